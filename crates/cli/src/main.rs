mod serve;

use std::path::Path;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use iras_relay_core::SubmissionType;

/// IRAS callback receiver toolchain.
#[derive(Parser)]
#[command(name = "iras-relay", version, about = "IRAS callback receiver")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP callback receiver
    Serve {
        /// Port to listen on (defaults to $PORT, then 8080)
        #[arg(long)]
        port: Option<u16>,
        /// Maximum number of retained event log entries
        #[arg(long, default_value_t = iras_relay_core::DEFAULT_CAPACITY)]
        log_capacity: usize,
    },

    /// Validate a callback payload file without serving
    Validate {
        /// Path to the JSON payload file
        payload: PathBuf,
        /// Submission type, as the endpoint path segment
        /// (gst-return, form-cs, commission-records, donation-records, e-stamping)
        #[arg(long, default_value = "gst-return")]
        kind: String,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port, log_capacity } => {
            let port = port
                .or_else(|| std::env::var("PORT").ok().and_then(|p| p.parse().ok()))
                .unwrap_or(8080);
            let rt = tokio::runtime::Runtime::new().expect("failed to create tokio runtime");
            if let Err(e) = rt.block_on(serve::start_server(port, log_capacity)) {
                eprintln!("Server error: {}", e);
                process::exit(1);
            }
        }
        Commands::Validate { payload, kind } => {
            cmd_validate(&payload, &kind);
        }
    }
}

/// Offline validation of a payload file. Exit code 1 on invalid payload,
/// 2 on usage errors.
fn cmd_validate(path: &Path, kind: &str) {
    let Some(kind) = SubmissionType::from_path_segment(kind) else {
        eprintln!(
            "error: unknown submission type '{}' (expected one of: gst-return, form-cs, commission-records, donation-records, e-stamping)",
            kind
        );
        process::exit(2);
    };

    let text = match std::fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("error: failed to read {}: {}", path.display(), e);
            process::exit(2);
        }
    };

    let payload: serde_json::Value = match serde_json::from_str(&text) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("error: invalid JSON in {}: {}", path.display(), e);
            process::exit(2);
        }
    };

    match iras_relay_core::validate(kind, &payload) {
        Ok(record) => {
            println!(
                "{}",
                serde_json::to_string_pretty(&record).unwrap_or_default()
            );
        }
        Err(e) => {
            eprintln!("invalid {} payload:", kind.endpoint_tag());
            for problem in &e.problems {
                eprintln!("  - {}", problem);
            }
            process::exit(1);
        }
    }
}
