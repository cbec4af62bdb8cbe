//! iras-relay-core: IRAS callback validation and event log.
//!
//! The library half of the callback receiver. It knows nothing about HTTP:
//! the serve layer decodes request bodies to `serde_json::Value`, hands them
//! to [`validate()`] together with a [`SubmissionType`], and appends the
//! outcome to the shared [`EventLog`].
//!
//! # Public API
//!
//! Key types are re-exported at the crate root for convenience:
//!
//! - [`validate()`] -- turn a decoded payload into a [`SubmissionRecord`]
//!   or a [`ValidationError`]
//! - [`SubmissionType`], [`SubmissionStatus`], [`FormType`] -- closed enums
//!   for the wire vocabulary
//! - [`EventLog`], [`LogEntry`], [`LogStats`] -- the bounded diagnostic log

pub mod eventlog;
pub mod submission;
pub mod validate;

pub use eventlog::{EntryStatus, EventLog, LogEntry, LogStats, DEFAULT_CAPACITY};
pub use submission::{
    FormType, SubmissionDetail, SubmissionRecord, SubmissionStatus, SubmissionType,
};
pub use validate::{optional_fields, required_fields, validate, ValidationError};
