//! Sales order domain errors
//!
//! These cover misuse of the dynamic record buffer. They are raised locally,
//! before anything reaches the record service, and convert into
//! `PortError::Validation` when they cross the port boundary.

use core_kernel::PortError;
use thiserror::Error;

/// Errors raised while mutating a record buffer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    /// A sublist value was set without selecting a line first
    #[error("No line is selected on sublist '{0}'")]
    NoCurrentLine(String),

    /// A new line was selected while another one is still pending
    #[error("Line on sublist '{0}' must be committed before selecting a new one")]
    LineAlreadySelected(String),

    /// The record still has an uncommitted line
    #[error("Uncommitted line on sublist '{0}'")]
    PendingLine(String),

    /// The field cannot be written by callers
    #[error("Field '{0}' is read-only")]
    ReadOnlyField(String),
}

impl RecordError {
    /// Name of the field or sublist the error refers to
    pub fn target(&self) -> &str {
        match self {
            RecordError::NoCurrentLine(s)
            | RecordError::LineAlreadySelected(s)
            | RecordError::PendingLine(s)
            | RecordError::ReadOnlyField(s) => s,
        }
    }
}

impl From<RecordError> for PortError {
    fn from(err: RecordError) -> Self {
        PortError::validation_field(err.to_string(), err.target().to_string())
    }
}
