//! Error types for the FHIRPath compiler and evaluator

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`], stable across message changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed expression text or inconsistent input data.
    Internal,
    /// Unknown field, function, constant or type name.
    NotFound,
    /// Wrong arity, wrong operand type or cardinality.
    InvalidArgument,
    /// Operation requires at most one element but got more.
    FailedPrecondition,
    /// Recognized but unsupported construct.
    Unimplemented,
    /// `%resource` used on a value with no enclosing resource.
    Ancestry,
}

/// Compilation and evaluation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Failed precondition: {0}")]
    FailedPrecondition(String),

    #[error("Unimplemented: {0}")]
    Unimplemented(String),

    #[error("No Resource found in ancestry.")]
    NoResourceInAncestry,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Parse(_) | Error::Internal(_) => ErrorKind::Internal,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Error::FailedPrecondition(_) => ErrorKind::FailedPrecondition,
            Error::Unimplemented(_) => ErrorKind::Unimplemented,
            Error::NoResourceInAncestry => ErrorKind::Ancestry,
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Error::InvalidArgument(message.into())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Internal(format!("invalid JSON: {err}"))
    }
}
