use std::sync::PoisonError;

use bincode::ErrorKind;

// Custom Result type
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Malformed input handed to a layer that expects a well-formed AST or record.
    Parse(String),
    /// I/O failure against a heap file or index file.
    Io(String),
    /// Positional or keyed lookup found nothing (update/delete with no matching row).
    NotFound(String),
    /// Index insert rejected by `allow_dupes = false`.
    Duplicate(String),
    /// Declared but unimplemented storage operation (index-backed reads).
    Unsupported(String),
    /// A query-tree invariant the optimizer is supposed to guarantee was violated.
    Invariant(String),
    /// Catch-all for everything else (poisoned locks, serialization failures).
    Internal(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Parse(s) => write!(f, "parse error: {s}"),
            Error::Io(s) => write!(f, "I/O error: {s}"),
            Error::NotFound(s) => write!(f, "not found: {s}"),
            Error::Duplicate(s) => write!(f, "duplicate key: {s}"),
            Error::Unsupported(s) => write!(f, "unsupported: {s}"),
            Error::Invariant(s) => write!(f, "invariant violated: {s}"),
            Error::Internal(s) => write!(f, "internal error: {s}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Error::Io(value.to_string())
    }
}

impl From<std::num::ParseIntError> for Error {
    fn from(value: std::num::ParseIntError) -> Self {
        Error::Parse(value.to_string())
    }
}

impl From<std::num::ParseFloatError> for Error {
    fn from(value: std::num::ParseFloatError) -> Self {
        Error::Parse(value.to_string())
    }
}

// Needed because the table share's RwLock propagates poisoning through `?`.
impl<T> From<PoisonError<T>> for Error {
    fn from(value: PoisonError<T>) -> Self {
        Error::Internal(value.to_string())
    }
}

impl From<Box<ErrorKind>> for Error {
    fn from(value: Box<ErrorKind>) -> Self {
        Error::Internal(value.to_string())
    }
}
