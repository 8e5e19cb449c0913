//! Centralized error handling for the text engine core.
//! Defines error categories and a single structured error type.

use std::fmt;

/// Category of the error, per the taxonomy in the core's error-handling design.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// File open/read/write/seek/map failures.
    Io,
    /// Invalid byte sequence under the current encoding (non-fatal, recorded for diagnostics).
    Encoding,
    /// Contract violation: out-of-range position, non-ascending edit ops, undo without can_undo.
    Internal,
    /// Saving/registering an unnamed buffer under a path that already maps to another buffer.
    RegistryConflict,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io => write!(f, "IO"),
            Self::Encoding => write!(f, "Encoding"),
            Self::Internal => write!(f, "Internal"),
            Self::RegistryConflict => write!(f, "RegistryConflict"),
        }
    }
}

/// A structured error produced by the text engine core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEngineError {
    pub kind: ErrorKind,
    pub code: String,
    pub message: String,
}

impl TextEngineError {
    pub fn new(kind: ErrorKind, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Io, "IO_ERROR", message)
    }

    pub fn registry_conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RegistryConflict, "REGISTRY_CONFLICT", message)
    }

    pub fn contains_msg(&self, sub: &str) -> bool {
        self.message.contains(sub)
    }
}

impl fmt::Display for TextEngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}): {}", self.kind, self.code, self.message)
    }
}

impl std::error::Error for TextEngineError {}

impl From<std::io::Error> for TextEngineError {
    fn from(err: std::io::Error) -> Self {
        Self::io(err.to_string())
    }
}

/// Result alias for text engine operations.
pub type Result<T> = std::result::Result<T, TextEngineError>;

#[cfg(test)]
#[path = "tests.rs"]
mod tests;
