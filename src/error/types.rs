//! Error type definitions

use crate::coroutine::CoroutineError;
use crate::reader::SourceLoc;
use crate::value::Value;
use std::fmt;
use thiserror::Error;

/// What went wrong.
///
/// `Raised` carries the exact value handed to `error(...)` so it can be
/// returned untouched through `pcall` or a failed `resume`. Every other
/// kind surfaces to scripts as its message string.
#[derive(Debug, Clone, Error)]
pub enum ErrorKind {
    #[error("{message}")]
    Syntax { message: String },

    #[error("bad argument #{position} to '{function}' ({message})")]
    BadArgument {
        position: usize,
        function: String,
        message: String,
    },

    #[error("{message}")]
    Runtime { message: String },

    #[error(transparent)]
    Coroutine(#[from] CoroutineError),

    #[error("stack overflow")]
    StackOverflow,

    #[error("{0}")]
    Raised(Value),
}

/// An error raised while loading or running code.
#[derive(Debug, Clone)]
pub struct LError {
    pub kind: ErrorKind,
    pub location: Option<SourceLoc>,
}

pub type LResult<T> = Result<T, LError>;

impl LError {
    pub fn new(kind: ErrorKind) -> Self {
        LError {
            kind,
            location: None,
        }
    }

    /// Attach a location unless one is already recorded. The innermost
    /// location wins as the error propagates outwards.
    pub fn at(mut self, location: SourceLoc) -> Self {
        if self.location.is_none() {
            self.location = Some(location);
        }
        self
    }

    /// The script-visible error object.
    pub fn into_value(self) -> Value {
        match self.kind {
            ErrorKind::Raised(value) => value,
            other => Value::string(other.to_string()),
        }
    }

    pub fn is_syntax(&self) -> bool {
        matches!(self.kind, ErrorKind::Syntax { .. })
    }

    pub fn as_coroutine_error(&self) -> Option<&CoroutineError> {
        match &self.kind {
            ErrorKind::Coroutine(err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for LError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(loc) => write!(f, "{}: {}", loc, self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for LError {}

impl From<ErrorKind> for LError {
    fn from(kind: ErrorKind) -> Self {
        LError::new(kind)
    }
}

impl From<CoroutineError> for LError {
    fn from(err: CoroutineError) -> Self {
        LError::new(ErrorKind::Coroutine(err))
    }
}
