//! Builder methods for constructing LError instances

use super::types::{ErrorKind, LError};
use crate::reader::SourceLoc;
use crate::value::Value;

impl LError {
    pub fn syntax(message: impl Into<String>, location: SourceLoc) -> Self {
        LError::new(ErrorKind::Syntax {
            message: message.into(),
        })
        .at(location)
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        LError::new(ErrorKind::Runtime {
            message: message.into(),
        })
    }

    pub fn raised(value: Value) -> Self {
        LError::new(ErrorKind::Raised(value))
    }

    pub fn stack_overflow() -> Self {
        LError::new(ErrorKind::StackOverflow)
    }

    // Argument validation for library functions
    pub fn bad_argument(
        position: usize,
        function: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        LError::new(ErrorKind::BadArgument {
            position,
            function: function.into(),
            message: message.into(),
        })
    }

    /// `bad argument #n to 'f' (table expected, got nil)`; a missing
    /// argument reads `got no value`.
    pub fn type_expected(
        position: usize,
        function: impl Into<String>,
        expected: &str,
        got: Option<&Value>,
    ) -> Self {
        let got = got.map_or("no value", |v| v.type_name());
        LError::bad_argument(position, function, format!("{} expected, got {}", expected, got))
    }

    // Operator errors
    pub fn arithmetic_on(value: &Value) -> Self {
        LError::runtime(format!(
            "attempt to perform arithmetic on a {} value",
            value.type_name()
        ))
    }

    pub fn compare(a: &Value, b: &Value) -> Self {
        let (ta, tb) = (a.type_name(), b.type_name());
        if ta == tb {
            LError::runtime(format!("attempt to compare two {} values", ta))
        } else {
            LError::runtime(format!("attempt to compare {} with {}", ta, tb))
        }
    }
}
