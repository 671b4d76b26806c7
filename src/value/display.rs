//! Display and Debug implementations for values
//!
//! `Display` is what `tostring` and `print` produce. `Debug` quotes strings
//! so test failures stay readable.

use super::number::format_float;
use super::{Function, Value};
use std::fmt;

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", format_float(*x)),
            Value::Str(s) => write!(f, "{}", s),
            Value::Table(t) => write!(f, "table: 0x{:08x}", t.addr()),
            Value::Function(func) => match func {
                Function::Lua(_) => write!(f, "function: 0x{:08x}", func.addr()),
                Function::Native(_) => write!(f, "function: builtin: 0x{:08x}", func.addr()),
            },
            Value::Thread(co) => write!(f, "thread: 0x{:08x}", co.addr()),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Function(func) => write!(f, "<function {}>", func.name()),
            Value::Thread(co) => write!(f, "{:?}", co),
            other => write!(f, "{}", other),
        }
    }
}
