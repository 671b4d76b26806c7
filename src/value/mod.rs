//! Value representation
//!
//! Script values are a plain tagged enum. Reference types (tables,
//! functions, threads) are `Rc` handles compared by identity; strings are
//! immutable `Rc<str>` compared by content.

pub mod display;
pub mod function;
pub mod multi;
pub mod number;
pub mod table;

pub use function::{Function, LuaClosure, NativeFn, NativeFunction, Upvalue};
pub use multi::{arg, Returns, Values};
pub use table::{Table, TableRef};

use crate::coroutine::Coroutine;
use std::rc::Rc;

#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    Table(TableRef),
    Function(Function),
    Thread(Coroutine),
}

impl Value {
    pub fn string(s: impl AsRef<str>) -> Value {
        Value::Str(Rc::from(s.as_ref()))
    }

    pub fn table() -> Value {
        Value::Table(TableRef::new())
    }

    pub fn native(
        name: impl Into<String>,
        func: impl Fn(&crate::context::Context<'_>, Values) -> crate::error::LResult<Values> + 'static,
    ) -> Value {
        Value::Function(Function::native(name, func))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "boolean",
            Value::Int(_) | Value::Float(_) => "number",
            Value::Str(_) => "string",
            Value::Table(_) => "table",
            Value::Function(_) => "function",
            Value::Thread(_) => "thread",
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Everything except `nil` and `false` is true.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&TableRef> {
        match self {
            Value::Table(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_thread(&self) -> Option<&Coroutine> {
        match self {
            Value::Thread(co) => Some(co),
            _ => None,
        }
    }

    /// Numeric view with string coercion, as arithmetic sees it.
    pub fn to_number(&self) -> Option<Value> {
        match self {
            Value::Int(_) | Value::Float(_) => Some(self.clone()),
            Value::Str(s) => number::parse_number(s),
            _ => None,
        }
    }

    /// Integer view: floats with an exact integer value and numeric
    /// strings convert, anything else does not.
    pub fn to_integer(&self) -> Option<i64> {
        match self.to_number()? {
            Value::Int(i) => Some(i),
            Value::Float(f) => number::float_to_int(f),
            _ => None,
        }
    }

    pub fn to_float(&self) -> Option<f64> {
        match self.to_number()? {
            Value::Int(i) => Some(i as f64),
            Value::Float(f) => Some(f),
            _ => None,
        }
    }
}

/// Raw equality: numbers by mathematical value, strings by content,
/// everything else by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(i), Value::Float(f)) | (Value::Float(f), Value::Int(i)) => {
                number::float_to_int(*f) == Some(*i)
            }
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Table(a), Value::Table(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => a == b,
            (Value::Thread(a), Value::Thread(b)) => a == b,
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Rc::from(s))
    }
}

impl From<Coroutine> for Value {
    fn from(co: Coroutine) -> Self {
        Value::Thread(co)
    }
}

impl From<Function> for Value {
    fn from(f: Function) -> Self {
        Value::Function(f)
    }
}
