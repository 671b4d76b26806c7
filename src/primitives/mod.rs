//! Built-in functions
//!
//! `base` holds the plain globals, `coroutines` and `table` fill the
//! library tables of the same names. The helpers below implement the
//! argument checks shared by all of them.

pub mod base;
pub mod coroutines;
pub mod def;
pub mod registration;
pub mod table;

pub use def::{PrimFn, PrimitiveDef, PrimitiveDocs};
pub use registration::register_primitives;

use crate::coroutine::Coroutine;
use crate::error::{LError, LResult};
use crate::value::{Function, TableRef, Value};

/// Argument `pos` (1-based) must be present, whatever its value.
pub(crate) fn check_any<'v>(args: &'v [Value], pos: usize, fname: &str) -> LResult<&'v Value> {
    args.get(pos - 1)
        .ok_or_else(|| LError::bad_argument(pos, fname, "value expected"))
}

pub(crate) fn check_table(args: &[Value], pos: usize, fname: &str) -> LResult<TableRef> {
    match args.get(pos - 1) {
        Some(Value::Table(t)) => Ok(t.clone()),
        other => Err(LError::type_expected(pos, fname, "table", other)),
    }
}

pub(crate) fn check_function(args: &[Value], pos: usize, fname: &str) -> LResult<Function> {
    match args.get(pos - 1) {
        Some(Value::Function(f)) => Ok(f.clone()),
        other => Err(LError::type_expected(pos, fname, "function", other)),
    }
}

pub(crate) fn check_thread(args: &[Value], pos: usize, fname: &str) -> LResult<Coroutine> {
    match args.get(pos - 1) {
        Some(Value::Thread(co)) => Ok(co.clone()),
        other => Err(LError::type_expected(pos, fname, "coroutine", other)),
    }
}

pub(crate) fn check_integer(args: &[Value], pos: usize, fname: &str) -> LResult<i64> {
    let value = args.get(pos - 1);
    match value {
        Some(v @ (Value::Int(_) | Value::Float(_) | Value::Str(_))) => match v.to_integer() {
            Some(i) => Ok(i),
            None if v.to_number().is_some() => Err(LError::bad_argument(
                pos,
                fname,
                "number has no integer representation",
            )),
            None => Err(LError::type_expected(pos, fname, "number", value)),
        },
        _ => Err(LError::type_expected(pos, fname, "number", value)),
    }
}

/// Like `check_integer`, but nil or a missing argument gives `default`.
pub(crate) fn opt_integer(args: &[Value], pos: usize, fname: &str, default: i64) -> LResult<i64> {
    match args.get(pos - 1) {
        None | Some(Value::Nil) => Ok(default),
        Some(_) => check_integer(args, pos, fname),
    }
}

/// Optional string argument; numbers are accepted in their string form.
pub(crate) fn opt_string(
    args: &[Value],
    pos: usize,
    fname: &str,
    default: &str,
) -> LResult<String> {
    match args.get(pos - 1) {
        None | Some(Value::Nil) => Ok(default.to_string()),
        Some(Value::Str(s)) => Ok(s.to_string()),
        Some(v @ (Value::Int(_) | Value::Float(_))) => Ok(v.to_string()),
        other => Err(LError::type_expected(pos, fname, "string", other)),
    }
}
