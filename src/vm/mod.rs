//! Tree-walking evaluator
//!
//! Each call of an interpreted closure gets a `Frame` holding one variable
//! cell per local slot. Declarations install a fresh cell, so closures
//! created in a loop body capture that iteration's variables. The
//! evaluator recurses on the machine stack, which is what lets a coroutine
//! suspend at any call depth.

pub mod arithmetic;
pub mod comparison;
mod eval;
mod execute;

use crate::context::Context;
use crate::error::{LError, LResult};
use crate::value::{LuaClosure, Upvalue, Value, Values};
use smallvec::smallvec;
use std::cell::RefCell;
use std::rc::Rc;

/// How a statement or block finished.
pub(crate) enum Flow {
    Normal,
    Break,
    Return(Values),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// Operator failure. `Operand` errors are finished by the evaluator,
/// which knows how to name the offending variable.
#[derive(Debug)]
pub enum OpError {
    Operand(Side, &'static str),
    Fail(LError),
}

pub(crate) struct Frame<'f, 'a> {
    cx: &'f Context<'a>,
    closure: &'f LuaClosure,
    slots: Vec<Upvalue>,
    varargs: Values,
}

fn fresh_cell(value: Value) -> Upvalue {
    Rc::new(RefCell::new(value))
}

/// Run an interpreted closure to completion on the current stack.
pub fn call_closure(cx: &Context<'_>, closure: &Rc<LuaClosure>, args: Values) -> LResult<Values> {
    let proto = &closure.proto;
    // Every slot gets its own cell when its declaration runs; until then
    // they share one placeholder that is never written.
    let placeholder = fresh_cell(Value::Nil);
    let mut slots = vec![placeholder; proto.num_slots];

    let mut args = args.into_iter();
    for &slot in &proto.params {
        slots[slot] = fresh_cell(args.next().unwrap_or_default());
    }
    let varargs = if proto.is_vararg {
        args.collect()
    } else {
        Values::new()
    };

    let mut frame = Frame {
        cx,
        closure,
        slots,
        varargs,
    };
    match frame.exec_block(&proto.body)? {
        Flow::Return(values) => Ok(values),
        Flow::Normal | Flow::Break => Ok(Values::new()),
    }
}

/// A value a `<close>` variable may hold.
pub fn is_closable(value: &Value) -> bool {
    match value {
        Value::Nil | Value::Bool(false) => true,
        Value::Table(t) => matches!(t.get_str("__close"), Value::Function(_)),
        _ => false,
    }
}

/// Invoke `value.__close(value, err)`.
pub fn call_close_hook(cx: &Context<'_>, value: &Value, err: Value) -> LResult<()> {
    let hook = match value {
        Value::Table(t) => t.get_str("__close"),
        _ => Value::Nil,
    };
    if !matches!(hook, Value::Function(_)) {
        return Err(LError::runtime(format!(
            "attempt to call a {} value (metamethod 'close')",
            hook.type_name()
        )));
    }
    cx.call(&hook, smallvec![value.clone(), err])?;
    Ok(())
}
