//! Callable values: interpreted closures and host functions.

use super::{Value, Values};
use crate::context::Context;
use crate::error::LResult;
use crate::reader::ast::FunctionProto;
use std::cell::RefCell;
use std::rc::Rc;

/// A captured variable cell, shared between the defining scope and every
/// closure that captures it.
pub type Upvalue = Rc<RefCell<Value>>;

pub type NativeFn = dyn Fn(&Context<'_>, Values) -> LResult<Values>;

/// A compiled function body plus its captured cells.
pub struct LuaClosure {
    pub proto: Rc<FunctionProto>,
    pub upvalues: Box<[Upvalue]>,
}

impl LuaClosure {
    pub fn name(&self) -> &str {
        &self.proto.name
    }
}

/// A host function callable from scripts.
pub struct NativeFunction {
    pub name: String,
    pub func: Box<NativeFn>,
}

impl NativeFunction {
    pub fn call(&self, cx: &Context<'_>, args: Values) -> LResult<Values> {
        (self.func)(cx, args)
    }
}

#[derive(Clone)]
pub enum Function {
    Lua(Rc<LuaClosure>),
    Native(Rc<NativeFunction>),
}

impl Function {
    pub fn native(
        name: impl Into<String>,
        func: impl Fn(&Context<'_>, Values) -> LResult<Values> + 'static,
    ) -> Function {
        Function::Native(Rc::new(NativeFunction {
            name: name.into(),
            func: Box::new(func),
        }))
    }

    pub fn name(&self) -> &str {
        match self {
            Function::Lua(c) => c.name(),
            Function::Native(n) => &n.name,
        }
    }

    pub fn addr(&self) -> usize {
        match self {
            Function::Lua(c) => Rc::as_ptr(c) as *const () as usize,
            Function::Native(n) => Rc::as_ptr(n) as *const () as usize,
        }
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }
}
