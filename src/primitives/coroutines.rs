//! Coroutine primitives
//!
//! The script-facing `coroutine` library:
//! - create: Make a coroutine from a function
//! - resume: Run it until it yields or finishes, tagging the outcome
//! - yield: Suspend the running coroutine
//! - wrap: Make a function that resumes a coroutine and raises its errors
//! - status, running, isyieldable: Introspection
//! - close: Kill a suspended coroutine, running its pending cleanups

use super::def::PrimitiveDef;
use super::{check_function, check_thread};
use crate::context::Context;
use crate::coroutine::{Body, Coroutine};
use crate::error::{LError, LResult};
use crate::value::{Function, Value, Values};
use smallvec::smallvec;

/// Create a coroutine from a function value and register it.
pub fn spawn(cx: &Context<'_>, func: Function) -> Coroutine {
    let body = match func {
        Function::Lua(closure) => Body::Interpreted(closure),
        Function::Native(native) => Body::Native(native),
    };
    cx.registry().spawn(body)
}

/// (create f) -> co
pub fn prim_create(cx: &Context<'_>, args: Values) -> LResult<Values> {
    let func = check_function(&args, 1, "create")?;
    Ok(smallvec![Value::Thread(spawn(cx, func))])
}

/// (resume co ...) -> true, ... | false, err
pub fn prim_resume(cx: &Context<'_>, args: Values) -> LResult<Values> {
    let co = check_thread(&args, 1, "resume")?;
    let rest: Values = args.into_iter().skip(1).collect();
    match co.resume(cx, rest)? {
        Ok(values) => {
            let mut out = Values::with_capacity(values.len() + 1);
            out.push(Value::Bool(true));
            out.extend(values);
            Ok(out)
        }
        Err(err) => Ok(smallvec![Value::Bool(false), err]),
    }
}

/// (yield ...) -> values passed to the next resume
pub fn prim_yield(cx: &Context<'_>, args: Values) -> LResult<Values> {
    cx.yield_values(args)
}

/// (wrap f) -> function
pub fn prim_wrap(cx: &Context<'_>, args: Values) -> LResult<Values> {
    let func = check_function(&args, 1, "wrap")?;
    if !matches!(func, Function::Lua(_)) {
        return Err(LError::bad_argument(1, "wrap", "interpreted function expected"));
    }
    let co = spawn(cx, func);
    let adapter = Value::native("wrap", move |cx, args| match co.resume(cx, args)? {
        Ok(values) => Ok(values),
        Err(err) => Err(LError::raised(err)),
    });
    Ok(smallvec![adapter])
}

/// (status co) -> "running" | "suspended" | "normal" | "dead"
pub fn prim_status(cx: &Context<'_>, args: Values) -> LResult<Values> {
    let co = check_thread(&args, 1, "status")?;
    Ok(smallvec![Value::string(co.status_in(cx).as_str())])
}

/// (running) -> co, ismain
pub fn prim_running(cx: &Context<'_>, _args: Values) -> LResult<Values> {
    let current = cx.current();
    let is_main = current.is_main();
    Ok(smallvec![Value::Thread(current), Value::Bool(is_main)])
}

/// (isyieldable [co]) -> boolean
pub fn prim_isyieldable(cx: &Context<'_>, args: Values) -> LResult<Values> {
    let co = match args.first() {
        None | Some(Value::Nil) => cx.current(),
        Some(_) => check_thread(&args, 1, "isyieldable")?,
    };
    Ok(smallvec![Value::Bool(!co.is_main())])
}

/// (close co) -> true | false, err
pub fn prim_close(cx: &Context<'_>, args: Values) -> LResult<Values> {
    let co = check_thread(&args, 1, "close")?;
    match co.close(cx)? {
        Ok(()) => Ok(smallvec![Value::Bool(true)]),
        Err(err) => Ok(smallvec![Value::Bool(false), err]),
    }
}

pub const PRIMITIVES: &[PrimitiveDef] = &[
    PrimitiveDef {
        name: "create",
        func: prim_create,
        library: "coroutine",
        doc: "Create a suspended coroutine running f.",
        params: &["f"],
    },
    PrimitiveDef {
        name: "resume",
        func: prim_resume,
        library: "coroutine",
        doc: "Run co until it yields or ends. Returns true plus its values, or false plus the error.",
        params: &["co", "..."],
    },
    PrimitiveDef {
        name: "yield",
        func: prim_yield,
        library: "coroutine",
        doc: "Suspend the running coroutine, handing values to resume.",
        params: &["..."],
    },
    PrimitiveDef {
        name: "wrap",
        func: prim_wrap,
        library: "coroutine",
        doc: "Return a function that resumes a new coroutine and raises its errors.",
        params: &["f"],
    },
    PrimitiveDef {
        name: "status",
        func: prim_status,
        library: "coroutine",
        doc: "One of running, suspended, normal or dead.",
        params: &["co"],
    },
    PrimitiveDef {
        name: "running",
        func: prim_running,
        library: "coroutine",
        doc: "The running coroutine and whether it is the main thread.",
        ..PrimitiveDef::DEFAULT
    },
    PrimitiveDef {
        name: "isyieldable",
        func: prim_isyieldable,
        library: "coroutine",
        doc: "Whether co (default: the running coroutine) can yield.",
        params: &["co"],
    },
    PrimitiveDef {
        name: "close",
        func: prim_close,
        library: "coroutine",
        doc: "Close a suspended or dead coroutine, running pending cleanups.",
        params: &["co"],
    },
];
