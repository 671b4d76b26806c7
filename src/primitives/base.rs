//! Base library: the plain globals every chunk can use.

use super::def::PrimitiveDef;
use super::{check_any, check_integer, check_table, opt_integer};
use crate::context::Context;
use crate::error::{LError, LResult};
use crate::value::number::parse_number;
use crate::value::{arg, TableRef, Value, Values};
use smallvec::smallvec;
use std::cell::Cell;
use std::io::Write;

/// (print ...) writes each value's string form, tab separated.
pub fn prim_print(cx: &Context<'_>, args: Values) -> LResult<Values> {
    let line = args
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("\t");
    let mut out = cx.state().output.borrow_mut();
    writeln!(out, "{}", line)
        .and_then(|_| out.flush())
        .map_err(|e| LError::runtime(format!("print: {}", e)))?;
    Ok(Values::new())
}

pub fn prim_type(_cx: &Context<'_>, args: Values) -> LResult<Values> {
    let v = check_any(&args, 1, "type")?;
    Ok(smallvec![Value::string(v.type_name())])
}

pub fn prim_tostring(_cx: &Context<'_>, args: Values) -> LResult<Values> {
    let v = check_any(&args, 1, "tostring")?;
    Ok(smallvec![Value::string(v.to_string())])
}

/// (tonumber v [base]) -> number | nil
pub fn prim_tonumber(_cx: &Context<'_>, args: Values) -> LResult<Values> {
    let v = check_any(&args, 1, "tonumber")?;
    if matches!(args.get(1), None | Some(Value::Nil)) {
        let n = match v {
            Value::Int(_) | Value::Float(_) => v.clone(),
            Value::Str(s) => parse_number(s).unwrap_or_default(),
            _ => Value::Nil,
        };
        return Ok(smallvec![n]);
    }

    let base = check_integer(&args, 2, "tonumber")?;
    if !(2..=36).contains(&base) {
        return Err(LError::bad_argument(2, "tonumber", "base out of range"));
    }
    let text = match v {
        Value::Str(s) => s.clone(),
        other => return Err(LError::type_expected(1, "tonumber", "string", Some(other))),
    };
    Ok(smallvec![parse_in_base(&text, base as u32).map_or(Value::Nil, Value::Int)])
}

fn parse_in_base(text: &str, base: u32) -> Option<i64> {
    let text = text.trim();
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    if digits.is_empty() {
        return None;
    }
    let mut n: i64 = 0;
    for c in digits.chars() {
        let d = c.to_digit(base)?;
        n = n.wrapping_mul(base as i64).wrapping_add(d as i64);
    }
    Some(if negative { n.wrapping_neg() } else { n })
}

/// (error v) raises `v` unchanged. The level argument is accepted and
/// ignored: error values never carry a position prefix.
pub fn prim_error(_cx: &Context<'_>, args: Values) -> LResult<Values> {
    Err(LError::raised(arg(&args, 0)))
}

/// (pcall f ...) -> true, ... | false, err
pub fn prim_pcall(cx: &Context<'_>, args: Values) -> LResult<Values> {
    check_any(&args, 1, "pcall")?;
    let mut args = args.into_iter();
    let func = args.next().unwrap_or_default();
    match cx.call(&func, args.collect()) {
        Ok(values) => {
            let mut out = Values::with_capacity(values.len() + 1);
            out.push(Value::Bool(true));
            out.extend(values);
            Ok(out)
        }
        Err(err) => Ok(smallvec![Value::Bool(false), err.into_value()]),
    }
}

/// (xpcall f handler ...) -> true, ... | false, handler(err)
pub fn prim_xpcall(cx: &Context<'_>, args: Values) -> LResult<Values> {
    let handler = check_any(&args, 2, "xpcall")?.clone();
    let mut args = args.into_iter();
    let func = args.next().unwrap_or_default();
    let rest: Values = args.skip(1).collect();
    match cx.call(&func, rest) {
        Ok(values) => {
            let mut out = Values::with_capacity(values.len() + 1);
            out.push(Value::Bool(true));
            out.extend(values);
            Ok(out)
        }
        Err(err) => {
            let handled = cx.call(&handler, smallvec![err.into_value()])?;
            let mut out = Values::with_capacity(handled.len() + 1);
            out.push(Value::Bool(false));
            out.extend(handled);
            Ok(out)
        }
    }
}

/// (assert v [message ...]) returns all its arguments when `v` is true.
pub fn prim_assert(_cx: &Context<'_>, args: Values) -> LResult<Values> {
    let v = check_any(&args, 1, "assert")?;
    if v.is_truthy() {
        return Ok(args);
    }
    match args.get(1) {
        None | Some(Value::Nil) => Err(LError::raised(Value::string("assertion failed!"))),
        Some(message) => Err(LError::raised(message.clone())),
    }
}

/// (select n ...) -> values from position n; (select "#" ...) -> count
pub fn prim_select(_cx: &Context<'_>, args: Values) -> LResult<Values> {
    let count = args.len().saturating_sub(1) as i64;
    if let Some(Value::Str(s)) = args.first() {
        if &**s == "#" {
            return Ok(smallvec![Value::Int(count)]);
        }
    }
    let n = check_integer(&args, 1, "select")?;
    let start = if n < 0 {
        if n.unsigned_abs() > count as u64 {
            return Err(LError::bad_argument(1, "select", "index out of range"));
        }
        count + n
    } else if n == 0 {
        return Err(LError::bad_argument(1, "select", "index out of range"));
    } else {
        (n - 1).min(count)
    };
    Ok(args.into_iter().skip(1 + start as usize).collect())
}

fn ipairs_step(_cx: &Context<'_>, args: Values) -> LResult<Values> {
    let table = check_table(&args, 1, "ipairs_step")?;
    let i = opt_integer(&args, 2, "ipairs_step", 0)?.wrapping_add(1);
    let v = table.get_int(i);
    if v.is_nil() {
        Ok(smallvec![Value::Nil])
    } else {
        Ok(smallvec![Value::Int(i), v])
    }
}

/// (ipairs t) -> step, t, 0
pub fn prim_ipairs(_cx: &Context<'_>, args: Values) -> LResult<Values> {
    let table = check_table(&args, 1, "ipairs")?;
    Ok(smallvec![
        Value::native("ipairs_step", ipairs_step),
        Value::Table(table),
        Value::Int(0)
    ])
}

/// (pairs t) -> step, t, nil
///
/// Iterates a snapshot of the entries taken when `pairs` is called.
/// Entries cleared during the loop are skipped; entries added are not
/// visited.
pub fn prim_pairs(_cx: &Context<'_>, args: Values) -> LResult<Values> {
    let table = check_table(&args, 1, "pairs")?;
    let entries = table.entries();
    let cursor = Cell::new(0usize);
    let live: TableRef = table.clone();
    let step = Value::native("pairs_step", move |_cx, _args| {
        while let Some((key, _)) = entries.get(cursor.get()) {
            cursor.set(cursor.get() + 1);
            let value = live.get(key);
            if !value.is_nil() {
                return Ok(smallvec![key.clone(), value]);
            }
        }
        Ok(smallvec![Value::Nil])
    });
    Ok(smallvec![step, Value::Table(table), Value::Nil])
}

pub const PRIMITIVES: &[PrimitiveDef] = &[
    PrimitiveDef {
        name: "print",
        func: prim_print,
        doc: "Write the values to the output, separated by tabs.",
        params: &["..."],
        ..PrimitiveDef::DEFAULT
    },
    PrimitiveDef {
        name: "type",
        func: prim_type,
        doc: "Type name of v.",
        params: &["v"],
        ..PrimitiveDef::DEFAULT
    },
    PrimitiveDef {
        name: "tostring",
        func: prim_tostring,
        doc: "String form of v, as print shows it.",
        params: &["v"],
        ..PrimitiveDef::DEFAULT
    },
    PrimitiveDef {
        name: "tonumber",
        func: prim_tonumber,
        doc: "Convert v to a number, or nil. With a base, parse an integer numeral.",
        params: &["v", "base"],
        ..PrimitiveDef::DEFAULT
    },
    PrimitiveDef {
        name: "error",
        func: prim_error,
        doc: "Raise v as an error.",
        params: &["v", "level"],
        ..PrimitiveDef::DEFAULT
    },
    PrimitiveDef {
        name: "pcall",
        func: prim_pcall,
        doc: "Call f in protected mode. Returns true plus results, or false plus the error.",
        params: &["f", "..."],
        ..PrimitiveDef::DEFAULT
    },
    PrimitiveDef {
        name: "xpcall",
        func: prim_xpcall,
        doc: "Like pcall, but errors are passed through handler.",
        params: &["f", "handler", "..."],
        ..PrimitiveDef::DEFAULT
    },
    PrimitiveDef {
        name: "assert",
        func: prim_assert,
        doc: "Raise message (default \"assertion failed!\") unless v is true.",
        params: &["v", "message"],
        ..PrimitiveDef::DEFAULT
    },
    PrimitiveDef {
        name: "select",
        func: prim_select,
        doc: "Arguments after position n, or their count when n is \"#\".",
        params: &["n", "..."],
        ..PrimitiveDef::DEFAULT
    },
    PrimitiveDef {
        name: "ipairs",
        func: prim_ipairs,
        doc: "Iterate t[1], t[2], ... up to the first nil.",
        params: &["t"],
        ..PrimitiveDef::DEFAULT
    },
    PrimitiveDef {
        name: "pairs",
        func: prim_pairs,
        doc: "Iterate every key/value pair of t.",
        params: &["t"],
        ..PrimitiveDef::DEFAULT
    },
];
