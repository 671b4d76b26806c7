//! Table library: sequence manipulation on raw tables.

use super::def::PrimitiveDef;
use super::{check_integer, check_table, opt_integer, opt_string};
use crate::context::Context;
use crate::error::{LError, LResult};
use crate::value::{TableRef, Value, Values};
use crate::vm::arithmetic::concat_piece;
use smallvec::smallvec;

/// Upper bound on values produced by one `unpack`.
const MAX_UNPACK: i64 = 1 << 20;

/// (insert t [pos] v)
pub fn prim_insert(_cx: &Context<'_>, args: Values) -> LResult<Values> {
    let table = check_table(&args, 1, "insert")?;
    let end = table.len() + 1;
    match args.len() {
        2 => table.set(Value::Int(end), args[1].clone())?,
        3 => {
            let pos = check_integer(&args, 2, "insert")?;
            if pos < 1 || pos > end {
                return Err(LError::bad_argument(2, "insert", "position out of bounds"));
            }
            let mut i = end;
            while i > pos {
                table.set(Value::Int(i), table.get_int(i - 1))?;
                i -= 1;
            }
            table.set(Value::Int(pos), args[2].clone())?;
        }
        _ => return Err(LError::runtime("wrong number of arguments to 'insert'")),
    }
    Ok(Values::new())
}

/// (remove t [pos]) -> removed value
pub fn prim_remove(_cx: &Context<'_>, args: Values) -> LResult<Values> {
    let table = check_table(&args, 1, "remove")?;
    let size = table.len();
    let mut pos = opt_integer(&args, 2, "remove", size)?;
    if pos != size && (pos < 1 || pos > size + 1) {
        return Err(LError::bad_argument(2, "remove", "position out of bounds"));
    }
    let removed = table.get_int(pos);
    while pos < size {
        table.set(Value::Int(pos), table.get_int(pos + 1))?;
        pos += 1;
    }
    table.set(Value::Int(pos), Value::Nil)?;
    Ok(smallvec![removed])
}

/// (concat t [sep [i [j]]]) -> string
pub fn prim_concat(_cx: &Context<'_>, args: Values) -> LResult<Values> {
    let table = check_table(&args, 1, "concat")?;
    let sep = opt_string(&args, 2, "concat", "")?;
    let first = opt_integer(&args, 3, "concat", 1)?;
    let last = opt_integer(&args, 4, "concat", table.len())?;

    let mut out = String::new();
    let mut i = first;
    while i <= last {
        let piece = table.get_int(i);
        match concat_piece(&piece) {
            Some(s) => out.push_str(&s),
            None => {
                return Err(LError::runtime(format!(
                    "invalid value (at index {}) in table for 'concat'",
                    i
                )))
            }
        }
        if i == last {
            break;
        }
        out.push_str(&sep);
        i += 1;
    }
    Ok(smallvec![Value::from(out)])
}

/// (pack ...) -> { ..., n = count }
pub fn prim_pack(_cx: &Context<'_>, args: Values) -> LResult<Values> {
    let n = args.len() as i64;
    let table = TableRef::from_values(args);
    table.set_str("n", Value::Int(n));
    Ok(smallvec![Value::Table(table)])
}

/// (unpack t [i [j]]) -> t[i], ..., t[j]
pub fn prim_unpack(_cx: &Context<'_>, args: Values) -> LResult<Values> {
    let table = check_table(&args, 1, "unpack")?;
    let first = opt_integer(&args, 2, "unpack", 1)?;
    let last = opt_integer(&args, 3, "unpack", table.len())?;
    if first > last {
        return Ok(Values::new());
    }
    let count = (last as i128) - (first as i128) + 1;
    if count >= MAX_UNPACK as i128 {
        return Err(LError::runtime("too many results to unpack"));
    }
    Ok((first..=last).map(|i| table.get_int(i)).collect())
}

pub const PRIMITIVES: &[PrimitiveDef] = &[
    PrimitiveDef {
        name: "insert",
        func: prim_insert,
        library: "table",
        doc: "Insert v at position pos (default: the end), shifting later elements up.",
        params: &["t", "pos", "v"],
    },
    PrimitiveDef {
        name: "remove",
        func: prim_remove,
        library: "table",
        doc: "Remove and return t[pos] (default: the last element), shifting later elements down.",
        params: &["t", "pos"],
    },
    PrimitiveDef {
        name: "concat",
        func: prim_concat,
        library: "table",
        doc: "Join t[i..j] with sep.",
        params: &["t", "sep", "i", "j"],
    },
    PrimitiveDef {
        name: "pack",
        func: prim_pack,
        library: "table",
        doc: "Collect the arguments into a table with field n.",
        params: &["..."],
    },
    PrimitiveDef {
        name: "unpack",
        func: prim_unpack,
        library: "table",
        doc: "Return t[i], ..., t[j] (default: the whole sequence).",
        params: &["t", "i", "j"],
    },
];
