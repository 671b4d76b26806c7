//! Arithmetic, concatenation and length with Lua 5.4 number semantics:
//! integer operations wrap, `/` and `^` always produce floats, `//` and
//! `%` round towards negative infinity, numeric strings coerce.

use super::{OpError, Side};
use crate::error::LError;
use crate::reader::ast::{BinOp, UnOp};
use crate::value::number::format_float;
use crate::value::Value;

const ARITH: &str = "perform arithmetic on";

pub fn arith(op: BinOp, a: &Value, b: &Value) -> Result<Value, OpError> {
    let x = a.to_number().ok_or(OpError::Operand(Side::Left, ARITH))?;
    let y = b.to_number().ok_or(OpError::Operand(Side::Right, ARITH))?;
    match (op, &x, &y) {
        (BinOp::Div | BinOp::Pow, _, _) => Ok(Value::Float(float_op(op, as_f64(&x), as_f64(&y)))),
        (_, Value::Int(i), Value::Int(j)) => int_op(op, *i, *j),
        _ => Ok(Value::Float(float_op(op, as_f64(&x), as_f64(&y)))),
    }
}

fn as_f64(v: &Value) -> f64 {
    match v {
        Value::Int(i) => *i as f64,
        Value::Float(f) => *f,
        _ => f64::NAN,
    }
}

fn int_op(op: BinOp, i: i64, j: i64) -> Result<Value, OpError> {
    let v = match op {
        BinOp::Add => i.wrapping_add(j),
        BinOp::Sub => i.wrapping_sub(j),
        BinOp::Mul => i.wrapping_mul(j),
        BinOp::IDiv => {
            if j == 0 {
                return Err(OpError::Fail(LError::runtime("attempt to perform 'n//0'")));
            }
            let q = i.wrapping_div(j);
            if i.wrapping_rem(j) != 0 && ((i < 0) != (j < 0)) {
                q - 1
            } else {
                q
            }
        }
        BinOp::Mod => {
            if j == 0 {
                return Err(OpError::Fail(LError::runtime("attempt to perform 'n%%0'")));
            }
            let r = i.wrapping_rem(j);
            if r != 0 && ((r < 0) != (j < 0)) {
                r + j
            } else {
                r
            }
        }
        _ => return Ok(Value::Float(float_op(op, i as f64, j as f64))),
    };
    Ok(Value::Int(v))
}

fn float_op(op: BinOp, x: f64, y: f64) -> f64 {
    match op {
        BinOp::Add => x + y,
        BinOp::Sub => x - y,
        BinOp::Mul => x * y,
        BinOp::Div => x / y,
        BinOp::Pow => x.powf(y),
        BinOp::IDiv => (x / y).floor(),
        BinOp::Mod => {
            let m = x % y;
            if (m > 0.0 && y < 0.0) || (m < 0.0 && y > 0.0) {
                m + y
            } else {
                m
            }
        }
        _ => f64::NAN,
    }
}

pub fn unary(op: UnOp, v: &Value) -> Result<Value, OpError> {
    match op {
        UnOp::Not => Ok(Value::Bool(!v.is_truthy())),
        UnOp::Neg => match v.to_number() {
            Some(Value::Int(i)) => Ok(Value::Int(i.wrapping_neg())),
            Some(Value::Float(f)) => Ok(Value::Float(-f)),
            _ => Err(OpError::Operand(Side::Left, ARITH)),
        },
        UnOp::Len => match v {
            Value::Str(s) => Ok(Value::Int(s.len() as i64)),
            Value::Table(t) => Ok(Value::Int(t.len())),
            _ => Err(OpError::Operand(Side::Left, "get length of")),
        },
    }
}

/// String form used by `..`; only strings and numbers qualify.
pub fn concat_piece(v: &Value) -> Option<String> {
    match v {
        Value::Str(s) => Some(s.to_string()),
        Value::Int(i) => Some(i.to_string()),
        Value::Float(f) => Some(format_float(*f)),
        _ => None,
    }
}

pub fn concat(a: &Value, b: &Value) -> Result<Value, OpError> {
    let left = concat_piece(a).ok_or(OpError::Operand(Side::Left, "concatenate"))?;
    let right = concat_piece(b).ok_or(OpError::Operand(Side::Right, "concatenate"))?;
    Ok(Value::from(left + &right))
}
