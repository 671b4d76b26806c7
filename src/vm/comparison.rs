//! Ordering comparisons. Mixed integer/float comparisons are exact, not
//! done by converting the integer to a float.

use super::OpError;
use crate::error::LError;
use crate::value::Value;

/// 2^63 as a float; every float strictly below it and at least -2^63
/// converts to `i64` without loss of ordering.
const TWO_63: f64 = 9_223_372_036_854_775_808.0;

pub fn less_than(a: &Value, b: &Value) -> Result<bool, OpError> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Ok(x < y),
        (Value::Float(x), Value::Float(y)) => Ok(x < y),
        (Value::Int(i), Value::Float(f)) => Ok(int_lt_float(*i, *f)),
        (Value::Float(f), Value::Int(i)) => Ok(float_lt_int(*f, *i)),
        (Value::Str(x), Value::Str(y)) => Ok(x < y),
        _ => Err(OpError::Fail(LError::compare(a, b))),
    }
}

pub fn less_equal(a: &Value, b: &Value) -> Result<bool, OpError> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Ok(x <= y),
        (Value::Float(x), Value::Float(y)) => Ok(x <= y),
        (Value::Int(i), Value::Float(f)) => Ok(int_le_float(*i, *f)),
        (Value::Float(f), Value::Int(i)) => Ok(float_le_int(*f, *i)),
        (Value::Str(x), Value::Str(y)) => Ok(x <= y),
        _ => Err(OpError::Fail(LError::compare(a, b))),
    }
}

fn int_lt_float(i: i64, f: f64) -> bool {
    if f.is_nan() {
        false
    } else if f >= TWO_63 {
        true
    } else if f < -TWO_63 {
        false
    } else {
        // i < f  <=>  i < ceil(f)
        i < f.ceil() as i64
    }
}

fn int_le_float(i: i64, f: f64) -> bool {
    if f.is_nan() {
        false
    } else if f >= TWO_63 {
        true
    } else if f < -TWO_63 {
        false
    } else {
        i <= f.floor() as i64
    }
}

fn float_lt_int(f: f64, i: i64) -> bool {
    if f.is_nan() {
        false
    } else if f >= TWO_63 {
        false
    } else if f < -TWO_63 {
        true
    } else {
        (f.floor() as i64) < i
    }
}

fn float_le_int(f: f64, i: i64) -> bool {
    if f.is_nan() {
        false
    } else if f >= TWO_63 {
        false
    } else if f < -TWO_63 {
        true
    } else {
        (f.ceil() as i64) <= i
    }
}
