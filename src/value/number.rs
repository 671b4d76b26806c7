//! Numeric conversions shared by the lexer, arithmetic and `tostring`.

use super::Value;

/// Exact float to integer conversion; `None` when `f` has a fractional
/// part or lies outside the `i64` range.
pub fn float_to_int(f: f64) -> Option<i64> {
    // 2^63 is exactly representable; every float below it fits.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if f.fract() == 0.0 && (-LIMIT..LIMIT).contains(&f) {
        Some(f as i64)
    } else {
        None
    }
}

/// Parse a numeral the way `tonumber` and arithmetic coercion do:
/// surrounding whitespace allowed, optional sign, decimal or hex integers,
/// decimal floats with optional exponent. Decimal integers that overflow
/// become floats; hex integers wrap.
pub fn parse_number(text: &str) -> Option<Value> {
    let s = text.trim();
    let (negative, body) = match s.as_bytes().first()? {
        b'-' => (true, &s[1..]),
        b'+' => (false, &s[1..]),
        _ => (false, s),
    };
    let value = parse_unsigned(body)?;
    Some(match value {
        Value::Int(i) if negative => Value::Int(i.wrapping_neg()),
        Value::Float(f) if negative => Value::Float(-f),
        other => other,
    })
}

/// Unsigned numeral as produced by the lexer.
pub fn parse_unsigned(s: &str) -> Option<Value> {
    if s.is_empty() {
        return None;
    }
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let mut acc: i64 = 0;
        for b in hex.bytes() {
            let digit = (b as char).to_digit(16)? as i64;
            acc = acc.wrapping_mul(16).wrapping_add(digit);
        }
        return Some(Value::Int(acc));
    }
    if !s.bytes().next()?.is_ascii_digit() && !s.starts_with('.') {
        return None;
    }
    if !s
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'))
    {
        return None;
    }
    if s.bytes().all(|b| b.is_ascii_digit()) {
        return Some(match s.parse::<i64>() {
            Ok(i) => Value::Int(i),
            Err(_) => Value::Float(s.parse::<f64>().ok()?),
        });
    }
    s.parse::<f64>().ok().map(Value::Float)
}

/// Format a float like C's `%.14g`, adding `.0` when the result would
/// otherwise read as an integer.
pub fn format_float(f: f64) -> String {
    if f.is_nan() {
        return if f.is_sign_negative() { "-nan" } else { "nan" }.to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if f == 0.0 {
        return if f.is_sign_negative() { "-0.0" } else { "0.0" }.to_string();
    }

    let sci = format!("{:.13e}", f);
    let (mantissa, exponent) = match sci.split_once('e') {
        Some(parts) => parts,
        None => return sci,
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);

    let mut out = if !(-4..14).contains(&exponent) {
        let mantissa = trim_fraction(mantissa);
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", mantissa, sign, exponent.abs())
    } else {
        let decimals = (13 - exponent) as usize;
        trim_fraction(&format!("{:.*}", decimals, f)).to_string()
    };

    if out.bytes().all(|b| b.is_ascii_digit() || b == b'-') {
        out.push_str(".0");
    }
    out
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}
