//! Total-order comparator shared by MIN/MAX and ORDER BY.

use std::cmp::Ordering;

use fedq_result::{Error, Result};

use crate::value::Value;

/// Compare two values with ORDER BY semantics.
///
/// - NULL sorts before every non-null value and equals NULL.
/// - Numerics compare by value across widths; NaN sorts after every other float.
/// - Strings and chars compare lexicographically, booleans as `false < true`.
/// - Arrays compare element-wise, then by length.
///
/// Values from different non-numeric families, and large objects, have no
/// defined order and produce a type coercion error.
pub fn compare_values(a: &Value, b: &Value) -> Result<Ordering> {
    use Value::*;
    match (a, b) {
        (Null, Null) => Ok(Ordering::Equal),
        (Null, _) => Ok(Ordering::Less),
        (_, Null) => Ok(Ordering::Greater),
        (Boolean(x), Boolean(y)) => Ok(x.cmp(y)),
        (String(x), String(y)) => Ok(x.as_str().cmp(y.as_str())),
        (Char(x), Char(y)) => Ok(x.cmp(y)),
        (String(x), Char(y)) => {
            let mut buf = [0; 4];
            Ok(x.as_str().cmp(&*y.encode_utf8(&mut buf)))
        }
        (Char(x), String(y)) => {
            let mut buf = [0; 4];
            let s: &str = x.encode_utf8(&mut buf);
            Ok(s.cmp(y.as_str()))
        }
        (Varbinary(x), Varbinary(y)) => Ok(x.cmp(y)),
        (Date(x), Date(y)) => Ok(x.cmp(y)),
        (Time(x), Time(y)) => Ok(x.cmp(y)),
        (Timestamp(x), Timestamp(y)) => Ok(x.cmp(y)),
        (Array(x), Array(y)) => {
            for (l, r) in x.iter().zip(y.iter()) {
                let ord = compare_values(l, r)?;
                if ord != Ordering::Equal {
                    return Ok(ord);
                }
            }
            Ok(x.len().cmp(&y.len()))
        }
        _ if a.data_type().is_numeric() && b.data_type().is_numeric() => compare_numeric(a, b),
        _ => Err(Error::type_coercion(a.type_name(), b.type_name())),
    }
}

fn compare_numeric(a: &Value, b: &Value) -> Result<Ordering> {
    let (ta, tb) = (a.data_type(), b.data_type());
    if ta.is_integral() && tb.is_integral() {
        return Ok(a.to_i64()?.cmp(&b.to_i64()?));
    }
    if ta.is_floating() || tb.is_floating() {
        let (x, y) = (a.to_f64()?, b.to_f64()?);
        // Arbitrary precision operands only take the float path when the
        // other side has no decimal form.
        let exact = ta.is_arbitrary_precision() || tb.is_arbitrary_precision();
        if !exact || !x.is_finite() || !y.is_finite() {
            return Ok(compare_f64(x, y));
        }
    }
    Ok(a.to_big_decimal()?.cmp(&b.to_big_decimal()?))
}

/// Float ordering with NaN greater than every other value, including +inf.
pub fn compare_f64(x: f64, y: f64) -> Ordering {
    match (x.is_nan(), y.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
    }
}
