//! Natural numeric widening of runtime values.
//!
//! Accumulators widen every accepted input into their active representation
//! through these conversions. A value outside the numeric family is a type
//! coercion error, never a silent NULL.

use bigdecimal::BigDecimal;
use fedq_result::{Error, Result};
use num_bigint::BigInt;
use num_traits::{FromPrimitive, ToPrimitive};

use crate::value::Value;

impl Value {
    /// Widen an integral value into an `i64`.
    pub fn to_i64(&self) -> Result<i64> {
        match self {
            Value::Byte(v) => Ok(i64::from(*v)),
            Value::Short(v) => Ok(i64::from(*v)),
            Value::Integer(v) => Ok(i64::from(*v)),
            Value::Long(v) => Ok(*v),
            Value::BigInteger(v) => v
                .to_i64()
                .ok_or_else(|| Error::overflow(format!("{v} does not fit in a 64-bit integer"))),
            other => Err(Error::type_coercion("integral", other.type_name())),
        }
    }

    /// Widen any numeric value into an `f64` (lossy for arbitrary precision).
    pub fn to_f64(&self) -> Result<f64> {
        match self {
            Value::Byte(v) => Ok(f64::from(*v)),
            Value::Short(v) => Ok(f64::from(*v)),
            Value::Integer(v) => Ok(f64::from(*v)),
            Value::Long(v) => Ok(*v as f64),
            Value::Float(v) => Ok(f64::from(*v)),
            Value::Double(v) => Ok(*v),
            Value::BigInteger(v) => v
                .to_f64()
                .ok_or_else(|| Error::expr_cast(format!("{v} is not representable as double"))),
            Value::BigDecimal(v) => v
                .to_f64()
                .ok_or_else(|| Error::expr_cast(format!("{v} is not representable as double"))),
            other => Err(Error::type_coercion("numeric", other.type_name())),
        }
    }

    /// Widen any numeric value into an arbitrary-precision decimal.
    ///
    /// Non-finite floating point values have no decimal form and fail.
    pub fn to_big_decimal(&self) -> Result<BigDecimal> {
        match self {
            Value::BigDecimal(v) => Ok(v.clone()),
            Value::BigInteger(v) => Ok(BigDecimal::new(v.clone(), 0)),
            Value::Float(v) => BigDecimal::from_f32(*v)
                .ok_or_else(|| Error::expr_cast(format!("{v} has no decimal representation"))),
            Value::Double(v) => BigDecimal::from_f64(*v)
                .ok_or_else(|| Error::expr_cast(format!("{v} has no decimal representation"))),
            other => other.to_i64().map(BigDecimal::from).map_err(|_| {
                Error::type_coercion("numeric", other.type_name())
            }),
        }
    }

    /// Widen an integral or arbitrary-precision value into a big integer,
    /// truncating any fractional digits.
    pub fn to_big_integer(&self) -> Result<BigInt> {
        match self {
            Value::BigInteger(v) => Ok(v.clone()),
            Value::BigDecimal(v) => Ok(truncate_to_big_integer(v)),
            Value::Float(_) | Value::Double(_) => {
                Ok(truncate_to_big_integer(&self.to_big_decimal()?))
            }
            other => other.to_i64().map(BigInt::from),
        }
    }

    /// Integer argument such as a tile count or frame offset.
    pub fn to_count_argument(&self) -> Result<i64> {
        match self {
            Value::Float(_) | Value::Double(_) | Value::BigDecimal(_) => {
                Err(Error::type_coercion("integral", self.type_name()))
            }
            other => other.to_i64(),
        }
    }
}

/// Drop the fractional digits of a decimal, rounding toward zero.
pub fn truncate_to_big_integer(value: &BigDecimal) -> BigInt {
    let (digits, _) = value.with_scale(0).into_bigint_and_exponent();
    digits
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn integral_widening() {
        assert_eq!(Value::Byte(-3).to_i64().unwrap(), -3);
        assert_eq!(Value::BigInteger(BigInt::from(42)).to_i64().unwrap(), 42);
        assert!(matches!(
            Value::BigInteger(BigInt::from(i64::MAX) * 4).to_i64(),
            Err(Error::Overflow(_))
        ));
        assert!(matches!(
            Value::String("1".into()).to_i64(),
            Err(Error::TypeCoercion { expected: "integral", got: "string" })
        ));
    }

    #[test]
    fn decimal_widening() {
        assert_eq!(
            Value::Integer(10).to_big_decimal().unwrap(),
            BigDecimal::from(10)
        );
        assert_eq!(
            Value::Double(1.5).to_big_decimal().unwrap(),
            BigDecimal::from_str("1.5").unwrap()
        );
        assert!(Value::Double(f64::NAN).to_big_decimal().is_err());
    }

    #[test]
    fn truncation_rounds_toward_zero() {
        let v = BigDecimal::from_str("-7.9").unwrap();
        assert_eq!(truncate_to_big_integer(&v), BigInt::from(-7));
        let v = BigDecimal::from_str("30.00").unwrap();
        assert_eq!(truncate_to_big_integer(&v), BigInt::from(30));
    }
}
