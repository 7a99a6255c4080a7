//! Grouping equality and hashing for [`Value`], used by DISTINCT filters.

use std::hash::{Hash, Hasher};

use crate::value::Value;

/// Grouping equality: NULL equals NULL and NaN equals NaN. Values of
/// different SQL types are never equal.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        use Value::*;
        match (self, other) {
            (Null, Null) => true,
            (Boolean(a), Boolean(b)) => a == b,
            (Byte(a), Byte(b)) => a == b,
            (Short(a), Short(b)) => a == b,
            (Integer(a), Integer(b)) => a == b,
            (Long(a), Long(b)) => a == b,
            (BigInteger(a), BigInteger(b)) => a == b,
            (Float(a), Float(b)) => (a.is_nan() && b.is_nan()) || a == b,
            (Double(a), Double(b)) => (a.is_nan() && b.is_nan()) || a == b,
            (BigDecimal(a), BigDecimal(b)) => a == b,
            (Char(a), Char(b)) => a == b,
            (String(a), String(b)) => a == b,
            (Varbinary(a), Varbinary(b)) => a == b,
            (Clob(a), Clob(b)) | (Blob(a), Blob(b)) | (Xml(a), Xml(b)) | (Json(a), Json(b)) => {
                a == b
            }
            (Date(a), Date(b)) => a == b,
            (Time(a), Time(b)) => a == b,
            (Timestamp(a), Timestamp(b)) => a == b,
            (Array(a), Array(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        use Value::*;

        std::mem::discriminant(self).hash(state);

        match self {
            Null => {}
            Boolean(b) => b.hash(state),
            Byte(v) => v.hash(state),
            Short(v) => v.hash(state),
            Integer(v) => v.hash(state),
            Long(v) => v.hash(state),
            BigInteger(v) => v.hash(state),
            // -0.0 == 0.0, so both must hash alike.
            Float(f) => {
                if f.is_nan() {
                    f32::NAN.to_bits().hash(state);
                } else if *f == 0.0 {
                    0u32.hash(state);
                } else {
                    f.to_bits().hash(state);
                }
            }
            Double(f) => {
                if f.is_nan() {
                    f64::NAN.to_bits().hash(state);
                } else if *f == 0.0 {
                    0u64.hash(state);
                } else {
                    f.to_bits().hash(state);
                }
            }
            BigDecimal(v) => v.normalized().to_string().hash(state),
            Char(c) => c.hash(state),
            String(s) => s.hash(state),
            Varbinary(bytes) => bytes.hash(state),
            Clob(lob) | Blob(lob) | Xml(lob) | Json(lob) => lob.hash(state),
            Date(v) => v.hash(state),
            Time(v) => v.hash(state),
            Timestamp(v) => v.hash(state),
            Array(items) => items.hash(state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashSet;
    use std::str::FromStr;

    #[test]
    fn nan_and_null_group_together() {
        let mut seen = FxHashSet::default();
        assert!(seen.insert(Value::Double(f64::NAN)));
        assert!(!seen.insert(Value::Double(f64::NAN)));
        assert!(seen.insert(Value::Null));
        assert!(!seen.insert(Value::Null));
    }

    #[test]
    fn equal_decimals_with_different_scales_hash_alike() {
        let mut seen = FxHashSet::default();
        assert!(seen.insert(Value::BigDecimal(
            bigdecimal::BigDecimal::from_str("1.50").unwrap()
        )));
        assert!(!seen.insert(Value::BigDecimal(
            bigdecimal::BigDecimal::from_str("1.5").unwrap()
        )));
    }
}
