use std::fmt;
use std::io::{self, Write};

use fedq_result::{Error, Result};
use fedq_types::Value;

use super::ConcatSink;
use crate::accumulator::{Accumulator, ArgRow};
use crate::context::EvalContext;

/// `JSON_ARRAYAGG`: a JSON array of every input, SQL nulls as `null`.
#[derive(Debug, Default)]
pub struct JsonArrayAgg {
    sink: ConcatSink,
}

impl JsonArrayAgg {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Reject values that have no JSON encoding, before anything is written.
pub(crate) fn check_json(value: &Value) -> Result<()> {
    match value {
        Value::Float(v) if !v.is_finite() => Err(not_finite(v)),
        Value::Double(v) if !v.is_finite() => Err(not_finite(v)),
        Value::Varbinary(_) | Value::Blob(_) => Err(Error::type_coercion(
            "JSON-encodable value",
            value.type_name(),
        )),
        Value::Array(items) => items.iter().try_for_each(check_json),
        _ => Ok(()),
    }
}

fn not_finite(value: impl fmt::Display) -> Error {
    Error::ExprCast(format!("{value} is not representable in JSON"))
}

/// Serialize through serde_json, surfacing writer failures as I/O errors.
macro_rules! to_json {
    ($out:expr, $value:expr) => {
        serde_json::to_writer(&mut *$out, $value).map_err(io::Error::from)?
    };
}

/// Encode one SQL value as a JSON array element.
pub(crate) fn write_json<W: Write + ?Sized>(out: &mut W, value: &Value) -> Result<()> {
    check_json(value)?;
    match value {
        Value::Null => to_json!(out, &()),
        Value::Boolean(b) => to_json!(out, b),
        Value::Byte(v) => to_json!(out, v),
        Value::Short(v) => to_json!(out, v),
        Value::Integer(v) => to_json!(out, v),
        Value::Long(v) => to_json!(out, v),
        Value::Float(v) => to_json!(out, v),
        Value::Double(v) => to_json!(out, v),
        // Arbitrary precision has no serde_json number; the decimal text is
        // already valid JSON number syntax.
        Value::BigInteger(v) => write!(out, "{v}")?,
        Value::BigDecimal(v) => write!(out, "{v}")?,
        Value::Json(lob) => {
            io::copy(&mut lob.reader()?, out)?;
        }
        Value::Array(items) => {
            out.write_all(b"[")?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.write_all(b",")?;
                }
                write_json(out, item)?;
            }
            out.write_all(b"]")?;
        }
        other => to_json!(out, &other.to_text()?),
    }
    Ok(())
}

impl Accumulator for JsonArrayAgg {
    fn respects_null(&self) -> bool {
        true
    }

    fn add_input_direct(&mut self, args: &ArgRow<'_>, ctx: &EvalContext) -> Result<()> {
        let value = args.get(0)?;
        check_json(value)?;
        let separator: &[u8] = if self.sink.rows_written() > 0 { b"," } else { b"[" };
        let out = self.sink.writer(ctx)?;
        out.write_all(separator)?;
        write_json(out, value)?;
        self.sink.row_written();
        Ok(())
    }

    fn get_result(&mut self, _ctx: &EvalContext) -> Result<Value> {
        Ok(self.sink.finish(b"]")?.map_or(Value::Null, Value::Json))
    }

    fn reset(&mut self) {
        self.sink.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(value: &Value) -> Result<String> {
        let mut out = Vec::new();
        write_json(&mut out, value)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn scalars_encode_as_json() {
        assert_eq!(encode(&Value::Null).unwrap(), "null");
        assert_eq!(encode(&Value::Boolean(true)).unwrap(), "true");
        assert_eq!(encode(&Value::Double(1.5)).unwrap(), "1.5");
        assert_eq!(encode(&Value::Float(0.1)).unwrap(), "0.1");
        assert_eq!(encode(&Value::Long(-7)).unwrap(), "-7");
        assert_eq!(encode(&Value::from("a\"b")).unwrap(), r#""a\"b""#);
        assert_eq!(
            encode(&Value::from(vec![Value::Integer(1), Value::Null])).unwrap(),
            "[1,null]"
        );
    }

    #[test]
    fn non_finite_and_binary_are_rejected() {
        assert!(matches!(
            encode(&Value::Double(f64::NAN)),
            Err(Error::ExprCast(_))
        ));
        assert!(matches!(
            encode(&Value::Varbinary(bytes::Bytes::from_static(b"x"))),
            Err(Error::TypeCoercion { .. })
        ));
        let nested = Value::from(vec![Value::Integer(1), Value::Float(f32::INFINITY)]);
        assert!(check_json(&nested).is_err());
    }
}
