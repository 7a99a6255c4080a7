//! Runtime values flowing through resolved input tuples and accumulator state.

use std::sync::Arc;

use bigdecimal::BigDecimal;
use bytes::Bytes;
use fedq_result::{Error, Result};
use fedq_storage::LobHandle;
use num_bigint::BigInt;
use time::{Date, Month, OffsetDateTime, Time};

use crate::data_type::DataType;

const MICROS_PER_SECOND: i64 = 1_000_000;
const MICROS_PER_DAY: i64 = 86_400 * MICROS_PER_SECOND;

/// A single already-evaluated SQL value.
///
/// Equality and hashing use grouping semantics (`NULL == NULL`, `NaN == NaN`)
/// so values can key DISTINCT sets; ordering lives in
/// [`compare_values`](crate::compare::compare_values).
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Boolean(bool),
    Byte(i8),
    Short(i16),
    Integer(i32),
    Long(i64),
    BigInteger(BigInt),
    Float(f32),
    Double(f64),
    BigDecimal(BigDecimal),
    Char(char),
    String(String),
    Varbinary(Bytes),
    Clob(LobHandle),
    Blob(LobHandle),
    Xml(LobHandle),
    Json(LobHandle),
    /// Days since the Unix epoch.
    Date(i32),
    /// Microseconds since midnight.
    Time(i64),
    /// Microseconds since the Unix epoch (UTC).
    Timestamp(i64),
    Array(Arc<[Value]>),
}

pub type Tuple = [Value];

macro_rules! impl_from_for_value {
    ($variant:ident, $($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::$variant(v.into())
                }
            }
        )*
    };
}

impl_from_for_value!(Boolean, bool);
impl_from_for_value!(Byte, i8);
impl_from_for_value!(Short, i16, u8);
impl_from_for_value!(Integer, i32, u16);
impl_from_for_value!(Long, i64, u32);
impl_from_for_value!(BigInteger, BigInt, u64);
impl_from_for_value!(Float, f32);
impl_from_for_value!(Double, f64);
impl_from_for_value!(BigDecimal, BigDecimal);
impl_from_for_value!(Char, char);
impl_from_for_value!(String, String);
impl_from_for_value!(Varbinary, Bytes);

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<Vec<Value>> for Value {
    fn from(values: Vec<Value>) -> Self {
        Value::Array(values.into())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Name of the value's SQL type, used in coercion error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Array(_) => "array",
            other => other.data_type().name(),
        }
    }

    /// The SQL type of this value; arrays report the type of their first
    /// non-null element.
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Null => DataType::Null,
            Value::Boolean(_) => DataType::Boolean,
            Value::Byte(_) => DataType::Byte,
            Value::Short(_) => DataType::Short,
            Value::Integer(_) => DataType::Integer,
            Value::Long(_) => DataType::Long,
            Value::BigInteger(_) => DataType::BigInteger,
            Value::Float(_) => DataType::Float,
            Value::Double(_) => DataType::Double,
            Value::BigDecimal(_) => DataType::BigDecimal,
            Value::Char(_) => DataType::Char,
            Value::String(_) => DataType::String,
            Value::Varbinary(_) => DataType::Varbinary,
            Value::Clob(_) => DataType::Clob,
            Value::Blob(_) => DataType::Blob,
            Value::Xml(_) => DataType::Xml,
            Value::Json(_) => DataType::Json,
            Value::Date(_) => DataType::Date,
            Value::Time(_) => DataType::Time,
            Value::Timestamp(_) => DataType::Timestamp,
            Value::Array(items) => {
                let element = items
                    .iter()
                    .find(|v| !v.is_null())
                    .map_or(DataType::Null, Value::data_type);
                DataType::Array(Box::new(element))
            }
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Large-object handle behind a CLOB/BLOB/XML/JSON value.
    pub fn as_lob(&self) -> Option<&LobHandle> {
        match self {
            Value::Clob(lob) | Value::Blob(lob) | Value::Xml(lob) | Value::Json(lob) => Some(lob),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Render the value as character data.
    ///
    /// This is the coercion used when a value is written into textual output
    /// (string concatenation, text lines). NULL renders as the empty string;
    /// binary payloads must be valid UTF-8.
    pub fn to_text(&self) -> Result<String> {
        Ok(match self {
            Value::Null => String::new(),
            Value::Boolean(b) => b.to_string(),
            Value::Byte(v) => v.to_string(),
            Value::Short(v) => v.to_string(),
            Value::Integer(v) => v.to_string(),
            Value::Long(v) => v.to_string(),
            Value::BigInteger(v) => v.to_string(),
            Value::Float(v) => v.to_string(),
            Value::Double(v) => v.to_string(),
            Value::BigDecimal(v) => v.to_string(),
            Value::Char(c) => c.to_string(),
            Value::String(s) => s.clone(),
            Value::Varbinary(bytes) => {
                String::from_utf8(bytes.to_vec()).map_err(Error::expr_cast)?
            }
            Value::Clob(lob) | Value::Blob(lob) | Value::Xml(lob) | Value::Json(lob) => {
                lob.to_text()?
            }
            Value::Date(days) => format_date(*days)?,
            Value::Time(micros) => format_time(*micros)?,
            Value::Timestamp(micros) => format_timestamp(*micros)?,
            Value::Array(items) => {
                let parts = items
                    .iter()
                    .map(Value::to_text)
                    .collect::<Result<Vec<_>>>()?;
                format!("({})", parts.join(", "))
            }
        })
    }
}

fn epoch_julian_day() -> i32 {
    // 1970-01-01 in the proleptic Gregorian calendar.
    2_440_588
}

fn format_date(days: i32) -> Result<String> {
    let julian = epoch_julian_day()
        .checked_add(days)
        .ok_or_else(|| Error::expr_cast(format!("date {days} out of range")))?;
    let date = Date::from_julian_day(julian).map_err(Error::expr_cast)?;
    let (year, month, day) = date.to_calendar_date();
    Ok(format!("{:04}-{:02}-{:02}", year, month as u8, day))
}

fn format_fraction(micros: i64) -> String {
    if micros == 0 {
        String::new()
    } else {
        format!(".{:06}", micros)
    }
}

fn format_time(micros: i64) -> Result<String> {
    if !(0..MICROS_PER_DAY).contains(&micros) {
        return Err(Error::expr_cast(format!("time {micros} outside a single day")));
    }
    let secs = micros / MICROS_PER_SECOND;
    let time = Time::from_hms_micro(
        (secs / 3600) as u8,
        ((secs / 60) % 60) as u8,
        (secs % 60) as u8,
        (micros % MICROS_PER_SECOND) as u32,
    )
    .map_err(Error::expr_cast)?;
    Ok(format!(
        "{:02}:{:02}:{:02}{}",
        time.hour(),
        time.minute(),
        time.second(),
        format_fraction(i64::from(time.microsecond()))
    ))
}

fn format_timestamp(micros: i64) -> Result<String> {
    let dt = OffsetDateTime::from_unix_timestamp_nanos(i128::from(micros) * 1_000)
        .map_err(Error::expr_cast)?;
    let month: Month = dt.month();
    Ok(format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}{}",
        dt.year(),
        month as u8,
        dt.day(),
        dt.hour(),
        dt.minute(),
        dt.second(),
        format_fraction(i64::from(dt.microsecond()))
    ))
}
