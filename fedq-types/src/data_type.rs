//! Declared SQL types of accumulator inputs, results and state slots.

use std::fmt;

use arrow::datatypes::DataType as ArrowDataType;
use fedq_result::{Error, Result};

/// Runtime SQL type tag.
///
/// Accumulators receive these at `initialize` and use them to pick their
/// internal representation once, before any row arrives.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataType {
    Null,
    Boolean,
    Byte,
    Short,
    Integer,
    Long,
    BigInteger,
    Float,
    Double,
    BigDecimal,
    Char,
    String,
    Varbinary,
    Clob,
    Blob,
    Xml,
    Json,
    /// Days since the Unix epoch.
    Date,
    /// Microseconds since midnight.
    Time,
    /// Microseconds since the Unix epoch.
    Timestamp,
    Array(Box<DataType>),
}

impl DataType {
    /// Fixed-width integer types that accumulate losslessly in an `i64`.
    pub fn is_integral(&self) -> bool {
        matches!(
            self,
            DataType::Byte | DataType::Short | DataType::Integer | DataType::Long
        )
    }

    pub fn is_floating(&self) -> bool {
        matches!(self, DataType::Float | DataType::Double)
    }

    /// Arbitrary-precision numeric types.
    pub fn is_arbitrary_precision(&self) -> bool {
        matches!(self, DataType::BigInteger | DataType::BigDecimal)
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integral() || self.is_floating() || self.is_arbitrary_precision()
    }

    pub fn is_lob(&self) -> bool {
        matches!(
            self,
            DataType::Clob | DataType::Blob | DataType::Xml | DataType::Json
        )
    }

    /// Types whose payload is raw bytes rather than characters.
    pub fn is_binary(&self) -> bool {
        matches!(self, DataType::Varbinary | DataType::Blob)
    }

    pub fn name(&self) -> &'static str {
        match self {
            DataType::Null => "null",
            DataType::Boolean => "boolean",
            DataType::Byte => "byte",
            DataType::Short => "short",
            DataType::Integer => "integer",
            DataType::Long => "long",
            DataType::BigInteger => "biginteger",
            DataType::Float => "float",
            DataType::Double => "double",
            DataType::BigDecimal => "bigdecimal",
            DataType::Char => "char",
            DataType::String => "string",
            DataType::Varbinary => "varbinary",
            DataType::Clob => "clob",
            DataType::Blob => "blob",
            DataType::Xml => "xml",
            DataType::Json => "json",
            DataType::Date => "date",
            DataType::Time => "time",
            DataType::Timestamp => "timestamp",
            DataType::Array(_) => "array",
        }
    }

    /// Map an Arrow column type onto the SQL type its cells decode to.
    pub fn from_arrow(data_type: &ArrowDataType) -> Result<Self> {
        let mapped = match data_type {
            ArrowDataType::Null => DataType::Null,
            ArrowDataType::Boolean => DataType::Boolean,
            ArrowDataType::Int8 => DataType::Byte,
            ArrowDataType::Int16 | ArrowDataType::UInt8 => DataType::Short,
            ArrowDataType::Int32 | ArrowDataType::UInt16 => DataType::Integer,
            ArrowDataType::Int64 | ArrowDataType::UInt32 => DataType::Long,
            ArrowDataType::UInt64 => DataType::BigInteger,
            ArrowDataType::Float32 => DataType::Float,
            ArrowDataType::Float64 => DataType::Double,
            ArrowDataType::Decimal128(_, _) => DataType::BigDecimal,
            ArrowDataType::Utf8 | ArrowDataType::LargeUtf8 => DataType::String,
            ArrowDataType::Binary | ArrowDataType::LargeBinary => DataType::Varbinary,
            ArrowDataType::Date32 => DataType::Date,
            ArrowDataType::Time64(_) => DataType::Time,
            ArrowDataType::Timestamp(_, _) => DataType::Timestamp,
            ArrowDataType::List(field) => {
                DataType::Array(Box::new(DataType::from_arrow(field.data_type())?))
            }
            other => {
                return Err(Error::InvalidArgumentError(format!(
                    "unsupported Arrow type for aggregation input: {other:?}"
                )));
            }
        };
        Ok(mapped)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Array(inner) => write!(f, "{}[]", inner),
            other => f.write_str(other.name()),
        }
    }
}
