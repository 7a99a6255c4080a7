//! Decoding Arrow cells into row-oriented [`Value`]s.
//!
//! The aggregate core consumes one resolved tuple per row; callers holding
//! columnar batches use these helpers to materialize each row.

use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, BinaryArray, BooleanArray, Date32Array, Decimal128Array, Float32Array,
    Float64Array, Int8Array, Int16Array, Int32Array, Int64Array, LargeBinaryArray,
    LargeStringArray, ListArray, RecordBatch, StringArray, Time64MicrosecondArray,
    Time64NanosecondArray, TimestampMicrosecondArray, TimestampMillisecondArray,
    TimestampNanosecondArray, TimestampSecondArray, UInt8Array, UInt16Array, UInt32Array,
    UInt64Array,
};
use arrow::datatypes::{DataType as ArrowDataType, TimeUnit};
use bigdecimal::BigDecimal;
use bytes::Bytes;
use fedq_result::{Error, Result};
use num_bigint::BigInt;

use crate::value::Value;

fn downcast<'a, T: 'static>(array: &'a ArrayRef) -> Result<&'a T> {
    array.as_any().downcast_ref::<T>().ok_or_else(|| {
        Error::Internal(format!(
            "array of type {:?} failed to downcast",
            array.data_type()
        ))
    })
}

/// Decode the cell at `index` of `array`.
pub fn value_from_array(array: &ArrayRef, index: usize) -> Result<Value> {
    if array.is_null(index) {
        return Ok(Value::Null);
    }

    let value = match array.data_type() {
        ArrowDataType::Null => Value::Null,
        ArrowDataType::Boolean => Value::Boolean(downcast::<BooleanArray>(array)?.value(index)),
        ArrowDataType::Int8 => Value::Byte(downcast::<Int8Array>(array)?.value(index)),
        ArrowDataType::Int16 => Value::Short(downcast::<Int16Array>(array)?.value(index)),
        ArrowDataType::Int32 => Value::Integer(downcast::<Int32Array>(array)?.value(index)),
        ArrowDataType::Int64 => Value::Long(downcast::<Int64Array>(array)?.value(index)),
        ArrowDataType::UInt8 => Value::from(downcast::<UInt8Array>(array)?.value(index)),
        ArrowDataType::UInt16 => Value::from(downcast::<UInt16Array>(array)?.value(index)),
        ArrowDataType::UInt32 => Value::from(downcast::<UInt32Array>(array)?.value(index)),
        ArrowDataType::UInt64 => Value::from(downcast::<UInt64Array>(array)?.value(index)),
        ArrowDataType::Float32 => Value::Float(downcast::<Float32Array>(array)?.value(index)),
        ArrowDataType::Float64 => Value::Double(downcast::<Float64Array>(array)?.value(index)),
        ArrowDataType::Decimal128(_, scale) => {
            let raw = downcast::<Decimal128Array>(array)?.value(index);
            Value::BigDecimal(BigDecimal::new(BigInt::from(raw), i64::from(*scale)))
        }
        ArrowDataType::Utf8 => {
            Value::String(downcast::<StringArray>(array)?.value(index).to_string())
        }
        ArrowDataType::LargeUtf8 => {
            Value::String(downcast::<LargeStringArray>(array)?.value(index).to_string())
        }
        ArrowDataType::Binary => Value::Varbinary(Bytes::copy_from_slice(
            downcast::<BinaryArray>(array)?.value(index),
        )),
        ArrowDataType::LargeBinary => Value::Varbinary(Bytes::copy_from_slice(
            downcast::<LargeBinaryArray>(array)?.value(index),
        )),
        ArrowDataType::Date32 => Value::Date(downcast::<Date32Array>(array)?.value(index)),
        ArrowDataType::Time64(TimeUnit::Microsecond) => {
            Value::Time(downcast::<Time64MicrosecondArray>(array)?.value(index))
        }
        ArrowDataType::Time64(TimeUnit::Nanosecond) => {
            Value::Time(downcast::<Time64NanosecondArray>(array)?.value(index) / 1_000)
        }
        ArrowDataType::Timestamp(unit, _) => Value::Timestamp(timestamp_micros(array, index, unit)?),
        ArrowDataType::List(_) => {
            let list = downcast::<ListArray>(array)?;
            let child: ArrayRef = list.value(index);
            let items = (0..child.len())
                .map(|i| value_from_array(&child, i))
                .collect::<Result<Vec<_>>>()?;
            Value::Array(Arc::from(items))
        }
        other => {
            return Err(Error::InvalidArgumentError(format!(
                "unsupported type for value conversion: {other:?}"
            )));
        }
    };
    Ok(value)
}

fn timestamp_micros(array: &ArrayRef, index: usize, unit: &TimeUnit) -> Result<i64> {
    let micros = match unit {
        TimeUnit::Second => downcast::<TimestampSecondArray>(array)?
            .value(index)
            .checked_mul(1_000_000),
        TimeUnit::Millisecond => downcast::<TimestampMillisecondArray>(array)?
            .value(index)
            .checked_mul(1_000),
        TimeUnit::Microsecond => Some(downcast::<TimestampMicrosecondArray>(array)?.value(index)),
        TimeUnit::Nanosecond => {
            Some(downcast::<TimestampNanosecondArray>(array)?.value(index) / 1_000)
        }
    };
    micros.ok_or_else(|| Error::overflow("timestamp exceeds microsecond range"))
}

/// Materialize row `row` of `batch` as a resolved input tuple.
pub fn tuple_from_batch(batch: &RecordBatch, row: usize) -> Result<Vec<Value>> {
    batch
        .columns()
        .iter()
        .map(|column| value_from_array(column, row))
        .collect()
}
