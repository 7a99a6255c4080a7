use std::sync::Arc;

use fedq_result::{Error, Result};
use fedq_types::Value;

fn fields<'a>(value: &'a Value, what: &str, expected: usize) -> Result<&'a [Value]> {
    match value.as_array() {
        Some(items) if items.len() == expected => Ok(items),
        _ => Err(Error::Internal(format!(
            "{what} fact must be an array of {expected} fields, got {}",
            value.type_name()
        ))),
    }
}

/// Per-row output of `NTILE`: the row's 1-based position and the tile count.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NtileFact {
    pub row_index: i64,
    pub tiles: i64,
}

impl NtileFact {
    pub fn to_value(self) -> Value {
        Value::Array(Arc::from([Value::Long(self.row_index), Value::Long(self.tiles)]))
    }

    pub fn decode(value: &Value) -> Result<Self> {
        let items = fields(value, "NTILE", 2)?;
        Ok(Self {
            row_index: items[0].to_i64()?,
            tiles: items[1].to_i64()?,
        })
    }

    /// Tile number of this row once the partition holds `partition_rows`.
    ///
    /// The first `partition_rows % tiles` tiles get one extra row.
    pub fn bucket(&self, partition_rows: i64) -> Result<i64> {
        if self.tiles < 1 || self.row_index < 1 || self.row_index > partition_rows {
            return Err(Error::Internal(format!(
                "NTILE row {} of {} with {} tiles",
                self.row_index, partition_rows, self.tiles
            )));
        }
        let base = partition_rows / self.tiles;
        let remainder = partition_rows % self.tiles;
        let offset = self.row_index - 1;
        let large_rows = remainder * (base + 1);
        Ok(if offset < large_rows {
            offset / (base + 1) + 1
        } else {
            remainder + (offset - large_rows) / base + 1
        })
    }
}

/// Per-row output of `LEAD`/`LAG`: the row's value, the default used when
/// the offset row falls outside the partition, and the partition id.
#[derive(Clone, Debug, PartialEq)]
pub struct LeadLagFact {
    pub value: Value,
    pub default: Value,
    pub partition_id: i64,
}

impl LeadLagFact {
    pub fn to_value(&self) -> Value {
        Value::Array(Arc::from([
            self.value.clone(),
            self.default.clone(),
            Value::Long(self.partition_id),
        ]))
    }

    pub fn decode(value: &Value) -> Result<Self> {
        let items = fields(value, "LEAD/LAG", 3)?;
        Ok(Self {
            value: items[0].clone(),
            default: items[1].clone(),
            partition_id: items[2].to_i64()?,
        })
    }
}
