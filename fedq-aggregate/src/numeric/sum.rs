use bigdecimal::BigDecimal;
use fedq_result::{Error, Result};
use fedq_types::numeric::truncate_to_big_integer;
use fedq_types::{DataType, Value};

use crate::accumulator::{state_slot, Accumulator, ArgRow, StatefulAccumulator};
use crate::context::EvalContext;

/// Running total in the representation chosen at initialization.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum SumAccumulator {
    Long(i64),
    Double(f64),
    Decimal(BigDecimal),
}

impl SumAccumulator {
    fn for_result_type(result_type: &DataType) -> Self {
        if result_type.is_integral() {
            SumAccumulator::Long(0)
        } else if result_type.is_floating() {
            SumAccumulator::Double(0.0)
        } else {
            SumAccumulator::Decimal(BigDecimal::from(0))
        }
    }

    fn zeroed(&self) -> Self {
        match self {
            SumAccumulator::Long(_) => SumAccumulator::Long(0),
            SumAccumulator::Double(_) => SumAccumulator::Double(0.0),
            SumAccumulator::Decimal(_) => SumAccumulator::Decimal(BigDecimal::from(0)),
        }
    }

    fn data_type(&self) -> DataType {
        match self {
            SumAccumulator::Long(_) => DataType::Long,
            SumAccumulator::Double(_) => DataType::Double,
            SumAccumulator::Decimal(_) => DataType::BigDecimal,
        }
    }

    fn add(&mut self, value: &Value) -> Result<()> {
        match self {
            SumAccumulator::Long(sum) => {
                let addend = value.to_i64()?;
                *sum = sum
                    .checked_add(addend)
                    .ok_or_else(|| Error::overflow(format!("SUM exceeded 64 bits adding {addend}")))?;
            }
            SumAccumulator::Double(sum) => *sum += value.to_f64()?,
            SumAccumulator::Decimal(sum) => *sum += value.to_big_decimal()?,
        }
        Ok(())
    }

    fn to_value(&self) -> Value {
        match self {
            SumAccumulator::Long(v) => Value::Long(*v),
            SumAccumulator::Double(v) => Value::Double(*v),
            SumAccumulator::Decimal(v) => Value::BigDecimal(v.clone()),
        }
    }
}

/// `SUM`.
///
/// Integral results accumulate in a checked `i64`, floating results in an
/// `f64`, everything else in an arbitrary-precision decimal that is
/// truncated when the declared result is a big integer.
#[derive(Clone, Debug)]
pub struct Sum {
    acc: SumAccumulator,
    result_type: DataType,
    is_null: bool,
}

impl Default for Sum {
    fn default() -> Self {
        Self {
            acc: SumAccumulator::Long(0),
            result_type: DataType::Long,
            is_null: true,
        }
    }
}

impl Sum {
    pub fn new() -> Self {
        Self::default()
    }

    /// Running total, or `None` before the first accepted row.
    pub(crate) fn accumulated(&self) -> Option<&SumAccumulator> {
        (!self.is_null).then_some(&self.acc)
    }
}

fn narrow<T: TryFrom<i64>>(value: i64, type_name: &str) -> Result<T> {
    T::try_from(value).map_err(|_| Error::overflow(format!("SUM {value} does not fit in {type_name}")))
}

impl Accumulator for Sum {
    fn initialize(&mut self, result_type: &DataType, _input_types: &[DataType]) -> Result<()> {
        self.acc = SumAccumulator::for_result_type(result_type);
        self.result_type = result_type.clone();
        Ok(())
    }

    fn add_input_direct(&mut self, args: &ArgRow<'_>, _ctx: &EvalContext) -> Result<()> {
        self.acc.add(args.get(0)?)?;
        self.is_null = false;
        Ok(())
    }

    fn get_result(&mut self, _ctx: &EvalContext) -> Result<Value> {
        if self.is_null {
            return Ok(Value::Null);
        }
        Ok(match (&self.acc, &self.result_type) {
            (SumAccumulator::Long(v), DataType::Byte) => Value::Byte(narrow(*v, "byte")?),
            (SumAccumulator::Long(v), DataType::Short) => Value::Short(narrow(*v, "short")?),
            (SumAccumulator::Long(v), DataType::Integer) => {
                Value::Integer(narrow(*v, "integer")?)
            }
            (SumAccumulator::Double(v), DataType::Float) => Value::Float(*v as f32),
            (SumAccumulator::Decimal(v), DataType::BigInteger) => {
                Value::BigInteger(truncate_to_big_integer(v))
            }
            (acc, _) => acc.to_value(),
        })
    }

    fn reset(&mut self) {
        self.acc = self.acc.zeroed();
        self.is_null = true;
    }
}

impl StatefulAccumulator for Sum {
    fn get_state(&self, state: &mut Vec<Value>) {
        state.push(if self.is_null {
            Value::Null
        } else {
            self.acc.to_value()
        });
    }

    fn set_state(&mut self, state: &[Value], index: usize) -> Result<usize> {
        let slot = state_slot(state, index)?;
        self.reset();
        if !slot.is_null() {
            self.acc.add(slot)?;
            self.is_null = false;
        }
        Ok(index + 1)
    }

    fn state_types(&self) -> Vec<DataType> {
        vec![self.acc.data_type()]
    }
}
