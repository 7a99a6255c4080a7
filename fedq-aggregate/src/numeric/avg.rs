use bigdecimal::{BigDecimal, RoundingMode};
use fedq_result::{Error, Result};
use fedq_types::{DataType, Value};

use super::sum::{Sum, SumAccumulator};
use crate::accumulator::{
    first_input_type, state_i64, Accumulator, ArgRow, StatefulAccumulator,
};
use crate::context::EvalContext;

/// `AVG`: a [`Sum`] plus a row count.
///
/// Arbitrary-precision inputs average in decimal, rounded half-up to the
/// larger of the sum's scale and the configured minimum; everything else
/// averages in `f64`.
#[derive(Clone, Debug, Default)]
pub struct Avg {
    sum: Sum,
    count: i64,
}

impl Avg {
    pub fn new() -> Self {
        Self::default()
    }
}

pub(crate) fn average_decimal(sum: &BigDecimal, count: i64, min_scale: i64) -> Result<BigDecimal> {
    if count == 0 {
        return Err(Error::Internal("decimal average over zero rows".into()));
    }
    let (_, sum_scale) = sum.as_bigint_and_exponent();
    let scale = sum_scale.max(min_scale);
    let quotient = sum.clone() / BigDecimal::from(count);
    Ok(quotient.with_scale_round(scale, RoundingMode::HalfUp))
}

impl Accumulator for Avg {
    fn initialize(&mut self, result_type: &DataType, input_types: &[DataType]) -> Result<()> {
        let decimal = result_type.is_arbitrary_precision()
            || first_input_type(input_types).is_arbitrary_precision();
        let sum_type = if decimal {
            DataType::BigDecimal
        } else {
            DataType::Double
        };
        self.sum.initialize(&sum_type, input_types)
    }

    fn add_input_direct(&mut self, args: &ArgRow<'_>, ctx: &EvalContext) -> Result<()> {
        self.sum.add_input_direct(args, ctx)?;
        self.count = self
            .count
            .checked_add(1)
            .ok_or_else(|| Error::overflow("AVG row count"))?;
        Ok(())
    }

    fn get_result(&mut self, ctx: &EvalContext) -> Result<Value> {
        Ok(match self.sum.accumulated() {
            None => Value::Null,
            Some(SumAccumulator::Decimal(sum)) => Value::BigDecimal(average_decimal(
                sum,
                self.count,
                ctx.config().avg_decimal_scale,
            )?),
            Some(SumAccumulator::Double(sum)) => Value::Double(sum / self.count as f64),
            Some(SumAccumulator::Long(sum)) => Value::Double(*sum as f64 / self.count as f64),
        })
    }

    fn reset(&mut self) {
        self.sum.reset();
        self.count = 0;
    }
}

impl StatefulAccumulator for Avg {
    fn get_state(&self, state: &mut Vec<Value>) {
        self.sum.get_state(state);
        state.push(Value::Long(self.count));
    }

    fn set_state(&mut self, state: &[Value], index: usize) -> Result<usize> {
        let next = self.sum.set_state(state, index)?;
        self.count = state_i64(state, next)?;
        Ok(next + 1)
    }

    fn state_types(&self) -> Vec<DataType> {
        let mut types = self.sum.state_types();
        types.push(DataType::Long);
        types
    }
}
