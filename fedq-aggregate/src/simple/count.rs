use fedq_result::{Error, Result};
use fedq_types::{DataType, Value};

use crate::accumulator::{state_i64, Accumulator, ArgRow, StatefulAccumulator};
use crate::context::EvalContext;

/// `COUNT`: 32-bit row counter.
///
/// Rows with a null argument are not counted. `COUNT(*)` binds no arguments
/// and counts every row.
#[derive(Clone, Debug, Default)]
pub struct Count {
    count: i32,
}

impl Count {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Accumulator for Count {
    // Nulls reach add_input_direct so COUNT(*) sees every row.
    fn respects_null(&self) -> bool {
        true
    }

    fn add_input_direct(&mut self, args: &ArgRow<'_>, _ctx: &EvalContext) -> Result<()> {
        if args.has_null()? {
            return Ok(());
        }
        self.count = self
            .count
            .checked_add(1)
            .ok_or_else(|| Error::overflow("COUNT exceeded 32 bits; use COUNT_BIG"))?;
        Ok(())
    }

    fn get_result(&mut self, _ctx: &EvalContext) -> Result<Value> {
        Ok(Value::Integer(self.count))
    }

    fn reset(&mut self) {
        self.count = 0;
    }
}

impl StatefulAccumulator for Count {
    fn get_state(&self, state: &mut Vec<Value>) {
        state.push(Value::Integer(self.count));
    }

    fn set_state(&mut self, state: &[Value], index: usize) -> Result<usize> {
        let count = state_i64(state, index)?;
        self.count = i32::try_from(count)
            .map_err(|_| Error::overflow(format!("COUNT state {count} exceeds 32 bits")))?;
        Ok(index + 1)
    }

    fn state_types(&self) -> Vec<DataType> {
        vec![DataType::Integer]
    }
}

/// `COUNT_BIG`: [`Count`] with a 64-bit counter.
#[derive(Clone, Debug, Default)]
pub struct CountBig {
    count: i64,
}

impl CountBig {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Accumulator for CountBig {
    fn respects_null(&self) -> bool {
        true
    }

    fn add_input_direct(&mut self, args: &ArgRow<'_>, _ctx: &EvalContext) -> Result<()> {
        if args.has_null()? {
            return Ok(());
        }
        self.count = self
            .count
            .checked_add(1)
            .ok_or_else(|| Error::overflow("COUNT_BIG exceeded 64 bits"))?;
        Ok(())
    }

    fn get_result(&mut self, _ctx: &EvalContext) -> Result<Value> {
        Ok(Value::Long(self.count))
    }

    fn reset(&mut self) {
        self.count = 0;
    }
}

impl StatefulAccumulator for CountBig {
    fn get_state(&self, state: &mut Vec<Value>) {
        state.push(Value::Long(self.count));
    }

    fn set_state(&mut self, state: &[Value], index: usize) -> Result<usize> {
        self.count = state_i64(state, index)?;
        Ok(index + 1)
    }

    fn state_types(&self) -> Vec<DataType> {
        vec![DataType::Long]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_overflow_is_reported() {
        let ctx = EvalContext::default();
        let mut count = Count { count: i32::MAX };
        let tuple = [Value::Integer(1)];
        let err = count
            .add_input_direct(&ArgRow::new(&tuple, &[0]), &ctx)
            .unwrap_err();
        assert!(matches!(err, Error::Overflow(_)));
    }

    #[test]
    fn count_star_counts_every_row() {
        let ctx = EvalContext::default();
        let mut count = CountBig::new();
        let tuple = [Value::Null];
        for _ in 0..3 {
            count.add_input_direct(&ArgRow::new(&tuple, &[]), &ctx).unwrap();
        }
        count.add_input_direct(&ArgRow::new(&tuple, &[0]), &ctx).unwrap();
        assert_eq!(count.get_result(&ctx).unwrap(), Value::Long(3));
    }
}
