use fedq_result::{Error, Result};
use fedq_types::{DataType, Value};

use crate::accumulator::{state_f64, state_i64, Accumulator, ArgRow, StatefulAccumulator};
use crate::context::EvalContext;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StatsKind {
    StddevPop,
    StddevSamp,
    VarPop,
    VarSamp,
}

impl StatsKind {
    fn is_sample(self) -> bool {
        matches!(self, StatsKind::StddevSamp | StatsKind::VarSamp)
    }

    fn is_stddev(self) -> bool {
        matches!(self, StatsKind::StddevPop | StatsKind::StddevSamp)
    }
}

/// `STDDEV_POP`, `STDDEV_SAMP`, `VAR_POP` and `VAR_SAMP` over running
/// Σx, Σx² and n.
#[derive(Clone, Debug)]
pub struct StatsFunction {
    kind: StatsKind,
    count: i64,
    sum: f64,
    sum_sq: f64,
}

impl StatsFunction {
    pub fn new(kind: StatsKind) -> Self {
        Self {
            kind,
            count: 0,
            sum: 0.0,
            sum_sq: 0.0,
        }
    }

    pub fn kind(&self) -> StatsKind {
        self.kind
    }
}

impl Accumulator for StatsFunction {
    fn add_input_direct(&mut self, args: &ArgRow<'_>, _ctx: &EvalContext) -> Result<()> {
        let x = args.get(0)?.to_f64()?;
        self.count = self
            .count
            .checked_add(1)
            .ok_or_else(|| Error::overflow("variance row count"))?;
        self.sum += x;
        self.sum_sq += x * x;
        Ok(())
    }

    fn get_result(&mut self, _ctx: &EvalContext) -> Result<Value> {
        let min_rows = if self.kind.is_sample() { 2 } else { 1 };
        if self.count < min_rows {
            return Ok(Value::Null);
        }
        let n = self.count as f64;
        let denominator = if self.kind.is_sample() { n - 1.0 } else { n };
        // Cancellation can leave a tiny negative residue for constant input.
        let variance = ((self.sum_sq - self.sum * self.sum / n) / denominator).max(0.0);
        Ok(Value::Double(if self.kind.is_stddev() {
            variance.sqrt()
        } else {
            variance
        }))
    }

    fn reset(&mut self) {
        self.count = 0;
        self.sum = 0.0;
        self.sum_sq = 0.0;
    }
}

impl StatefulAccumulator for StatsFunction {
    fn get_state(&self, state: &mut Vec<Value>) {
        state.push(Value::Long(self.count));
        state.push(Value::Double(self.sum));
        state.push(Value::Double(self.sum_sq));
    }

    fn set_state(&mut self, state: &[Value], index: usize) -> Result<usize> {
        self.count = state_i64(state, index)?;
        self.sum = state_f64(state, index + 1)?;
        self.sum_sq = state_f64(state, index + 2)?;
        Ok(index + 3)
    }

    fn state_types(&self) -> Vec<DataType> {
        vec![DataType::Long, DataType::Double, DataType::Double]
    }
}
