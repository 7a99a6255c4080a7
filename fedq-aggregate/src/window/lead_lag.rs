use fedq_result::Result;
use fedq_types::Value;

use super::facts::LeadLagFact;
use crate::accumulator::{Accumulator, ArgRow};
use crate::context::EvalContext;

/// `LEAD` / `LAG(value, offset, default)`: emits a [`LeadLagFact`] per row.
///
/// The offset is applied by the window executor. Each reset starts a new
/// partition id so facts from adjacent partitions never pair up.
#[derive(Clone, Debug, Default)]
pub struct LeadLagValue {
    partition_id: i64,
    fact: Option<LeadLagFact>,
}

impl LeadLagValue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn partition_id(&self) -> i64 {
        self.partition_id
    }
}

impl Accumulator for LeadLagValue {
    fn respects_null(&self) -> bool {
        true
    }

    fn add_input_direct(&mut self, args: &ArgRow<'_>, _ctx: &EvalContext) -> Result<()> {
        self.fact = Some(LeadLagFact {
            value: args.get(0)?.clone(),
            default: args.get_opt(2)?.cloned().unwrap_or(Value::Null),
            partition_id: self.partition_id,
        });
        Ok(())
    }

    fn get_result(&mut self, _ctx: &EvalContext) -> Result<Value> {
        Ok(self
            .fact
            .as_ref()
            .map_or(Value::Null, LeadLagFact::to_value))
    }

    fn reset(&mut self) {
        self.fact = None;
        self.partition_id = self.partition_id.wrapping_add(1);
    }
}
