use fedq_result::{Error, Result};
use fedq_types::{DataType, Value};

use crate::accumulator::{state_bool, Accumulator, ArgRow, StatefulAccumulator};
use crate::context::EvalContext;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BooleanMode {
    /// `EVERY`: logical AND.
    Every,
    /// `SOME` / `ANY`: logical OR.
    Any,
}

/// Boolean reduction over the non-null inputs of a group.
#[derive(Clone, Debug)]
pub struct BooleanAgg {
    mode: BooleanMode,
    result: Option<bool>,
}

impl BooleanAgg {
    pub fn new(mode: BooleanMode) -> Self {
        Self { mode, result: None }
    }
}

impl Accumulator for BooleanAgg {
    fn add_input_direct(&mut self, args: &ArgRow<'_>, _ctx: &EvalContext) -> Result<()> {
        let value = args.get(0)?;
        let b = value
            .as_bool()
            .ok_or_else(|| Error::type_coercion("boolean", value.type_name()))?;
        self.result = Some(match (self.mode, self.result) {
            (_, None) => b,
            (BooleanMode::Every, Some(acc)) => acc && b,
            (BooleanMode::Any, Some(acc)) => acc || b,
        });
        Ok(())
    }

    fn get_result(&mut self, _ctx: &EvalContext) -> Result<Value> {
        Ok(self.result.into())
    }

    fn reset(&mut self) {
        self.result = None;
    }
}

impl StatefulAccumulator for BooleanAgg {
    fn get_state(&self, state: &mut Vec<Value>) {
        state.push(self.result.into());
    }

    fn set_state(&mut self, state: &[Value], index: usize) -> Result<usize> {
        self.result = state_bool(state, index)?;
        Ok(index + 1)
    }

    fn state_types(&self) -> Vec<DataType> {
        vec![DataType::Boolean]
    }
}
