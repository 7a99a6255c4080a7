use fedq_result::Result;
use fedq_types::{DataType, Value};

use crate::accumulator::{first_input_type, state_slot, Accumulator, ArgRow, StatefulAccumulator};
use crate::context::EvalContext;

/// Returns the last value seen, nulls included. Used for grouping
/// expressions that are constant within a group.
#[derive(Clone, Debug)]
pub struct ConstantFunction {
    value: Value,
    input_type: DataType,
}

impl Default for ConstantFunction {
    fn default() -> Self {
        Self {
            value: Value::Null,
            input_type: DataType::Null,
        }
    }
}

impl ConstantFunction {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Accumulator for ConstantFunction {
    fn initialize(&mut self, _result_type: &DataType, input_types: &[DataType]) -> Result<()> {
        self.input_type = first_input_type(input_types);
        Ok(())
    }

    fn respects_null(&self) -> bool {
        true
    }

    fn add_input_direct(&mut self, args: &ArgRow<'_>, _ctx: &EvalContext) -> Result<()> {
        self.value = args.get(0)?.clone();
        Ok(())
    }

    fn get_result(&mut self, _ctx: &EvalContext) -> Result<Value> {
        Ok(self.value.clone())
    }

    fn reset(&mut self) {
        self.value = Value::Null;
    }
}

impl StatefulAccumulator for ConstantFunction {
    fn get_state(&self, state: &mut Vec<Value>) {
        state.push(self.value.clone());
    }

    fn set_state(&mut self, state: &[Value], index: usize) -> Result<usize> {
        self.value = state_slot(state, index)?.clone();
        Ok(index + 1)
    }

    fn state_types(&self) -> Vec<DataType> {
        vec![self.input_type.clone()]
    }
}
