use fedq_result::Result;
use fedq_types::{DataType, Value};

use crate::accumulator::{
    first_input_type, state_bool, state_slot, Accumulator, ArgRow, StatefulAccumulator,
};
use crate::context::EvalContext;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FirstLastMode {
    First,
    Last,
}

/// `FIRST_VALUE` / `LAST_VALUE`, nulls included.
#[derive(Clone, Debug)]
pub struct FirstLastValue {
    mode: FirstLastMode,
    value: Value,
    captured: bool,
    input_type: DataType,
}

impl FirstLastValue {
    pub fn new(mode: FirstLastMode) -> Self {
        Self {
            mode,
            value: Value::Null,
            captured: false,
            input_type: DataType::Null,
        }
    }

    pub fn mode(&self) -> FirstLastMode {
        self.mode
    }
}

impl Accumulator for FirstLastValue {
    fn initialize(&mut self, _result_type: &DataType, input_types: &[DataType]) -> Result<()> {
        self.input_type = first_input_type(input_types);
        Ok(())
    }

    fn respects_null(&self) -> bool {
        true
    }

    fn add_input_direct(&mut self, args: &ArgRow<'_>, _ctx: &EvalContext) -> Result<()> {
        if self.mode == FirstLastMode::First && self.captured {
            return Ok(());
        }
        self.value = args.get(0)?.clone();
        self.captured = true;
        Ok(())
    }

    fn get_result(&mut self, _ctx: &EvalContext) -> Result<Value> {
        Ok(self.value.clone())
    }

    fn reset(&mut self) {
        self.value = Value::Null;
        self.captured = false;
    }
}

impl StatefulAccumulator for FirstLastValue {
    fn get_state(&self, state: &mut Vec<Value>) {
        state.push(self.value.clone());
        state.push(Value::Boolean(self.captured));
    }

    fn set_state(&mut self, state: &[Value], index: usize) -> Result<usize> {
        self.value = state_slot(state, index)?.clone();
        self.captured = state_bool(state, index + 1)?.unwrap_or(false);
        Ok(index + 2)
    }

    fn state_types(&self) -> Vec<DataType> {
        vec![self.input_type.clone(), DataType::Boolean]
    }
}
