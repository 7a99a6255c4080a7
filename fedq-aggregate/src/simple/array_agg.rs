use std::sync::Arc;

use fedq_result::{Error, Result};
use fedq_types::{DataType, Value};

use crate::accumulator::{first_input_type, state_slot, Accumulator, ArgRow, StatefulAccumulator};
use crate::context::EvalContext;

/// `ARRAY_AGG`: collects values, nulls included, in arrival order.
#[derive(Clone, Debug)]
pub struct ArrayAgg {
    values: Vec<Value>,
    seen: bool,
    input_type: DataType,
}

impl Default for ArrayAgg {
    fn default() -> Self {
        Self {
            values: Vec::new(),
            seen: false,
            input_type: DataType::Null,
        }
    }
}

impl ArrayAgg {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Accumulator for ArrayAgg {
    fn initialize(&mut self, _result_type: &DataType, input_types: &[DataType]) -> Result<()> {
        self.input_type = first_input_type(input_types);
        Ok(())
    }

    fn respects_null(&self) -> bool {
        true
    }

    fn add_input_direct(&mut self, args: &ArgRow<'_>, _ctx: &EvalContext) -> Result<()> {
        self.values.push(args.get(0)?.clone());
        self.seen = true;
        Ok(())
    }

    fn get_result(&mut self, _ctx: &EvalContext) -> Result<Value> {
        if !self.seen {
            return Ok(Value::Null);
        }
        Ok(Value::Array(Arc::from(self.values.as_slice())))
    }

    fn reset(&mut self) {
        self.values.clear();
        self.seen = false;
    }
}

impl StatefulAccumulator for ArrayAgg {
    fn get_state(&self, state: &mut Vec<Value>) {
        state.push(if self.seen {
            Value::Array(Arc::from(self.values.as_slice()))
        } else {
            Value::Null
        });
    }

    fn set_state(&mut self, state: &[Value], index: usize) -> Result<usize> {
        match state_slot(state, index)? {
            Value::Null => self.reset(),
            Value::Array(items) => {
                self.values = items.to_vec();
                self.seen = true;
            }
            other => return Err(Error::type_coercion("array", other.type_name())),
        }
        Ok(index + 1)
    }

    fn state_types(&self) -> Vec<DataType> {
        vec![DataType::Array(Box::new(self.input_type.clone()))]
    }
}
