use std::cmp::Ordering;

use fedq_result::Result;
use fedq_types::{compare_values, DataType, Value};

use crate::accumulator::{first_input_type, state_slot, Accumulator, ArgRow, StatefulAccumulator};
use crate::context::EvalContext;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Extreme {
    Min,
    Max,
}

/// `MIN` / `MAX` under the same total order used for sorting.
#[derive(Clone, Debug)]
pub struct MinMax {
    extreme: Extreme,
    value: Option<Value>,
    input_type: DataType,
}

impl MinMax {
    pub fn new(extreme: Extreme) -> Self {
        Self {
            extreme,
            value: None,
            input_type: DataType::Null,
        }
    }

    pub fn extreme(&self) -> Extreme {
        self.extreme
    }

    fn improves(&self, candidate: &Value, current: &Value) -> Result<bool> {
        let ord = compare_values(candidate, current)?;
        Ok(match self.extreme {
            Extreme::Min => ord == Ordering::Less,
            Extreme::Max => ord == Ordering::Greater,
        })
    }

    fn offer(&mut self, candidate: &Value) -> Result<()> {
        let replace = match &self.value {
            None => true,
            Some(current) => self.improves(candidate, current)?,
        };
        if replace {
            self.value = Some(candidate.clone());
        }
        Ok(())
    }
}

impl Accumulator for MinMax {
    fn initialize(&mut self, _result_type: &DataType, input_types: &[DataType]) -> Result<()> {
        self.input_type = first_input_type(input_types);
        Ok(())
    }

    fn add_input_direct(&mut self, args: &ArgRow<'_>, _ctx: &EvalContext) -> Result<()> {
        self.offer(args.get(0)?)
    }

    fn get_result(&mut self, _ctx: &EvalContext) -> Result<Value> {
        Ok(self.value.clone().unwrap_or(Value::Null))
    }

    fn reset(&mut self) {
        self.value = None;
    }
}

impl StatefulAccumulator for MinMax {
    fn get_state(&self, state: &mut Vec<Value>) {
        state.push(self.value.clone().unwrap_or(Value::Null));
    }

    fn set_state(&mut self, state: &[Value], index: usize) -> Result<usize> {
        let slot = state_slot(state, index)?;
        self.value = (!slot.is_null()).then(|| slot.clone());
        Ok(index + 1)
    }

    fn state_types(&self) -> Vec<DataType> {
        vec![self.input_type.clone()]
    }
}
