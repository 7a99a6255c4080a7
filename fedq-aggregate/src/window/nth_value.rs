use fedq_result::{Error, Result};
use fedq_types::Value;

use crate::accumulator::{Accumulator, ArgRow};
use crate::context::EvalContext;

/// `NTH_VALUE(value, n)`: the value of the n-th row of the current frame,
/// or null when the frame is shorter.
#[derive(Clone, Debug, Default)]
pub struct NthValue {
    nth: Option<i64>,
    column: usize,
}

impl NthValue {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Accumulator for NthValue {
    fn respects_null(&self) -> bool {
        true
    }

    fn add_input_direct(&mut self, args: &ArgRow<'_>, _ctx: &EvalContext) -> Result<()> {
        let n = args.get(1)?;
        if n.is_null() {
            return Err(Error::InvalidArgumentError(
                "NTH_VALUE position must not be null".into(),
            ));
        }
        let n = n.to_count_argument()?;
        if n < 1 {
            return Err(Error::InvalidArgumentError(format!(
                "NTH_VALUE position must be positive, got {n}"
            )));
        }
        self.nth = Some(n);
        self.column = args.column(0)?;
        Ok(())
    }

    fn get_result(&mut self, ctx: &EvalContext) -> Result<Value> {
        let Some(nth) = self.nth else {
            return Ok(Value::Null);
        };
        let frame = ctx.window_frame().ok_or_else(|| {
            Error::Internal("NTH_VALUE evaluated without a window frame".into())
        })?;
        // nth >= 1 was checked on input.
        let offset = (nth - 1) as u64;
        Ok(frame.value_at(offset, self.column)?.unwrap_or(Value::Null))
    }

    fn reset(&mut self) {
        self.nth = None;
    }
}
