use fedq_result::{Error, Result};
use fedq_types::Value;

use super::facts::NtileFact;
use crate::accumulator::{Accumulator, ArgRow};
use crate::context::EvalContext;

/// `NTILE(n)`: emits an [`NtileFact`] per row.
#[derive(Clone, Debug, Default)]
pub struct Ntile {
    row_index: i64,
    tiles: i64,
}

impl Ntile {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Accumulator for Ntile {
    // A null tile count must fail rather than skip the row.
    fn respects_null(&self) -> bool {
        true
    }

    fn add_input_direct(&mut self, args: &ArgRow<'_>, _ctx: &EvalContext) -> Result<()> {
        let arg = args.get(0)?;
        if arg.is_null() {
            return Err(Error::InvalidArgumentError(
                "NTILE tile count must not be null".into(),
            ));
        }
        let tiles = arg.to_count_argument()?;
        if tiles < 1 {
            return Err(Error::InvalidArgumentError(format!(
                "NTILE tile count must be positive, got {tiles}"
            )));
        }
        self.row_index += 1;
        self.tiles = tiles;
        Ok(())
    }

    fn get_result(&mut self, _ctx: &EvalContext) -> Result<Value> {
        if self.row_index == 0 {
            return Ok(Value::Null);
        }
        Ok(NtileFact {
            row_index: self.row_index,
            tiles: self.tiles,
        }
        .to_value())
    }

    fn reset(&mut self) {
        self.row_index = 0;
        self.tiles = 0;
    }
}
