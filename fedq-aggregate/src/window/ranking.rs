use fedq_result::{Error, Result};
use fedq_types::Value;

use crate::accumulator::{Accumulator, ArgRow};
use crate::context::EvalContext;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RankMode {
    Rank,
    DenseRank,
    RowNumber,
}

/// `RANK`, `DENSE_RANK` and `ROW_NUMBER` over an ordered partition.
///
/// Rows are fed in order with `add_input_direct`; `get_result` is called
/// once per peer group after its last row and every row of the group takes
/// that value. `ROW_NUMBER` treats each row as its own group. Asking again
/// without new rows is a contract violation.
#[derive(Clone, Debug)]
pub struct RankingFunction {
    mode: RankMode,
    count: i64,
    last_count: i64,
    pending: i64,
}

impl RankingFunction {
    pub fn new(mode: RankMode) -> Self {
        Self {
            mode,
            count: 0,
            last_count: 0,
            pending: 0,
        }
    }

    pub fn mode(&self) -> RankMode {
        self.mode
    }
}

impl Accumulator for RankingFunction {
    fn respects_null(&self) -> bool {
        true
    }

    fn add_input_direct(&mut self, _args: &ArgRow<'_>, _ctx: &EvalContext) -> Result<()> {
        if self.mode == RankMode::RowNumber && self.pending > 0 {
            return Err(Error::Internal(
                "ROW_NUMBER needs a result for every row".into(),
            ));
        }
        self.count = self
            .count
            .checked_add(1)
            .ok_or_else(|| Error::overflow("ranking row counter"))?;
        self.pending += 1;
        Ok(())
    }

    fn get_result(&mut self, _ctx: &EvalContext) -> Result<Value> {
        if self.pending == 0 {
            return Err(Error::Internal(format!(
                "{:?} result requested with no new rows in the peer group",
                self.mode
            )));
        }
        self.pending = 0;
        let rank = match self.mode {
            RankMode::Rank => {
                let rank = self.last_count + 1;
                self.last_count = self.count;
                rank
            }
            RankMode::DenseRank => {
                self.last_count += 1;
                self.last_count
            }
            RankMode::RowNumber => self.count,
        };
        let rank = i32::try_from(rank)
            .map_err(|_| Error::overflow(format!("rank {rank} exceeds 32 bits")))?;
        Ok(Value::Integer(rank))
    }

    fn reset(&mut self) {
        self.count = 0;
        self.last_count = 0;
        self.pending = 0;
    }
}
