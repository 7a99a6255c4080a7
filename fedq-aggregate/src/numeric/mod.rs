//! Numeric reducers: SUM, AVG and the variance family.

mod avg;
mod stats;
mod sum;

pub use avg::Avg;
pub use stats::{StatsFunction, StatsKind};
pub use sum::Sum;
