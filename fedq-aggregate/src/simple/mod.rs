//! Row-at-a-time reducers with fixed-size state.

mod array_agg;
mod boolean;
mod constant;
mod count;
mod min_max;

pub use array_agg::ArrayAgg;
pub use boolean::{BooleanAgg, BooleanMode};
pub use constant::ConstantFunction;
pub use count::{Count, CountBig};
pub use min_max::{Extreme, MinMax};
