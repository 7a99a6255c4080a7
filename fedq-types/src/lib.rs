//! SQL type tags and runtime values for the fedq aggregate core.
//!
//! [`Value`] is the cell type of a resolved input tuple and of accumulator
//! state vectors; [`DataType`] is the declared type accumulators are
//! initialized with. The comparator in [`compare`] is the same total order
//! used for ORDER BY, so MIN/MAX agree with sorting.

pub mod arrow_cell;
pub mod compare;
pub mod data_type;
mod hash;
pub mod numeric;
pub mod value;

pub use arrow_cell::{tuple_from_batch, value_from_array};
pub use compare::compare_values;
pub use data_type::DataType;
pub use value::{Tuple, Value};

pub use bigdecimal::BigDecimal;
pub use num_bigint::BigInt;
