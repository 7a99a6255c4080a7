//! Error types and result definitions shared by the `fedq-*` crates.
//!
//! Every fallible operation in the aggregate core returns [`Result<T>`]. The
//! executor that drives accumulators treats any [`Error`] surfacing from
//! `add_input`/`get_result` as a processing failure for the current group or
//! partition; this layer performs no retries.
//!
//! # Error Categories
//!
//! - **Overflow** ([`Error::Overflow`]): counters or integral sums that would wrap
//! - **Invalid arguments** ([`Error::InvalidArgumentError`]): e.g. `NTILE(0)`
//! - **I/O** ([`Error::Io`]): spill-to-disk sink failures
//! - **Type coercion** ([`Error::TypeCoercion`], [`Error::ExprCast`]): a runtime value
//!   that does not match the declared SQL type
//! - **Batch decoding** ([`Error::Arrow`]): Arrow arrays fed through the batch driver
//! - **Internal** ([`Error::Internal`]): contract misuse by the caller

pub mod error;
pub mod result;

pub use error::Error;
pub use result::Result;
