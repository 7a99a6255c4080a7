use std::{fmt, io};
use thiserror::Error;

/// Unified error type for accumulator processing.
///
/// Errors propagate synchronously out of `add_input_direct` and `get_result`
/// using the `?` operator. Null arguments are never errors: rows carrying them
/// are skipped by the shared input filter unless the function respects nulls.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error while writing to or reading from a spill-capable sink.
    ///
    /// Typically disk exhaustion or a temp file that could not be created in the
    /// configured spill directory.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Arrow error raised while decoding a batch into row tuples.
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Invalid argument supplied to an aggregate or window function.
    ///
    /// Raised for values the function rejects outright, such as a tile count
    /// below one for `NTILE` or a non-positive position for `NTH_VALUE`.
    #[error("Invalid argument: {0}")]
    InvalidArgumentError(String),

    /// Arithmetic overflow.
    ///
    /// Accumulators never wrap silently; a counter or integral sum that would
    /// exceed its representation aborts with this error.
    #[error("arithmetic overflow: {0}")]
    Overflow(String),

    /// A runtime value did not match the type the function was initialized for.
    #[error("type coercion error: expected {expected}, got {got}")]
    TypeCoercion {
        expected: &'static str,
        got: &'static str,
    },

    /// Conversion of a value into another representation failed.
    #[error("expression cast error: {0}")]
    ExprCast(String),

    /// Internal error indicating the caller broke the accumulator contract.
    ///
    /// Examples: an argument index beyond the tuple width, `NTH_VALUE` evaluated
    /// without a window frame, or a ranking result requested twice for the same
    /// peer group.
    #[error("An internal operation failed: {0}")]
    Internal(String),
}

impl Error {
    /// Create an expression cast error from any displayable error.
    ///
    /// # Examples
    ///
    /// ```
    /// use fedq_result::Error;
    ///
    /// fn parse_tiles(input: &str) -> Result<i64, Error> {
    ///     input.parse::<i64>().map_err(Error::expr_cast)
    /// }
    ///
    /// assert_eq!(parse_tiles("4").unwrap(), 4);
    /// assert!(matches!(parse_tiles("four"), Err(Error::ExprCast(_))));
    /// ```
    #[inline]
    pub fn expr_cast<E: fmt::Display>(err: E) -> Self {
        Error::ExprCast(err.to_string())
    }

    /// Create an overflow error naming the operation that overflowed.
    #[inline]
    pub fn overflow(what: impl Into<String>) -> Self {
        Error::Overflow(what.into())
    }

    /// Create a type coercion error from the expected and observed type names.
    #[inline]
    pub fn type_coercion(expected: &'static str, got: &'static str) -> Self {
        Error::TypeCoercion { expected, got }
    }
}
