//! The accumulator contract shared by every aggregate and window primitive.

use fedq_result::{Error, Result};
use fedq_types::{DataType, Value};

use crate::context::EvalContext;

/// View of one input tuple through an aggregate's argument bindings.
///
/// Argument `i` is `tuple[indexes[i]]`. Out-of-range bindings are a
/// contract violation by the caller and surface as internal errors.
#[derive(Clone, Copy, Debug)]
pub struct ArgRow<'a> {
    tuple: &'a [Value],
    indexes: &'a [usize],
}

impl<'a> ArgRow<'a> {
    pub fn new(tuple: &'a [Value], indexes: &'a [usize]) -> Self {
        Self { tuple, indexes }
    }

    /// Number of bound arguments.
    pub fn len(&self) -> usize {
        self.indexes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }

    pub fn tuple(&self) -> &'a [Value] {
        self.tuple
    }

    /// Tuple position bound to argument `arg`.
    pub fn column(&self, arg: usize) -> Result<usize> {
        self.indexes.get(arg).copied().ok_or_else(|| {
            Error::Internal(format!(
                "argument {arg} requested but only {} are bound",
                self.indexes.len()
            ))
        })
    }

    pub fn get(&self, arg: usize) -> Result<&'a Value> {
        let column = self.column(arg)?;
        self.tuple.get(column).ok_or_else(|| {
            Error::Internal(format!(
                "argument index {column} outside tuple of width {}",
                self.tuple.len()
            ))
        })
    }

    /// Like [`ArgRow::get`] but `None` for an unbound optional argument.
    pub fn get_opt(&self, arg: usize) -> Result<Option<&'a Value>> {
        if arg >= self.indexes.len() {
            return Ok(None);
        }
        self.get(arg).map(Some)
    }

    pub fn iter(&self) -> impl Iterator<Item = Result<&'a Value>> + '_ {
        (0..self.len()).map(move |i| self.get(i))
    }

    pub fn has_null(&self) -> Result<bool> {
        for value in self.iter() {
            if value?.is_null() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Owned copy of the bound arguments.
    pub fn to_vec(&self) -> Result<Vec<Value>> {
        self.iter().map(|v| v.cloned()).collect()
    }
}

/// Incremental reducer over the rows of one group, partition, or frame.
///
/// Lifecycle: `initialize` once, any number of `add_input_direct` calls, then
/// `get_result`. `reset` returns the accumulator to the zero-rows state so
/// the same instance can serve the next group.
pub trait Accumulator {
    /// Fix the active representation from the declared types.
    fn initialize(&mut self, result_type: &DataType, input_types: &[DataType]) -> Result<()> {
        let _ = (result_type, input_types);
        Ok(())
    }

    /// Whether rows with a null argument are passed through rather than skipped.
    fn respects_null(&self) -> bool {
        false
    }

    /// Fold one already-filtered row.
    fn add_input_direct(&mut self, args: &ArgRow<'_>, ctx: &EvalContext) -> Result<()>;

    fn get_result(&mut self, ctx: &EvalContext) -> Result<Value>;

    fn reset(&mut self);
}

/// Accumulators whose partial state can be exported and restored, used when
/// evaluation is split across stages.
///
/// State is a flat vector; an accumulator appends its fields in a fixed
/// order and reads them back from a start index, returning the index just
/// past its last field so several accumulators can share one vector.
pub trait StatefulAccumulator {
    fn get_state(&self, state: &mut Vec<Value>);

    fn set_state(&mut self, state: &[Value], index: usize) -> Result<usize>;

    /// Types of the fields appended by [`StatefulAccumulator::get_state`].
    fn state_types(&self) -> Vec<DataType>;
}

/// State field at `index`, or an internal error when the vector is short.
pub(crate) fn state_slot(state: &[Value], index: usize) -> Result<&Value> {
    state.get(index).ok_or_else(|| {
        Error::Internal(format!(
            "state vector of {} fields has no slot {index}",
            state.len()
        ))
    })
}

pub(crate) fn state_i64(state: &[Value], index: usize) -> Result<i64> {
    match state_slot(state, index)? {
        Value::Null => Ok(0),
        other => other.to_i64(),
    }
}

pub(crate) fn state_f64(state: &[Value], index: usize) -> Result<f64> {
    match state_slot(state, index)? {
        Value::Null => Ok(0.0),
        other => other.to_f64(),
    }
}

pub(crate) fn state_bool(state: &[Value], index: usize) -> Result<Option<bool>> {
    match state_slot(state, index)? {
        Value::Null => Ok(None),
        Value::Boolean(b) => Ok(Some(*b)),
        other => Err(Error::type_coercion("boolean", other.type_name())),
    }
}

/// First input type, or `Null` when the aggregate was initialized without one.
pub(crate) fn first_input_type(input_types: &[DataType]) -> DataType {
    input_types.first().cloned().unwrap_or(DataType::Null)
}
