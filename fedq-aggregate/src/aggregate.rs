use arrow::array::RecordBatch;
use rustc_hash::FxHashSet;

use fedq_result::{Error, Result};
use fedq_types::{tuple_from_batch, DataType, Value};

use crate::accumulator::{Accumulator, ArgRow};
use crate::context::EvalContext;
use crate::{AggregateAccumulator, AggregateSpec};

/// One accumulator instance wired to its input tuple.
///
/// Owns the argument bindings, the optional FILTER condition column, the
/// DISTINCT filter and the accumulator itself. [`Aggregate::add_input`]
/// applies the shared row filters before delegating.
#[derive(Debug)]
pub struct Aggregate {
    alias: String,
    accumulator: AggregateAccumulator,
    arg_indexes: Vec<usize>,
    condition_index: Option<usize>,
    distinct: Option<FxHashSet<Vec<Value>>>,
    initialized: bool,
}

impl Aggregate {
    pub fn new(spec: &AggregateSpec) -> Self {
        let mut aggregate = Self::from_accumulator(spec.alias.clone(), spec.kind.accumulator());
        if spec.distinct {
            aggregate.distinct = Some(FxHashSet::default());
        }
        aggregate
    }

    pub fn from_accumulator(alias: impl Into<String>, accumulator: AggregateAccumulator) -> Self {
        Self {
            alias: alias.into(),
            accumulator,
            arg_indexes: Vec::new(),
            condition_index: None,
            distinct: None,
            initialized: false,
        }
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn accumulator(&self) -> &AggregateAccumulator {
        &self.accumulator
    }

    pub fn is_distinct(&self) -> bool {
        self.distinct.is_some()
    }

    pub fn arg_indexes(&self) -> &[usize] {
        &self.arg_indexes
    }

    pub fn condition_index(&self) -> Option<usize> {
        self.condition_index
    }

    pub fn set_arg_indexes(&mut self, arg_indexes: Vec<usize>) {
        self.arg_indexes = arg_indexes;
    }

    /// FILTER clause column; rows whose value there is not `true` are skipped.
    pub fn set_condition_index(&mut self, condition_index: Option<usize>) {
        self.condition_index = condition_index;
    }

    /// Choose the accumulator representation. Allowed once per instance.
    pub fn initialize(&mut self, result_type: &DataType, input_types: &[DataType]) -> Result<()> {
        if self.initialized {
            return Err(Error::Internal(format!(
                "aggregate '{}' initialized twice",
                self.alias
            )));
        }
        self.accumulator.initialize(result_type, input_types)?;
        self.initialized = true;
        tracing::trace!(
            "initialized aggregate '{}' for result type {} over {:?}",
            self.alias,
            result_type,
            input_types
        );
        Ok(())
    }

    pub fn respects_null(&self) -> bool {
        self.accumulator.respects_null()
    }

    /// Whether the null rule excludes `tuple`: a function that does not
    /// respect nulls skips rows with any null argument.
    pub fn filter(&self, tuple: &[Value]) -> Result<bool> {
        if self.respects_null() {
            return Ok(false);
        }
        ArgRow::new(tuple, &self.arg_indexes).has_null()
    }

    fn passes_condition(&self, tuple: &[Value]) -> Result<bool> {
        let Some(index) = self.condition_index else {
            return Ok(true);
        };
        let value = tuple.get(index).ok_or_else(|| {
            Error::Internal(format!(
                "condition index {index} outside tuple of width {}",
                tuple.len()
            ))
        })?;
        Ok(matches!(value, Value::Boolean(true)))
    }

    /// Apply the FILTER condition, the null rule and DISTINCT, then
    /// accumulate the row.
    pub fn add_input(&mut self, tuple: &[Value], ctx: &EvalContext) -> Result<()> {
        if !self.passes_condition(tuple)? || self.filter(tuple)? {
            return Ok(());
        }
        if let Some(seen) = self.distinct.as_mut() {
            let key = ArgRow::new(tuple, &self.arg_indexes).to_vec()?;
            if !seen.insert(key) {
                return Ok(());
            }
        }
        self.add_input_direct(tuple, ctx)
    }

    /// Accumulate the row without any filtering.
    pub fn add_input_direct(&mut self, tuple: &[Value], ctx: &EvalContext) -> Result<()> {
        let args = ArgRow::new(tuple, &self.arg_indexes);
        self.accumulator.add_input_direct(&args, ctx)
    }

    pub fn get_result(&mut self, ctx: &EvalContext) -> Result<Value> {
        self.accumulator.get_result(ctx)
    }

    /// Back to the zero-rows state, keeping bindings and representation.
    pub fn reset(&mut self) {
        tracing::trace!("reset aggregate '{}'", self.alias);
        self.accumulator.reset();
        if let Some(seen) = self.distinct.as_mut() {
            seen.clear();
        }
    }

    /// Append the accumulator's state; nothing for stateless functions.
    ///
    /// The DISTINCT filter is not part of the state.
    pub fn get_state(&self, state: &mut Vec<Value>) {
        if let Some(stateful) = self.accumulator.as_stateful() {
            stateful.get_state(state);
        }
    }

    pub fn set_state(&mut self, state: &[Value], index: usize) -> Result<usize> {
        match self.accumulator.as_stateful_mut() {
            Some(stateful) => stateful.set_state(state, index),
            None => Ok(index),
        }
    }

    pub fn state_types(&self) -> Vec<DataType> {
        self.accumulator
            .as_stateful()
            .map(|stateful| stateful.state_types())
            .unwrap_or_default()
    }

    /// Feed every row of `batch` through [`Aggregate::add_input`].
    pub fn update_batch(&mut self, batch: &RecordBatch, ctx: &EvalContext) -> Result<()> {
        for row in 0..batch.num_rows() {
            let tuple = tuple_from_batch(batch, row)?;
            self.add_input(&tuple, ctx)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AggregateKind;

    fn count_with_filter() -> Aggregate {
        let spec = AggregateSpec::new("c", AggregateKind::Count);
        let mut agg = spec.build(&[DataType::Integer], vec![0]).unwrap();
        agg.set_condition_index(Some(1));
        agg
    }

    #[test]
    fn condition_must_be_exactly_true() {
        let ctx = EvalContext::default();
        let mut agg = count_with_filter();
        for cond in [Value::Boolean(true), Value::Boolean(false), Value::Null, Value::Integer(1)] {
            agg.add_input(&[Value::Integer(1), cond], &ctx).unwrap();
        }
        assert_eq!(agg.get_result(&ctx).unwrap(), Value::Integer(1));
    }

    #[test]
    fn condition_index_past_tuple_is_internal() {
        let ctx = EvalContext::default();
        let mut agg = count_with_filter();
        let err = agg.add_input(&[Value::Integer(1)], &ctx).unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
    }

    #[test]
    fn second_initialize_is_rejected() {
        let mut agg = Aggregate::new(&AggregateSpec::new("s", AggregateKind::Sum));
        agg.initialize(&DataType::Long, &[DataType::Integer]).unwrap();
        assert!(agg.initialize(&DataType::Double, &[DataType::Double]).is_err());
    }
}
