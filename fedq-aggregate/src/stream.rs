use arrow::array::RecordBatch;
use arrow::datatypes::SchemaRef;
use fedq_result::{Error, Result};
use fedq_types::{DataType, Value};

use crate::context::EvalContext;
use crate::{Aggregate, AggregateSpec};

/// One finished aggregate: its alias and value.
pub type AggregateOutput = (String, Value);

/// Ungrouped aggregation over a stream of Arrow batches.
///
/// Drains the input on the first `next` call, feeding every batch to every
/// aggregate, then yields the finished row once.
pub struct AggregateStream<I> {
    aggregates: Vec<Aggregate>,
    input: I,
    ctx: EvalContext,
    done: bool,
}

impl<I> AggregateStream<I>
where
    I: Iterator<Item = Result<RecordBatch>>,
{
    pub fn new(input: I, aggregates: Vec<Aggregate>, ctx: EvalContext) -> Self {
        Self {
            aggregates,
            input,
            ctx,
            done: false,
        }
    }

    /// Build one aggregate per `(spec, argument column names)` pair,
    /// resolving columns and their types against `schema`.
    pub fn try_new(
        input: I,
        specs: &[(AggregateSpec, Vec<String>)],
        schema: &SchemaRef,
        ctx: EvalContext,
    ) -> Result<Self> {
        let aggregates = build_aggregates(specs, schema)?;
        Ok(Self::new(input, aggregates, ctx))
    }

    pub fn aggregates(&self) -> &[Aggregate] {
        &self.aggregates
    }

    fn drain(&mut self) -> Result<Vec<AggregateOutput>> {
        for batch in self.input.by_ref() {
            let batch = batch?;
            for aggregate in self.aggregates.iter_mut() {
                aggregate.update_batch(&batch, &self.ctx)?;
            }
        }
        let mut row = Vec::with_capacity(self.aggregates.len());
        for aggregate in self.aggregates.iter_mut() {
            let value = aggregate.get_result(&self.ctx)?;
            row.push((aggregate.alias().to_string(), value));
        }
        Ok(row)
    }
}

impl<I> Iterator for AggregateStream<I>
where
    I: Iterator<Item = Result<RecordBatch>>,
{
    type Item = Result<Vec<AggregateOutput>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        self.done = true;
        Some(self.drain())
    }
}

fn build_aggregates(
    specs: &[(AggregateSpec, Vec<String>)],
    schema: &SchemaRef,
) -> Result<Vec<Aggregate>> {
    let mut aggregates = Vec::with_capacity(specs.len());
    for (spec, columns) in specs {
        let mut arg_indexes = Vec::with_capacity(columns.len());
        let mut input_types = Vec::with_capacity(columns.len());
        for column in columns {
            let (index, field) = schema.column_with_name(column).ok_or_else(|| {
                Error::InvalidArgumentError(format!(
                    "unknown column '{}' in aggregate '{}'",
                    column, spec.alias
                ))
            })?;
            arg_indexes.push(index);
            input_types.push(DataType::from_arrow(field.data_type())?);
        }
        aggregates.push(spec.build(&input_types, arg_indexes)?);
    }
    Ok(aggregates)
}
