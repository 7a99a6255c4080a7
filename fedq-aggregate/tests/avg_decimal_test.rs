use std::str::FromStr;
use std::sync::Arc;

use arrow::array::{Decimal128Array, Int32Array, RecordBatch};
use arrow::datatypes::{DataType as ArrowDataType, Field, Schema};
use fedq_aggregate::{AggregateConfig, AggregateKind, AggregateSpec, AggregateStream, EvalContext};
use fedq_types::{BigDecimal, Value};

fn decimal_batch() -> RecordBatch {
    // 10.51 and 10.52 at precision 10, scale 2.
    let array = Decimal128Array::from(vec![Some(1051), None, Some(1052)])
        .with_precision_and_scale(10, 2)
        .unwrap();
    let ids = Int32Array::from(vec![1, 2, 3]);
    let schema = Arc::new(Schema::new(vec![
        Field::new("a", ArrowDataType::Decimal128(10, 2), true),
        Field::new("id", ArrowDataType::Int32, false),
    ]));
    RecordBatch::try_new(schema, vec![Arc::new(array), Arc::new(ids)]).unwrap()
}

fn run_avg(config: AggregateConfig) -> Value {
    let batch = decimal_batch();
    let schema = batch.schema();
    let specs = vec![(
        AggregateSpec::new("avg", AggregateKind::Avg),
        vec!["a".to_string()],
    )];
    let mut stream = AggregateStream::try_new(
        vec![Ok(batch)].into_iter(),
        &specs,
        &schema,
        EvalContext::new(config),
    )
    .unwrap();
    let row = stream.next().unwrap().unwrap();
    assert!(stream.next().is_none());
    assert_eq!(row.len(), 1);
    assert_eq!(row[0].0, "avg");
    row[0].1.clone()
}

#[test]
fn avg_decimal_keeps_default_scale() {
    let Value::BigDecimal(avg) = run_avg(AggregateConfig::default()) else {
        panic!("AVG over decimals must stay decimal");
    };
    assert_eq!(avg, BigDecimal::from_str("10.515").unwrap());
    assert_eq!(avg.as_bigint_and_exponent().1, 16);
}

#[test]
fn avg_decimal_rounds_half_up_at_sum_scale() {
    // With no configured minimum the sum's scale of 2 wins: 10.515 -> 10.52.
    let avg = run_avg(AggregateConfig::default().with_avg_decimal_scale(0));
    assert_eq!(avg, Value::BigDecimal(BigDecimal::from_str("10.52").unwrap()));
}

#[test]
fn stream_feeds_every_aggregate_across_batches() {
    let batch = decimal_batch();
    let schema = batch.schema();
    let specs = vec![
        (AggregateSpec::new("n", AggregateKind::Count), vec!["a".to_string()]),
        (AggregateSpec::new("rows", AggregateKind::CountBig), vec![]),
        (AggregateSpec::new("total", AggregateKind::Sum), vec!["id".to_string()]),
        (AggregateSpec::new("hi", AggregateKind::Max), vec!["a".to_string()]),
    ];
    let input = vec![Ok(batch.clone()), Ok(batch)].into_iter();
    let row = AggregateStream::try_new(input, &specs, &schema, EvalContext::default())
        .unwrap()
        .next()
        .unwrap()
        .unwrap();
    let values: Vec<Value> = row.into_iter().map(|(_, v)| v).collect();
    assert_eq!(
        values,
        vec![
            Value::Integer(4),
            Value::Long(6),
            Value::Long(12),
            Value::BigDecimal(BigDecimal::from_str("10.52").unwrap()),
        ]
    );
}

#[test]
fn unknown_column_is_rejected() {
    let batch = decimal_batch();
    let schema = batch.schema();
    let specs = vec![(
        AggregateSpec::new("s", AggregateKind::Sum),
        vec!["missing".to_string()],
    )];
    let result = AggregateStream::try_new(
        std::iter::empty(),
        &specs,
        &schema,
        EvalContext::default(),
    );
    assert!(result.is_err());
}
