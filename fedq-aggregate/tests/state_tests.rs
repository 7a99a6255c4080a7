use std::str::FromStr;

use fedq_aggregate::{Aggregate, AggregateKind, AggregateSpec, EvalContext};
use fedq_result::Error;
use fedq_types::{BigDecimal, DataType, Value};

fn build(name: &str, input_types: &[DataType]) -> Aggregate {
    let kind = AggregateKind::from_name(name).unwrap();
    let indexes = (0..input_types.len()).collect();
    AggregateSpec::new(name, kind)
        .build(input_types, indexes)
        .unwrap()
}

fn feed(agg: &mut Aggregate, ctx: &EvalContext, values: &[Value]) {
    for v in values {
        agg.add_input(std::slice::from_ref(v), ctx).unwrap();
    }
}

#[test]
fn count_state_round_trip() {
    let ctx = EvalContext::default();
    let mut count = build("COUNT", &[DataType::Integer]);
    feed(&mut count, &ctx, &vec![Value::Integer(1); 7]);
    let mut state = Vec::new();
    count.get_state(&mut state);
    assert_eq!(state, vec![Value::Integer(7)]);

    let mut fresh = build("COUNT", &[DataType::Integer]);
    assert_eq!(fresh.set_state(&[Value::Integer(7)], 0).unwrap(), 1);
    assert_eq!(fresh.get_result(&ctx).unwrap(), Value::Integer(7));
}

/// Accumulate `values`, export, restore into a fresh instance and compare
/// results and slot bookkeeping.
fn assert_round_trip(name: &str, input_type: DataType, values: &[Value]) {
    let ctx = EvalContext::default();
    let mut original = build(name, &[input_type.clone()]);
    feed(&mut original, &ctx, values);

    let mut state = vec![Value::from("prefix")];
    original.get_state(&mut state);
    let types = original.state_types();
    assert_eq!(state.len() - 1, types.len(), "{name}: slots vs types");

    let mut restored = build(name, &[input_type]);
    let next = restored.set_state(&state, 1).unwrap();
    assert_eq!(next, state.len(), "{name}: next index");
    assert_eq!(
        restored.get_result(&ctx).unwrap(),
        original.get_result(&ctx).unwrap(),
        "{name}"
    );
}

#[test]
fn stateful_functions_round_trip() {
    let ints: Vec<Value> = [4, 8, 15, 16, 23, 42].into_iter().map(Value::Integer).collect();
    for name in [
        "COUNT",
        "COUNT_BIG",
        "SUM",
        "AVG",
        "MIN",
        "MAX",
        "STDDEV_SAMP",
        "VAR_POP",
        "ARRAY_AGG",
        "FIRST_VALUE",
        "LAST_VALUE",
    ] {
        assert_round_trip(name, DataType::Integer, &ints);
        assert_round_trip(name, DataType::Integer, &[]);
    }
    let decimals: Vec<Value> = ["1.25", "2.5"]
        .into_iter()
        .map(|s| Value::BigDecimal(BigDecimal::from_str(s).unwrap()))
        .collect();
    assert_round_trip("SUM", DataType::BigDecimal, &decimals);
    assert_round_trip("AVG", DataType::BigDecimal, &decimals);
    assert_round_trip("EVERY", DataType::Boolean, &[Value::Boolean(true)]);
}

#[test]
fn several_functions_share_one_vector() {
    let ctx = EvalContext::default();
    let values: Vec<Value> = [1.0, 2.0, 6.0].into_iter().map(Value::Double).collect();
    let names = ["AVG", "COUNT", "MAX"];

    let mut packed = Vec::new();
    for name in names {
        let mut agg = build(name, &[DataType::Double]);
        feed(&mut agg, &ctx, &values);
        agg.get_state(&mut packed);
    }

    let mut index = 0;
    let mut results = Vec::new();
    for name in names {
        let mut agg = build(name, &[DataType::Double]);
        index = agg.set_state(&packed, index).unwrap();
        results.push(agg.get_result(&ctx).unwrap());
    }
    assert_eq!(index, packed.len());
    assert_eq!(
        results,
        vec![Value::Double(3.0), Value::Integer(3), Value::Double(6.0)]
    );
}

#[test]
fn stateless_functions_contribute_no_slots() {
    let mut xml = build("XMLAGG", &[DataType::Xml]);
    let mut state = Vec::new();
    xml.get_state(&mut state);
    assert!(state.is_empty());
    assert!(xml.state_types().is_empty());
    assert_eq!(xml.set_state(&[], 0).unwrap(), 0);
}

#[test]
fn short_state_vector_is_rejected() {
    let mut avg = build("AVG", &[DataType::Double]);
    let err = avg.set_state(&[Value::Double(1.0)], 0).unwrap_err();
    assert!(matches!(err, Error::Internal(_)));
}
