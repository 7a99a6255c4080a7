use fedq_aggregate::{
    Aggregate, AggregateConfig, AggregateKind, AggregateSpec, EvalContext, TextColumn,
    TextLineFormat,
};
use fedq_result::Error;
use fedq_storage::LobHandle;
use fedq_test_utils::{count_entries, isolated_spill_config};
use fedq_types::{DataType, Value};

fn build(kind: AggregateKind, input_types: &[DataType]) -> Aggregate {
    let indexes = (0..input_types.len()).collect();
    AggregateSpec::new("agg", kind)
        .build(input_types, indexes)
        .unwrap()
}

fn text_of(value: &Value) -> String {
    value.as_lob().expect("large object result").to_text().unwrap()
}

fn string_rows(values: &[&str], delimiter: &str) -> Vec<Vec<Value>> {
    values
        .iter()
        .map(|v| vec![Value::from(*v), Value::from(delimiter)])
        .collect()
}

#[test]
fn string_agg_joins_with_delimiter() {
    let ctx = EvalContext::default();
    let mut agg = build(AggregateKind::StringAgg, &[DataType::String, DataType::String]);
    assert_eq!(agg.get_result(&ctx).unwrap(), Value::Null);
    for row in string_rows(&["a", "b", "c"], ",") {
        agg.add_input(&row, &ctx).unwrap();
    }
    let result = agg.get_result(&ctx).unwrap();
    assert!(matches!(result, Value::Clob(_)));
    assert_eq!(text_of(&result), "a,b,c");
}

#[test]
fn string_agg_skips_rows_with_null_value() {
    let ctx = EvalContext::default();
    let mut agg = build(AggregateKind::StringAgg, &[DataType::String, DataType::String]);
    agg.add_input(&[Value::from("a"), Value::from("-")], &ctx).unwrap();
    agg.add_input(&[Value::Null, Value::from("-")], &ctx).unwrap();
    agg.add_input(&[Value::from("b"), Value::from("-")], &ctx).unwrap();
    assert_eq!(text_of(&agg.get_result(&ctx).unwrap()), "a-b");
}

#[test]
fn string_agg_rejected_row_leaves_no_delimiter() {
    let ctx = EvalContext::default();
    let mut agg = build(AggregateKind::StringAgg, &[DataType::String, DataType::String]);
    let err = agg
        .add_input(&[Value::Integer(9), Value::from(",")], &ctx)
        .unwrap_err();
    assert!(matches!(err, Error::TypeCoercion { .. }));
    assert_eq!(agg.get_result(&ctx).unwrap(), Value::Null);

    agg.add_input(&[Value::from("a"), Value::from(",")], &ctx).unwrap();
    assert!(agg.add_input(&[Value::from("b"), Value::Integer(0)], &ctx).is_err());
    agg.add_input(&[Value::from("c"), Value::from(",")], &ctx).unwrap();
    assert_eq!(text_of(&agg.get_result(&ctx).unwrap()), "a,c");
}

#[test]
fn binary_string_agg_is_a_blob() {
    let ctx = EvalContext::default();
    let mut agg = build(AggregateKind::StringAgg, &[DataType::Varbinary, DataType::Varbinary]);
    for chunk in [&b"\x01"[..], &b"\x02"[..]] {
        let row = [
            Value::Varbinary(bytes::Bytes::copy_from_slice(chunk)),
            Value::Varbinary(bytes::Bytes::from_static(b"|")),
        ];
        agg.add_input(&row, &ctx).unwrap();
    }
    let Value::Blob(lob) = agg.get_result(&ctx).unwrap() else {
        panic!("binary STRING_AGG must produce a BLOB");
    };
    assert_eq!(lob.to_bytes().unwrap().as_ref(), b"\x01|\x02");
}

#[test]
fn repeated_result_returns_same_handle_and_reset_reuses() {
    let ctx = EvalContext::default();
    let mut agg = build(AggregateKind::StringAgg, &[DataType::String, DataType::String]);
    for row in string_rows(&["x", "y"], ";") {
        agg.add_input(&row, &ctx).unwrap();
    }
    let first = agg.get_result(&ctx).unwrap();
    assert_eq!(agg.get_result(&ctx).unwrap(), first);
    assert!(matches!(
        agg.add_input(&[Value::from("z"), Value::from(";")], &ctx),
        Err(Error::Internal(_))
    ));

    agg.reset();
    assert_eq!(agg.get_result(&ctx).unwrap(), Value::Null);
    for row in string_rows(&["z"], ";") {
        agg.add_input(&row, &ctx).unwrap();
    }
    assert_eq!(text_of(&agg.get_result(&ctx).unwrap()), "z");
}

#[test]
fn large_output_spills_and_reset_releases_the_file() {
    let (spill, dir) = isolated_spill_config(16).unwrap();
    let ctx = EvalContext::new(AggregateConfig::default().with_spill(spill));
    let mut agg = build(AggregateKind::StringAgg, &[DataType::String, DataType::String]);
    let words = ["alpha", "bravo", "charlie", "delta", "echo"];
    for row in string_rows(&words, " ") {
        agg.add_input(&row, &ctx).unwrap();
    }
    let result = agg.get_result(&ctx).unwrap();
    let lob: &LobHandle = result.as_lob().unwrap();
    assert!(lob.is_spilled());
    assert_eq!(lob.to_text().unwrap(), words.join(" "));
    assert_eq!(count_entries(&dir).unwrap(), 1);
    assert_eq!(ctx.store().stats().sinks_spilled, 1);

    drop(result);
    agg.reset();
    assert_eq!(count_entries(&dir).unwrap(), 0);
}

#[test]
fn abandoned_aggregate_releases_its_sink() {
    let (spill, dir) = isolated_spill_config(4).unwrap();
    let ctx = EvalContext::new(AggregateConfig::default().with_spill(spill));
    let mut agg = build(AggregateKind::StringAgg, &[DataType::String, DataType::String]);
    for row in string_rows(&["unfinished", "output"], ",") {
        agg.add_input(&row, &ctx).unwrap();
    }
    assert_eq!(count_entries(&dir).unwrap(), 1);
    drop(agg);
    assert_eq!(count_entries(&dir).unwrap(), 0);
}

#[test]
fn xml_agg_concatenates_fragments() {
    let ctx = EvalContext::default();
    let mut agg = build(AggregateKind::XmlAgg, &[DataType::Xml]);
    assert_eq!(agg.get_result(&ctx).unwrap(), Value::Null);
    for fragment in [r#"<?xml version="1.0"?><a>1</a>"#, "<b/>"] {
        agg.add_input(&[Value::Xml(LobHandle::from_string(fragment))], &ctx)
            .unwrap();
    }
    agg.add_input(&[Value::Null], &ctx).unwrap();
    let result = agg.get_result(&ctx).unwrap();
    assert!(matches!(result, Value::Xml(_)));
    assert_eq!(text_of(&result), "<a>1</a><b/>");
}

#[test]
fn json_array_agg_keeps_nulls() {
    let ctx = EvalContext::default();
    let mut agg = build(AggregateKind::JsonArrayAgg, &[DataType::String]);
    for value in [Value::Integer(1), Value::from("two"), Value::Null] {
        agg.add_input(&[value], &ctx).unwrap();
    }
    let result = agg.get_result(&ctx).unwrap();
    assert!(matches!(result, Value::Json(_)));
    assert_eq!(text_of(&result), r#"[1,"two",null]"#);
}

#[test]
fn json_array_agg_rejected_row_leaves_valid_json() {
    let ctx = EvalContext::default();
    let mut agg = build(AggregateKind::JsonArrayAgg, &[DataType::Double]);
    let err = agg.add_input(&[Value::Double(f64::NAN)], &ctx).unwrap_err();
    assert!(matches!(err, Error::ExprCast(_)));
    agg.add_input(&[Value::Double(1.5)], &ctx).unwrap();
    let nested = Value::from(vec![Value::Integer(1), Value::Double(f64::INFINITY)]);
    assert!(agg.add_input(&[nested], &ctx).is_err());
    agg.add_input(&[Value::Integer(2)], &ctx).unwrap();
    assert_eq!(text_of(&agg.get_result(&ctx).unwrap()), "[1.5,2]");
}

#[test]
fn json_array_agg_with_only_rejected_rows_is_null() {
    let ctx = EvalContext::default();
    let mut agg = build(AggregateKind::JsonArrayAgg, &[DataType::Varbinary]);
    let row = [Value::Varbinary(bytes::Bytes::from_static(b"x"))];
    assert!(agg.add_input(&row, &ctx).is_err());
    assert_eq!(agg.get_result(&ctx).unwrap(), Value::Null);
}

#[test]
fn text_agg_writes_header_and_delimited_rows() {
    let ctx = EvalContext::default();
    let format = TextLineFormat::new(vec![TextColumn::new("id"), TextColumn::new("name")])
        .with_header(true);
    let mut agg = build(
        AggregateKind::TextAgg(format),
        &[DataType::Integer, DataType::String],
    );
    assert_eq!(agg.get_result(&ctx).unwrap(), Value::Null);
    agg.add_input(&[Value::Integer(1), Value::from("ann")], &ctx).unwrap();
    agg.add_input(&[Value::Integer(2), Value::Null], &ctx).unwrap();
    let result = agg.get_result(&ctx).unwrap();
    assert!(matches!(result, Value::Blob(_)));
    assert_eq!(
        text_of(&result),
        "id,name\n1,ann\n2,\n"
    );
}

#[test]
fn text_agg_fixed_width_without_header() {
    let ctx = EvalContext::default();
    let format = TextLineFormat::new(vec![
        TextColumn::new("code").with_width(4),
        TextColumn::new("qty").with_width(3),
    ]);
    let mut agg = build(
        AggregateKind::TextAgg(format),
        &[DataType::String, DataType::Integer],
    );
    agg.add_input(&[Value::from("ab"), Value::Integer(12)], &ctx).unwrap();
    agg.add_input(&[Value::from("abcdefg"), Value::Integer(7)], &ctx).unwrap();
    assert_eq!(text_of(&agg.get_result(&ctx).unwrap()), "ab  12 \nabcd7  \n");
}

#[test]
fn text_agg_without_columns_fails_to_initialize() {
    let spec = AggregateSpec::new("t", AggregateKind::from_name("TEXTAGG").unwrap());
    let err = spec.build(&[DataType::String], vec![0]).unwrap_err();
    assert!(matches!(err, Error::InvalidArgumentError(_)));
}
