use crate::value::{Input, Lookup, Source, Value, WireValue, Wrapper};
use chrono::{TimeDelta, TimeZone, Utc};
use serde_json::json;

// ---- helpers -----------------------------------------------------------

fn input_of(src: impl Into<Source>) -> Input {
    src.into().into_input()
}

// ---- source normalization ----------------------------------------------

#[test]
fn wire_scalars_become_native_values() {
    assert!(matches!(input_of(json!(null)), Input::Null));
    assert!(matches!(input_of(json!(true)), Input::Value(Value::Bool(true))));
    assert!(matches!(input_of(json!(-4)), Input::Value(Value::Int(-4))));
    assert!(matches!(
        input_of(json!(u64::MAX)),
        Input::Value(Value::Uint(u64::MAX))
    ));
    assert!(matches!(input_of(json!(1.5)), Input::Value(Value::Float(f)) if (f - 1.5).abs() < f64::EPSILON));
    assert!(matches!(input_of(json!("x")), Input::Value(Value::Text(ref s)) if s == "x"));
}

#[test]
fn wire_structures_keep_their_tag() {
    let list = input_of(json!([1, 2]));
    assert_eq!(list.label(), "list");

    let object = input_of(json!({"id": "1"}));
    assert_eq!(object.label(), "struct");
}

#[test]
fn wrappers_unwrap_into_values() {
    assert!(matches!(
        input_of(Wrapper::Int32(-7)),
        Input::Value(Value::Int(-7))
    ));
    assert!(matches!(
        input_of(Wrapper::UInt32(7)),
        Input::Value(Value::Uint(7))
    ));
    assert!(matches!(
        input_of(Wrapper::Bytes(vec![1])),
        Input::Value(Value::Binary(_))
    ));
}

#[test]
fn none_and_null_value_are_null_input() {
    assert!(matches!(input_of(None::<i64>), Input::Null));
    assert!(matches!(input_of(Value::Null), Input::Null));
    assert!(matches!(input_of(Some(3_i64)), Input::Value(Value::Int(3))));
}

// ---- wire lowering -----------------------------------------------------

#[test]
fn datetime_lowers_to_seconds() {
    let whole = Utc.with_ymd_and_hms(2024, 11, 18, 17, 37, 43).unwrap();
    assert_eq!(Value::DateTime(whole).to_wire(), json!(1_731_951_463));

    let fractional = whole + TimeDelta::milliseconds(527);
    let WireValue::Number(n) = Value::DateTime(fractional).to_wire() else {
        panic!("expected a number");
    };
    assert!((n.as_f64().unwrap() - 1_731_951_463.527).abs() < 1e-6);
}

#[test]
fn duration_lowers_to_seconds() {
    assert_eq!(Value::Duration(TimeDelta::minutes(90)).to_wire(), json!(5400));
    assert_eq!(
        Value::Duration(TimeDelta::milliseconds(1500)).to_wire(),
        json!(1.5)
    );
}

#[test]
fn lookup_lowers_without_empty_members() {
    let lookup = Lookup::new("42").with_type("dictionaries/cities");
    assert_eq!(
        Value::Lookup(lookup).to_wire(),
        json!({"id": "42", "type": "dictionaries/cities"})
    );
    assert_eq!(Value::Lookup(Lookup::default()).to_wire(), json!(null));
}

#[test]
fn binary_lowers_to_base64_and_lists_recurse() {
    assert_eq!(Value::Binary(b"hi".to_vec()).to_wire(), json!("aGk="));
    assert_eq!(
        Value::list([1_i64, 2, 3]).to_wire(),
        json!([1, 2, 3])
    );
    assert_eq!(Value::List(Vec::new()).to_wire(), json!([]));
}

#[test]
fn non_finite_floats_lower_to_null() {
    assert_eq!(Value::Float(f64::NAN).to_wire(), json!(null));
}
