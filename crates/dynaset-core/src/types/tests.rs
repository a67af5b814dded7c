use crate::{
    error::{Error, ErrorClass},
    model::{DatasetSpec, Dictionary, DictionaryLookup, FieldSpec, IntSpec, TypeSpec},
    types::{LookupType, Type, TypeError},
    value::{Lookup, Value},
};
use dynaset_primitives::{ALL_KINDS, Kind};
use serde_json::json;
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

fn cities() -> Arc<Dictionary> {
    Arc::new(Dictionary::new(
        0,
        DatasetSpec::new("cities", "dictionaries/cities")
            .with_field(FieldSpec::new("id", TypeSpec::Int(IntSpec::between(1, 1000))))
            .with_field(FieldSpec::of_kind("name", Kind::String))
            .with_primary("id")
            .with_display("name"),
    ))
}

fn counting_lookup(calls: Arc<AtomicUsize>) -> Arc<dyn DictionaryLookup> {
    let cities = cities();

    Arc::new(
        move |_: i64, path: &str| -> Result<Option<Arc<Dictionary>>, Error> {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok((path == "dictionaries/cities").then(|| Arc::clone(&cities)))
        },
    )
}

#[test]
fn every_kind_maps_to_a_type_of_the_same_kind() {
    for kind in ALL_KINDS {
        let ty = Type::of(kind);

        match kind {
            Kind::None => assert!(ty.is_undefined()),
            Kind::List => {
                assert_eq!(ty.kind(), Kind::List);
                assert!(ty.elem().unwrap().is_undefined());
            }
            _ => assert_eq!(ty.kind(), kind, "{kind}"),
        }
    }
}

#[test]
fn scalar_descriptors_are_valid_by_default() {
    for kind in ALL_KINDS {
        if matches!(kind, Kind::None | Kind::List | Kind::Lookup) {
            continue;
        }

        assert_eq!(Type::of(kind).validate_descriptor(), Ok(()), "{kind}");
    }
}

#[test]
fn codec_keeps_previous_value_on_failure() {
    let mut codec = Type::of(Kind::Int32).new_codec();
    assert!(codec.is_null());

    codec.decode("42").unwrap();
    assert_eq!(codec.value(), &Value::Int(42));

    let err = codec.decode("forty-two").unwrap_err();
    assert_eq!(err.class(), ErrorClass::Conversion);
    assert_eq!(codec.value(), &Value::Int(42));
    assert_eq!(codec.validate_value(), Ok(()));

    codec.decode(Option::<i32>::None).unwrap();
    assert!(codec.is_null());
}

#[test]
fn nil_decodes_to_null_for_every_defined_type() {
    for kind in ALL_KINDS {
        if kind == Kind::None {
            continue;
        }

        assert_eq!(Type::of(kind).decode(json!(null)), Ok(Value::Null), "{kind}");
    }
}

#[test]
fn undefined_type_fails_every_operation() {
    let ty = Type::undefined();

    assert_eq!(ty.decode(1), Err(TypeError::NoType));
    assert_eq!(ty.validate_descriptor(), Err(TypeError::NoType));
    assert_eq!(ty.validate_value(&Value::Null), Err(TypeError::NoType));
}

#[test]
fn list_decodes_wire_and_native_sequences() {
    let ty = Type::from_field(
        &FieldSpec::list("ids", TypeSpec::Int(IntSpec::between(0, 10))),
        &super::TypeContext::default(),
    );

    assert_eq!(ty.validate_descriptor(), Ok(()));
    assert_eq!(ty.elem().unwrap().kind(), Kind::Int);
    assert_eq!(
        ty.decode(json!([1, "2", 3])),
        Ok(Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)]))
    );
    assert_eq!(
        ty.decode(Value::list([Value::from(4), Value::from("5")])),
        Ok(Value::List(vec![Value::Int(4), Value::Int(5)]))
    );
}

#[test]
fn empty_list_is_not_null() {
    let ty = Type::from_field(
        &FieldSpec::list("tags", TypeSpec::String(crate::model::TextSpec::default())),
        &super::TypeContext::default(),
    );

    assert_eq!(ty.decode(json!([])), Ok(Value::List(Vec::new())));
    assert_eq!(ty.decode(json!(null)), Ok(Value::Null));
}

#[test]
fn list_rejects_elements_out_of_bounds() {
    let ty = Type::from_field(
        &FieldSpec::list("ids", TypeSpec::Int(IntSpec::between(0, 10))),
        &super::TypeContext::default(),
    );

    let err = ty.decode(json!([1, 11])).unwrap_err();
    assert_eq!(err.code(), Some("type.int.max.violation"));
}

#[test]
fn list_rejects_non_sequences() {
    let ty = Type::from_field(
        &FieldSpec::list("ids", TypeSpec::of(Kind::Int).unwrap()),
        &super::TypeContext::default(),
    );

    assert_eq!(
        ty.decode(json!({"a": 1})),
        Err(TypeError::UnsupportedTag {
            tag: "struct",
            kind: Kind::List,
        })
    );
    assert!(matches!(ty.decode(5), Err(TypeError::Convert { .. })));
}

#[test]
fn nested_lists_collapse() {
    let inner = Type::from_field(
        &FieldSpec::list("ids", TypeSpec::of(Kind::Int64).unwrap()),
        &super::TypeContext::default(),
    );
    let outer = super::ListType::new(inner);

    assert_eq!(outer.elem().kind(), Kind::Int64);
}

#[test]
fn list_without_element_type_is_invalid() {
    assert!(matches!(
        Type::of(Kind::List).validate_descriptor(),
        Err(TypeError::Descriptor {
            kind: Kind::List,
            ..
        })
    ));
}

#[test]
fn lookup_resolves_once_and_types_the_id() {
    let calls = Arc::new(AtomicUsize::new(0));
    let ty = LookupType::new(5, "dictionaries/cities", Some(counting_lookup(Arc::clone(&calls))));

    assert!(!ty.is_resolved());
    assert_eq!(ty.validate_descriptor(), Ok(()));
    assert!(ty.is_resolved());

    let ty = Type::Lookup(ty);
    assert_eq!(
        ty.decode(" 17 "),
        Ok(Value::Lookup(Lookup::new("17")))
    );
    assert_eq!(
        ty.decode(json!({"ID": 18, "name": "Kyiv"})),
        Ok(Value::Lookup(Lookup::new("18").with_name("Kyiv")))
    );
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn lookup_id_is_checked_against_the_primary_type() {
    let calls = Arc::new(AtomicUsize::new(0));
    let ty = LookupType::new(5, "dictionaries/cities", Some(counting_lookup(calls)));

    let err = Type::Lookup(ty.clone()).decode("abc").unwrap_err();
    assert!(matches!(err, TypeError::LookupId { .. }));
    assert_eq!(err.class(), ErrorClass::Conversion);

    let err = Type::Lookup(ty.clone()).decode(2000).unwrap_err();
    assert_eq!(err.class(), ErrorClass::ConstraintViolation);
    assert_eq!(err.code(), Some("type.int.max.violation"));

    assert_eq!(ty.typed_id(&Lookup::new("7")), Ok(Value::Int(7)));
}

#[test]
fn lookup_requires_an_id() {
    let ty = Type::Lookup(LookupType::bound(&cities()));

    let err = ty
        .decode(json!({"name": "Lviv"}))
        .unwrap_err();
    assert_eq!(err.code(), Some("type.lookup.id.required"));
    assert_eq!(ty.decode(""), Ok(Value::Null));
    assert_eq!(ty.decode(json!({})), Ok(Value::Null));
}

#[test]
fn lookup_struct_rejects_unknown_keys() {
    let ty = Type::Lookup(LookupType::bound(&cities()));

    assert!(matches!(
        ty.decode(json!({"id": 1, "zip": "01001"})),
        Err(TypeError::Parse { .. })
    ));
}

#[test]
fn unresolved_lookup_is_structural() {
    let lookup: Arc<dyn DictionaryLookup> =
        Arc::new(|_: i64, _: &str| -> Result<Option<Arc<Dictionary>>, Error> { Ok(None) });
    let ty = LookupType::new(1, "nowhere", Some(lookup));

    let err = ty.validate_descriptor().unwrap_err();
    assert_eq!(
        err,
        TypeError::LookupUnresolved {
            path: "nowhere".into()
        }
    );
    assert_eq!(err.class(), ErrorClass::Structural);
    assert!(!ty.is_resolved());
}

#[test]
fn self_referencing_lookup_uses_its_owner() {
    let lookup: Arc<dyn DictionaryLookup> =
        Arc::new(|_: i64, _: &str| -> Result<Option<Arc<Dictionary>>, Error> { Ok(None) });
    let people = Dictionary::with_lookup(
        0,
        DatasetSpec::new("people", "people")
            .with_field(FieldSpec::of_kind("id", Kind::Uint64))
            .with_field(FieldSpec::new("manager", TypeSpec::lookup("people")))
            .with_primary("id"),
        lookup,
    );

    assert_eq!(people.validate(), Ok(()));

    let manager = people.fields().by_name("manager").unwrap();
    assert_eq!(
        manager.ty().decode(3),
        Ok(Value::Lookup(Lookup::new("3")))
    );
    assert!(manager.ty().decode(-3).is_err());
}
