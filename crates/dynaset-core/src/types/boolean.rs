use crate::{
    types::{TypeError, text_input},
    value::{Input, Value},
};
use dynaset_primitives::Kind;

///
/// BoolType
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct BoolType;

impl BoolType {
    pub(crate) fn decode(self, input: Input) -> Result<Value, TypeError> {
        match input {
            Input::Null => Ok(Value::Null),
            Input::Value(Value::Bool(v)) => Ok(Value::Bool(v)),
            Input::Value(Value::Text(s)) => match text_input(&s) {
                None => Ok(Value::Null),
                Some(text) => parse_bool(text)
                    .map(Value::Bool)
                    .ok_or_else(|| TypeError::parse(text, Kind::Bool)),
            },
            Input::Value(v) => Err(TypeError::convert(v.label(), Kind::Bool)),
            other @ (Input::Struct(_) | Input::List(_)) => Err(TypeError::UnsupportedTag {
                tag: other.label(),
                kind: Kind::Bool,
            }),
        }
    }

    pub(crate) fn validate(self, value: &Value) -> Result<(), TypeError> {
        match value {
            Value::Null | Value::Bool(_) => Ok(()),
            other => Err(TypeError::convert(other.label(), Kind::Bool)),
        }
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    match text {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

///
/// TESTS
///
