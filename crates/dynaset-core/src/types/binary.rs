use crate::{
    model::BinarySpec,
    types::{TypeError, text_input},
    value::{Input, Value},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use dynaset_primitives::Kind;

///
/// BinaryType
///
/// Raw bytes; text input is read as standard base64.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct BinaryType {
    max_bytes: Option<usize>,
}

impl BinaryType {
    #[must_use]
    pub fn new(spec: Option<&BinarySpec>) -> Self {
        Self {
            max_bytes: spec.and_then(|s| s.max_bytes),
        }
    }

    #[must_use]
    pub const fn max_bytes(&self) -> Option<usize> {
        self.max_bytes
    }

    pub(crate) fn decode(self, input: Input) -> Result<Value, TypeError> {
        let bytes = match input {
            Input::Null => return Ok(Value::Null),
            Input::Value(Value::Binary(v)) => v,
            Input::Value(Value::Text(s)) => match text_input(&s) {
                None => return Ok(Value::Null),
                Some(text) => STANDARD
                    .decode(text)
                    .map_err(|_| TypeError::parse(text, Kind::Binary))?,
            },
            Input::Value(v) => return Err(TypeError::convert(v.label(), Kind::Binary)),
            other @ (Input::Struct(_) | Input::List(_)) => {
                return Err(TypeError::UnsupportedTag {
                    tag: other.label(),
                    kind: Kind::Binary,
                });
            }
        };

        self.check(&bytes)?;

        Ok(Value::Binary(bytes))
    }

    fn check(self, bytes: &[u8]) -> Result<(), TypeError> {
        match self.max_bytes {
            Some(max) if bytes.len() > max => Err(TypeError::violation(
                "type.binary.max_bytes.violation",
                format!(
                    "binary value of {} bytes violates max boundary of: {max} bytes",
                    bytes.len()
                ),
            )),
            _ => Ok(()),
        }
    }

    pub(crate) fn validate(self, value: &Value) -> Result<(), TypeError> {
        match value {
            Value::Null => Ok(()),
            Value::Binary(v) => self.check(v),
            other => Err(TypeError::convert(other.label(), Kind::Binary)),
        }
    }
}

///
/// TESTS
///
