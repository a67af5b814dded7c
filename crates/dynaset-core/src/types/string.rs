use crate::{
    model::TextSpec,
    types::TypeError,
    value::{Input, Value},
};
use dynaset_primitives::Kind;

const PREVIEW_CHARS: usize = 16;
const PREVIEW_KEEP: usize = 14;

///
/// StringType
///
/// Text and rich text. Input is stored as given, without trimming.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct StringType {
    kind: Kind,
    spec: Option<TextSpec>,
}

impl StringType {
    #[must_use]
    pub fn new(kind: Kind, spec: Option<&TextSpec>) -> Self {
        Self {
            kind,
            spec: spec.copied(),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> Kind {
        self.kind
    }

    #[must_use]
    pub fn is_multiline(&self) -> bool {
        self.spec.is_none_or(|s| s.multiline)
    }

    pub(crate) fn decode(self, input: Input) -> Result<Value, TypeError> {
        let text = match input {
            Input::Null => return Ok(Value::Null),
            Input::Value(Value::Text(s)) => s,
            Input::Value(Value::Bool(v)) => v.to_string(),
            Input::Value(Value::Int(v)) => v.to_string(),
            Input::Value(Value::Uint(v)) => v.to_string(),
            Input::Value(Value::Float(v)) => v.to_string(),
            Input::Value(Value::Binary(bytes)) => String::from_utf8(bytes).map_err(|_| {
                TypeError::violation(
                    "type.string.encoding.violation",
                    "string value is not valid utf-8",
                )
            })?,
            Input::Value(v) => return Err(TypeError::convert(v.label(), self.kind)),
            other @ (Input::Struct(_) | Input::List(_)) => {
                return Err(TypeError::UnsupportedTag {
                    tag: other.label(),
                    kind: self.kind,
                });
            }
        };

        self.check(&text)?;

        Ok(Value::Text(text))
    }

    fn check(self, text: &str) -> Result<(), TypeError> {
        let Some(spec) = self.spec else {
            return Ok(());
        };

        if !spec.multiline && text.contains(['\n', '\r']) {
            return Err(TypeError::violation(
                "type.string.multiline.violation",
                format!("string {} violates multiline constraint", preview(text)),
            ));
        }
        if spec.max_bytes > 0 && text.len() > spec.max_bytes {
            return Err(TypeError::violation(
                "type.string.max_bytes.violation",
                format!(
                    "string {} violates max boundary of: {} bytes",
                    preview(text),
                    spec.max_bytes
                ),
            ));
        }
        if spec.max_chars > 0 && text.chars().count() > spec.max_chars {
            return Err(TypeError::violation(
                "type.string.max_chars.violation",
                format!(
                    "string {} violates max boundary of: {} characters",
                    preview(text),
                    spec.max_chars
                ),
            ));
        }

        Ok(())
    }

    pub(crate) fn validate(self, value: &Value) -> Result<(), TypeError> {
        match value {
            Value::Null => Ok(()),
            Value::Text(v) => self.check(v),
            other => Err(TypeError::convert(other.label(), self.kind)),
        }
    }
}

/// Quoted, shortened rendering of a value for violation messages.
fn preview(text: &str) -> String {
    let count = text.chars().count();
    if count <= PREVIEW_CHARS {
        return format!("{text:?}");
    }

    let head: String = text.chars().take(PREVIEW_KEEP).collect();

    format!("{:?}", format!("{head}..(+{})", count - PREVIEW_KEEP))
}

///
/// TESTS
///
