use crate::{types::TypeError, value::Value};

///
/// UndefinedType
///
/// Stand-in for a field without a usable kind. Every operation fails,
/// so callers never need to check for a missing type.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct UndefinedType {
    cause: Option<String>,
}

impl UndefinedType {
    #[must_use]
    pub const fn new() -> Self {
        Self { cause: None }
    }

    pub fn caused_by(cause: impl Into<String>) -> Self {
        Self {
            cause: Some(cause.into()),
        }
    }

    #[must_use]
    pub fn error(&self) -> TypeError {
        self.cause
            .clone()
            .map_or(TypeError::NoType, TypeError::Undefined)
    }

    pub(crate) fn decode(&self) -> Result<Value, TypeError> {
        Err(self.error())
    }
}
