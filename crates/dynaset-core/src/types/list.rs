use crate::{
    types::{Type, TypeError},
    value::{Input, Source, Value},
};
use dynaset_primitives::Kind;

///
/// ListType
///
/// Ordered values of one element type. A list of lists collapses into
/// a single list.
///

#[derive(Clone, Debug)]
pub struct ListType {
    elem: Box<Type>,
}

impl ListType {
    #[must_use]
    pub fn new(elem: Type) -> Self {
        match elem {
            Type::List(list) => list,
            other => Self {
                elem: Box::new(other),
            },
        }
    }

    #[must_use]
    pub fn elem(&self) -> &Type {
        &self.elem
    }

    pub(crate) fn validate_descriptor(&self) -> Result<(), TypeError> {
        if matches!(*self.elem, Type::Undefined(_)) {
            return Err(TypeError::descriptor(Kind::List, "list[type] undefined"));
        }

        self.elem.validate_descriptor()
    }

    pub(crate) fn decode(&self, input: Input) -> Result<Value, TypeError> {
        let items: Vec<Source> = match input {
            Input::Null => return Ok(Value::Null),
            Input::Value(Value::List(items)) => items.into_iter().map(Source::Value).collect(),
            Input::List(items) => items.into_iter().map(Source::Wire).collect(),
            Input::Value(v) => return Err(TypeError::convert(v.label(), Kind::List)),
            Input::Struct(_) => {
                return Err(TypeError::UnsupportedTag {
                    tag: "struct",
                    kind: Kind::List,
                });
            }
        };

        items
            .into_iter()
            .map(|item| self.elem.decode_input(item.into_input()))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List)
    }

    pub(crate) fn validate(&self, value: &Value) -> Result<(), TypeError> {
        match value {
            Value::Null => Ok(()),
            Value::List(items) => items
                .iter()
                .try_for_each(|item| self.elem.validate_value(item)),
            other => Err(TypeError::convert(other.label(), Kind::List)),
        }
    }
}
