mod source;
mod wire;

#[cfg(test)]
mod tests;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

// re-exports
pub use source::{Source, Wrapper};
pub(crate) use source::Input;
pub use wire::{WireMap, WireValue};

///
/// Value
///
/// Normalized native value held by a codec or a record slot.
/// `Null` is the absence of a value; an empty `List` is a present value.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Binary(Vec<u8>),
    Text(String),
    DateTime(DateTime<Utc>),
    Duration(TimeDelta),
    Lookup(Lookup),
    List(Vec<Self>),
}

impl Value {
    /// Build a list value from anything convertible into values.
    pub fn list<T: Into<Self>>(items: impl IntoIterator<Item = T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Stable lower-case label used in conversion diagnostics.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Uint(_) => "uint",
            Self::Float(_) => "float",
            Self::Binary(_) => "binary",
            Self::Text(_) => "string",
            Self::DateTime(_) => "datetime",
            Self::Duration(_) => "duration",
            Self::Lookup(_) => "lookup",
            Self::List(_) => "list",
        }
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_uint(&self) -> Option<u64> {
        match self {
            Self::Uint(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::DateTime(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_duration(&self) -> Option<TimeDelta> {
        match self {
            Self::Duration(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_lookup(&self) -> Option<&Lookup> {
        match self {
            Self::Lookup(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[Self]> {
        match self {
            Self::List(v) => Some(v),
            _ => None,
        }
    }
}

macro_rules! impl_value_from {
    ( $( $ty:ty => $variant:ident ),* $(,)? ) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Self::$variant(v.into())
                }
            }
        )*
    };
}

impl_value_from! {
    bool => Bool,
    i8 => Int,
    i16 => Int,
    i32 => Int,
    i64 => Int,
    u8 => Uint,
    u16 => Uint,
    u32 => Uint,
    u64 => Uint,
    f32 => Float,
    f64 => Float,
    Vec<u8> => Binary,
    String => Text,
    &str => Text,
    DateTime<Utc> => DateTime,
    TimeDelta => Duration,
    Lookup => Lookup,
}

///
/// Lookup
///
/// Reference to a row of another dataset.
/// Only `id` identifies the target; `name` and `type` are display hints.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Lookup {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(default, rename = "type", skip_serializing_if = "String::is_empty")]
    pub type_path: String,
}

impl Lookup {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_type(mut self, type_path: impl Into<String>) -> Self {
        self.type_path = type_path.into();
        self
    }

    /// A lookup with no component set is treated as NULL.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.id.is_empty() && self.name.is_empty() && self.type_path.is_empty()
    }
}
