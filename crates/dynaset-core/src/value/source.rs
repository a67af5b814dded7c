use crate::value::{Lookup, Value, WireMap, WireValue};
use chrono::{DateTime, TimeDelta, Utc};

///
/// Source
///
/// Anything a codec can be asked to decode.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub enum Source {
    #[default]
    Null,

    /// A native value, including one already normalized by another codec.
    Value(Value),

    /// A generic tagged value as received from the transport boundary.
    Wire(WireValue),

    /// A well-known boxed scalar.
    Wrapper(Wrapper),
}

impl Source {
    /// Collapse every representation into the shape codecs dispatch on.
    pub(crate) fn into_input(self) -> Input {
        match self {
            Self::Null | Self::Value(Value::Null) => Input::Null,
            Self::Value(v) => Input::Value(v),
            Self::Wrapper(w) => Input::Value(w.into_value()),
            Self::Wire(wire) => Input::from_wire(wire),
        }
    }
}

impl From<Value> for Source {
    fn from(v: Value) -> Self {
        Self::Value(v)
    }
}

impl From<WireValue> for Source {
    fn from(v: WireValue) -> Self {
        Self::Wire(v)
    }
}

impl From<Wrapper> for Source {
    fn from(v: Wrapper) -> Self {
        Self::Wrapper(v)
    }
}

impl<T: Into<Self>> From<Option<T>> for Source {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

macro_rules! impl_source_from_native {
    ( $( $ty:ty ),* $(,)? ) => {
        $(
            impl From<$ty> for Source {
                fn from(v: $ty) -> Self {
                    Self::Value(Value::from(v))
                }
            }
        )*
    };
}

impl_source_from_native!(
    bool,
    i8,
    i16,
    i32,
    i64,
    u8,
    u16,
    u32,
    u64,
    f32,
    f64,
    Vec<u8>,
    String,
    &str,
    DateTime<Utc>,
    TimeDelta,
    Lookup,
);

///
/// Wrapper
///
/// Boxed scalar forms used by message-oriented transports.
///

#[derive(Clone, Debug, PartialEq)]
pub enum Wrapper {
    Bool(bool),
    Int32(i32),
    Int64(i64),
    UInt32(u32),
    UInt64(u64),
    Float(f32),
    Double(f64),
    String(String),
    Bytes(Vec<u8>),
}

impl Wrapper {
    #[must_use]
    pub fn into_value(self) -> Value {
        match self {
            Self::Bool(v) => Value::Bool(v),
            Self::Int32(v) => Value::Int(v.into()),
            Self::Int64(v) => Value::Int(v),
            Self::UInt32(v) => Value::Uint(v.into()),
            Self::UInt64(v) => Value::Uint(v),
            Self::Float(v) => Value::Float(v.into()),
            Self::Double(v) => Value::Float(v),
            Self::String(v) => Value::Text(v),
            Self::Bytes(v) => Value::Binary(v),
        }
    }
}

///
/// Input
///
/// Normalized decode input. Wire scalars and wrappers become native values;
/// only the structured wire tags survive as their own variants.
///

#[derive(Debug)]
pub(crate) enum Input {
    Null,
    Value(Value),
    Struct(WireMap),
    List(Vec<WireValue>),
}

impl Input {
    fn from_wire(wire: WireValue) -> Self {
        match wire {
            WireValue::Null => Self::Null,
            WireValue::Bool(v) => Self::Value(Value::Bool(v)),
            WireValue::Number(n) => {
                if let Some(v) = n.as_i64() {
                    Self::Value(Value::Int(v))
                } else if let Some(v) = n.as_u64() {
                    Self::Value(Value::Uint(v))
                } else {
                    Self::Value(Value::Float(n.as_f64().unwrap_or(f64::NAN)))
                }
            }
            WireValue::String(v) => Self::Value(Value::Text(v)),
            WireValue::Array(items) => Self::List(items),
            WireValue::Object(map) => Self::Struct(map),
        }
    }

    /// Label naming the source in conversion errors.
    pub(crate) const fn label(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Value(v) => v.label(),
            Self::Struct(_) => "struct",
            Self::List(_) => "list",
        }
    }
}
