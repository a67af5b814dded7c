use crate::{
    model::UintSpec,
    types::{TypeError, signed::integral, text_input},
    value::{Input, Value},
};
use dynaset_primitives::Kind;
use std::num::IntErrorKind;

///
/// UnsignedType
///

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnsignedType {
    kind: Kind,
    bits: u8,
    min: u64,
    max: u64,
    error: Option<TypeError>,
}

impl UnsignedType {
    /// Build from an unsigned kind (`uint` is 32 bits).
    #[must_use]
    pub fn new(kind: Kind, spec: Option<&UintSpec>) -> Self {
        let bits = if kind == Kind::Uint64 { 64 } else { 32 };

        Self::with_bits(kind, bits, spec)
    }

    #[must_use]
    pub fn with_bits(kind: Kind, bits: u8, spec: Option<&UintSpec>) -> Self {
        let Some(base_max) = base_max(bits) else {
            return Self {
                kind,
                bits,
                min: 0,
                max: 0,
                error: Some(TypeError::descriptor(
                    kind,
                    format!("unsupported bit width {bits}"),
                )),
            };
        };

        let mut ty = Self {
            kind,
            bits,
            min: 0,
            max: base_max,
            error: None,
        };

        if let Some(spec) = spec {
            let min = spec.min.unwrap_or(0);
            let max = spec.max.unwrap_or(base_max);

            ty.error = if min > base_max {
                Some(TypeError::descriptor(
                    kind,
                    format!("uint{bits}: invalid lower bound {min}; max: {base_max}"),
                ))
            } else if max > base_max {
                Some(TypeError::descriptor(
                    kind,
                    format!("uint{bits}: invalid upper bound {max}; max: {base_max}"),
                ))
            } else if min >= max {
                Some(TypeError::descriptor(
                    kind,
                    format!("uint{bits}: invalid range [{min}, {max}]"),
                ))
            } else {
                ty.min = min;
                ty.max = max;
                None
            };
        }

        ty
    }

    #[must_use]
    pub const fn kind(&self) -> Kind {
        self.kind
    }

    #[must_use]
    pub const fn bits(&self) -> u8 {
        self.bits
    }

    #[must_use]
    pub const fn min(&self) -> u64 {
        self.min
    }

    #[must_use]
    pub const fn max(&self) -> u64 {
        self.max
    }

    pub(crate) fn validate_descriptor(&self) -> Result<(), TypeError> {
        self.error.clone().map_or(Ok(()), Err)
    }

    pub(crate) fn decode(&self, input: Input) -> Result<Value, TypeError> {
        let wide = match input {
            Input::Null => return Ok(Value::Null),
            Input::Value(Value::Int(v)) => i128::from(v),
            Input::Value(Value::Uint(v)) => i128::from(v),
            Input::Value(Value::Float(v)) => integral(v).ok_or_else(|| TypeError::Inexact {
                value: v.to_string(),
                kind: self.kind,
            })?,
            Input::Value(Value::Text(s)) => match text_input(&s) {
                None => return Ok(Value::Null),
                Some(text) => text.parse::<i128>().map_err(|err| match err.kind() {
                    IntErrorKind::PosOverflow => self.above(text),
                    IntErrorKind::NegOverflow => self.below(text),
                    _ => TypeError::parse(text, self.kind),
                })?,
            },
            Input::Value(v) => return Err(TypeError::convert(v.label(), self.kind)),
            other @ (Input::Struct(_) | Input::List(_)) => {
                return Err(TypeError::UnsupportedTag {
                    tag: other.label(),
                    kind: self.kind,
                });
            }
        };

        self.accept(wide).map(Value::Uint)
    }

    fn accept(&self, v: i128) -> Result<u64, TypeError> {
        if v < i128::from(self.min) {
            return Err(self.below(v));
        }
        if v > i128::from(self.max) {
            return Err(self.above(v));
        }

        u64::try_from(v).map_err(|_| self.above(v))
    }

    pub(crate) fn validate(&self, value: &Value) -> Result<(), TypeError> {
        match value {
            Value::Null => Ok(()),
            Value::Uint(v) => self.accept(i128::from(*v)).map(|_| ()),
            other => Err(TypeError::convert(other.label(), self.kind)),
        }
    }

    fn below(&self, v: impl std::fmt::Display) -> TypeError {
        TypeError::violation(
            "type.uint.min.violation",
            format!("{}: invalid value: {v}; min: {}", self.kind, self.min),
        )
    }

    fn above(&self, v: impl std::fmt::Display) -> TypeError {
        TypeError::violation(
            "type.uint.max.violation",
            format!("{}: invalid value: {v}; max: {}", self.kind, self.max),
        )
    }
}

const fn base_max(bits: u8) -> Option<u64> {
    match bits {
        8 => Some(u8::MAX as u64),
        16 => Some(u16::MAX as u64),
        32 => Some(u32::MAX as u64),
        64 => Some(u64::MAX),
        _ => None,
    }
}

///
/// TESTS
///
