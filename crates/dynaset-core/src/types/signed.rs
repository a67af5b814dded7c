use crate::{
    model::IntSpec,
    types::{TypeError, text_input},
    value::{Input, Value},
};
use dynaset_primitives::Kind;
use std::num::IntErrorKind;

///
/// SignedType
///
/// Signed integer of 8, 16, 32 or 64 bits. The bit width fixes the base
/// range; a descriptor may narrow it.
///

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedType {
    kind: Kind,
    bits: u8,
    min: i64,
    max: i64,
    error: Option<TypeError>,
}

impl SignedType {
    /// Build from a signed kind (`int` is 32 bits).
    #[must_use]
    pub fn new(kind: Kind, spec: Option<&IntSpec>) -> Self {
        let bits = if kind == Kind::Int64 { 64 } else { 32 };

        Self::with_bits(kind, bits, spec)
    }

    /// Build with an explicit base width.
    #[must_use]
    pub fn with_bits(kind: Kind, bits: u8, spec: Option<&IntSpec>) -> Self {
        let Some((base_min, base_max)) = base_range(bits) else {
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
            min: base_min,
            max: base_max,
            error: None,
        };
        if let Some(spec) = spec {
            ty.narrow(spec, base_min, base_max);
        }

        ty
    }

    fn narrow(&mut self, spec: &IntSpec, base_min: i64, base_max: i64) {
        let min = spec.min.unwrap_or(base_min);
        let max = spec.max.unwrap_or(base_max);
        let bits = self.bits;

        self.error = if min < base_min || min > base_max {
            Some(TypeError::descriptor(
                self.kind,
                format!("int{bits}: invalid lower bound {min}; min: {base_min}"),
            ))
        } else if max > base_max || max < base_min {
            Some(TypeError::descriptor(
                self.kind,
                format!("int{bits}: invalid upper bound {max}; max: {base_max}"),
            ))
        } else if min >= max {
            Some(TypeError::descriptor(
                self.kind,
                format!("int{bits}: invalid range [{min}, {max}]"),
            ))
        } else {
            None
        };

        if self.error.is_none() {
            self.min = min;
            self.max = max;
        }
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
    pub const fn min(&self) -> i64 {
        self.min
    }

    #[must_use]
    pub const fn max(&self) -> i64 {
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
                Some(text) => self.parse(text)?,
            },
            Input::Value(v) => return Err(TypeError::convert(v.label(), self.kind)),
            other @ (Input::Struct(_) | Input::List(_)) => {
                return Err(TypeError::UnsupportedTag {
                    tag: other.label(),
                    kind: self.kind,
                });
            }
        };

        self.accept(wide).map(Value::Int)
    }

    fn parse(&self, text: &str) -> Result<i128, TypeError> {
        text.parse::<i128>().map_err(|err| match err.kind() {
            IntErrorKind::PosOverflow => self.above(text),
            IntErrorKind::NegOverflow => self.below(text),
            _ => TypeError::parse(text, self.kind),
        })
    }

    fn accept(&self, v: i128) -> Result<i64, TypeError> {
        if v < i128::from(self.min) {
            return Err(self.below(v));
        }
        if v > i128::from(self.max) {
            return Err(self.above(v));
        }

        i64::try_from(v).map_err(|_| self.above(v))
    }

    pub(crate) fn validate(&self, value: &Value) -> Result<(), TypeError> {
        match value {
            Value::Null => Ok(()),
            Value::Int(v) => self.accept(i128::from(*v)).map(|_| ()),
            other => Err(TypeError::convert(other.label(), self.kind)),
        }
    }

    fn below(&self, v: impl std::fmt::Display) -> TypeError {
        TypeError::violation(
            "type.int.min.violation",
            format!("{}: invalid value: {v}; min: {}", self.kind, self.min),
        )
    }

    fn above(&self, v: impl std::fmt::Display) -> TypeError {
        TypeError::violation(
            "type.int.max.violation",
            format!("{}: invalid value: {v}; max: {}", self.kind, self.max),
        )
    }
}

/// Base `[min, max]` of a supported bit width.
pub(crate) const fn base_range(bits: u8) -> Option<(i64, i64)> {
    match bits {
        8 => Some((i8::MIN as i64, i8::MAX as i64)),
        16 => Some((i16::MIN as i64, i16::MAX as i64)),
        32 => Some((i32::MIN as i64, i32::MAX as i64)),
        64 => Some((i64::MIN, i64::MAX)),
        _ => None,
    }
}

/// Whole-number floats widen losslessly; anything else is rejected.
#[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
pub(crate) fn integral(v: f64) -> Option<i128> {
    (v.is_finite() && v.trunc() == v).then(|| v as i128)
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Source;
    use serde_json::json;

    fn decode(ty: &SignedType, src: impl Into<Source>) -> Result<Value, TypeError> {
        ty.decode(src.into().into_input())
    }

    #[test]
    fn int32_accepts_its_upper_bound_and_rejects_beyond() {
        let ty = SignedType::new(Kind::Int32, None);

        assert_eq!(decode(&ty, "2147483647"), Ok(Value::Int(2_147_483_647)));

        let err = decode(&ty, "2147483648").unwrap_err();
        assert!(err.is_violation());
        assert_eq!(err.code(), Some("type.int.max.violation"));
    }

    #[test]
    fn strings_are_trimmed_and_empty_is_null() {
        let ty = SignedType::new(Kind::Int64, None);

        assert_eq!(decode(&ty, "  -12 "), Ok(Value::Int(-12)));
        assert_eq!(decode(&ty, "   "), Ok(Value::Null));
        assert!(matches!(
            decode(&ty, "twelve"),
            Err(TypeError::Parse { .. })
        ));
    }

    #[test]
    fn overflowing_text_is_a_violation_not_a_parse_error() {
        let ty = SignedType::new(Kind::Int64, None);
        let err = decode(&ty, "-999999999999999999999999999999999999999999").unwrap_err();

        assert_eq!(err.code(), Some("type.int.min.violation"));
    }

    #[test]
    fn wire_numbers_must_be_integral() {
        let ty = SignedType::new(Kind::Int, None);

        assert_eq!(decode(&ty, json!(7.0)), Ok(Value::Int(7)));
        assert!(matches!(
            decode(&ty, json!(7.5)),
            Err(TypeError::Inexact { .. })
        ));
        assert!(matches!(
            decode(&ty, json!({"v": 1})),
            Err(TypeError::UnsupportedTag { tag: "struct", .. })
        ));
    }

    #[test]
    fn configured_bounds_narrow_the_base_range() {
        let ty = SignedType::new(Kind::Int32, Some(&IntSpec::between(1, 10)));
        assert!(ty.validate_descriptor().is_ok());

        assert_eq!(decode(&ty, 10_i32), Ok(Value::Int(10)));
        assert_eq!(
            decode(&ty, 0_i32).unwrap_err().code(),
            Some("type.int.min.violation")
        );
    }

    #[test]
    fn bounds_outside_the_base_range_are_descriptor_errors() {
        let wide = IntSpec::between(0, i64::from(i32::MAX) + 1);
        let ty = SignedType::new(Kind::Int32, Some(&wide));
        assert!(matches!(
            ty.validate_descriptor(),
            Err(TypeError::Descriptor { .. })
        ));

        let inverted = SignedType::with_bits(Kind::Int, 8, Some(&IntSpec::between(5, 5)));
        assert!(inverted.validate_descriptor().is_err());

        let odd = SignedType::with_bits(Kind::Int, 12, None);
        assert!(odd.validate_descriptor().is_err());
    }

    #[test]
    fn eight_bit_base_range() {
        let ty = SignedType::with_bits(Kind::Int, 8, None);

        assert_eq!(ty.min(), -128);
        assert_eq!(ty.max(), 127);
        assert!(decode(&ty, 128_i32).unwrap_err().is_violation());
    }

    #[test]
    fn other_natives_are_conversion_errors() {
        let ty = SignedType::new(Kind::Int32, None);
        let err = decode(&ty, true).unwrap_err();

        assert_eq!(err.to_string(), "cannot convert bool into int32");
    }
}
