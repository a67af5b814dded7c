use crate::{
    model::FloatSpec,
    types::{TypeError, text_input},
    value::{Input, Value},
};
use dynaset_primitives::Kind;

///
/// FloatType
///
/// Finite floating point number. Single precision values are normalized
/// through `f32` so they compare equal after a round trip.
///

#[derive(Clone, Debug, PartialEq)]
pub struct FloatType {
    kind: Kind,
    bits: u8,
    min: Option<f64>,
    max: Option<f64>,
}

impl FloatType {
    #[must_use]
    pub fn new(kind: Kind, spec: Option<&FloatSpec>) -> Self {
        let bits = if kind == Kind::Float32 { 32 } else { 64 };
        let spec = spec.copied().unwrap_or_default();

        Self {
            kind,
            bits,
            min: spec.min,
            max: spec.max,
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

    pub(crate) fn validate_descriptor(&self) -> Result<(), TypeError> {
        for bound in [self.min, self.max].into_iter().flatten() {
            if !bound.is_finite() {
                return Err(TypeError::descriptor(
                    self.kind,
                    format!("bound {bound} is not finite"),
                ));
            }
        }
        if let (Some(min), Some(max)) = (self.min, self.max)
            && min >= max
        {
            return Err(TypeError::descriptor(
                self.kind,
                format!("invalid range [{min}, {max}]"),
            ));
        }

        Ok(())
    }

    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn decode(&self, input: Input) -> Result<Value, TypeError> {
        let v = match input {
            Input::Null => return Ok(Value::Null),
            Input::Value(Value::Float(v)) => v,
            Input::Value(Value::Int(v)) => v as f64,
            Input::Value(Value::Uint(v)) => v as f64,
            Input::Value(Value::Text(s)) => match text_input(&s) {
                None => return Ok(Value::Null),
                Some(text) => text
                    .parse::<f64>()
                    .map_err(|_| TypeError::parse(text, self.kind))?,
            },
            Input::Value(v) => return Err(TypeError::convert(v.label(), self.kind)),
            other @ (Input::Struct(_) | Input::List(_)) => {
                return Err(TypeError::UnsupportedTag {
                    tag: other.label(),
                    kind: self.kind,
                });
            }
        };

        self.check(v)?;

        Ok(Value::Float(self.normalize(v)))
    }

    #[allow(clippy::cast_possible_truncation)]
    fn normalize(&self, v: f64) -> f64 {
        if self.bits == 32 {
            f64::from(v as f32)
        } else {
            v
        }
    }

    fn check(&self, v: f64) -> Result<(), TypeError> {
        if !v.is_finite() || (self.bits == 32 && v.abs() > f64::from(f32::MAX)) {
            return Err(TypeError::violation(
                "type.float.finite.violation",
                format!("{}: value {v} is not representable", self.kind),
            ));
        }
        if let Some(min) = self.min
            && v < min
        {
            return Err(TypeError::violation(
                "type.float.min.violation",
                format!("{}: invalid value: {v}; min: {min}", self.kind),
            ));
        }
        if let Some(max) = self.max
            && v > max
        {
            return Err(TypeError::violation(
                "type.float.max.violation",
                format!("{}: invalid value: {v}; max: {max}", self.kind),
            ));
        }

        Ok(())
    }

    pub(crate) fn validate(&self, value: &Value) -> Result<(), TypeError> {
        match value {
            Value::Null => Ok(()),
            Value::Float(v) => self.check(*v),
            other => Err(TypeError::convert(other.label(), self.kind)),
        }
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Source;

    fn decode(ty: &FloatType, src: impl Into<Source>) -> Result<Value, TypeError> {
        ty.decode(src.into().into_input())
    }

    #[test]
    fn integers_and_text_widen_to_float() {
        let ty = FloatType::new(Kind::Float, None);

        assert_eq!(decode(&ty, 3_i64), Ok(Value::Float(3.0)));
        assert_eq!(decode(&ty, " 2.5 "), Ok(Value::Float(2.5)));
        assert_eq!(decode(&ty, ""), Ok(Value::Null));
    }

    #[test]
    fn non_finite_values_are_rejected() {
        let ty = FloatType::new(Kind::Float64, None);

        assert_eq!(
            decode(&ty, "NaN").unwrap_err().code(),
            Some("type.float.finite.violation")
        );
        assert!(decode(&ty, f64::INFINITY).is_err());
    }

    #[test]
    fn float32_is_normalized_and_range_checked() {
        let ty = FloatType::new(Kind::Float32, None);

        let Ok(Value::Float(v)) = decode(&ty, 0.1_f64) else {
            panic!("expected a float");
        };
        assert!((v - f64::from(0.1_f32)).abs() < f64::EPSILON);
        assert!(decode(&ty, 1e300).unwrap_err().is_violation());
    }

    #[test]
    fn bounds() {
        let spec = FloatSpec {
            min: Some(0.0),
            max: Some(1.0),
        };
        let ty = FloatType::new(Kind::Float, Some(&spec));

        assert!(decode(&ty, 0.5).is_ok());
        assert_eq!(
            decode(&ty, -0.5).unwrap_err().code(),
            Some("type.float.min.violation")
        );
        assert_eq!(
            decode(&ty, 1.5).unwrap_err().code(),
            Some("type.float.max.violation")
        );

        let inverted = FloatType::new(
            Kind::Float,
            Some(&FloatSpec {
                min: Some(2.0),
                max: Some(1.0),
            }),
        );
        assert!(inverted.validate_descriptor().is_err());
    }
}
