//! Closed family of value types and the codec that decodes values into them.

mod binary;
mod boolean;
mod datetime;
mod duration;
mod error;
mod float;
mod list;
mod lookup;
mod signed;
mod string;
mod undefined;
mod unsigned;

#[cfg(test)]
mod tests;

use crate::{
    model::{DictionaryLookup, FieldSpec, TypeSpec},
    value::{Input, Source, Value},
};
use dynaset_primitives::Kind;
use std::sync::Arc;

// re-exports
pub use binary::BinaryType;
pub use boolean::BoolType;
pub use datetime::{
    DEFAULT_LAYOUT, DateTimeType, Precision, cast_from_number, cast_to_number,
    from_float_timestamp, from_timestamp,
};
pub use duration::{DurationType, format_duration, parse_duration};
pub use error::{TypeError, Violation};
pub use float::FloatType;
pub use list::ListType;
pub use lookup::{LookupTarget, LookupType};
pub use signed::SignedType;
pub use string::StringType;
pub use undefined::UndefinedType;
pub use unsigned::UnsignedType;

///
/// Type
///
/// Immutable value type. One variant per codec family; the kind carried
/// by each variant distinguishes widths and text flavours.
///

#[derive(Clone, Debug)]
pub enum Type {
    Undefined(UndefinedType),
    Bool(BoolType),
    Signed(SignedType),
    Unsigned(UnsignedType),
    Float(FloatType),
    Binary(BinaryType),
    String(StringType),
    DateTime(DateTimeType),
    Duration(DurationType),
    List(ListType),
    Lookup(LookupType),
}

impl Type {
    #[must_use]
    pub const fn undefined() -> Self {
        Self::Undefined(UndefinedType::new())
    }

    /// Unconstrained type of `kind`; lookups and lists need a descriptor.
    #[must_use]
    pub fn of(kind: Kind) -> Self {
        Self::build(kind, TypeSpec::of(kind).as_ref(), &TypeContext::default())
    }

    /// Build the type described by a field definition.
    pub(crate) fn from_field(spec: &FieldSpec, ctx: &TypeContext) -> Self {
        Self::build(spec.resolved_kind(), spec.type_spec.as_ref(), ctx)
    }

    fn build(kind: Kind, spec: Option<&TypeSpec>, ctx: &TypeContext) -> Self {
        match kind {
            Kind::None => Self::undefined(),
            Kind::List => {
                let elem_kind = spec.map_or(Kind::None, TypeSpec::kind);

                Self::List(ListType::new(Self::build(elem_kind, spec, ctx)))
            }
            Kind::Bool => Self::Bool(BoolType),
            Kind::Int | Kind::Int32 | Kind::Int64 => {
                Self::Signed(SignedType::new(kind, spec.and_then(TypeSpec::as_int)))
            }
            Kind::Uint | Kind::Uint32 | Kind::Uint64 => {
                Self::Unsigned(UnsignedType::new(kind, spec.and_then(TypeSpec::as_uint)))
            }
            Kind::Float | Kind::Float32 | Kind::Float64 => {
                Self::Float(FloatType::new(kind, spec.and_then(TypeSpec::as_float)))
            }
            Kind::Binary => Self::Binary(BinaryType::new(spec.and_then(TypeSpec::as_binary))),
            Kind::String | Kind::Richtext => {
                Self::String(StringType::new(kind, spec.and_then(TypeSpec::as_text)))
            }
            Kind::Datetime => {
                Self::DateTime(DateTimeType::new(spec.and_then(TypeSpec::as_datetime)))
            }
            Kind::Duration => {
                Self::Duration(DurationType::new(spec.and_then(TypeSpec::as_duration)))
            }
            Kind::Lookup => Self::Lookup(LookupType::from_context(
                spec.and_then(TypeSpec::as_lookup),
                ctx,
            )),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> Kind {
        match self {
            Self::Undefined(_) => Kind::None,
            Self::Bool(_) => Kind::Bool,
            Self::Signed(t) => t.kind(),
            Self::Unsigned(t) => t.kind(),
            Self::Float(t) => t.kind(),
            Self::Binary(_) => Kind::Binary,
            Self::String(t) => t.kind(),
            Self::DateTime(_) => Kind::Datetime,
            Self::Duration(_) => Kind::Duration,
            Self::List(_) => Kind::List,
            Self::Lookup(_) => Kind::Lookup,
        }
    }

    /// Element type of a list.
    #[must_use]
    pub fn elem(&self) -> Option<&Self> {
        match self {
            Self::List(list) => Some(list.elem()),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined(_))
    }

    /// Fresh codec holding NULL.
    #[must_use]
    pub fn new_codec(&self) -> Codec {
        Codec {
            ty: self.clone(),
            value: Value::Null,
        }
    }

    /// Check the descriptor itself, independent of any value.
    pub fn validate_descriptor(&self) -> Result<(), TypeError> {
        match self {
            Self::Undefined(t) => Err(t.error()),
            Self::Signed(t) => t.validate_descriptor(),
            Self::Unsigned(t) => t.validate_descriptor(),
            Self::Float(t) => t.validate_descriptor(),
            Self::Duration(t) => t.validate_descriptor(),
            Self::List(t) => t.validate_descriptor(),
            Self::Lookup(t) => t.validate_descriptor(),
            Self::Bool(_) | Self::Binary(_) | Self::String(_) | Self::DateTime(_) => Ok(()),
        }
    }

    /// Decode and validate a source into a normalized value.
    pub fn decode(&self, src: impl Into<Source>) -> Result<Value, TypeError> {
        let value = self.decode_input(src.into().into_input())?;
        self.validate_value(&value)?;

        Ok(value)
    }

    pub(crate) fn decode_input(&self, input: Input) -> Result<Value, TypeError> {
        match self {
            Self::Undefined(t) => t.decode(),
            Self::Bool(t) => t.decode(input),
            Self::Signed(t) => t.decode(input),
            Self::Unsigned(t) => t.decode(input),
            Self::Float(t) => t.decode(input),
            Self::Binary(t) => t.decode(input),
            Self::String(t) => t.decode(input),
            Self::DateTime(t) => t.decode(input),
            Self::Duration(t) => t.decode(input),
            Self::List(t) => t.decode(input),
            Self::Lookup(t) => t.decode(input),
        }
    }

    /// Re-check a value against this type's constraints.
    pub fn validate_value(&self, value: &Value) -> Result<(), TypeError> {
        match self {
            Self::Undefined(t) => Err(t.error()),
            Self::Bool(t) => t.validate(value),
            Self::Signed(t) => t.validate(value),
            Self::Unsigned(t) => t.validate(value),
            Self::Float(t) => t.validate(value),
            Self::Binary(t) => t.validate(value),
            Self::String(t) => t.validate(value),
            Self::DateTime(t) => t.validate(value),
            Self::Duration(t) => t.validate(value),
            Self::List(t) => t.validate(value),
            Self::Lookup(t) => t.validate(value),
        }
    }
}

///
/// Codec
///
/// One value bound to one type. A failed decode leaves the previous
/// value in place.
///

#[derive(Clone, Debug)]
pub struct Codec {
    ty: Type,
    value: Value,
}

impl Codec {
    pub fn decode(&mut self, src: impl Into<Source>) -> Result<(), TypeError> {
        self.value = self.ty.decode(src)?;

        Ok(())
    }

    #[must_use]
    pub const fn value(&self) -> &Value {
        &self.value
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        self.value
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        self.value.is_null()
    }

    #[must_use]
    pub const fn ty(&self) -> &Type {
        &self.ty
    }

    pub fn validate_value(&self) -> Result<(), TypeError> {
        self.ty.validate_value(&self.value)
    }
}

///
/// TypeContext
///
/// What a field type needs from its owning dataset: the domain and path
/// used to resolve lookups, and the owner's primary field for lookups
/// that reference their own dictionary.
///

#[derive(Clone, Default)]
pub(crate) struct TypeContext {
    pub(crate) domain_id: i64,
    pub(crate) owner_path: String,
    pub(crate) owner_primary: Option<FieldSpec>,
    pub(crate) lookup: Option<Arc<dyn DictionaryLookup>>,
}

/// Trimmed text, or `None` when nothing but whitespace remains.
pub(crate) fn text_input(s: &str) -> Option<&str> {
    let trimmed = s.trim();

    (!trimmed.is_empty()).then_some(trimmed)
}
