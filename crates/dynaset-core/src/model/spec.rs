//! Serializable descriptors: datasets and fields defined as data.

use dynaset_primitives::Kind;
use serde::{Deserialize, Serialize};

///
/// DatasetSpec
///
/// Data definition of one dataset. `name` is the per-domain key, `path`
/// the hierarchical key (`dictionaries/cities`).
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct DatasetSpec {
    pub name: String,
    pub path: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub title: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub usage: String,

    pub fields: Vec<FieldSpec>,
    pub primary: String,

    /// Display field name, optionally a dotted path into a lookup.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub display: String,

    #[serde(skip_serializing_if = "is_false")]
    pub extendable: bool,
}

impl DatasetSpec {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    #[must_use]
    pub fn with_primary(mut self, primary: impl Into<String>) -> Self {
        self.primary = primary.into();
        self
    }

    #[must_use]
    pub fn with_display(mut self, display: impl Into<String>) -> Self {
        self.display = display.into();
        self
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    #[must_use]
    pub fn with_usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = usage.into();
        self
    }

    #[must_use]
    pub const fn extendable(mut self) -> Self {
        self.extendable = true;
        self
    }
}

///
/// FieldSpec
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct FieldSpec {
    pub id: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub title: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub usage: String,

    /// Explicit kind; `none` derives the kind from `type_spec`.
    #[serde(with = "kind_name", skip_serializing_if = "kind_name::is_none")]
    pub kind: Kind,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_spec: Option<TypeSpec>,

    #[serde(skip_serializing_if = "is_false")]
    pub readonly: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub required: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub disabled: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub hidden: bool,
}

impl FieldSpec {
    /// Field whose kind follows its type descriptor.
    pub fn new(id: impl Into<String>, type_spec: TypeSpec) -> Self {
        Self {
            id: id.into(),
            type_spec: Some(type_spec),
            ..Self::default()
        }
    }

    /// Field with an explicit kind and unconstrained type.
    pub fn of_kind(id: impl Into<String>, kind: Kind) -> Self {
        Self {
            id: id.into(),
            kind,
            ..Self::default()
        }
    }

    /// List field; the element kind follows `elem`.
    pub fn list(id: impl Into<String>, elem: TypeSpec) -> Self {
        Self {
            id: id.into(),
            kind: Kind::List,
            type_spec: Some(elem),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    #[must_use]
    pub fn with_usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = usage.into();
        self
    }

    #[must_use]
    pub const fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }

    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub const fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Configured kind, else the kind implied by the type descriptor.
    #[must_use]
    pub fn resolved_kind(&self) -> Kind {
        if self.kind.is_none() {
            self.type_spec.as_ref().map_or(Kind::None, TypeSpec::kind)
        } else {
            self.kind
        }
    }
}

///
/// TypeSpec
///
/// Type descriptor variants and their constraints.
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeSpec {
    Bool,
    Int(IntSpec),
    Int32(IntSpec),
    Int64(IntSpec),
    Uint(UintSpec),
    Uint32(UintSpec),
    Uint64(UintSpec),
    Float(FloatSpec),
    Float32(FloatSpec),
    Float64(FloatSpec),
    Binary(BinarySpec),
    Lookup(LookupSpec),
    String(TextSpec),
    Richtext(TextSpec),
    Datetime(DatetimeSpec),
    Duration(DurationSpec),
}

impl TypeSpec {
    #[must_use]
    pub const fn kind(&self) -> Kind {
        match self {
            Self::Bool => Kind::Bool,
            Self::Int(_) => Kind::Int,
            Self::Int32(_) => Kind::Int32,
            Self::Int64(_) => Kind::Int64,
            Self::Uint(_) => Kind::Uint,
            Self::Uint32(_) => Kind::Uint32,
            Self::Uint64(_) => Kind::Uint64,
            Self::Float(_) => Kind::Float,
            Self::Float32(_) => Kind::Float32,
            Self::Float64(_) => Kind::Float64,
            Self::Binary(_) => Kind::Binary,
            Self::Lookup(_) => Kind::Lookup,
            Self::String(_) => Kind::String,
            Self::Richtext(_) => Kind::Richtext,
            Self::Datetime(_) => Kind::Datetime,
            Self::Duration(_) => Kind::Duration,
        }
    }

    /// Shorthand for an unconstrained descriptor of `kind`.
    #[must_use]
    pub fn of(kind: Kind) -> Option<Self> {
        let spec = match kind {
            Kind::None | Kind::List => return None,
            Kind::Bool => Self::Bool,
            Kind::Int => Self::Int(IntSpec::default()),
            Kind::Int32 => Self::Int32(IntSpec::default()),
            Kind::Int64 => Self::Int64(IntSpec::default()),
            Kind::Uint => Self::Uint(UintSpec::default()),
            Kind::Uint32 => Self::Uint32(UintSpec::default()),
            Kind::Uint64 => Self::Uint64(UintSpec::default()),
            Kind::Float => Self::Float(FloatSpec::default()),
            Kind::Float32 => Self::Float32(FloatSpec::default()),
            Kind::Float64 => Self::Float64(FloatSpec::default()),
            Kind::Binary => Self::Binary(BinarySpec::default()),
            Kind::Lookup => Self::Lookup(LookupSpec::default()),
            Kind::String => Self::String(TextSpec::default()),
            Kind::Richtext => Self::Richtext(TextSpec::default()),
            Kind::Datetime => Self::Datetime(DatetimeSpec::default()),
            Kind::Duration => Self::Duration(DurationSpec::default()),
        };

        Some(spec)
    }

    pub fn lookup(path: impl Into<String>) -> Self {
        Self::Lookup(LookupSpec { path: path.into() })
    }

    #[must_use]
    pub const fn as_int(&self) -> Option<&IntSpec> {
        match self {
            Self::Int(s) | Self::Int32(s) | Self::Int64(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_uint(&self) -> Option<&UintSpec> {
        match self {
            Self::Uint(s) | Self::Uint32(s) | Self::Uint64(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_float(&self) -> Option<&FloatSpec> {
        match self {
            Self::Float(s) | Self::Float32(s) | Self::Float64(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_binary(&self) -> Option<&BinarySpec> {
        match self {
            Self::Binary(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_text(&self) -> Option<&TextSpec> {
        match self {
            Self::String(s) | Self::Richtext(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_datetime(&self) -> Option<&DatetimeSpec> {
        match self {
            Self::Datetime(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_duration(&self) -> Option<&DurationSpec> {
        match self {
            Self::Duration(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_lookup(&self) -> Option<&LookupSpec> {
        match self {
            Self::Lookup(s) => Some(s),
            _ => None,
        }
    }
}

///
/// IntSpec
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct IntSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<i64>,
}

impl IntSpec {
    #[must_use]
    pub const fn between(min: i64, max: i64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }
}

///
/// UintSpec
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct UintSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<u64>,
}

impl UintSpec {
    #[must_use]
    pub const fn between(min: u64, max: u64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }
}

///
/// FloatSpec
///

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct FloatSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

///
/// BinarySpec
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct BinarySpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_bytes: Option<usize>,
}

///
/// TextSpec
///
/// Zero bounds are unbounded.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct TextSpec {
    pub multiline: bool,
    pub max_bytes: usize,
    pub max_chars: usize,
}

impl TextSpec {
    #[must_use]
    pub const fn max_chars(max_chars: usize) -> Self {
        Self {
            multiline: false,
            max_bytes: 0,
            max_chars,
        }
    }
}

///
/// DatetimeSpec
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct DatetimeSpec {
    /// strftime-style layout used for text input and output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

///
/// DurationSpec
///
/// Bounds in whole seconds.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct DurationSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<i64>,
}

///
/// LookupSpec
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct LookupSpec {
    /// Path of the referenced dictionary.
    pub path: String,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn is_false(v: &bool) -> bool {
    !*v
}

mod kind_name {
    use dynaset_primitives::Kind;
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

    pub(super) fn serialize<S: Serializer>(kind: &Kind, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(kind.name())
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Kind, D::Error> {
        let name = String::deserialize(d)?;

        Kind::from_name(&name).ok_or_else(|| D::Error::custom(format!("unknown kind {name:?}")))
    }

    #[allow(clippy::trivially_copy_pass_by_ref)]
    pub(super) const fn is_none(kind: &Kind) -> bool {
        kind.is_none()
    }
}

///
/// TESTS
///
