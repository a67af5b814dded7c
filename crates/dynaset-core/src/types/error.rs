use crate::error::ErrorClass;
use dynaset_primitives::Kind;
use thiserror::Error as ThisError;

///
/// TypeError
///
/// Failures raised while building a type, decoding a source, or
/// validating a decoded value.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum TypeError {
    #[error("cannot convert {from} into {kind}")]
    Convert { from: &'static str, kind: Kind },

    #[error("cannot convert wire {tag} into {kind}")]
    UnsupportedTag { tag: &'static str, kind: Kind },

    #[error("cannot parse {input:?} as {kind}")]
    Parse { input: String, kind: Kind },

    #[error("cannot convert {value} into {kind} without loss")]
    Inexact { value: String, kind: Kind },

    #[error(transparent)]
    Violation(#[from] Violation),

    #[error("{kind}: invalid descriptor; {reason}")]
    Descriptor { kind: Kind, reason: String },

    #[error("type undefined")]
    NoType,

    #[error("type undefined; {0}")]
    Undefined(String),

    #[error("lookup( path: {path:?} ) not found")]
    LookupUnresolved { path: String },

    #[error("lookup( id: {id} ); {cause}")]
    LookupId { id: String, cause: Box<Self> },
}

impl TypeError {
    pub(crate) const fn convert(from: &'static str, kind: Kind) -> Self {
        Self::Convert { from, kind }
    }

    pub(crate) fn parse(input: &str, kind: Kind) -> Self {
        Self::Parse {
            input: input.to_string(),
            kind,
        }
    }

    pub(crate) fn descriptor(kind: Kind, reason: impl Into<String>) -> Self {
        Self::Descriptor {
            kind,
            reason: reason.into(),
        }
    }

    pub(crate) fn violation(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Violation(Violation::new(code, message))
    }

    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Convert { .. }
            | Self::UnsupportedTag { .. }
            | Self::Parse { .. }
            | Self::Inexact { .. } => ErrorClass::Conversion,
            Self::Violation(_) => ErrorClass::ConstraintViolation,
            Self::Descriptor { .. }
            | Self::NoType
            | Self::Undefined(_)
            | Self::LookupUnresolved { .. } => ErrorClass::Structural,
            Self::LookupId { cause, .. } => cause.class(),
        }
    }

    /// Machine-readable violation code, if this error carries one.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Violation(v) => Some(&v.code),
            Self::LookupId { cause, .. } => cause.code(),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_violation(&self) -> bool {
        self.class() == ErrorClass::ConstraintViolation
    }
}

///
/// Violation
///
/// A decoded value outside the bounds of its type.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("{message}")]
pub struct Violation {
    pub code: String,
    pub message: String,
}

impl Violation {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}
