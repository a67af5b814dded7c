use crate::{
    cache::CacheError, model::DatasetError, record::RecordError, registry::RegistryError,
    types::TypeError,
};
use std::fmt;
use thiserror::Error as ThisError;

///
/// Error
///
/// Structured error with a stable classification.
/// Every module error converts into this shape at the API boundary.
///

#[derive(Clone, Debug, ThisError)]
#[error("{message}")]
pub struct Error {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,

    /// Machine-readable code for constraint violations.
    pub code: Option<String>,
    pub message: String,
}

impl Error {
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            code: None,
            message: message.into(),
        }
    }

    /// Construct an error raised by an external resolver.
    pub fn resolver(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Resolver, ErrorOrigin::Resolver, message)
    }

    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    #[must_use]
    pub const fn is_violation(&self) -> bool {
        matches!(self.class, ErrorClass::ConstraintViolation)
    }

    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self.class, ErrorClass::Conflict)
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        match &self.code {
            Some(code) => format!("{}:{}:{code}: {}", self.origin, self.class, self.message),
            None => format!("{}:{}: {}", self.origin, self.class, self.message),
        }
    }
}

impl From<TypeError> for Error {
    fn from(err: TypeError) -> Self {
        let code = err.code().map(ToString::to_string);

        Self {
            class: err.class(),
            origin: ErrorOrigin::Type,
            code,
            message: err.to_string(),
        }
    }
}

impl From<DatasetError> for Error {
    fn from(err: DatasetError) -> Self {
        Self::new(err.class(), ErrorOrigin::Dataset, err.to_string())
    }
}

impl From<RecordError> for Error {
    fn from(err: RecordError) -> Self {
        let code = err.code().map(ToString::to_string);

        Self {
            class: err.class(),
            origin: ErrorOrigin::Record,
            code,
            message: err.to_string(),
        }
    }
}

impl From<CacheError> for Error {
    fn from(err: CacheError) -> Self {
        Self::new(err.class(), ErrorOrigin::Cache, err.to_string())
    }
}

impl From<RegistryError> for Error {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::Resolver(inner) => inner,
            other => Self::new(other.class(), ErrorOrigin::Registry, other.to_string()),
        }
    }
}

///
/// ErrorClass
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ErrorClass {
    /// Descriptor-level defect: duplicate field, unresolved type.
    Structural,
    /// A source value cannot be decoded into the target kind.
    Conversion,
    /// A decoded value violates the bounds of its type.
    ConstraintViolation,
    /// Cache keys collide across distinct entries.
    Conflict,
    Resolver,
    Internal,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Structural => "structural",
            Self::Conversion => "conversion",
            Self::ConstraintViolation => "constraint_violation",
            Self::Conflict => "conflict",
            Self::Resolver => "resolver",
            Self::Internal => "internal",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorOrigin
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ErrorOrigin {
    Type,
    Dataset,
    Record,
    Cache,
    Registry,
    Resolver,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Type => "type",
            Self::Dataset => "dataset",
            Self::Record => "record",
            Self::Cache => "cache",
            Self::Registry => "registry",
            Self::Resolver => "resolver",
        };
        write!(f, "{label}")
    }
}
