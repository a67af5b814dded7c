#[macro_use]
mod macros;

use std::{fmt, str::FromStr};

///
/// Kind
///
/// Closed set of value categories a field can carry.
///

#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Kind {
    #[default]
    None,
    List,
    Bool,
    Int,
    Int32,
    Int64,
    Uint,
    Uint32,
    Uint64,
    Float,
    Float32,
    Float64,
    Binary,
    Lookup,
    String,
    Richtext,
    Datetime,
    Duration,
}

impl Kind {
    /// Return the full metadata descriptor for one kind.
    #[must_use]
    pub const fn metadata(self) -> KindMetadata {
        kind_registry!(metadata_from_registry, self)
    }

    /// Canonical lower-case name used on the wire and in descriptors.
    #[must_use]
    pub const fn name(self) -> &'static str {
        self.metadata().name
    }

    #[must_use]
    pub const fn family(self) -> KindFamily {
        self.metadata().family
    }

    /// Bit width of the base range for numeric and temporal kinds, zero otherwise.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.metadata().bits
    }

    #[must_use]
    pub const fn is_none(self) -> bool {
        matches!(self, Self::None)
    }

    /// Return whether values of this kind are plain numbers on the wire.
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(
            self.family(),
            KindFamily::Signed | KindFamily::Unsigned | KindFamily::Float
        )
    }

    /// Return whether this kind is a scalar (anything but `none` and `list`).
    #[must_use]
    pub const fn is_scalar(self) -> bool {
        !matches!(self.family(), KindFamily::Undefined | KindFamily::Collection)
    }

    /// Resolve a kind from its canonical name, ignoring ASCII case.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase();

        kind_registry!(kind_from_name_registry, name.as_str())
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Kind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| UnknownKind(s.to_string()))
    }
}

///
/// KindMetadata
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct KindMetadata {
    pub family: KindFamily,
    pub bits: u8,
    pub name: &'static str,
}

///
/// KindFamily
///
/// Coarse routing family shared by kinds with the same codec.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum KindFamily {
    Undefined,
    Collection,
    Bool,
    Signed,
    Unsigned,
    Float,
    Binary,
    Reference,
    Textual,
    Temporal,
}

///
/// UnknownKind
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UnknownKind(pub String);

impl fmt::Display for UnknownKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown kind {:?}", self.0)
    }
}

impl std::error::Error for UnknownKind {}

/// Ordered list of all kinds in registry order.
pub const ALL_KINDS: [Kind; 18] = kind_registry!(all_kinds_from_registry);

///
/// TESTS
///
