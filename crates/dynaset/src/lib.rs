//! ## Crate layout
//! - `core`: field types, codecs, datasets, records, the cache, and the registry.
//! - `primitives`: the closed `Kind` set and its metadata table.
//!
//! The `prelude` module covers the everyday surface; the free functions
//! below operate on the process-wide default registry, which datasets
//! built without an explicit lookup resolve through.

pub use dynaset_core as core;
pub use dynaset_primitives as primitives;

pub use dynaset_core::{Error, ErrorClass, ErrorOrigin, Kind};

use dynaset_core::{
    model::{Descriptor, Dictionary, Extension},
    registry::{self, Registry, RegistryError, TypeResolver},
};
use std::sync::Arc;

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//
// Default registry
//

/// The process-wide default registry.
#[must_use]
pub fn registry() -> &'static Registry {
    registry::global()
}

/// Registry sharing the default registry's domains, backed by `resolver`.
#[must_use]
pub fn with_resolver(resolver: Arc<dyn TypeResolver>) -> Registry {
    registry::global().with_resolver(resolver)
}

pub fn register(descriptor: impl Into<Descriptor>) -> Result<(), RegistryError> {
    registry::global().register(descriptor)
}

pub fn unregister(descriptor: &Descriptor) -> bool {
    registry::global().unregister(descriptor)
}

pub fn get_dictionary(
    domain_id: i64,
    path: &str,
) -> Result<Option<Arc<Dictionary>>, RegistryError> {
    registry::global().get_dictionary(domain_id, path)
}

pub fn get_extension(
    domain_id: i64,
    path: &str,
) -> Result<Option<Arc<Extension>>, RegistryError> {
    registry::global().get_extension(domain_id, path)
}

///
/// Prelude
/// using _ brings traits into scope and avoids name conflicts
///

pub mod prelude {
    pub use crate::core::{
        Kind,
        model::{
            DatasetDescriptor as _, DatasetSpec, Descriptor, Dictionary, DictionaryDescriptor as _,
            Extension, ExtensionDescriptor as _, FieldSpec, TypeSpec,
        },
        record::Record,
        registry::{Registry, TypeResolver},
        value::{Lookup, Value},
    };
    pub use crate::{Error, ErrorClass};
}
