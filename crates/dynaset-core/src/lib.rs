//! Core runtime for Dynaset: field types and codecs, dataset descriptors,
//! records, the multi-key cache, and the domain registry.

// public exports are one module level down
pub mod cache;
pub mod error;
pub mod model;
pub mod obs;
pub mod record;
pub mod registry;
pub mod types;
pub mod value;

pub use dynaset_primitives::Kind;
pub use error::{Error, ErrorClass, ErrorOrigin};

///
/// Prelude
///
/// Vocabulary for building descriptors and filling records.
/// No caches, sinks, or per-type codecs are re-exported here.
///

pub mod prelude {
    pub use crate::{
        Kind,
        model::{
            DatasetDescriptor as _, DatasetSpec, Descriptor, Dictionary, DictionaryDescriptor as _,
            Extension, ExtensionDescriptor as _, FieldSpec, TypeSpec,
        },
        record::Record,
        registry::{Registry, TypeResolver},
        value::{Lookup, Value},
    };
}
