//! Dataset descriptors: fields, dictionaries, and extensions.

mod dataset;
mod descriptor;
mod dictionary;
mod extension;
mod field;
mod spec;

use crate::error::Error;
use std::sync::Arc;

// re-exports
pub use dataset::{DATASET_ISSUE, Dataset, DatasetError};
pub use descriptor::{DatasetDescriptor, Descriptor, DictionaryDescriptor, ExtensionDescriptor};
pub use dictionary::Dictionary;
pub use extension::{EXTENSIONS_DIR, Extension};
pub use field::{Field, Fields};
pub use spec::{
    BinarySpec, DatasetSpec, DatetimeSpec, DurationSpec, FieldSpec, FloatSpec, IntSpec,
    LookupSpec, TextSpec, TypeSpec, UintSpec,
};

///
/// DictionaryLookup
///
/// Source of dictionaries for lookup fields and extension bases.
/// "Not found" is `Ok(None)`.
///

pub trait DictionaryLookup: Send + Sync {
    fn lookup_dictionary(
        &self,
        domain_id: i64,
        path: &str,
    ) -> Result<Option<Arc<Dictionary>>, Error>;
}

impl<F> DictionaryLookup for F
where
    F: Fn(i64, &str) -> Result<Option<Arc<Dictionary>>, Error> + Send + Sync,
{
    fn lookup_dictionary(
        &self,
        domain_id: i64,
        path: &str,
    ) -> Result<Option<Arc<Dictionary>>, Error> {
        self(domain_id, path)
    }
}
