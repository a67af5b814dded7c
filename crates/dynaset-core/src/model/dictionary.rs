use crate::model::{Dataset, DatasetSpec, DictionaryLookup};
use derive_more::Deref;
use std::sync::Arc;

///
/// Dictionary
///
/// Dataset describing a shared entity kind. Dictionaries of the global
/// domain are read-only and may be marked extendable so that other
/// domains can attach their own fields.
///

#[derive(Debug, Deref)]
pub struct Dictionary {
    dataset: Dataset,
}

impl Dictionary {
    /// Dictionary whose lookups resolve through the default registry.
    #[must_use]
    pub fn new(domain_id: i64, spec: DatasetSpec) -> Self {
        Self {
            dataset: Dataset::new(domain_id, spec, None),
        }
    }

    /// Dictionary whose lookups resolve through `lookup`.
    #[must_use]
    pub fn with_lookup(
        domain_id: i64,
        spec: DatasetSpec,
        lookup: Arc<dyn DictionaryLookup>,
    ) -> Self {
        Self {
            dataset: Dataset::new(domain_id, spec, Some(lookup)),
        }
    }

    #[must_use]
    pub const fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Global dictionaries cannot be changed by a domain.
    #[must_use]
    pub const fn is_readonly(&self) -> bool {
        self.dataset.domain_id() < 1
    }

    #[must_use]
    pub const fn is_extendable(&self) -> bool {
        self.is_readonly() && self.dataset.is_extendable_flag()
    }
}

///
/// TESTS
///
