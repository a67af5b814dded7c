use crate::{
    model::{
        Dataset, DatasetError, DatasetSpec, Dictionary, DictionaryLookup, FieldSpec,
        field::{Field, Fields, eq_fold},
    },
    registry,
};
use parking_lot::Mutex;
use std::{
    fmt,
    sync::{Arc, OnceLock},
};

/// Path prefix of every extension dataset.
pub const EXTENSIONS_DIR: &str = "extensions";

///
/// Extension
///
/// Domain-scoped fields attached to one extendable global dictionary.
/// The field list always starts with a copy of the base dictionary's
/// primary field, which is also the extension's primary and display.
///
/// The base is resolved on construction and retried on demand until it
/// is found; failures surface through `validate`.
///

pub struct Extension {
    base_key: String,
    custom: Vec<FieldSpec>,
    lookup: Option<Arc<dyn DictionaryLookup>>,
    base: OnceLock<Arc<Dictionary>>,
    failure: Mutex<Option<DatasetError>>,
    dataset: Dataset,
}

impl Extension {
    /// Extension whose base resolves through the default registry.
    ///
    /// The base dictionary is looked up in the global domain under
    /// `spec.name`, or under `spec.path` when the name is empty.
    ///
    /// # Panics
    ///
    /// Panics when `domain_id < 1`; extensions always belong to a domain.
    #[must_use]
    pub fn new(domain_id: i64, spec: DatasetSpec) -> Self {
        Self::build(domain_id, spec, None, None)
    }

    /// Extension whose base resolves through `lookup`, keyed the same
    /// way as [`Extension::new`].
    ///
    /// # Panics
    ///
    /// Panics when `domain_id < 1`.
    #[must_use]
    pub fn with_lookup(
        domain_id: i64,
        spec: DatasetSpec,
        lookup: Arc<dyn DictionaryLookup>,
    ) -> Self {
        Self::build(domain_id, spec, Some(lookup), None)
    }

    /// Extension of an already resolved base dictionary. The name and path
    /// of `spec` are replaced by the base's; only its fields are kept.
    ///
    /// # Panics
    ///
    /// Panics when `domain_id < 1`.
    #[must_use]
    pub fn from_base(domain_id: i64, base: Arc<Dictionary>, spec: DatasetSpec) -> Self {
        Self::build(domain_id, spec, None, Some(base))
    }

    fn build(
        domain_id: i64,
        spec: DatasetSpec,
        lookup: Option<Arc<dyn DictionaryLookup>>,
        base: Option<Arc<Dictionary>>,
    ) -> Self {
        assert!(domain_id >= 1, "extension domain required");

        let base_key = if spec.name.is_empty() {
            spec.path.clone()
        } else {
            spec.name.clone()
        };
        let path = format!("{EXTENSIONS_DIR}/{base_key}");
        let resolved = match base {
            Some(base) => check_base(base, &path),
            None => resolve_base(lookup.as_deref(), &base_key, &path),
        };

        let (sub, cell, failure) = match resolved {
            Ok((base, primary)) => {
                let sub = DatasetSpec {
                    name: base.name().to_string(),
                    path: format!("{EXTENSIONS_DIR}/{}", base.name()),
                    fields: merge(&primary, &spec.fields),
                    primary: primary.id.clone(),
                    display: primary.id,
                    extendable: false,
                    ..spec.clone()
                };

                (sub, OnceLock::from(base), None)
            }
            Err(err) => {
                let sub = DatasetSpec {
                    name: base_key.clone(),
                    path,
                    extendable: false,
                    ..spec.clone()
                };

                (sub, OnceLock::new(), Some(err))
            }
        };

        Self {
            base_key,
            custom: spec.fields,
            dataset: Dataset::new(domain_id, sub, lookup.clone()),
            lookup,
            base: cell,
            failure: Mutex::new(failure),
        }
    }

    #[must_use]
    pub const fn domain_id(&self) -> i64 {
        self.dataset.domain_id()
    }

    /// Name of the base dictionary.
    #[must_use]
    pub fn name(&self) -> &str {
        self.dataset.name()
    }

    /// `extensions/<name>`.
    #[must_use]
    pub fn path(&self) -> &str {
        self.dataset.path()
    }

    #[must_use]
    pub fn title(&self) -> &str {
        self.dataset.title()
    }

    #[must_use]
    pub fn usage(&self) -> &str {
        self.dataset.usage()
    }

    /// Inherited primary followed by the custom fields.
    #[must_use]
    pub const fn fields(&self) -> &Fields {
        self.dataset.fields()
    }

    #[must_use]
    pub fn primary_field(&self) -> Option<Arc<Field>> {
        self.dataset.primary_field()
    }

    #[must_use]
    pub fn display_field(&self) -> Option<Arc<Field>> {
        self.dataset.display_field()
    }

    /// Whether the base dictionary has been resolved.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.base.get().is_some()
    }

    /// Error recorded by the most recent failed base resolution.
    #[must_use]
    pub fn last_failure(&self) -> Option<DatasetError> {
        self.failure.lock().clone()
    }

    /// Resolve the base dictionary, retrying until it is found.
    pub fn base_dictionary(&self) -> Result<Arc<Dictionary>, DatasetError> {
        if let Some(base) = self.base.get() {
            return Ok(Arc::clone(base));
        }

        let mut failure = self.failure.lock();
        if let Some(base) = self.base.get() {
            return Ok(Arc::clone(base));
        }

        match resolve_base(self.lookup.as_deref(), &self.base_key, self.path()) {
            Ok((base, primary)) => {
                self.dataset.reset_fields(
                    merge(&primary, &self.custom),
                    &primary.id,
                    &primary.id,
                    self.lookup.clone(),
                );
                *failure = None;

                Ok(Arc::clone(self.base.get_or_init(|| base)))
            }
            Err(err) => {
                *failure = Some(err.clone());

                Err(err)
            }
        }
    }

    /// Require a domain, a resolved base, and valid base and own fields.
    pub fn validate(&self) -> Result<(), DatasetError> {
        if self.domain_id() < 1 {
            return Err(DatasetError::Invalid {
                dataset: self.path().to_string(),
                issues: [(
                    super::DATASET_ISSUE.to_string(),
                    vec!["extension domain required".to_string()],
                )]
                .into(),
            });
        }

        let base = self.base_dictionary()?;
        base.validate()?;

        self.dataset.validate()
    }

    /// Full descriptor, including the inherited primary field.
    #[must_use]
    pub fn export(&self) -> DatasetSpec {
        let mut spec = self.dataset.export();
        spec.display.clone_from(&spec.primary);

        spec
    }

    /// Editable view: custom fields only, no primary or display.
    #[must_use]
    pub fn public_view(&self) -> DatasetSpec {
        let mut spec = self.export();
        let primary = std::mem::take(&mut spec.primary);

        spec.display.clear();
        if !primary.is_empty() {
            spec.fields.retain(|field| !eq_fold(&field.id, &primary));
        }

        spec
    }
}

impl fmt::Debug for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extension")
            .field("domain_id", &self.domain_id())
            .field("path", &self.path())
            .field("resolved", &self.is_resolved())
            .field("fields", self.fields())
            .finish_non_exhaustive()
    }
}

fn merge(primary: &FieldSpec, custom: &[FieldSpec]) -> Vec<FieldSpec> {
    let mut fields = Vec::with_capacity(custom.len() + 1);
    fields.push(primary.clone());
    fields.extend(
        custom
            .iter()
            .filter(|field| !eq_fold(&field.id, &primary.id))
            .cloned(),
    );

    fields
}

fn resolve_base(
    lookup: Option<&dyn DictionaryLookup>,
    key: &str,
    path: &str,
) -> Result<(Arc<Dictionary>, FieldSpec), DatasetError> {
    let found = match lookup {
        Some(lookup) => lookup.lookup_dictionary(0, key),
        None => registry::global().lookup_dictionary(0, key),
    };

    match found {
        Ok(Some(base)) => check_base(base, path),
        Ok(None) => Err(DatasetError::BaseNotFound {
            path: path.to_string(),
        }),
        Err(err) => Err(DatasetError::BaseResolution {
            path: path.to_string(),
            message: err.to_string(),
        }),
    }
}

fn check_base(
    base: Arc<Dictionary>,
    path: &str,
) -> Result<(Arc<Dictionary>, FieldSpec), DatasetError> {
    let primary = base
        .is_extendable()
        .then(|| base.primary_field())
        .flatten()
        .ok_or_else(|| DatasetError::BaseNotExtendable {
            path: path.to_string(),
        })?;
    let primary = primary.spec().clone();

    Ok((base, primary))
}

///
/// TESTS
///
