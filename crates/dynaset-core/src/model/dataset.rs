use crate::{
    error::ErrorClass,
    model::{
        DatasetSpec, DictionaryLookup, FieldSpec,
        field::{Field, FieldKeys, Fields, display_head, eq_fold},
    },
    types::TypeContext,
};
use std::{collections::BTreeMap, fmt::Write as _, sync::Arc};
use thiserror::Error as ThisError;

/// Issue key for problems that belong to the dataset rather than a field.
pub const DATASET_ISSUE: &str = "dataset";

///
/// DatasetError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum DatasetError {
    #[error("dataset {dataset:?} invalid: {}", summarize(issues))]
    Invalid {
        dataset: String,
        issues: BTreeMap<String, Vec<String>>,
    },

    #[error("extension {path:?}; base type not found")]
    BaseNotFound { path: String },

    #[error("extension {path:?}; base type not extendable")]
    BaseNotExtendable { path: String },

    #[error("extension {path:?}; base type resolution failed: {message}")]
    BaseResolution { path: String, message: String },
}

impl DatasetError {
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::Invalid { .. } | Self::BaseNotFound { .. } | Self::BaseNotExtendable { .. } => {
                ErrorClass::Structural
            }
            Self::BaseResolution { .. } => ErrorClass::Resolver,
        }
    }

    /// Issues keyed by field name, empty for resolution failures.
    #[must_use]
    pub fn issues(&self) -> Option<&BTreeMap<String, Vec<String>>> {
        match self {
            Self::Invalid { issues, .. } => Some(issues),
            _ => None,
        }
    }
}

fn summarize(issues: &BTreeMap<String, Vec<String>>) -> String {
    let mut out = String::new();

    for (key, list) in issues {
        for issue in list {
            if !out.is_empty() {
                out.push_str("; ");
            }
            let _ = write!(out, "{key}: {issue}");
        }
    }

    out
}

///
/// Issues
///
/// Accumulates validation problems keyed by field.
///

#[derive(Debug, Default)]
pub(crate) struct Issues(BTreeMap<String, Vec<String>>);

impl Issues {
    pub(crate) fn push(&mut self, key: impl Into<String>, issue: impl Into<String>) {
        self.0.entry(key.into()).or_default().push(issue.into());
    }

    pub(crate) fn into_result(self, dataset: &str) -> Result<(), DatasetError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(DatasetError::Invalid {
                dataset: dataset.to_string(),
                issues: self.0,
            })
        }
    }
}

///
/// Dataset
///
/// Composite record type: header attributes plus an ordered field
/// collection. Shared by dictionaries and extensions.
///

#[derive(Debug)]
pub struct Dataset {
    domain_id: i64,
    name: String,
    path: String,
    title: String,
    usage: String,
    extendable: bool,
    fields: Fields,
}

impl Dataset {
    pub(crate) fn new(
        domain_id: i64,
        spec: DatasetSpec,
        lookup: Option<Arc<dyn DictionaryLookup>>,
    ) -> Self {
        let domain_id = domain_id.max(0);
        let keys = keys_of(&spec);
        let ctx = context(domain_id, &spec.path, &spec.fields, &keys, lookup);

        Self {
            domain_id,
            name: spec.name,
            path: spec.path,
            title: spec.title,
            usage: spec.usage,
            extendable: spec.extendable,
            fields: Fields::new(spec.fields, keys, ctx),
        }
    }

    /// Replace the field definitions, keeping the header.
    pub(crate) fn reset_fields(
        &self,
        defs: Vec<FieldSpec>,
        primary: &str,
        display: &str,
        lookup: Option<Arc<dyn DictionaryLookup>>,
    ) {
        let keys = FieldKeys {
            primary: primary.to_string(),
            display: if display.is_empty() { primary } else { display }.to_string(),
        };
        let ctx = context(self.domain_id, &self.path, &defs, &keys, lookup);

        self.fields.reset(defs, keys, ctx);
    }

    #[must_use]
    pub const fn domain_id(&self) -> i64 {
        self.domain_id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn usage(&self) -> &str {
        &self.usage
    }

    #[must_use]
    pub const fn is_extendable_flag(&self) -> bool {
        self.extendable
    }

    #[must_use]
    pub const fn fields(&self) -> &Fields {
        &self.fields
    }

    #[must_use]
    pub fn primary_field(&self) -> Option<Arc<Field>> {
        let primary = self.fields.primary_name();

        (!primary.is_empty())
            .then(|| self.fields.by_name(&primary))
            .flatten()
    }

    /// Field named by the head of the display path.
    #[must_use]
    pub fn display_field(&self) -> Option<Arc<Field>> {
        let display = self.fields.display_name();

        (!display.is_empty())
            .then(|| self.fields.by_name(display_head(&display)))
            .flatten()
    }

    /// Full display path, e.g. `name.common_name`.
    #[must_use]
    pub fn display_path(&self) -> String {
        self.fields.display_name()
    }

    /// Check field names, field types, and the primary and display keys.
    pub fn validate(&self) -> Result<(), DatasetError> {
        let mut issues = Issues::default();
        let fields: Vec<_> = self.fields.iter().collect();

        for (i, field) in fields.iter().enumerate() {
            let name = field.name();

            if !is_word(name) {
                issues.push(name, format!("fields( name: {name:?} ); invalid name"));
            }
            if fields[..i].iter().any(|prev| eq_fold(prev.name(), name)) {
                issues.push(name, format!("fields( name: {name} ); duplicate"));
            }
            if let Err(err) = field.ty().validate_descriptor() {
                issues.push(name, format!("fields( name: {name} ); {err}"));
            }
        }

        let primary = self.fields.primary_name();
        if !primary.is_empty() && self.primary_field().is_none() {
            issues.push(
                DATASET_ISSUE,
                format!("primary( field: {primary} ); not found"),
            );
        }
        let display = self.fields.display_name();
        if !display.is_empty() && self.display_field().is_none() {
            issues.push(
                DATASET_ISSUE,
                format!("display( field: {display} ); not found"),
            );
        }

        issues.into_result(&self.path)
    }

    /// Serializable descriptor of the current state.
    #[must_use]
    pub fn export(&self) -> DatasetSpec {
        DatasetSpec {
            name: self.name.clone(),
            path: self.path.clone(),
            title: self.title.clone(),
            usage: self.usage.clone(),
            fields: self.fields.specs(),
            primary: self.fields.primary_name(),
            display: self.fields.display_name(),
            extendable: self.extendable,
        }
    }
}

fn keys_of(spec: &DatasetSpec) -> FieldKeys {
    let display = if spec.display.is_empty() {
        &spec.primary
    } else {
        &spec.display
    };

    FieldKeys {
        primary: spec.primary.clone(),
        display: display.clone(),
    }
}

fn context(
    domain_id: i64,
    path: &str,
    defs: &[FieldSpec],
    keys: &FieldKeys,
    lookup: Option<Arc<dyn DictionaryLookup>>,
) -> TypeContext {
    let owner_primary = defs
        .iter()
        .find(|def| !keys.primary.is_empty() && eq_fold(&def.id, &keys.primary))
        .cloned();

    TypeContext {
        domain_id,
        owner_path: path.to_string(),
        owner_primary,
        lookup,
    }
}

fn is_word(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_')
}

///
/// TESTS
///
