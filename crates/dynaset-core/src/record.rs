//! Mutable value containers bound to one dataset.

use crate::{
    error::ErrorClass,
    model::{DatasetDescriptor, Descriptor, Field},
    types::TypeError,
    value::{Source, Value, WireMap},
};
use parking_lot::Mutex;
use std::sync::Arc;
use thiserror::Error as ThisError;

///
/// RecordError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum RecordError {
    #[error("record.set( field: {field} ); invalid descriptor")]
    ForeignField { field: String },

    #[error("record( dataset: {dataset} ); no such field {field:?}")]
    NoSuchField { dataset: String, field: String },

    #[error("record( dataset: {dataset} ); fields changed since the record was created")]
    Stale { dataset: String },

    #[error("record( field: {field} ); {source}")]
    Type {
        field: String,
        #[source]
        source: TypeError,
    },
}

impl RecordError {
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::ForeignField { .. } | Self::NoSuchField { .. } | Self::Stale { .. } => {
                ErrorClass::Structural
            }
            Self::Type { source, .. } => source.class(),
        }
    }

    /// Violation code of the underlying type error.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Type { source, .. } => source.code(),
            _ => None,
        }
    }
}

///
/// Record
///
/// One value slot per field of its dataset, plus the names of the fields
/// written so far in last-write order. The slot count is fixed when the
/// record is created, and so is the version of the dataset's field
/// list; once that list is rebuilt (an extension resolving its base late)
/// the record only answers with [`RecordError::Stale`].
///
/// Required and disabled flags are not enforced here.
///

#[derive(Debug)]
pub struct Record {
    descriptor: Descriptor,
    version: u32,
    state: Mutex<RecordState>,
}

#[derive(Debug, Default)]
struct RecordState {
    values: Vec<Value>,
    touched: Vec<String>,
}

impl RecordState {
    fn touch(&mut self, name: &str) {
        if let Some(pos) = self.touched.iter().position(|n| n == name) {
            let moved = self.touched.remove(pos);
            self.touched.push(moved);
        } else {
            self.touched.push(name.to_string());
        }
    }
}

impl Record {
    #[must_use]
    pub fn new(descriptor: impl Into<Descriptor>) -> Self {
        let descriptor = descriptor.into();
        let slots = descriptor.fields().len();
        let version = descriptor.fields().version();

        Self {
            descriptor,
            version,
            state: Mutex::new(RecordState {
                values: vec![Value::Null; slots],
                touched: Vec::new(),
            }),
        }
    }

    #[must_use]
    pub const fn dataset(&self) -> &Descriptor {
        &self.descriptor
    }

    /// Number of value slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn stale(&self) -> RecordError {
        RecordError::Stale {
            dataset: self.descriptor.path().to_string(),
        }
    }

    fn check_version(&self) -> Result<(), RecordError> {
        if self.descriptor.fields().version() == self.version {
            Ok(())
        } else {
            Err(self.stale())
        }
    }

    /// Fields of the dataset still match the slots of this record.
    #[must_use]
    pub fn is_current(&self) -> bool {
        self.check_version().is_ok()
    }

    // Slot of a field owned by this record's dataset.
    fn slot(&self, field: &Arc<Field>) -> Result<usize, RecordError> {
        let foreign = || RecordError::ForeignField {
            field: field.name().to_string(),
        };

        if !self.descriptor.fields().owns(field) {
            return Err(foreign());
        }
        if field.version() != self.version {
            return Err(self.stale());
        }
        let slot = field.num().checked_sub(1).ok_or_else(foreign)?;
        if slot >= self.len() {
            return Err(foreign());
        }

        Ok(slot)
    }

    fn field(&self, name: &str) -> Result<Arc<Field>, RecordError> {
        self.check_version()?;

        self.descriptor
            .fields()
            .by_name(name)
            .ok_or_else(|| RecordError::NoSuchField {
                dataset: self.descriptor.path().to_string(),
                field: name.to_string(),
            })
    }

    /// Decode `src` with the field's type and store the normalized value.
    pub fn set(&self, field: &Arc<Field>, src: impl Into<Source>) -> Result<(), RecordError> {
        let slot = self.slot(field)?;
        let value = field.ty().decode(src).map_err(|source| RecordError::Type {
            field: field.name().to_string(),
            source,
        })?;

        let mut state = self.state.lock();
        if let Some(cell) = state.values.get_mut(slot) {
            *cell = value;
        }
        state.touch(field.name());

        Ok(())
    }

    pub fn set_by_name(&self, name: &str, src: impl Into<Source>) -> Result<(), RecordError> {
        let field = self.field(name)?;

        self.set(&field, src)
    }

    /// Stored value of `field`; NULL when never set.
    pub fn get(&self, field: &Arc<Field>) -> Result<Value, RecordError> {
        let slot = self.slot(field)?;

        Ok(self
            .state
            .lock()
            .values
            .get(slot)
            .cloned()
            .unwrap_or_default())
    }

    pub fn get_by_name(&self, name: &str) -> Result<Value, RecordError> {
        let field = self.field(name)?;

        self.get(&field)
    }

    /// Names of written fields, oldest write first.
    #[must_use]
    pub fn touched_fields(&self) -> Vec<String> {
        self.state.lock().touched.clone()
    }

    #[must_use]
    pub fn is_touched(&self, name: &str) -> bool {
        let name = name.to_lowercase();

        self.state
            .lock()
            .touched
            .iter()
            .any(|n| n.to_lowercase() == name)
    }

    /// Visit written fields in last-write order until `f` returns false.
    /// Runs on a snapshot, so `f` may call back into the record.
    pub fn for_each<F>(&self, mut f: F) -> Result<(), RecordError>
    where
        F: FnMut(&Arc<Field>, &Value) -> bool,
    {
        self.check_version()?;

        let snapshot: Vec<(Arc<Field>, Value)> = {
            let state = self.state.lock();
            let fields = self.descriptor.fields();

            state
                .touched
                .iter()
                .filter_map(|name| {
                    let field = fields.by_name(name)?;
                    let value = state.values.get(field.num() - 1)?.clone();
                    Some((field, value))
                })
                .collect()
        };
        if snapshot.iter().any(|(field, _)| field.version() != self.version) {
            return Err(self.stale());
        }

        for (field, value) in &snapshot {
            if !f(field, value) {
                break;
            }
        }

        Ok(())
    }

    /// Generic map of non-NULL values. An extension's inherited primary
    /// is left out.
    pub fn as_map(&self) -> Result<WireMap, RecordError> {
        self.check_version()?;

        let hidden = match &self.descriptor {
            Descriptor::Extension(ext) => ext.primary_field(),
            Descriptor::Dictionary(_) => None,
        };
        let values = self.state.lock().values.clone();
        let mut map = WireMap::new();

        for field in self.descriptor.fields().iter() {
            if field.version() != self.version {
                return Err(self.stale());
            }
            if hidden.as_ref().is_some_and(|h| Arc::ptr_eq(h, &field)) {
                continue;
            }
            let Some(value) = values.get(field.num() - 1) else {
                continue;
            };
            if value.is_null() {
                continue;
            }
            map.insert(field.name().to_string(), value.to_wire());
        }

        Ok(map)
    }

    /// Set every entry of a generic map, stopping at the first failure.
    pub fn from_generic(&self, map: &WireMap) -> Result<(), RecordError> {
        for (name, value) in map {
            self.set_by_name(name, value.clone())?;
        }

        Ok(())
    }
}

///
/// TESTS
///
