use crate::model::{Dataset, DatasetError, DatasetSpec, Dictionary, Extension, Field, Fields};
use std::sync::Arc;

///
/// DatasetDescriptor
///
/// Capabilities shared by every dataset descriptor.
///

pub trait DatasetDescriptor: Send + Sync {
    /// Owning domain; 0 is global.
    fn domain_id(&self) -> i64;

    fn name(&self) -> &str;

    fn path(&self) -> &str;

    fn fields(&self) -> &Fields;

    fn primary_field(&self) -> Option<Arc<Field>>;

    fn display_field(&self) -> Option<Arc<Field>>;

    fn validate(&self) -> Result<(), DatasetError>;

    fn export(&self) -> DatasetSpec;
}

///
/// DictionaryDescriptor
///

pub trait DictionaryDescriptor: DatasetDescriptor {
    fn title(&self) -> &str;

    fn usage(&self) -> &str;

    fn is_readonly(&self) -> bool;

    fn is_extendable(&self) -> bool;
}

///
/// ExtensionDescriptor
///

pub trait ExtensionDescriptor: DatasetDescriptor {
    fn base_dictionary(&self) -> Result<Arc<Dictionary>, DatasetError>;

    /// Descriptor without the inherited primary field.
    fn public_view(&self) -> DatasetSpec;
}

impl DatasetDescriptor for Dataset {
    fn domain_id(&self) -> i64 {
        Self::domain_id(self)
    }

    fn name(&self) -> &str {
        Self::name(self)
    }

    fn path(&self) -> &str {
        Self::path(self)
    }

    fn fields(&self) -> &Fields {
        Self::fields(self)
    }

    fn primary_field(&self) -> Option<Arc<Field>> {
        Self::primary_field(self)
    }

    fn display_field(&self) -> Option<Arc<Field>> {
        Self::display_field(self)
    }

    fn validate(&self) -> Result<(), DatasetError> {
        Self::validate(self)
    }

    fn export(&self) -> DatasetSpec {
        Self::export(self)
    }
}

impl DatasetDescriptor for Dictionary {
    fn domain_id(&self) -> i64 {
        self.dataset().domain_id()
    }

    fn name(&self) -> &str {
        self.dataset().name()
    }

    fn path(&self) -> &str {
        self.dataset().path()
    }

    fn fields(&self) -> &Fields {
        self.dataset().fields()
    }

    fn primary_field(&self) -> Option<Arc<Field>> {
        self.dataset().primary_field()
    }

    fn display_field(&self) -> Option<Arc<Field>> {
        self.dataset().display_field()
    }

    fn validate(&self) -> Result<(), DatasetError> {
        self.dataset().validate()
    }

    fn export(&self) -> DatasetSpec {
        self.dataset().export()
    }
}

impl DictionaryDescriptor for Dictionary {
    fn title(&self) -> &str {
        self.dataset().title()
    }

    fn usage(&self) -> &str {
        self.dataset().usage()
    }

    fn is_readonly(&self) -> bool {
        Self::is_readonly(self)
    }

    fn is_extendable(&self) -> bool {
        Self::is_extendable(self)
    }
}

impl DatasetDescriptor for Extension {
    fn domain_id(&self) -> i64 {
        Self::domain_id(self)
    }

    fn name(&self) -> &str {
        Self::name(self)
    }

    fn path(&self) -> &str {
        Self::path(self)
    }

    fn fields(&self) -> &Fields {
        Self::fields(self)
    }

    fn primary_field(&self) -> Option<Arc<Field>> {
        Self::primary_field(self)
    }

    fn display_field(&self) -> Option<Arc<Field>> {
        Self::display_field(self)
    }

    fn validate(&self) -> Result<(), DatasetError> {
        Self::validate(self)
    }

    fn export(&self) -> DatasetSpec {
        Self::export(self)
    }
}

impl ExtensionDescriptor for Extension {
    fn base_dictionary(&self) -> Result<Arc<Dictionary>, DatasetError> {
        Self::base_dictionary(self)
    }

    fn public_view(&self) -> DatasetSpec {
        Self::public_view(self)
    }
}

///
/// Descriptor
///
/// A registered dataset: the registry's cache value and the binding of
/// every record.
///

#[derive(Clone, Debug)]
pub enum Descriptor {
    Dictionary(Arc<Dictionary>),
    Extension(Arc<Extension>),
}

impl Descriptor {
    #[must_use]
    pub const fn as_dictionary(&self) -> Option<&Arc<Dictionary>> {
        match self {
            Self::Dictionary(d) => Some(d),
            Self::Extension(_) => None,
        }
    }

    #[must_use]
    pub const fn as_extension(&self) -> Option<&Arc<Extension>> {
        match self {
            Self::Extension(x) => Some(x),
            Self::Dictionary(_) => None,
        }
    }

    #[must_use]
    pub const fn is_extension(&self) -> bool {
        matches!(self, Self::Extension(_))
    }

    /// Same underlying descriptor instance.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Dictionary(a), Self::Dictionary(b)) => Arc::ptr_eq(a, b),
            (Self::Extension(a), Self::Extension(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    fn inner(&self) -> &dyn DatasetDescriptor {
        match self {
            Self::Dictionary(d) => d.as_ref(),
            Self::Extension(x) => x.as_ref(),
        }
    }
}

impl From<Arc<Dictionary>> for Descriptor {
    fn from(dictionary: Arc<Dictionary>) -> Self {
        Self::Dictionary(dictionary)
    }
}

impl From<Dictionary> for Descriptor {
    fn from(dictionary: Dictionary) -> Self {
        Self::Dictionary(Arc::new(dictionary))
    }
}

impl From<Arc<Extension>> for Descriptor {
    fn from(extension: Arc<Extension>) -> Self {
        Self::Extension(extension)
    }
}

impl From<Extension> for Descriptor {
    fn from(extension: Extension) -> Self {
        Self::Extension(Arc::new(extension))
    }
}

impl DatasetDescriptor for Descriptor {
    fn domain_id(&self) -> i64 {
        self.inner().domain_id()
    }

    fn name(&self) -> &str {
        self.inner().name()
    }

    fn path(&self) -> &str {
        self.inner().path()
    }

    fn fields(&self) -> &Fields {
        self.inner().fields()
    }

    fn primary_field(&self) -> Option<Arc<Field>> {
        self.inner().primary_field()
    }

    fn display_field(&self) -> Option<Arc<Field>> {
        self.inner().display_field()
    }

    fn validate(&self) -> Result<(), DatasetError> {
        self.inner().validate()
    }

    fn export(&self) -> DatasetSpec {
        self.inner().export()
    }
}

///
/// TESTS
///
