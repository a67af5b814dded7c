use crate::{
    error::Error,
    model::{Dictionary, Extension},
};
use parking_lot::Mutex;
use std::sync::Arc;

///
/// TypeResolver
///
/// External source of descriptors consulted on a registry miss.
/// "Not found" is `Ok(None)`, never an error.
///

pub trait TypeResolver: Send + Sync {
    fn resolve_dictionary(
        &self,
        domain_id: i64,
        path: &str,
    ) -> Result<Option<Arc<Dictionary>>, Error>;

    fn resolve_extension(
        &self,
        domain_id: i64,
        path: &str,
    ) -> Result<Option<Arc<Extension>>, Error>;
}

///
/// ProtectedResolver
///
/// Serializes dictionary resolutions behind one lock and extension
/// resolutions behind another. The locks cover only the external call.
///

pub(crate) struct ProtectedResolver {
    dictionaries: Mutex<()>,
    extensions: Mutex<()>,
    inner: Arc<dyn TypeResolver>,
}

impl ProtectedResolver {
    pub(crate) fn new(inner: Arc<dyn TypeResolver>) -> Self {
        Self {
            dictionaries: Mutex::new(()),
            extensions: Mutex::new(()),
            inner,
        }
    }

    pub(crate) fn wraps(&self, other: &Arc<dyn TypeResolver>) -> bool {
        Arc::ptr_eq(&self.inner, other)
    }
}

impl TypeResolver for ProtectedResolver {
    fn resolve_dictionary(
        &self,
        domain_id: i64,
        path: &str,
    ) -> Result<Option<Arc<Dictionary>>, Error> {
        let _guard = self.dictionaries.lock();

        self.inner.resolve_dictionary(domain_id, path)
    }

    fn resolve_extension(
        &self,
        domain_id: i64,
        path: &str,
    ) -> Result<Option<Arc<Extension>>, Error> {
        let _guard = self.extensions.lock();

        self.inner.resolve_extension(domain_id, path)
    }
}
