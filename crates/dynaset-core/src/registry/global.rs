use crate::registry::Registry;
use std::sync::OnceLock;

static GLOBAL: OnceLock<Registry> = OnceLock::new();

/// Process-wide default registry, created empty on first use.
///
/// Datasets built without an explicit lookup resolve through it.
pub fn global() -> &'static Registry {
    GLOBAL.get_or_init(Registry::new)
}
