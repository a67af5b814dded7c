use crate::registry::RegistryError;
use serde::{Deserialize, Serialize};

/// Entries per domain cache unless configured otherwise.
pub const DEFAULT_CAPACITY: usize = 1 << 8;

///
/// RegistryConfig
///
/// Capacities of the per-domain caches. Zero is treated as one.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
    /// Capacity of every non-global domain.
    pub domain_capacity: usize,

    /// Capacity of the global domain (0).
    pub global_capacity: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            domain_capacity: DEFAULT_CAPACITY,
            global_capacity: DEFAULT_CAPACITY,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    registry: RegistryConfig,
}

impl RegistryConfig {
    /// Read the `[registry]` table of a TOML document; a missing table
    /// yields the defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, RegistryError> {
        let file: ConfigFile = toml::from_str(source).map_err(|err| RegistryError::Config {
            message: err.to_string(),
        })?;

        Ok(file.registry)
    }

    #[must_use]
    pub const fn capacity_for(&self, domain_id: i64) -> usize {
        if domain_id < 1 {
            self.global_capacity
        } else {
            self.domain_capacity
        }
    }
}

///
/// TESTS
///
