//! Registry collaborators consulted by the resolver and the admin surface.
//!
//! Both traits are synchronous. Async callers run them on a blocking pool.

use crate::error::Result;
use crate::types::{Store, StoreConfig};

/// Store configurations, keyed by id and uniquely by subdomain.
pub trait ConfigRegistry: Send + Sync {
    /// The config claiming `subdomain`, only if it is active.
    fn find_active(&self, subdomain: &str) -> Result<Option<StoreConfig>>;

    fn find_by_store(&self, store_id: &str) -> Result<Option<StoreConfig>>;

    fn get_config(&self, id: &str) -> Result<StoreConfig>;

    fn list_configs(&self) -> Result<Vec<StoreConfig>>;

    /// Fails with `SubdomainTaken` if another config already claims the subdomain.
    fn insert_config(&self, config: &StoreConfig) -> Result<()>;

    /// Replace a config and bump its version.
    ///
    /// With `expected_version` set, the stored version must match or the call
    /// fails with `VersionConflict`. Returns the config as stored.
    fn update_config(&self, config: &StoreConfig, expected_version: Option<u64>)
        -> Result<StoreConfig>;

    fn delete_config(&self, id: &str) -> Result<()>;
}

/// Store (tenant) records.
pub trait StoreRegistry: Send + Sync {
    fn get_store(&self, id: &str) -> Result<Store>;

    fn list_stores(&self) -> Result<Vec<Store>>;

    fn insert_store(&self, store: &Store) -> Result<()>;

    fn update_store(&self, store: &Store) -> Result<()>;

    fn delete_store(&self, id: &str) -> Result<()>;
}

pub(crate) fn check_version(id: &str, expected: Option<u64>, actual: u64) -> Result<()> {
    match expected {
        Some(expected) if expected != actual => Err(crate::error::StoreError::VersionConflict {
            id: id.to_string(),
            expected,
            actual,
        }),
        _ => Ok(()),
    }
}
