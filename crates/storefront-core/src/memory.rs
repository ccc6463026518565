use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{Result, StoreError};
use crate::registry::{check_version, ConfigRegistry, StoreRegistry};
use crate::types::{Store, StoreConfig};

/// In-process registry holding both stores and configs.
///
/// Each table has its own lock, so a store write and a config write are two
/// independent operations. Pair it with [`crate::lifecycle::PairedRegistry`]
/// to get all-or-nothing lifecycle semantics.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    stores: RwLock<HashMap<String, Store>>,
    configs: RwLock<HashMap<String, StoreConfig>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn stores(&self) -> Result<RwLockReadGuard<'_, HashMap<String, Store>>> {
        self.stores.read().map_err(|_| poisoned("stores"))
    }

    fn stores_mut(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, Store>>> {
        self.stores.write().map_err(|_| poisoned("stores"))
    }

    fn configs(&self) -> Result<RwLockReadGuard<'_, HashMap<String, StoreConfig>>> {
        self.configs.read().map_err(|_| poisoned("store_configs"))
    }

    fn configs_mut(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, StoreConfig>>> {
        self.configs.write().map_err(|_| poisoned("store_configs"))
    }
}

fn poisoned(table: &str) -> StoreError {
    StoreError::Registry(format!("{table} lock poisoned"))
}

impl ConfigRegistry for MemoryRegistry {
    fn find_active(&self, subdomain: &str) -> Result<Option<StoreConfig>> {
        Ok(self
            .configs()?
            .values()
            .find(|c| c.subdomain == subdomain && c.is_active)
            .cloned())
    }

    fn find_by_store(&self, store_id: &str) -> Result<Option<StoreConfig>> {
        Ok(self
            .configs()?
            .values()
            .find(|c| c.store_id == store_id)
            .cloned())
    }

    fn get_config(&self, id: &str) -> Result<StoreConfig> {
        self.configs()?
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::ConfigNotFound(id.to_string()))
    }

    fn list_configs(&self) -> Result<Vec<StoreConfig>> {
        let mut all: Vec<StoreConfig> = self.configs()?.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(all)
    }

    fn insert_config(&self, config: &StoreConfig) -> Result<()> {
        let mut configs = self.configs_mut()?;
        if configs.values().any(|c| c.subdomain == config.subdomain) {
            return Err(StoreError::SubdomainTaken(config.subdomain.clone()));
        }
        configs.insert(config.id.clone(), config.clone());
        Ok(())
    }

    fn update_config(
        &self,
        config: &StoreConfig,
        expected_version: Option<u64>,
    ) -> Result<StoreConfig> {
        let mut configs = self.configs_mut()?;
        let current_version = configs
            .get(&config.id)
            .map(|c| c.version)
            .ok_or_else(|| StoreError::ConfigNotFound(config.id.clone()))?;
        check_version(&config.id, expected_version, current_version)?;
        if configs
            .values()
            .any(|c| c.id != config.id && c.subdomain == config.subdomain)
        {
            return Err(StoreError::SubdomainTaken(config.subdomain.clone()));
        }
        let mut stored = config.clone();
        stored.version = current_version + 1;
        configs.insert(stored.id.clone(), stored.clone());
        Ok(stored)
    }

    fn delete_config(&self, id: &str) -> Result<()> {
        self.configs_mut()?
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::ConfigNotFound(id.to_string()))
    }
}

impl StoreRegistry for MemoryRegistry {
    fn get_store(&self, id: &str) -> Result<Store> {
        self.stores()?
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::StoreNotFound(id.to_string()))
    }

    fn list_stores(&self) -> Result<Vec<Store>> {
        let mut all: Vec<Store> = self.stores()?.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(all)
    }

    fn insert_store(&self, store: &Store) -> Result<()> {
        self.stores_mut()?.insert(store.id.clone(), store.clone());
        Ok(())
    }

    fn update_store(&self, store: &Store) -> Result<()> {
        let mut stores = self.stores_mut()?;
        if !stores.contains_key(&store.id) {
            return Err(StoreError::StoreNotFound(store.id.clone()));
        }
        stores.insert(store.id.clone(), store.clone());
        Ok(())
    }

    fn delete_store(&self, id: &str) -> Result<()> {
        self.stores_mut()?
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::StoreNotFound(id.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NewStore;

    #[test]
    fn find_active_skips_inactive() {
        let reg = MemoryRegistry::new();
        let (_, mut config) = NewStore::new("Shop", "shop2").into_records();
        config.is_active = false;
        reg.insert_config(&config).unwrap();

        assert!(reg.find_active("shop2").unwrap().is_none());
        assert!(reg.find_by_store(&config.store_id).unwrap().is_some());
    }

    #[test]
    fn duplicate_subdomain_rejected() {
        let reg = MemoryRegistry::new();
        let (_, a) = NewStore::new("A", "shop").into_records();
        let (_, b) = NewStore::new("B", "shop").into_records();
        reg.insert_config(&a).unwrap();
        let err = reg.insert_config(&b).unwrap_err();
        assert!(matches!(err, StoreError::SubdomainTaken(ref s) if s == "shop"));
    }

    #[test]
    fn update_bumps_version_and_checks_expected() {
        let reg = MemoryRegistry::new();
        let (_, config) = NewStore::new("Shop", "shop").into_records();
        reg.insert_config(&config).unwrap();

        let stored = reg.update_config(&config, Some(1)).unwrap();
        assert_eq!(stored.version, 2);

        let err = reg.update_config(&config, Some(1)).unwrap_err();
        assert!(matches!(
            err,
            StoreError::VersionConflict {
                expected: 1,
                actual: 2,
                ..
            }
        ));

        // No expectation means last write wins.
        assert_eq!(reg.update_config(&config, None).unwrap().version, 3);
    }

    #[test]
    fn update_cannot_steal_subdomain() {
        let reg = MemoryRegistry::new();
        let (_, a) = NewStore::new("A", "alpha").into_records();
        let (_, b) = NewStore::new("B", "beta").into_records();
        reg.insert_config(&a).unwrap();
        reg.insert_config(&b).unwrap();

        let mut renamed = b.clone();
        renamed.subdomain = "alpha".into();
        assert!(matches!(
            reg.update_config(&renamed, None).unwrap_err(),
            StoreError::SubdomainTaken(_)
        ));
    }

    #[test]
    fn store_crud() {
        let reg = MemoryRegistry::new();
        let (mut store, _) = NewStore::new("Shop", "shop").into_records();
        reg.insert_store(&store).unwrap();
        store.name = "Renamed".into();
        reg.update_store(&store).unwrap();
        assert_eq!(reg.get_store(&store.id).unwrap().name, "Renamed");
        reg.delete_store(&store.id).unwrap();
        assert!(reg.get_store(&store.id).unwrap_err().is_not_found());
    }
}
