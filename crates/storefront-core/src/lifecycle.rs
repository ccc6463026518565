//! Paired store + config lifecycle.
//!
//! A store and its routing config are created, updated and deleted together.
//! Either both writes land or neither does. [`crate::db::RegistryDb`] gets
//! this from a single write transaction; [`PairedRegistry`] gets it from a
//! [`Saga`] over two independent registries.

use std::sync::Arc;

use crate::error::{Result, StoreError};
use crate::registry::{check_version, ConfigRegistry, StoreRegistry};
use crate::saga::Saga;
use crate::subdomain::{self, DEFAULT_RESERVED};
use crate::types::{NewStore, StoreConfig, StoreUpdate, StoreWithConfig};

pub trait StoreLifecycle: Send + Sync {
    fn create(&self, input: NewStore) -> Result<StoreWithConfig>;

    fn update(&self, store_id: &str, update: StoreUpdate) -> Result<StoreWithConfig>;

    fn delete(&self, store_id: &str) -> Result<()>;

    fn get(&self, store_id: &str) -> Result<StoreWithConfig>;

    fn list(&self) -> Result<Vec<StoreWithConfig>>;
}

// ---------------------------------------------------------------------------
// Validation shared by all implementations
// ---------------------------------------------------------------------------

pub(crate) fn validate_new(input: &NewStore, reserved: &[String]) -> Result<()> {
    validate_name(&input.name)?;
    subdomain::validate_claim(&input.subdomain, reserved)
}

pub(crate) fn validate_update(update: &StoreUpdate, reserved: &[String]) -> Result<()> {
    if let Some(name) = &update.name {
        validate_name(name)?;
    }
    if let Some(sub) = &update.subdomain {
        subdomain::validate_claim(sub, reserved)?;
    }
    Ok(())
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(StoreError::InvalidName("name must not be empty".to_string()));
    }
    Ok(())
}

pub(crate) fn default_reserved() -> Vec<String> {
    DEFAULT_RESERVED.iter().map(|s| s.to_string()).collect()
}

/// Join stores with their configs, keeping store order.
pub(crate) fn join_configs(
    stores: Vec<crate::types::Store>,
    mut configs: Vec<StoreConfig>,
) -> Vec<StoreWithConfig> {
    stores
        .into_iter()
        .map(|store| {
            let config = configs
                .iter()
                .position(|c| c.store_id == store.id)
                .map(|i| configs.swap_remove(i));
            StoreWithConfig { store, config }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// PairedRegistry
// ---------------------------------------------------------------------------

/// Lifecycle over two independently-committed registries, kept consistent by
/// compensating writes.
#[derive(Clone)]
pub struct PairedRegistry {
    stores: Arc<dyn StoreRegistry>,
    configs: Arc<dyn ConfigRegistry>,
    reserved: Vec<String>,
}

impl PairedRegistry {
    pub fn new(stores: Arc<dyn StoreRegistry>, configs: Arc<dyn ConfigRegistry>) -> Self {
        Self {
            stores,
            configs,
            reserved: default_reserved(),
        }
    }

    pub fn with_reserved(mut self, reserved: Vec<String>) -> Self {
        self.reserved = reserved;
        self
    }
}

impl StoreLifecycle for PairedRegistry {
    fn create(&self, input: NewStore) -> Result<StoreWithConfig> {
        validate_new(&input, &self.reserved)?;
        let (store, config) = input.into_records();

        let mut saga = Saga::new("create-store");
        saga.step("insert-store", || self.stores.insert_store(&store))?;
        saga.compensate("insert-store", || self.stores.delete_store(&store.id));
        saga.step("insert-config", || self.configs.insert_config(&config))?;
        saga.commit();

        tracing::info!(store_id = %store.id, subdomain = %config.subdomain, "store created");
        Ok(StoreWithConfig {
            store,
            config: Some(config),
        })
    }

    fn update(&self, store_id: &str, update: StoreUpdate) -> Result<StoreWithConfig> {
        validate_update(&update, &self.reserved)?;
        let original_store = self.stores.get_store(store_id)?;
        let original_config = self.configs.find_by_store(store_id)?;

        if update.touches_config() || update.expected_version.is_some() {
            let current = original_config
                .as_ref()
                .ok_or_else(|| StoreError::ConfigNotFound(store_id.to_string()))?;
            check_version(&current.id, update.expected_version, current.version)?;
        }

        let mut saga = Saga::new("update-store");
        let store = if update.touches_store() {
            let next = update.apply_to_store(&original_store);
            saga.step("update-store", || self.stores.update_store(&next))?;
            saga.compensate("update-store", || self.stores.update_store(&original_store));
            next
        } else {
            original_store.clone()
        };

        let config = match (&original_config, update.touches_config()) {
            (Some(current), true) => {
                let next = update.apply_to_config(current);
                Some(saga.step("update-config", || {
                    self.configs.update_config(&next, update.expected_version)
                })?)
            }
            _ => original_config.clone(),
        };
        saga.commit();

        tracing::info!(store_id, "store updated");
        Ok(StoreWithConfig { store, config })
    }

    fn delete(&self, store_id: &str) -> Result<()> {
        let store = self.stores.get_store(store_id)?;
        let config = self.configs.find_by_store(store_id)?;

        let mut saga = Saga::new("delete-store");
        if let Some(cfg) = &config {
            saga.step("delete-config", || self.configs.delete_config(&cfg.id))?;
            saga.compensate("delete-config", move || self.configs.insert_config(cfg));
        }
        saga.step("delete-store", || self.stores.delete_store(&store.id))?;
        saga.commit();

        tracing::info!(store_id, "store deleted");
        Ok(())
    }

    fn get(&self, store_id: &str) -> Result<StoreWithConfig> {
        let store = self.stores.get_store(store_id)?;
        let config = self.configs.find_by_store(store_id)?;
        Ok(StoreWithConfig { store, config })
    }

    fn list(&self) -> Result<Vec<StoreWithConfig>> {
        let stores = self.stores.list_stores()?;
        let configs = self.configs.list_configs()?;
        Ok(join_configs(stores, configs))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
