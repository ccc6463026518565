//! Persistent registry backed by redb.
//!
//! # Table design
//!
//! ```text
//! stores           store id     -> JSON Store
//! store_configs    config id    -> JSON StoreConfig
//! subdomain_index  subdomain    -> config id
//! ```
//!
//! `subdomain_index` is written in the same transaction as `store_configs`,
//! which is what keeps subdomains unique. Lifecycle operations touch the store
//! and config tables inside one write transaction, so a failure anywhere
//! aborts the whole operation.

use std::path::Path;

use redb::{
    Database, ReadTransaction, ReadableTable, Table, TableDefinition, WriteTransaction,
};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, StoreError};
use crate::lifecycle::{
    default_reserved, join_configs, validate_new, validate_update, StoreLifecycle,
};
use crate::registry::{check_version, ConfigRegistry, StoreRegistry};
use crate::types::{NewStore, Store, StoreConfig, StoreUpdate, StoreWithConfig};

// ---------------------------------------------------------------------------
// Table definitions
// ---------------------------------------------------------------------------

const STORES: TableDefinition<&str, &[u8]> = TableDefinition::new("stores");
const CONFIGS: TableDefinition<&str, &[u8]> = TableDefinition::new("store_configs");
const SUBDOMAINS: TableDefinition<&str, &str> = TableDefinition::new("subdomain_index");

fn db_err(e: impl std::fmt::Display) -> StoreError {
    StoreError::Registry(e.to_string())
}

// ---------------------------------------------------------------------------
// JSON helpers
// ---------------------------------------------------------------------------

fn get_json<T: DeserializeOwned>(
    table: &impl ReadableTable<&'static str, &'static [u8]>,
    key: &str,
) -> Result<Option<T>> {
    match table.get(key).map_err(db_err)? {
        Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
        None => Ok(None),
    }
}

fn all_json<T: DeserializeOwned>(
    table: &impl ReadableTable<&'static str, &'static [u8]>,
) -> Result<Vec<T>> {
    let mut result = Vec::new();
    for entry in table.iter().map_err(db_err)? {
        let (_, v) = entry.map_err(db_err)?;
        result.push(serde_json::from_slice(v.value())?);
    }
    Ok(result)
}

fn put_json<T: Serialize>(
    table: &mut Table<'_, &'static str, &'static [u8]>,
    key: &str,
    value: &T,
) -> Result<()> {
    let bytes = serde_json::to_vec(value)?;
    table.insert(key, bytes.as_slice()).map_err(db_err)?;
    Ok(())
}

fn config_for_store(
    table: &impl ReadableTable<&'static str, &'static [u8]>,
    store_id: &str,
) -> Result<Option<StoreConfig>> {
    let all: Vec<StoreConfig> = all_json(table)?;
    Ok(all.into_iter().find(|c| c.store_id == store_id))
}

// ---------------------------------------------------------------------------
// Transaction-scoped operations
// ---------------------------------------------------------------------------

fn tx_get_store(wt: &WriteTransaction, id: &str) -> Result<Store> {
    let table = wt.open_table(STORES).map_err(db_err)?;
    get_json(&table, id)?.ok_or_else(|| StoreError::StoreNotFound(id.to_string()))
}

fn tx_put_store(wt: &WriteTransaction, store: &Store) -> Result<()> {
    let mut table = wt.open_table(STORES).map_err(db_err)?;
    put_json(&mut table, &store.id, store)
}

fn tx_remove_store(wt: &WriteTransaction, id: &str) -> Result<()> {
    let mut table = wt.open_table(STORES).map_err(db_err)?;
    let removed = table.remove(id).map_err(db_err)?.is_some();
    if !removed {
        return Err(StoreError::StoreNotFound(id.to_string()));
    }
    Ok(())
}

fn tx_config_for_store(wt: &WriteTransaction, store_id: &str) -> Result<Option<StoreConfig>> {
    let table = wt.open_table(CONFIGS).map_err(db_err)?;
    config_for_store(&table, store_id)
}

fn tx_insert_config(wt: &WriteTransaction, config: &StoreConfig) -> Result<()> {
    {
        let mut index = wt.open_table(SUBDOMAINS).map_err(db_err)?;
        let taken = index.get(config.subdomain.as_str()).map_err(db_err)?.is_some();
        if taken {
            return Err(StoreError::SubdomainTaken(config.subdomain.clone()));
        }
        index
            .insert(config.subdomain.as_str(), config.id.as_str())
            .map_err(db_err)?;
    }
    let mut table = wt.open_table(CONFIGS).map_err(db_err)?;
    put_json(&mut table, &config.id, config)
}

fn tx_update_config(
    wt: &WriteTransaction,
    config: &StoreConfig,
    expected_version: Option<u64>,
) -> Result<StoreConfig> {
    let mut table = wt.open_table(CONFIGS).map_err(db_err)?;
    let current: StoreConfig = get_json(&table, &config.id)?
        .ok_or_else(|| StoreError::ConfigNotFound(config.id.clone()))?;
    check_version(&config.id, expected_version, current.version)?;

    if current.subdomain != config.subdomain {
        let mut index = wt.open_table(SUBDOMAINS).map_err(db_err)?;
        let owner = index
            .get(config.subdomain.as_str())
            .map_err(db_err)?
            .map(|g| g.value().to_string());
        if owner.is_some_and(|id| id != config.id) {
            return Err(StoreError::SubdomainTaken(config.subdomain.clone()));
        }
        index.remove(current.subdomain.as_str()).map_err(db_err)?;
        index
            .insert(config.subdomain.as_str(), config.id.as_str())
            .map_err(db_err)?;
    }

    let mut stored = config.clone();
    stored.version = current.version + 1;
    put_json(&mut table, &stored.id, &stored)?;
    Ok(stored)
}

fn tx_remove_config(wt: &WriteTransaction, id: &str) -> Result<()> {
    let mut table = wt.open_table(CONFIGS).map_err(db_err)?;
    let current: StoreConfig =
        get_json(&table, id)?.ok_or_else(|| StoreError::ConfigNotFound(id.to_string()))?;
    table.remove(id).map_err(db_err)?;
    let mut index = wt.open_table(SUBDOMAINS).map_err(db_err)?;
    index.remove(current.subdomain.as_str()).map_err(db_err)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// RegistryDb
// ---------------------------------------------------------------------------

/// Store and config registry in a single redb file.
pub struct RegistryDb {
    db: Database,
    reserved: Vec<String>,
}

impl RegistryDb {
    /// Open or create the database at `path`, creating parent directories
    /// and all tables.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            crate::io::ensure_dir(parent)?;
        }
        let db = Database::create(path).map_err(db_err)?;
        let wt = db.begin_write().map_err(db_err)?;
        wt.open_table(STORES).map_err(db_err)?;
        wt.open_table(CONFIGS).map_err(db_err)?;
        wt.open_table(SUBDOMAINS).map_err(db_err)?;
        wt.commit().map_err(db_err)?;
        tracing::debug!(path = %path.display(), "registry opened");
        Ok(Self {
            db,
            reserved: default_reserved(),
        })
    }

    /// Subdomains the lifecycle refuses to hand out.
    pub fn with_reserved(mut self, reserved: Vec<String>) -> Self {
        self.reserved = reserved;
        self
    }

    fn read<T>(&self, f: impl FnOnce(&ReadTransaction) -> Result<T>) -> Result<T> {
        let rt = self.db.begin_read().map_err(db_err)?;
        f(&rt)
    }

    /// Run `f` in a write transaction; commit on success, abort on error.
    fn write<T>(&self, f: impl FnOnce(&WriteTransaction) -> Result<T>) -> Result<T> {
        let wt = self.db.begin_write().map_err(db_err)?;
        match f(&wt) {
            Ok(out) => {
                wt.commit().map_err(db_err)?;
                Ok(out)
            }
            Err(e) => {
                if let Err(abort) = wt.abort() {
                    tracing::error!(error = %abort, "failed to abort registry transaction");
                }
                Err(e)
            }
        }
    }
}

impl ConfigRegistry for RegistryDb {
    fn find_active(&self, subdomain: &str) -> Result<Option<StoreConfig>> {
        self.read(|rt| {
            let index = rt.open_table(SUBDOMAINS).map_err(db_err)?;
            let Some(config_id) = index
                .get(subdomain)
                .map_err(db_err)?
                .map(|g| g.value().to_string())
            else {
                return Ok(None);
            };
            let table = rt.open_table(CONFIGS).map_err(db_err)?;
            let config: Option<StoreConfig> = get_json(&table, &config_id)?;
            Ok(config.filter(|c| c.is_active))
        })
    }

    fn find_by_store(&self, store_id: &str) -> Result<Option<StoreConfig>> {
        self.read(|rt| {
            let table = rt.open_table(CONFIGS).map_err(db_err)?;
            config_for_store(&table, store_id)
        })
    }

    fn get_config(&self, id: &str) -> Result<StoreConfig> {
        self.read(|rt| {
            let table = rt.open_table(CONFIGS).map_err(db_err)?;
            get_json(&table, id)?.ok_or_else(|| StoreError::ConfigNotFound(id.to_string()))
        })
    }

    fn list_configs(&self) -> Result<Vec<StoreConfig>> {
        let mut all: Vec<StoreConfig> = self.read(|rt| {
            let table = rt.open_table(CONFIGS).map_err(db_err)?;
            all_json(&table)
        })?;
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(all)
    }

    fn insert_config(&self, config: &StoreConfig) -> Result<()> {
        self.write(|wt| tx_insert_config(wt, config))
    }

    fn update_config(
        &self,
        config: &StoreConfig,
        expected_version: Option<u64>,
    ) -> Result<StoreConfig> {
        self.write(|wt| tx_update_config(wt, config, expected_version))
    }

    fn delete_config(&self, id: &str) -> Result<()> {
        self.write(|wt| tx_remove_config(wt, id))
    }
}

impl StoreRegistry for RegistryDb {
    fn get_store(&self, id: &str) -> Result<Store> {
        self.read(|rt| {
            let table = rt.open_table(STORES).map_err(db_err)?;
            get_json(&table, id)?.ok_or_else(|| StoreError::StoreNotFound(id.to_string()))
        })
    }

    fn list_stores(&self) -> Result<Vec<Store>> {
        let mut all: Vec<Store> = self.read(|rt| {
            let table = rt.open_table(STORES).map_err(db_err)?;
            all_json(&table)
        })?;
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(all)
    }

    fn insert_store(&self, store: &Store) -> Result<()> {
        self.write(|wt| tx_put_store(wt, store))
    }

    fn update_store(&self, store: &Store) -> Result<()> {
        self.write(|wt| {
            tx_get_store(wt, &store.id)?;
            tx_put_store(wt, store)
        })
    }

    fn delete_store(&self, id: &str) -> Result<()> {
        self.write(|wt| tx_remove_store(wt, id))
    }
}

impl StoreLifecycle for RegistryDb {
    fn create(&self, input: NewStore) -> Result<StoreWithConfig> {
        validate_new(&input, &self.reserved)?;
        let (store, config) = input.into_records();
        self.write(|wt| {
            tx_put_store(wt, &store)?;
            tx_insert_config(wt, &config)
        })?;
        tracing::info!(store_id = %store.id, subdomain = %config.subdomain, "store created");
        Ok(StoreWithConfig {
            store,
            config: Some(config),
        })
    }

    fn update(&self, store_id: &str, update: StoreUpdate) -> Result<StoreWithConfig> {
        validate_update(&update, &self.reserved)?;
        let updated = self.write(|wt| {
            let current_store = tx_get_store(wt, store_id)?;
            let current_config = tx_config_for_store(wt, store_id)?;

            if update.touches_config() || update.expected_version.is_some() {
                let current = current_config
                    .as_ref()
                    .ok_or_else(|| StoreError::ConfigNotFound(store_id.to_string()))?;
                check_version(&current.id, update.expected_version, current.version)?;
            }

            let store = if update.touches_store() {
                let next = update.apply_to_store(&current_store);
                tx_put_store(wt, &next)?;
                next
            } else {
                current_store
            };
            let config = match current_config {
                Some(current) if update.touches_config() => {
                    let next = update.apply_to_config(&current);
                    Some(tx_update_config(wt, &next, update.expected_version)?)
                }
                other => other,
            };
            Ok(StoreWithConfig { store, config })
        })?;
        tracing::info!(store_id, "store updated");
        Ok(updated)
    }

    fn delete(&self, store_id: &str) -> Result<()> {
        self.write(|wt| {
            if let Some(config) = tx_config_for_store(wt, store_id)? {
                tx_remove_config(wt, &config.id)?;
            }
            tx_remove_store(wt, store_id)
        })?;
        tracing::info!(store_id, "store deleted");
        Ok(())
    }

    fn get(&self, store_id: &str) -> Result<StoreWithConfig> {
        let store = self.get_store(store_id)?;
        let config = self.find_by_store(store_id)?;
        Ok(StoreWithConfig { store, config })
    }

    fn list(&self) -> Result<Vec<StoreWithConfig>> {
        Ok(join_configs(self.list_stores()?, self.list_configs()?))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_tmp() -> (TempDir, RegistryDb) {
        let dir = TempDir::new().unwrap();
        let db = RegistryDb::open(&dir.path().join("data/registry.redb")).unwrap();
        (dir, db)
    }

    #[test]
    fn create_then_resolve_by_subdomain() {
        let (_dir, db) = open_tmp();
        let created = db.create(NewStore::new("Shop One", "shop1")).unwrap();
        let found = db.find_active("shop1").unwrap().unwrap();
        assert_eq!(found.store_id, created.store.id);
        assert_eq!(db.get_store(&found.store_id).unwrap().name, "Shop One");
    }

    #[test]
    fn duplicate_subdomain_aborts_whole_create() {
        let (_dir, db) = open_tmp();
        db.create(NewStore::new("A", "shop")).unwrap();
        let err = db.create(NewStore::new("B", "shop")).unwrap_err();
        assert!(matches!(err, StoreError::SubdomainTaken(_)));
        assert_eq!(db.list_stores().unwrap().len(), 1, "no orphan store");
    }

    #[test]
    fn deactivated_config_is_not_active() {
        let (_dir, db) = open_tmp();
        let created = db.create(NewStore::new("Shop", "shop2")).unwrap();
        let update = StoreUpdate {
            is_active: Some(false),
            ..Default::default()
        };
        let updated = db.update(&created.store.id, update).unwrap();
        assert!(!updated.config.as_ref().unwrap().is_active);
        assert!(db.find_active("shop2").unwrap().is_none());
    }

    #[test]
    fn subdomain_change_moves_index() {
        let (_dir, db) = open_tmp();
        let created = db.create(NewStore::new("Shop", "old-name")).unwrap();
        let update = StoreUpdate {
            subdomain: Some("new-name".into()),
            ..Default::default()
        };
        db.update(&created.store.id, update).unwrap();
        assert!(db.find_active("old-name").unwrap().is_none());
        assert!(db.find_active("new-name").unwrap().is_some());

        // The old name is free again.
        db.create(NewStore::new("Other", "old-name")).unwrap();
    }

    #[test]
    fn failed_config_update_keeps_store_unchanged() {
        let (_dir, db) = open_tmp();
        db.create(NewStore::new("A", "alpha")).unwrap();
        let b = db.create(NewStore::new("B", "beta")).unwrap();

        let update = StoreUpdate {
            name: Some("B renamed".into()),
            subdomain: Some("alpha".into()),
            ..Default::default()
        };
        let err = db.update(&b.store.id, update).unwrap_err();
        assert!(matches!(err, StoreError::SubdomainTaken(_)));
        assert_eq!(db.get_store(&b.store.id).unwrap().name, "B");
    }

    #[test]
    fn stale_expected_version_conflicts() {
        let (_dir, db) = open_tmp();
        let created = db.create(NewStore::new("Shop", "shop")).unwrap();
        let first = StoreUpdate {
            theme_settings: Some(serde_json::json!({ "primary": "#000" })),
            expected_version: Some(1),
            ..Default::default()
        };
        db.update(&created.store.id, first.clone()).unwrap();
        let err = db.update(&created.store.id, first).unwrap_err();
        assert!(matches!(
            err,
            StoreError::VersionConflict {
                expected: 1,
                actual: 2,
                ..
            }
        ));
    }

    #[test]
    fn delete_removes_store_config_and_index() {
        let (_dir, db) = open_tmp();
        let created = db.create(NewStore::new("Shop", "shop")).unwrap();
        db.delete(&created.store.id).unwrap();
        assert!(db.list_stores().unwrap().is_empty());
        assert!(db.list_configs().unwrap().is_empty());
        assert!(db.find_active("shop").unwrap().is_none());
        db.create(NewStore::new("Again", "shop")).unwrap();
    }

    #[test]
    fn delete_missing_is_not_found() {
        let (_dir, db) = open_tmp();
        assert!(db.delete("store_missing").unwrap_err().is_not_found());
    }

    #[test]
    fn data_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("registry.redb");
        {
            let db = RegistryDb::open(&path).unwrap();
            db.create(NewStore::new("Shop", "shop")).unwrap();
        }
        let db = RegistryDb::open(&path).unwrap();
        assert_eq!(db.list().unwrap().len(), 1);
    }
}
