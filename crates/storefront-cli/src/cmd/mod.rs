pub mod config;
pub mod resolve;
pub mod serve;
pub mod store;

use anyhow::Context as _;
use std::path::{Path, PathBuf};
use storefront_core::config::Config;
use storefront_core::db::RegistryDb;
use storefront_core::paths;

/// Where the config file and registry live for this invocation.
pub struct Context {
    config_file: PathBuf,
    db_override: Option<PathBuf>,
}

impl Context {
    pub fn new(config: Option<PathBuf>, db: Option<PathBuf>) -> Self {
        Self {
            config_file: config.unwrap_or_else(paths::default_config_path),
            db_override: db,
        }
    }

    pub fn config_file(&self) -> &Path {
        &self.config_file
    }

    /// Config from disk, or the defaults when the file does not exist yet.
    pub fn load_config(&self) -> anyhow::Result<Config> {
        Config::load_or_default(&self.config_file)
            .with_context(|| format!("failed to load {}", self.config_file.display()))
    }

    pub fn registry_path(&self, config: &Config) -> PathBuf {
        match &self.db_override {
            Some(path) => path.clone(),
            None => config.registry_path(&self.config_file),
        }
    }

    /// Open the registry with the reserved list from `config` applied.
    pub fn open_registry(&self, config: &Config) -> anyhow::Result<RegistryDb> {
        let path = self.registry_path(config);
        let db = RegistryDb::open(&path)
            .with_context(|| format!("failed to open registry at {}", path.display()))?;
        Ok(db.with_reserved(config.tenancy.reserved_subdomains.clone()))
    }
}
