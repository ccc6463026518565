use crate::error::{Result, StoreError};
use crate::paths;
use crate::subdomain::{validate_subdomain, DEFAULT_RESERVED};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// ServerConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    9000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

// ---------------------------------------------------------------------------
// RegistryConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default = "paths::default_registry_path")]
    pub path: PathBuf,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            path: paths::default_registry_path(),
        }
    }
}

// ---------------------------------------------------------------------------
// TenancyConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenancyConfig {
    /// Route group whose requests are resolved to a store.
    #[serde(default = "default_route_prefix")]
    pub route_prefix: String,
    /// First host labels that skip resolution entirely.
    #[serde(default = "default_reserved_subdomains")]
    pub reserved_subdomains: Vec<String>,
}

fn default_route_prefix() -> String {
    paths::DEFAULT_ROUTE_PREFIX.to_string()
}

fn default_reserved_subdomains() -> Vec<String> {
    DEFAULT_RESERVED.iter().map(|s| s.to_string()).collect()
}

impl Default for TenancyConfig {
    fn default() -> Self {
        Self {
            route_prefix: default_route_prefix(),
            reserved_subdomains: default_reserved_subdomains(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub tenancy: TenancyConfig,
}

fn default_version() -> u32 {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            server: ServerConfig::default(),
            registry: RegistryConfig::default(),
            tenancy: TenancyConfig::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(StoreError::SettingsMissing(path.display().to_string()));
        }
        let data = std::fs::read_to_string(path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    /// Like [`Config::load`], but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Err(StoreError::SettingsMissing(_)) => Ok(Self::default()),
            other => other,
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(path, data.as_bytes())
    }

    /// Registry file location, relative paths taken from the config file's directory.
    pub fn registry_path(&self, config_file: &Path) -> PathBuf {
        paths::registry_path(config_file, &self.registry.path)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        let prefix = &self.tenancy.route_prefix;

        if !prefix.starts_with('/') || prefix.len() < 2 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!(
                    "tenancy.route_prefix '{prefix}' must start with '/' and name a route group"
                ),
            });
        }
        if prefix.trim_end_matches('/') == paths::ADMIN_PREFIX {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!(
                    "tenancy.route_prefix '{prefix}' collides with the admin route group"
                ),
            });
        }

        if self.tenancy.reserved_subdomains.is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "tenancy.reserved_subdomains is empty; admin and api hosts will be \
                          resolved as storefronts"
                    .to_string(),
            });
        }
        for name in &self.tenancy.reserved_subdomains {
            if validate_subdomain(name).is_err() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!(
                        "reserved subdomain '{name}' is not a valid DNS label and can never match"
                    ),
                });
            }
        }

        if self.server.port == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "server.port is 0; the OS will pick a port".to_string(),
            });
        }

        warnings
    }

    pub fn has_errors(&self) -> bool {
        self.validate()
            .iter()
            .any(|w| w.level == WarnLevel::Error)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
