use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

pub const CONFIG_FILE: &str = "storefront.yaml";
pub const REGISTRY_FILE: &str = ".storefront/registry.redb";

pub const DEFAULT_ROUTE_PREFIX: &str = "/store";
pub const ADMIN_PREFIX: &str = "/admin";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn default_config_path() -> PathBuf {
    PathBuf::from(CONFIG_FILE)
}

pub fn default_registry_path() -> PathBuf {
    PathBuf::from(REGISTRY_FILE)
}

/// Resolve a registry path from config relative to the config file's directory.
pub fn registry_path(config_file: &Path, configured: &Path) -> PathBuf {
    if configured.is_absolute() {
        return configured.to_path_buf();
    }
    match config_file.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.join(configured),
        _ => configured.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_registry_path_follows_config_dir() {
        let got = registry_path(Path::new("/etc/shop/storefront.yaml"), Path::new("data/r.redb"));
        assert_eq!(got, PathBuf::from("/etc/shop/data/r.redb"));
    }

    #[test]
    fn bare_config_name_keeps_relative_path() {
        let got = registry_path(Path::new("storefront.yaml"), Path::new(REGISTRY_FILE));
        assert_eq!(got, PathBuf::from(REGISTRY_FILE));
    }

    #[test]
    fn absolute_registry_path_wins() {
        let got = registry_path(Path::new("/etc/storefront.yaml"), Path::new("/var/lib/r.redb"));
        assert_eq!(got, PathBuf::from("/var/lib/r.redb"));
    }
}
