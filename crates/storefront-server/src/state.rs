use std::sync::Arc;

use storefront_core::config::TenancyConfig;
use storefront_core::db::RegistryDb;
use storefront_core::lifecycle::{PairedRegistry, StoreLifecycle};
use storefront_core::memory::MemoryRegistry;
use storefront_core::paths::DEFAULT_ROUTE_PREFIX;
use storefront_core::registry::{ConfigRegistry, StoreRegistry};
use storefront_core::tenant::TenantResolver;

/// Shared application state passed to all route handlers.
///
/// Every collaborator is injected here; handlers never look services up by name.
#[derive(Clone)]
pub struct AppState {
    pub resolver: TenantResolver,
    pub lifecycle: Arc<dyn StoreLifecycle>,
    pub route_prefix: String,
}

impl AppState {
    pub fn new(
        configs: Arc<dyn ConfigRegistry>,
        stores: Arc<dyn StoreRegistry>,
        lifecycle: Arc<dyn StoreLifecycle>,
    ) -> Self {
        Self {
            resolver: TenantResolver::new(configs, stores),
            lifecycle,
            route_prefix: DEFAULT_ROUTE_PREFIX.to_string(),
        }
    }

    /// State backed by a redb registry file.
    pub fn persistent(db: RegistryDb, tenancy: &TenancyConfig) -> Self {
        let db = Arc::new(db.with_reserved(tenancy.reserved_subdomains.clone()));
        Self::new(db.clone(), db.clone(), db).with_tenancy(tenancy)
    }

    /// State backed by an in-process registry. Nothing survives a restart.
    pub fn in_memory(tenancy: &TenancyConfig) -> Self {
        let reg = Arc::new(MemoryRegistry::new());
        let lifecycle = PairedRegistry::new(reg.clone(), reg.clone())
            .with_reserved(tenancy.reserved_subdomains.clone());
        Self::new(reg.clone(), reg, Arc::new(lifecycle)).with_tenancy(tenancy)
    }

    pub fn with_tenancy(mut self, tenancy: &TenancyConfig) -> Self {
        self.resolver = self
            .resolver
            .with_reserved(tenancy.reserved_subdomains.clone());
        self.with_route_prefix(&tenancy.route_prefix)
    }

    /// Set the tenant-scoped route group. Trailing slashes are dropped; an
    /// unusable prefix falls back to the default.
    pub fn with_route_prefix(mut self, prefix: &str) -> Self {
        let trimmed = prefix.trim_end_matches('/');
        self.route_prefix = if trimmed.starts_with('/') && trimmed.len() > 1 {
            trimmed.to_string()
        } else {
            tracing::warn!(prefix, "unusable route prefix, using {}", DEFAULT_ROUTE_PREFIX);
            DEFAULT_ROUTE_PREFIX.to_string()
        };
        self
    }
}
