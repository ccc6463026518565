//! Host-based tenant resolution.
//!
//! Resolution order for a `Host` value:
//! 1. Candidate = first label of the host (port stripped).
//! 2. Candidate is reserved → `Bypass`; the registry is never consulted.
//! 3. Look up the active config for the candidate. Deactivated configs are
//!    indistinguishable from missing ones.
//! 4. No config → `NotFound`.
//! 5. Config found → fetch its store → `Bound`.
//! 6. Any registry error in 3 or 5 → `Unavailable`. Callers fail open.
//!
//! Every call re-reads the registry; there is no cache.

use std::sync::Arc;

use crate::error::StoreError;
use crate::lifecycle::default_reserved;
use crate::registry::{ConfigRegistry, StoreRegistry};
use crate::subdomain::{candidate_subdomain, is_reserved};
use crate::types::TenantContext;

#[derive(Debug)]
pub enum Resolution {
    Bypass { subdomain: String },
    NotFound { subdomain: String },
    Bound(TenantContext),
    Unavailable { subdomain: String, error: StoreError },
}

impl Resolution {
    pub fn subdomain(&self) -> &str {
        match self {
            Resolution::Bypass { subdomain }
            | Resolution::NotFound { subdomain }
            | Resolution::Unavailable { subdomain, .. } => subdomain,
            Resolution::Bound(ctx) => ctx.subdomain(),
        }
    }

    pub fn context(&self) -> Option<&TenantContext> {
        match self {
            Resolution::Bound(ctx) => Some(ctx),
            _ => None,
        }
    }

    pub fn into_context(self) -> Option<TenantContext> {
        match self {
            Resolution::Bound(ctx) => Some(ctx),
            _ => None,
        }
    }

    /// Short label for logs and CLI output.
    pub fn outcome(&self) -> &'static str {
        match self {
            Resolution::Bypass { .. } => "bypass",
            Resolution::NotFound { .. } => "not_found",
            Resolution::Bound(_) => "bound",
            Resolution::Unavailable { .. } => "unavailable",
        }
    }
}

/// Resolves request hosts to stores using injected registries.
#[derive(Clone)]
pub struct TenantResolver {
    configs: Arc<dyn ConfigRegistry>,
    stores: Arc<dyn StoreRegistry>,
    reserved: Vec<String>,
}

impl TenantResolver {
    pub fn new(configs: Arc<dyn ConfigRegistry>, stores: Arc<dyn StoreRegistry>) -> Self {
        Self {
            configs,
            stores,
            reserved: default_reserved(),
        }
    }

    pub fn with_reserved(mut self, reserved: Vec<String>) -> Self {
        self.reserved = reserved;
        self
    }

    pub fn reserved(&self) -> &[String] {
        &self.reserved
    }

    pub fn resolve(&self, host: &str) -> Resolution {
        resolve_tenant(host, &self.reserved, self.configs.as_ref(), self.stores.as_ref())
    }
}

/// One resolution against explicit collaborators. At most two reads.
pub fn resolve_tenant(
    host: &str,
    reserved: &[String],
    configs: &dyn ConfigRegistry,
    stores: &dyn StoreRegistry,
) -> Resolution {
    let subdomain = candidate_subdomain(host).to_string();
    if is_reserved(&subdomain, reserved) {
        return Resolution::Bypass { subdomain };
    }

    let config = match configs.find_active(&subdomain) {
        Ok(Some(config)) => config,
        Ok(None) => return Resolution::NotFound { subdomain },
        Err(error) => return Resolution::Unavailable { subdomain, error },
    };

    match stores.get_store(&config.store_id) {
        Ok(store) => Resolution::Bound(TenantContext { store, config }),
        Err(error) => Resolution::Unavailable { subdomain, error },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::lifecycle::{PairedRegistry, StoreLifecycle};
    use crate::memory::MemoryRegistry;
    use crate::types::{NewStore, Store, StoreConfig, StoreUpdate};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Registry that counts lookups and can be switched to fail every call.
    #[derive(Default)]
    struct Probe {
        inner: MemoryRegistry,
        calls: AtomicUsize,
        down: bool,
    }

    impl Probe {
        fn down() -> Self {
            Self {
                down: true,
                ..Default::default()
            }
        }

        fn hit(&self) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.down {
                return Err(StoreError::Registry("ConnectionError: refused".into()));
            }
            Ok(())
        }
    }

    impl ConfigRegistry for Probe {
        fn find_active(&self, s: &str) -> Result<Option<StoreConfig>> {
            self.hit()?;
            self.inner.find_active(s)
        }
        fn find_by_store(&self, id: &str) -> Result<Option<StoreConfig>> {
            self.hit()?;
            self.inner.find_by_store(id)
        }
        fn get_config(&self, id: &str) -> Result<StoreConfig> {
            self.hit()?;
            self.inner.get_config(id)
        }
        fn list_configs(&self) -> Result<Vec<StoreConfig>> {
            self.hit()?;
            self.inner.list_configs()
        }
        fn insert_config(&self, c: &StoreConfig) -> Result<()> {
            self.inner.insert_config(c)
        }
        fn update_config(&self, c: &StoreConfig, v: Option<u64>) -> Result<StoreConfig> {
            self.inner.update_config(c, v)
        }
        fn delete_config(&self, id: &str) -> Result<()> {
            self.inner.delete_config(id)
        }
    }

    impl StoreRegistry for Probe {
        fn get_store(&self, id: &str) -> Result<Store> {
            self.hit()?;
            self.inner.get_store(id)
        }
        fn list_stores(&self) -> Result<Vec<Store>> {
            self.hit()?;
            self.inner.list_stores()
        }
        fn insert_store(&self, s: &Store) -> Result<()> {
            self.inner.insert_store(s)
        }
        fn update_store(&self, s: &Store) -> Result<()> {
            self.inner.update_store(s)
        }
        fn delete_store(&self, id: &str) -> Result<()> {
            self.inner.delete_store(id)
        }
    }

    fn seeded() -> (Arc<MemoryRegistry>, TenantResolver, PairedRegistry) {
        let reg = Arc::new(MemoryRegistry::new());
        let resolver = TenantResolver::new(reg.clone(), reg.clone());
        let lifecycle = PairedRegistry::new(reg.clone(), reg.clone());
        (reg, resolver, lifecycle)
    }

    #[test]
    fn active_config_binds_context() {
        let (_reg, resolver, lifecycle) = seeded();
        let created = lifecycle.create(NewStore::new("Shop 1", "shop1")).unwrap();

        let res = resolver.resolve("shop1.example.com");
        let ctx = res.context().expect("context should be bound");
        assert_eq!(ctx.subdomain(), "shop1");
        assert_eq!(ctx.store_id(), created.store.id);
    }

    #[test]
    fn inactive_config_is_not_found() {
        let (_reg, resolver, lifecycle) = seeded();
        let created = lifecycle.create(NewStore::new("Shop 2", "shop2")).unwrap();
        lifecycle
            .update(
                &created.store.id,
                StoreUpdate {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .unwrap();

        match resolver.resolve("shop2.example.com") {
            Resolution::NotFound { subdomain } => assert_eq!(subdomain, "shop2"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn missing_config_names_subdomain() {
        let (_reg, resolver, _) = seeded();
        let res = resolver.resolve("ghost.example.com:8443");
        assert_eq!(res.outcome(), "not_found");
        assert_eq!(res.subdomain(), "ghost");
    }

    #[test]
    fn reserved_hosts_never_touch_registry() {
        let probe = Arc::new(Probe::default());
        let resolver = TenantResolver::new(probe.clone(), probe.clone());
        for host in ["admin.example.com", "api.example.com", "api"] {
            let res = resolver.resolve(host);
            assert!(matches!(res, Resolution::Bypass { .. }), "{host}");
            assert!(res.context().is_none());
        }
        assert_eq!(probe.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn custom_reserved_list_is_honoured() {
        let (_reg, resolver, _) = seeded();
        let resolver = resolver.with_reserved(vec!["www".into()]);
        assert_eq!(resolver.resolve("www.example.com").outcome(), "bypass");
        assert_eq!(resolver.resolve("admin.example.com").outcome(), "not_found");
    }

    #[test]
    fn registry_failure_is_unavailable() {
        let probe = Arc::new(Probe::down());
        let resolver = TenantResolver::new(probe.clone(), probe.clone());
        match resolver.resolve("shop1.example.com") {
            Resolution::Unavailable { subdomain, error } => {
                assert_eq!(subdomain, "shop1");
                assert!(error.to_string().contains("ConnectionError"));
            }
            other => panic!("expected Unavailable, got {other:?}"),
        }
    }

    #[test]
    fn free_function_matches_resolver() {
        let reg = MemoryRegistry::new();
        let (store, config) = NewStore::new("Shop", "shop").into_records();
        reg.insert_store(&store).unwrap();
        reg.insert_config(&config).unwrap();
        let reserved = vec!["www".to_string()];

        let res = resolve_tenant("shop.example.com", &reserved, &reg, &reg);
        assert_eq!(res.context().map(|c| c.store_id()), Some(store.id.as_str()));
        assert_eq!(resolve_tenant("www.example.com", &reserved, &reg, &reg).outcome(), "bypass");
    }

    #[test]
    fn dangling_config_is_unavailable() {
        let reg = Arc::new(MemoryRegistry::new());
        let (_, config) = NewStore::new("Gone", "gone").into_records();
        reg.insert_config(&config).unwrap();
        let resolver = TenantResolver::new(reg.clone(), reg.clone());
        let res = resolver.resolve("gone.example.com");
        assert_eq!(res.outcome(), "unavailable");
    }

    #[test]
    fn at_most_two_reads_per_resolution() {
        let probe = Arc::new(Probe::default());
        let (store, config) = NewStore::new("Shop", "shop").into_records();
        probe.insert_store(&store).unwrap();
        probe.insert_config(&config).unwrap();
        let resolver = TenantResolver::new(probe.clone(), probe.clone());

        assert_eq!(resolver.resolve("shop.example.com").outcome(), "bound");
        assert_eq!(probe.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn resolution_is_idempotent() {
        let (_reg, resolver, lifecycle) = seeded();
        lifecycle.create(NewStore::new("Shop", "shop1")).unwrap();
        let first = resolver.resolve("shop1.example.com").into_context();
        let second = resolver.resolve("shop1.example.com").into_context();
        assert!(first.is_some());
        assert_eq!(first, second);

        let miss_a = resolver.resolve("nope.example.com");
        let miss_b = resolver.resolve("nope.example.com");
        assert_eq!(miss_a.outcome(), miss_b.outcome());
        assert_eq!(miss_a.subdomain(), miss_b.subdomain());
    }
}
