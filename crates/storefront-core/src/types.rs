use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Currency
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    pub currency_code: String,
    #[serde(default)]
    pub is_default: bool,
}

impl Currency {
    pub fn new(code: impl Into<String>, is_default: bool) -> Self {
        Self {
            currency_code: code.into().to_lowercase(),
            is_default,
        }
    }

    /// Build a currency list from bare codes. The first code becomes the default.
    /// An empty list yields a single default `usd`.
    pub fn list_from_codes<S: AsRef<str>>(codes: &[S]) -> Vec<Currency> {
        if codes.is_empty() {
            return default_currencies();
        }
        codes
            .iter()
            .enumerate()
            .map(|(i, c)| Currency::new(c.as_ref(), i == 0))
            .collect()
    }
}

pub fn default_currencies() -> Vec<Currency> {
    vec![Currency::new("usd", true)]
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// The tenant record. One storefront sharing the deployment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Store {
    pub id: String,
    pub name: String,
    #[serde(default = "default_currencies")]
    pub supported_currencies: Vec<Currency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Store {
    pub fn new(name: impl Into<String>, currencies: Vec<Currency>) -> Self {
        let now = Utc::now();
        Self {
            id: format!("store_{}", Uuid::new_v4().simple()),
            name: name.into(),
            supported_currencies: if currencies.is_empty() {
                default_currencies()
            } else {
                currencies
            },
            metadata: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn default_currency(&self) -> Option<&Currency> {
        self.supported_currencies
            .iter()
            .find(|c| c.is_default)
            .or_else(|| self.supported_currencies.first())
    }
}

// ---------------------------------------------------------------------------
// StoreConfig
// ---------------------------------------------------------------------------

/// Routing and activation record, paired one-to-one with a [`Store`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    pub id: String,
    pub store_id: String,
    pub subdomain: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme_settings: Option<serde_json::Value>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    #[serde(default = "initial_version")]
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

fn initial_version() -> u64 {
    1
}

impl StoreConfig {
    pub fn new(store_id: impl Into<String>, subdomain: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: format!("scfg_{}", Uuid::new_v4().simple()),
            store_id: store_id.into(),
            subdomain: subdomain.into(),
            custom_domain: None,
            theme_settings: None,
            is_active: true,
            metadata: None,
            version: initial_version(),
            created_at: now,
            updated_at: now,
        }
    }
}

// ---------------------------------------------------------------------------
// Lifecycle inputs / outputs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewStore {
    pub name: String,
    pub subdomain: String,
    #[serde(default)]
    pub currencies: Option<Vec<Currency>>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
    #[serde(default)]
    pub custom_domain: Option<String>,
    #[serde(default)]
    pub theme_settings: Option<serde_json::Value>,
}

impl NewStore {
    pub fn new(name: impl Into<String>, subdomain: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            subdomain: subdomain.into(),
            ..Default::default()
        }
    }

    /// Split into the pair of records that get written together.
    pub fn into_records(self) -> (Store, StoreConfig) {
        let mut store = Store::new(self.name, self.currencies.unwrap_or_default());
        store.metadata = self.metadata;
        let mut config = StoreConfig::new(store.id.clone(), self.subdomain);
        config.custom_domain = self.custom_domain;
        config.theme_settings = self.theme_settings;
        (store, config)
    }
}

/// Partial update applied to a store and its config. `None` leaves a field as is.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
    #[serde(default)]
    pub subdomain: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub custom_domain: Option<String>,
    #[serde(default)]
    pub theme_settings: Option<serde_json::Value>,
    /// Config version the caller last read. Stale values are rejected.
    #[serde(default)]
    pub expected_version: Option<u64>,
}

impl StoreUpdate {
    pub fn touches_store(&self) -> bool {
        self.name.is_some() || self.metadata.is_some()
    }

    pub fn touches_config(&self) -> bool {
        self.subdomain.is_some()
            || self.is_active.is_some()
            || self.custom_domain.is_some()
            || self.theme_settings.is_some()
    }

    pub fn apply_to_store(&self, store: &Store) -> Store {
        let mut next = store.clone();
        if let Some(name) = &self.name {
            next.name = name.clone();
        }
        if let Some(metadata) = &self.metadata {
            next.metadata = Some(metadata.clone());
        }
        next.updated_at = Utc::now();
        next
    }

    /// Returns the updated config. `version` is left for the registry to bump.
    pub fn apply_to_config(&self, config: &StoreConfig) -> StoreConfig {
        let mut next = config.clone();
        if let Some(subdomain) = &self.subdomain {
            next.subdomain = subdomain.clone();
        }
        if let Some(active) = self.is_active {
            next.is_active = active;
        }
        if let Some(domain) = &self.custom_domain {
            next.custom_domain = if domain.is_empty() {
                None
            } else {
                Some(domain.clone())
            };
        }
        if let Some(theme) = &self.theme_settings {
            next.theme_settings = Some(theme.clone());
        }
        next.updated_at = Utc::now();
        next
    }
}

/// A store together with its routing config, as returned by admin reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreWithConfig {
    #[serde(flatten)]
    pub store: Store,
    pub config: Option<StoreConfig>,
}

// ---------------------------------------------------------------------------
// TenantContext
// ---------------------------------------------------------------------------

/// Per-request binding of "which store is this request for".
///
/// Built by the resolver at the start of a request and dropped with it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TenantContext {
    pub store: Store,
    pub config: StoreConfig,
}

impl TenantContext {
    pub fn store_id(&self) -> &str {
        &self.store.id
    }

    pub fn subdomain(&self) -> &str {
        &self.config.subdomain
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_store_defaults_to_usd() {
        let store = Store::new("Shop", vec![]);
        assert_eq!(store.supported_currencies, vec![Currency::new("usd", true)]);
        assert!(store.id.starts_with("store_"));
    }

    #[test]
    fn currency_codes_first_is_default() {
        let list = Currency::list_from_codes(&["EUR", "gbp"]);
        assert_eq!(list[0].currency_code, "eur");
        assert!(list[0].is_default);
        assert!(!list[1].is_default);
    }

    #[test]
    fn into_records_links_config_to_store() {
        let mut input = NewStore::new("Shop One", "shop1");
        input.custom_domain = Some("shop1.example.org".into());
        let (store, config) = input.into_records();
        assert_eq!(config.store_id, store.id);
        assert_eq!(config.subdomain, "shop1");
        assert!(config.is_active);
        assert_eq!(config.version, 1);
        assert_eq!(config.custom_domain.as_deref(), Some("shop1.example.org"));
    }

    #[test]
    fn update_leaves_unset_fields_alone() {
        let (store, config) = NewStore::new("Shop", "shop").into_records();
        let update = StoreUpdate {
            is_active: Some(false),
            ..Default::default()
        };
        assert!(!update.touches_store());
        assert!(update.touches_config());

        let next = update.apply_to_config(&config);
        assert!(!next.is_active);
        assert_eq!(next.subdomain, "shop");
        assert_eq!(update.apply_to_store(&store).name, "Shop");
    }

    #[test]
    fn empty_custom_domain_clears_it() {
        let (_, mut config) = NewStore::new("Shop", "shop").into_records();
        config.custom_domain = Some("old.example.org".into());
        let update = StoreUpdate {
            custom_domain: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(update.apply_to_config(&config).custom_domain, None);
    }

    #[test]
    fn store_with_config_flattens_store_fields() {
        let (store, config) = NewStore::new("Shop", "shop").into_records();
        let json = serde_json::to_value(StoreWithConfig {
            store: store.clone(),
            config: Some(config),
        })
        .unwrap();
        assert_eq!(json["id"], store.id.as_str());
        assert_eq!(json["config"]["subdomain"], "shop");
    }
}
