use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("configuration file not found: {0} (run 'storefront config init')")]
    SettingsMissing(String),

    #[error("store not found: {0}")]
    StoreNotFound(String),

    #[error("store config not found: {0}")]
    ConfigNotFound(String),

    #[error("subdomain already taken: {0}")]
    SubdomainTaken(String),

    #[error("invalid subdomain '{0}': must be a lowercase DNS label (a-z, 0-9, hyphens)")]
    InvalidSubdomain(String),

    #[error("subdomain '{0}' is reserved")]
    ReservedSubdomain(String),

    #[error("invalid store name: {0}")]
    InvalidName(String),

    #[error("version conflict on config {id}: expected {expected}, found {actual}")]
    VersionConflict {
        id: String,
        expected: u64,
        actual: u64,
    },

    #[error("{operation} failed ({cause}) and rollback did not complete: {rollback}")]
    RollbackFailed {
        operation: String,
        cause: String,
        rollback: String,
    },

    #[error("registry error: {0}")]
    Registry(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    /// True for errors that say "the thing asked for does not exist".
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::StoreNotFound(_) | StoreError::ConfigNotFound(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
