use crate::error::{Result, StoreError};
use regex::Regex;
use std::sync::OnceLock;

/// Subdomains that never map to a storefront by default.
pub const DEFAULT_RESERVED: &[&str] = &["admin", "api"];

const MAX_LABEL_LEN: usize = 63;

// ---------------------------------------------------------------------------
// Host parsing
// ---------------------------------------------------------------------------

/// Extract the candidate subdomain from a `Host` header value.
///
/// The port is dropped, then everything before the first `.` is returned.
/// A host without dots is returned whole; an empty host gives `""`.
pub fn candidate_subdomain(host: &str) -> &str {
    let bare = host.split(':').next().unwrap_or(host);
    bare.split('.').next().unwrap_or(bare)
}

/// Exact, case-sensitive match against the reserved list.
pub fn is_reserved<S: AsRef<str>>(candidate: &str, reserved: &[S]) -> bool {
    reserved.iter().any(|r| r.as_ref() == candidate)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

static LABEL_RE: OnceLock<Regex> = OnceLock::new();

fn label_re() -> &'static Regex {
    LABEL_RE.get_or_init(|| {
        Regex::new(r"^[a-z0-9][a-z0-9\-]*[a-z0-9]$|^[a-z0-9]$").expect("static regex is valid")
    })
}

/// Check that `subdomain` is a lowercase DNS label.
pub fn validate_subdomain(subdomain: &str) -> Result<()> {
    if subdomain.is_empty() || subdomain.len() > MAX_LABEL_LEN || !label_re().is_match(subdomain) {
        return Err(StoreError::InvalidSubdomain(subdomain.to_string()));
    }
    Ok(())
}

/// Validate a subdomain that is about to be claimed by a store config.
pub fn validate_claim<S: AsRef<str>>(subdomain: &str, reserved: &[S]) -> Result<()> {
    validate_subdomain(subdomain)?;
    if is_reserved(subdomain, reserved) {
        return Err(StoreError::ReservedSubdomain(subdomain.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
