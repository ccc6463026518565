use super::Context;
use crate::output::print_json;
use std::sync::Arc;
use storefront_core::tenant::{Resolution, TenantResolver};

/// Run the resolver once against the registry, as the middleware would.
pub fn run(ctx: &Context, host: &str, json: bool) -> anyhow::Result<()> {
    let config = ctx.load_config()?;
    let db = Arc::new(ctx.open_registry(&config)?);
    let resolver = TenantResolver::new(db.clone(), db)
        .with_reserved(config.tenancy.reserved_subdomains.clone());

    let resolution = resolver.resolve(host);

    if json {
        let mut value = serde_json::json!({
            "host": host,
            "subdomain": resolution.subdomain(),
            "outcome": resolution.outcome(),
        });
        match &resolution {
            Resolution::Bound(tenant) => value["context"] = serde_json::to_value(tenant)?,
            Resolution::Unavailable { error, .. } => value["error"] = error.to_string().into(),
            _ => {}
        }
        return print_json(&value);
    }

    match resolution {
        Resolution::Bypass { subdomain } => {
            println!("{subdomain}: reserved, request passes through unscoped")
        }
        Resolution::NotFound { subdomain } => {
            println!("{subdomain}: no active store (404)")
        }
        Resolution::Bound(tenant) => println!(
            "{}: bound to {} ({})",
            tenant.subdomain(),
            tenant.store.name,
            tenant.store_id()
        ),
        Resolution::Unavailable { subdomain, error } => {
            println!("{subdomain}: registry unavailable, request passes through unscoped ({error})")
        }
    }
    Ok(())
}
