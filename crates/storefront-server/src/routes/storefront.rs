use axum::Json;
use serde_json::json;

use crate::tenant::CurrentTenant;

/// GET {prefix}/context: which store this request is bound to
pub async fn context(CurrentTenant(ctx): CurrentTenant) -> Json<serde_json::Value> {
    let Some(ctx) = ctx else {
        return Json(json!({ "scoped": false }));
    };
    let store = &ctx.store;
    let config = &ctx.config;
    Json(json!({
        "scoped": true,
        "store": {
            "id": store.id,
            "name": store.name,
            "supported_currencies": store.supported_currencies,
            "default_currency": store.default_currency().map(|c| c.currency_code.clone()),
        },
        "config": {
            "id": config.id,
            "store_id": config.store_id,
            "subdomain": config.subdomain,
            "custom_domain": config.custom_domain,
            "is_active": config.is_active,
        },
    }))
}

/// GET {prefix}/theme: the bound store's theme, or an empty theme when unscoped
pub async fn theme(CurrentTenant(ctx): CurrentTenant) -> Json<serde_json::Value> {
    let theme = ctx
        .as_ref()
        .and_then(|c| c.config.theme_settings.clone())
        .unwrap_or_else(|| json!({}));
    Json(json!({
        "scoped": ctx.is_some(),
        "theme": theme,
    }))
}
