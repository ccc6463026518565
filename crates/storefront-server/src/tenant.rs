use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use storefront_core::tenant::Resolution;
use storefront_core::types::TenantContext;

use crate::error::AppError;
use crate::state::AppState;

/// Axum middleware that binds the requesting store to the request.
///
/// Flow (evaluated in order, before any downstream handler runs):
/// 1. Candidate subdomain = first label of `Host` (port dropped)
/// 2. Reserved candidate (`admin`, `api` by default) → passthrough, no lookup
/// 3. No active config for the candidate → 404 naming the subdomain
/// 4. Config and store found → `TenantContext` inserted into request extensions
/// 5. Registry error → logged, passthrough without a context
///
/// Step 5 fails open: a registry outage leaves storefront traffic unscoped
/// instead of failing it. Handlers read the context through [`CurrentTenant`]
/// and treat its absence as a global request.
pub async fn tenant_middleware(State(app): State<AppState>, mut req: Request, next: Next) -> Response {
    let host = request_host(&req);
    let resolver = app.resolver.clone();

    let resolution = match tokio::task::spawn_blocking(move || resolver.resolve(&host)).await {
        Ok(resolution) => resolution,
        Err(e) => {
            tracing::error!(error = %e, "store context resolution task failed, continuing unscoped");
            return next.run(req).await;
        }
    };

    match resolution {
        Resolution::Bypass { subdomain } => {
            tracing::trace!(%subdomain, "reserved subdomain, skipping store context");
            next.run(req).await
        }
        Resolution::NotFound { subdomain } => {
            tracing::debug!(%subdomain, "no active store for subdomain");
            AppError::not_found(format!("store not found for subdomain: {subdomain}")).into_response()
        }
        Resolution::Bound(ctx) => {
            tracing::debug!(
                subdomain = %ctx.subdomain(),
                store_id = %ctx.store_id(),
                "store context bound"
            );
            req.extensions_mut().insert(ctx);
            next.run(req).await
        }
        Resolution::Unavailable { subdomain, error } => {
            tracing::error!(
                %subdomain,
                error = %error,
                "store context resolution failed, continuing unscoped"
            );
            next.run(req).await
        }
    }
}

/// `Host` header, falling back to the URI authority (HTTP/2 `:authority`).
fn request_host(req: &Request) -> String {
    req.headers()
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .or_else(|| req.uri().authority().map(|a| a.as_str()))
        .unwrap_or("")
        .to_string()
}

// ---------------------------------------------------------------------------
// Extractor
// ---------------------------------------------------------------------------

/// The store bound to this request, if any.
///
/// Never rejects. `None` means the request is unscoped: a reserved host, a
/// route outside the tenant group, or a registry outage.
#[derive(Debug, Clone)]
pub struct CurrentTenant(pub Option<TenantContext>);

impl<S> FromRequestParts<S> for CurrentTenant
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(CurrentTenant(parts.extensions.get::<TenantContext>().cloned()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::{body::Body, http::Request, middleware, routing::get, Router};
    use storefront_core::config::TenancyConfig;
    use storefront_core::lifecycle::StoreLifecycle;
    use storefront_core::types::NewStore;
    use tower::ServiceExt;

    async fn scoped_handler(CurrentTenant(ctx): CurrentTenant) -> String {
        match ctx {
            Some(ctx) => ctx.subdomain().to_string(),
            None => "unscoped".to_string(),
        }
    }

    fn test_app(state: AppState) -> Router {
        Router::new()
            .route("/", get(scoped_handler))
            .layer(middleware::from_fn_with_state(state, tenant_middleware))
    }

    async fn body_text(resp: Response) -> String {
        use http_body_util::BodyExt;
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn req(host: &str) -> Request<Body> {
        Request::builder()
            .uri("/")
            .header("host", host)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn bound_store_reaches_handler() {
        let state = AppState::in_memory(&TenancyConfig::default());
        state
            .lifecycle
            .create(NewStore::new("Shop 1", "shop1"))
            .unwrap();

        let resp = test_app(state).oneshot(req("shop1.example.com")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_text(resp).await, "shop1");
    }

    #[tokio::test]
    async fn unknown_subdomain_is_404_with_name() {
        let state = AppState::in_memory(&TenancyConfig::default());
        let resp = test_app(state).oneshot(req("nowhere.example.com")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert!(body_text(resp).await.contains("nowhere"));
    }

    #[tokio::test]
    async fn admin_host_passes_through_unscoped() {
        let state = AppState::in_memory(&TenancyConfig::default());
        let resp = test_app(state).oneshot(req("admin.example.com")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_text(resp).await, "unscoped");
    }

    #[tokio::test]
    async fn authority_used_when_host_header_missing() {
        let state = AppState::in_memory(&TenancyConfig::default());
        state
            .lifecycle
            .create(NewStore::new("Shop 1", "shop1"))
            .unwrap();
        let request = Request::builder()
            .uri("http://shop1.example.com/")
            .body(Body::empty())
            .unwrap();
        let resp = test_app(state).oneshot(request).await.unwrap();
        assert_eq!(body_text(resp).await, "shop1");
    }
}
