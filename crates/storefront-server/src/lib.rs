pub mod error;
pub mod routes;
pub mod state;
pub mod tenant;

use axum::middleware;
use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// Build the axum Router with all routes and middleware.
/// Used by `serve()` and available for integration testing.
///
/// Only the storefront group (mounted at `state.route_prefix`) runs the
/// tenant middleware. Health checks and `/admin` never resolve a store.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let storefront = Router::new()
        .route("/context", get(routes::storefront::context))
        .route("/theme", get(routes::storefront::theme))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            tenant::tenant_middleware,
        ));

    let admin = Router::new()
        .route(
            "/stores",
            get(routes::stores::list_stores).post(routes::stores::create_store),
        )
        .route(
            "/stores/{id}",
            get(routes::stores::get_store)
                .put(routes::stores::update_store)
                .delete(routes::stores::delete_store),
        );

    let prefix = state.route_prefix.clone();

    Router::new()
        .route("/health", get(routes::health::health))
        .route("/healthcheck", get(routes::health::health))
        .nest(&prefix, storefront)
        .nest(storefront_core::paths::ADMIN_PREFIX, admin)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the server on `addr`.
pub async fn serve(addr: &str, state: AppState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    serve_on(listener, state).await
}

/// Start the server on a pre-bound listener.
///
/// Unlike `serve`, this accepts a `TcpListener` that was already bound so the
/// caller can read the actual port before starting (useful when `port = 0` and
/// the OS picks a free port). Returns after Ctrl-C.
pub async fn serve_on(listener: tokio::net::TcpListener, state: AppState) -> anyhow::Result<()> {
    let local = listener.local_addr()?;
    let app = build_router(state);

    tracing::info!(
        addr = %local,
        "storefront server listening on http://localhost:{}",
        local.port()
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("storefront server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
}
