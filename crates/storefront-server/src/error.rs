use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use storefront_core::error::StoreError;

// ---------------------------------------------------------------------------
// Internal sentinel for explicit 404 errors
// ---------------------------------------------------------------------------

/// Private sentinel error type used to carry an explicit HTTP 404 with a
/// caller-chosen message through the `anyhow::Error` chain.
#[derive(Debug)]
struct NotFoundError(String);

impl std::fmt::Display for NotFoundError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for NotFoundError {}

// ---------------------------------------------------------------------------
// AppError
// ---------------------------------------------------------------------------

/// Unified error type for HTTP responses. Renders as `{"error": "..."}`.
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    /// Construct a 404 Not Found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self(NotFoundError(msg.into()).into())
    }

    pub fn join(err: tokio::task::JoinError) -> Self {
        Self(anyhow::anyhow!("task join error: {err}"))
    }
}

fn status_for(err: &StoreError) -> StatusCode {
    match err {
        StoreError::StoreNotFound(_) | StoreError::ConfigNotFound(_) => StatusCode::NOT_FOUND,
        StoreError::SubdomainTaken(_) | StoreError::VersionConflict { .. } => StatusCode::CONFLICT,
        StoreError::InvalidSubdomain(_)
        | StoreError::ReservedSubdomain(_)
        | StoreError::InvalidName(_) => StatusCode::BAD_REQUEST,
        StoreError::Registry(_) => StatusCode::SERVICE_UNAVAILABLE,
        StoreError::SettingsMissing(_)
        | StoreError::RollbackFailed { .. }
        | StoreError::Io(_)
        | StoreError::Yaml(_)
        | StoreError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Some(n) = self.0.downcast_ref::<NotFoundError>() {
            let body = serde_json::json!({ "error": n.0.clone() });
            return (StatusCode::NOT_FOUND, axum::Json(body)).into_response();
        }

        let status = match self.0.downcast_ref::<StoreError>() {
            Some(e) => status_for(e),
            None => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }

        let body = serde_json::json!({ "error": self.0.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
