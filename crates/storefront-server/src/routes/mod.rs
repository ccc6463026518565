pub mod health;
pub mod stores;
pub mod storefront;

use crate::error::AppError;

/// Run a synchronous registry call on the blocking pool.
pub(crate) async fn blocking<T, F>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> storefront_core::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let result = tokio::task::spawn_blocking(f)
        .await
        .map_err(AppError::join)?;
    Ok(result?)
}
