use axum::{
    extract::{Path, State},
    Json,
};
use storefront_core::types::{NewStore, StoreUpdate};

use super::blocking;
use crate::error::AppError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// List / show
// ---------------------------------------------------------------------------

/// GET /admin/stores: every store with its routing config
pub async fn list_stores(State(app): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let lifecycle = app.lifecycle.clone();
    let stores = blocking(move || lifecycle.list()).await?;
    Ok(Json(serde_json::json!({ "stores": stores })))
}

/// GET /admin/stores/{id}
pub async fn get_store(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let lifecycle = app.lifecycle.clone();
    let store = blocking(move || lifecycle.get(&id)).await?;
    Ok(Json(serde_json::json!({ "store": store })))
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

/// POST /admin/stores: create a store and its config together
pub async fn create_store(
    State(app): State<AppState>,
    Json(body): Json<NewStore>,
) -> Result<Json<serde_json::Value>, AppError> {
    let lifecycle = app.lifecycle.clone();
    let created = blocking(move || lifecycle.create(body)).await?;
    Ok(Json(serde_json::json!({ "store": created })))
}

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

/// PUT /admin/stores/{id}: partial update of store and config
pub async fn update_store(
    State(app): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<StoreUpdate>,
) -> Result<Json<serde_json::Value>, AppError> {
    let lifecycle = app.lifecycle.clone();
    let updated = blocking(move || lifecycle.update(&id, body)).await?;
    Ok(Json(serde_json::json!({ "store": updated })))
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

/// DELETE /admin/stores/{id}: remove config and store together
pub async fn delete_store(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let lifecycle = app.lifecycle.clone();
    blocking(move || lifecycle.delete(&id)).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
