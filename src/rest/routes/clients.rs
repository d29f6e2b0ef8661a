// rest/routes/clients.rs — client CRUD pass-through.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::models::{Client, ClientPatch, NewClient};
use crate::rest::error::ApiError;
use crate::AppContext;

pub async fn list_clients(
    State(ctx): State<Arc<AppContext>>,
) -> Result<Json<Vec<Client>>, ApiError> {
    Ok(Json(ctx.store.list_clients().await?))
}

pub async fn create_client(
    State(ctx): State<Arc<AppContext>>,
    Json(new): Json<NewClient>,
) -> Result<(StatusCode, Json<Client>), ApiError> {
    let row = ctx.store.insert_client(new).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

pub async fn update_client(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<i64>,
    Json(patch): Json<ClientPatch>,
) -> Result<Json<Client>, ApiError> {
    if patch.is_empty() {
        return Err(ApiError::BadRequest("no fields to update".to_string()));
    }
    Ok(Json(ctx.store.update_client(id, patch).await?))
}
