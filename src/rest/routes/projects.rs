// rest/routes/projects.rs — project CRUD pass-through.
//
// List reads embed the owning client's name (the store joins it in).

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::models::{NewProject, Project};
use crate::rest::error::ApiError;
use crate::AppContext;

pub async fn list_projects(
    State(ctx): State<Arc<AppContext>>,
) -> Result<Json<Vec<Project>>, ApiError> {
    Ok(Json(ctx.store.list_projects().await?))
}

pub async fn create_project(
    State(ctx): State<Arc<AppContext>>,
    Json(new): Json<NewProject>,
) -> Result<(StatusCode, Json<Project>), ApiError> {
    let row = ctx.store.insert_project(new).await?;
    Ok((StatusCode::CREATED, Json(row)))
}
