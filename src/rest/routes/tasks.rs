// rest/routes/tasks.rs — task CRUD plus the pending-count derived read.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::models::{NewTask, Task, TaskPatch};
use crate::rest::error::ApiError;
use crate::AppContext;

#[derive(Deserialize)]
pub struct TaskListQuery {
    pub project_id: Option<i64>,
}

pub async fn list_tasks(
    State(ctx): State<Arc<AppContext>>,
    Query(query): Query<TaskListQuery>,
) -> Result<Json<Vec<Task>>, ApiError> {
    Ok(Json(ctx.store.list_tasks(query.project_id).await?))
}

pub async fn create_task(
    State(ctx): State<Arc<AppContext>>,
    Json(new): Json<NewTask>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let row = ctx.store.insert_task(new).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

pub async fn update_task(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<i64>,
    Json(patch): Json<TaskPatch>,
) -> Result<Json<Task>, ApiError> {
    if patch.is_empty() {
        return Err(ApiError::BadRequest("no fields to update".to_string()));
    }
    // Status changes must follow the forward-only transition rules; check
    // against the current row before the store applies the patch.
    if let Some(next) = patch.status {
        let current = ctx.store.get_task(id).await?;
        if !current.status.can_transition_to(next) {
            return Err(ApiError::BadRequest(format!(
                "invalid status transition: {} -> {next}",
                current.status
            )));
        }
    }
    Ok(Json(ctx.store.update_task(id, patch).await?))
}

#[derive(Serialize)]
pub struct PendingCount {
    pub count: u64,
}

pub async fn pending_count(
    State(ctx): State<Arc<AppContext>>,
) -> Result<Json<PendingCount>, ApiError> {
    let count = ctx.store.count_pending_tasks().await?;
    Ok(Json(PendingCount { count }))
}
