//! Task HTTP handlers.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};

use tasklist_core::{ListTasksResponse, Task, TaskInput};

use crate::query_types::ListTasksQuery;
use crate::{ApiError, AppState};

/// List tasks with search, filters, sorting, and pagination.
///
/// `totalCount` and `completedCount` cover tasks matching `searchTerm` only;
/// `completed` and `overdue` narrow the returned page.
#[utoipa::path(
    get,
    path = "/tasks",
    tag = "Tasks",
    params(ListTasksQuery),
    responses(
        (status = 200, description = "Page of tasks", body = ListTasksResponse),
        (status = 400, description = "Malformed or out-of-range query parameter")
    )
)]
pub async fn list_tasks(
    State(state): State<AppState>,
    query: Result<Query<ListTasksQuery>, QueryRejection>,
) -> Result<Json<ListTasksResponse>, ApiError> {
    let Query(query) = query?;
    let response = state.tasks.list_tasks(query).await?;
    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/tasks/{id}",
    tag = "Tasks",
    params(("id" = String, Path, description = "Task id")),
    responses(
        (status = 200, description = "The task", body = Task),
        (status = 404, description = "No task with this id")
    )
)]
pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Task>, ApiError> {
    let task = state.tasks.get_task(&id).await?;
    Ok(Json(task))
}

/// Create a task. Responds 201 with a `Location` header.
#[utoipa::path(
    post,
    path = "/tasks",
    tag = "Tasks",
    request_body = TaskInput,
    responses(
        (status = 201, description = "Task created", body = Task),
        (status = 400, description = "Invalid title, tags, or body")
    )
)]
pub async fn create_task(
    State(state): State<AppState>,
    body: Result<Json<TaskInput>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(input) = body?;
    let task = state.tasks.create_task(input).await?;
    let location = format!("/tasks/{}", task.id);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(task)))
}

/// Replace a task. Absent `completed` means false and absent `tags` means none.
#[utoipa::path(
    put,
    path = "/tasks/{id}",
    tag = "Tasks",
    params(("id" = String, Path, description = "Task id")),
    request_body = TaskInput,
    responses(
        (status = 200, description = "Task updated", body = Task),
        (status = 400, description = "Invalid title, tags, or body"),
        (status = 404, description = "No task with this id")
    )
)]
pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<TaskInput>, JsonRejection>,
) -> Result<Json<Task>, ApiError> {
    let Json(input) = body?;
    let task = state.tasks.update_task(&id, input).await?;
    Ok(Json(task))
}

#[utoipa::path(
    delete,
    path = "/tasks/{id}",
    tag = "Tasks",
    params(("id" = String, Path, description = "Task id")),
    responses(
        (status = 204, description = "Task deleted"),
        (status = 404, description = "No task with this id")
    )
)]
pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.tasks.delete_task(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
