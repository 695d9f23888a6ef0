//! Tag HTTP handlers.

use axum::{extract::State, Json};

use crate::{ApiError, AppState};

/// Distinct tag texts across all tasks, sorted ascending.
#[utoipa::path(
    get,
    path = "/tags",
    tag = "Tags",
    responses((status = 200, description = "Sorted tag list", body = [String]))
)]
pub async fn list_tags(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    let tags = state.tasks.list_tags().await?;
    Ok(Json(tags))
}
