//! Typed HTTP client for the tasklist API.

use std::time::{Duration, Instant};

use reqwest::{Client, Response, StatusCode};
use tracing::debug;

use tasklist_core::{Error, ListTasksResponse, Result, Task, TaskInput};

use crate::query::TaskQuery;

/// Default API base URL.
pub const DEFAULT_API_URL: &str = "http://localhost:3000";

/// Default request timeout (seconds).
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// HTTP client for one tasklist server.
#[derive(Debug, Clone)]
pub struct TaskClient {
    client: Client,
    base_url: String,
}

impl TaskClient {
    /// Create a client for `base_url` with the default timeout.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self::with_client(client, base_url))
    }

    /// Create a client around an existing `reqwest::Client`.
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    /// Create from `TASKLIST_API_URL`, falling back to [`DEFAULT_API_URL`].
    pub fn from_env() -> Result<Self> {
        let base_url =
            std::env::var("TASKLIST_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        Self::new(base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Fetch page `page` (zero-based) of `query`.
    pub async fn list_tasks(&self, query: &TaskQuery, page: usize) -> Result<ListTasksResponse> {
        let start = Instant::now();
        let response = self
            .client
            .get(self.url("/tasks"))
            .query(&query.to_params(page))
            .send()
            .await?;
        let body: ListTasksResponse = check_status(response).await?.json().await?;

        debug!(
            subsystem = "client",
            op = "list",
            page,
            result_count = body.returned_count,
            duration_ms = start.elapsed().as_millis() as u64,
            "Fetched task page"
        );
        Ok(body)
    }

    pub async fn get_task(&self, id: &str) -> Result<Task> {
        let response = self
            .client
            .get(self.url(&format!("/tasks/{}", id)))
            .send()
            .await?;
        Ok(check_status(response).await?.json().await?)
    }

    pub async fn create_task(&self, input: &TaskInput) -> Result<Task> {
        let response = self
            .client
            .post(self.url("/tasks"))
            .json(input)
            .send()
            .await?;
        Ok(check_status(response).await?.json().await?)
    }

    /// Replace every field of task `id`.
    pub async fn update_task(&self, id: &str, input: &TaskInput) -> Result<Task> {
        let response = self
            .client
            .put(self.url(&format!("/tasks/{}", id)))
            .json(input)
            .send()
            .await?;
        Ok(check_status(response).await?.json().await?)
    }

    pub async fn delete_task(&self, id: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.url(&format!("/tasks/{}", id)))
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    pub async fn list_tags(&self) -> Result<Vec<String>> {
        let response = self.client.get(self.url("/tags")).send().await?;
        Ok(check_status(response).await?.json().await?)
    }
}

/// Map non-success statuses onto core errors.
///
/// 404 becomes `NotFound`, 400 becomes `InvalidInput` carrying the server's
/// `error` message, anything else becomes `Request`.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().path().to_string();
    let body = response.text().await.unwrap_or_default();
    match status {
        StatusCode::NOT_FOUND => Err(Error::NotFound(format!("{} not found", url))),
        StatusCode::BAD_REQUEST => Err(Error::InvalidInput(error_message(&body))),
        _ => Err(Error::Request(format!(
            "Server returned {}: {}",
            status,
            error_message(&body)
        ))),
    }
}

/// The `error` field of a JSON error body, or the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = TaskClient::new("http://localhost:3000/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:3000");
        assert_eq!(client.url("/tasks"), "http://localhost:3000/tasks");
    }

    #[test]
    fn test_error_message_prefers_json_field() {
        assert_eq!(
            error_message(r#"{"error":"Title must be 1-140 characters long."}"#),
            "Title must be 1-140 characters long."
        );
        assert_eq!(error_message("plain failure"), "plain failure");
        assert_eq!(error_message(""), "");
    }
}
