//! # tasklist-api
//!
//! HTTP API for tasklist: task CRUD, listing with search and pagination, a
//! tag index, health, and a generated OpenAPI document.
//!
//! The router is built over an [`AppState`] holding any
//! [`TaskRepository`], so the binary serves PostgreSQL while tests serve an
//! in-memory store.

pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod query_types;
pub mod services;

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use governor::{Quota, RateLimiter};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use uuid::Uuid;

use tasklist_core::{ListTasksResponse, Task, TaskInput, TaskRepository};

pub use config::{parse_allowed_origins, ServerConfig};
pub use error::ApiError;
pub use query_types::ListTasksQuery;
pub use services::TaskService;

// =============================================================================
// REQUEST ID (UUIDv7)
// =============================================================================

/// Generates time-ordered UUIDv7 request correlation IDs.
#[derive(Clone, Default)]
pub struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

// =============================================================================
// STATE
// =============================================================================

pub type GlobalRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub tasks: TaskService,
    /// Global rate limiter (None if rate limiting is disabled).
    pub rate_limiter: Option<Arc<GlobalRateLimiter>>,
}

impl AppState {
    pub fn new(repo: Arc<dyn TaskRepository>) -> Self {
        Self {
            tasks: TaskService::new(repo),
            rate_limiter: None,
        }
    }

    pub fn with_rate_limiter(mut self, limiter: Arc<GlobalRateLimiter>) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }
}

/// Build a global limiter allowing `requests` per `period_secs`.
///
/// Returns `None` when either value is zero.
pub fn build_rate_limiter(requests: u64, period_secs: u64) -> Option<GlobalRateLimiter> {
    let burst = NonZeroU32::new(u32::try_from(requests).unwrap_or(u32::MAX))?;
    let quota = Quota::with_period(Duration::from_secs(period_secs))?.allow_burst(burst);
    Some(RateLimiter::direct(quota))
}

// =============================================================================
// OPENAPI
// =============================================================================

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Tasklist API",
        description = "Personal task tracking: tasks with tags and due dates"
    ),
    paths(
        handlers::tasks::list_tasks,
        handlers::tasks::get_task,
        handlers::tasks::create_task,
        handlers::tasks::update_task,
        handlers::tasks::delete_task,
        handlers::tags::list_tags,
        handlers::health::health_check,
    ),
    components(schemas(Task, TaskInput, ListTasksResponse)),
    tags(
        (name = "Tasks", description = "Task CRUD and listing"),
        (name = "Tags", description = "Tag index"),
        (name = "Health", description = "Service health")
    )
)]
pub struct ApiDoc;

async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

// =============================================================================
// ROUTER
// =============================================================================

/// Build the application router with all middleware applied.
pub fn build_router(state: AppState, config: &ServerConfig) -> Router {
    let allowed_origins = parse_allowed_origins(&config.allowed_origins);

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/openapi.json", get(openapi_json))
        .route(
            "/tasks",
            get(handlers::tasks::list_tasks).post(handlers::tasks::create_task),
        )
        .route(
            "/tasks/:id",
            get(handlers::tasks::get_task)
                .put(handlers::tasks::update_task)
                .delete(handlers::tasks::delete_task),
        )
        .route("/tags", get(handlers::tags::list_tags))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(allowed_origins))
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
                .expose_headers([header::LOCATION])
                .max_age(Duration::from_secs(3600)),
        )
        .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
        .layer(CatchPanicLayer::new())
        .with_state(state)
}

// =============================================================================
// RATE LIMITING MIDDLEWARE
// =============================================================================

async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: axum::extract::Request,
    next: axum::middleware::Next,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    if let Some(limiter) = &state.rate_limiter {
        if limiter.check().is_err() {
            tracing::warn!(subsystem = "api", component = "rate_limit", "Rate limit exceeded");
            return Err((
                StatusCode::TOO_MANY_REQUESTS,
                Json(serde_json::json!({
                    "error": "Too many requests. Please wait before retrying."
                })),
            ));
        }
    }
    Ok(next.run(request).await)
}
