use crate::config::Config;
use crate::errors::AppError;
use crate::intake_form::IntakeForm;
use crate::models::IntakeRecord;
use crate::response_browser::{FilterOption, ResponseBrowser, ResponseFilters, ResponseStats};
use crate::response_detail::ResponseDetail;
use crate::store::ResponseStore;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use moka::future::Cache;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Backend holding the `calculator_responses` collection.
    pub store: Arc<dyn ResponseStore>,
    /// Open intake form sessions. Each form sits behind its own lock so that
    /// concurrent requests against one session are serialized.
    pub sessions: Cache<Uuid, Arc<Mutex<IntakeForm>>>,
    /// Admin view over stored submissions. Locks on it are only held
    /// briefly, never across a store call.
    pub browser: Arc<RwLock<ResponseBrowser>>,
    /// Held for the whole of a refresh; one refresh runs at a time.
    pub refresh_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn ResponseStore>) -> Self {
        let sessions = Cache::builder()
            .time_to_live(Duration::from_secs(config.session_ttl_secs))
            .max_capacity(config.session_capacity)
            .build();

        Self {
            config,
            store,
            sessions,
            browser: Arc::new(RwLock::new(ResponseBrowser::new())),
            refresh_lock: Arc::new(Mutex::new(())),
        }
    }
}

/// Health check endpoint.
///
/// Returns the service status and version.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "geldhero-intake",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// Body of `GET /api/v1/responses`.
#[derive(Debug, Serialize)]
pub struct ResponseListView {
    pub filters: ResponseFilters,
    /// Number of records after filtering.
    pub shown: usize,
    pub responses: Vec<IntakeRecord>,
    /// Computed over the whole snapshot, not the filtered view.
    pub stats: ResponseStats,
    pub goal_type_options: Vec<FilterOption>,
    pub risk_comfort_options: Vec<FilterOption>,
    /// A refresh is in flight; the snapshot shown is the previous one.
    pub is_loading: bool,
    pub last_refresh_failed: bool,
}

/// GET /api/v1/responses
///
/// Projects the current snapshot through the query filters. Does not hit
/// the store; use the refresh endpoint for that.
pub async fn list_responses(
    State(state): State<Arc<AppState>>,
    Query(filters): Query<ResponseFilters>,
) -> Result<Json<ResponseListView>, AppError> {
    tracing::debug!("GET /responses - filters: {:?}", filters);

    let browser = state.browser.read().await;
    let responses: Vec<IntakeRecord> = browser.view(&filters).into_iter().cloned().collect();

    Ok(Json(ResponseListView {
        shown: responses.len(),
        responses,
        stats: browser.stats(),
        goal_type_options: browser.goal_type_options(),
        risk_comfort_options: browser.risk_comfort_options(),
        is_loading: browser.is_loading(),
        last_refresh_failed: browser.last_refresh_failed(),
        filters,
    }))
}

/// Reloads the admin snapshot from the store.
///
/// The browser is locked only to flag the refresh and to apply its result,
/// so list and detail reads keep being served from the previous snapshot
/// while the fetch is in flight. Runs on its own task so a dropped caller
/// cannot leave the browser loading.
pub async fn refresh_browser(state: Arc<AppState>) -> Result<usize, AppError> {
    let refresh = tokio::spawn(async move {
        let _in_flight = state.refresh_lock.lock().await;

        state.browser.write().await.begin_refresh();
        let result = state.store.list_newest_first().await;
        let mut browser = state.browser.write().await;
        browser.finish_refresh(result)
    });

    refresh.await.map_err(|e| {
        tracing::error!("Refresh task failed: {}", e);
        AppError::InternalError(format!("Refresh task failed: {}", e))
    })?
}

/// POST /api/v1/responses/refresh
///
/// Reloads the snapshot from the store. On failure the previous snapshot
/// stays visible and the error is reported as a 502.
pub async fn refresh_responses(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, AppError> {
    let count = refresh_browser(state).await?;

    Ok(Json(json!({
        "status": "refreshed",
        "total": count,
    })))
}

/// GET /api/v1/responses/:id
///
/// Detail view of one record from the current snapshot. Selection is
/// resolved per request; the shared browser keeps no selected record.
pub async fn get_response(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ResponseDetail>, AppError> {
    tracing::info!("GET /responses/{}", id);

    let browser = state.browser.read().await;
    let record = browser
        .find(id)
        .ok_or_else(|| AppError::NotFound(format!("Response with id {} not found", id)))?;

    Ok(Json(ResponseDetail::from_record(record)))
}
