#![deny(unsafe_code)]

pub mod recent;
pub mod validation;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use campaign_planner_core::{
    AllocationEngine, CatalogError, CompareRequest, ConfigView, Plan, PlanRequest,
    PlannerCatalog, PlannerError,
};
use recent::{RecentStoreError, RecentStrategy, RecentStrategyStore, DEFAULT_RECENT_CAPACITY};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use validation::{validate_compare_request, validate_plan_request, ValidationErrors};

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Optional catalog document; built-in defaults when absent.
    pub catalog_path: Option<PathBuf>,
    pub recent_path: PathBuf,
    pub recent_capacity: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            catalog_path: None,
            recent_path: PathBuf::from("data/recent-strategies.json"),
            recent_capacity: DEFAULT_RECENT_CAPACITY,
        }
    }
}

#[derive(Clone)]
pub struct ServiceState {
    pub engine: Arc<AllocationEngine>,
    pub recent: Arc<Mutex<RecentStrategyStore>>,
}

impl ServiceState {
    pub fn bootstrap(config: ServiceConfig) -> Result<Self, ServiceError> {
        let ServiceConfig {
            catalog_path,
            recent_path,
            recent_capacity,
        } = config;

        let catalog = match catalog_path {
            Some(path) => PlannerCatalog::from_path(path)?,
            None => PlannerCatalog::default(),
        };
        let recent = RecentStrategyStore::load(recent_path, recent_capacity)?;

        Ok(Self {
            engine: Arc::new(AllocationEngine::new(Arc::new(catalog))),
            recent: Arc::new(Mutex::new(recent)),
        })
    }
}

pub fn build_router(state: ServiceState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/config", get(get_config))
        .route("/api/plan", post(create_plan))
        .route("/api/compare", post(compare))
        .route("/api/strategies/recent", get(list_recent))
        .with_state(state)
}

/// Plan plus the request fields echoed back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanResponse {
    #[serde(flatten)]
    pub plan: Plan,
    pub total_budget: f64,
    pub duration_days: u32,
}

pub fn plan_with_validation(
    state: &ServiceState,
    request: &PlanRequest,
) -> Result<PlanResponse, ApiError> {
    validate_plan_request(request)?;
    let plan = state.engine.create_plan(request)?;
    Ok(PlanResponse {
        plan,
        total_budget: request.total_budget,
        duration_days: request.duration_days,
    })
}

/// Run a comparison and remember its custom strategies.
///
/// Failing to persist the recent list is logged but does not fail the
/// comparison.
pub async fn compare_and_remember(
    state: &ServiceState,
    request: &CompareRequest,
) -> Result<Vec<PlanResponse>, ApiError> {
    validate_compare_request(request)?;
    let plans = state.engine.compare(request)?;

    let remembered = request
        .custom_strategies
        .iter()
        .filter_map(|strategy| {
            strategy
                .mix
                .complete()
                .map(|mix| (strategy.name.clone(), mix))
        })
        .collect::<Vec<_>>();
    if !remembered.is_empty() {
        let mut recent = state.recent.lock().await;
        if let Err(err) = recent.remember(remembered) {
            warn!(
                path = %recent.path().display(),
                error = %err,
                "failed to persist recent strategies"
            );
        }
    }

    Ok(plans
        .into_iter()
        .map(|plan| PlanResponse {
            plan,
            total_budget: request.total_budget,
            duration_days: request.duration_days,
        })
        .collect())
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("recent strategy store error: {0}")]
    Recent(#[from] RecentStoreError),
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    Http {
        status: StatusCode,
        code: &'static str,
        message: String,
    },
    #[error(transparent)]
    Planner(#[from] PlannerError),
}

impl ApiError {
    fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::Http {
            status: StatusCode::BAD_REQUEST,
            code,
            message: message.into(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request("INVALID_BODY", rejection.body_text())
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        Self::bad_request("VALIDATION_FAILED", errors.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::Http {
                status,
                code,
                message,
            } => (status, code, message),
            ApiError::Planner(err) => (StatusCode::BAD_REQUEST, err.code(), err.to_string()),
        };
        debug!(%status, code, %message, "request rejected");
        (
            status,
            Json(serde_json::json!({ "error": message, "code": code })),
        )
            .into_response()
    }
}

#[derive(Debug, Clone, Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "campaign-planner-service",
    })
}

async fn get_config(State(state): State<ServiceState>) -> Json<ConfigView> {
    Json(state.engine.config())
}

async fn create_plan(
    State(state): State<ServiceState>,
    payload: Result<Json<PlanRequest>, JsonRejection>,
) -> Result<Json<PlanResponse>, ApiError> {
    let Json(request) = payload?;
    Ok(Json(plan_with_validation(&state, &request)?))
}

async fn compare(
    State(state): State<ServiceState>,
    payload: Result<Json<CompareRequest>, JsonRejection>,
) -> Result<Json<Vec<PlanResponse>>, ApiError> {
    let Json(request) = payload?;
    Ok(Json(compare_and_remember(&state, &request).await?))
}

#[derive(Debug, Clone, Serialize)]
struct RecentListResponse {
    items: Vec<RecentStrategy>,
}

async fn list_recent(State(state): State<ServiceState>) -> Json<RecentListResponse> {
    let recent = state.recent.lock().await;
    Json(RecentListResponse {
        items: recent.list(),
    })
}
