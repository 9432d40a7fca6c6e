//! HTTP surface.
//!
//! Public reads live under `/api/faqs`. The `/admin/faqs` routes are only
//! mounted when an admin API key is configured and every request to them must
//! carry it in `X-API-Key`.

use axum::{
    extract::{Path, Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::admin::AdminFilter;
use crate::app::FaqApp;
use crate::error::FaqError;
use crate::i18n::MetricsReport;
use crate::model::{FaqId, FaqList, FaqRecord, FaqUpdate, FaqView, NewFaq};
use crate::security::has_valid_api_key;

pub struct AppState {
    pub app: FaqApp,
    pub admin_api_key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LangQuery {
    pub lang: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AdminList {
    pub count: usize,
    pub results: Vec<FaqRecord>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    metrics: MetricsReport,
}

pub fn router(app: FaqApp, admin_api_key: Option<String>) -> Router {
    let admin_enabled = admin_api_key.is_some();
    let state = Arc::new(AppState { app, admin_api_key });

    let mut router = Router::new()
        .route("/health", get(health))
        .route("/api/faqs", get(list_faqs))
        .route("/api/faqs/:id", get(get_faq));

    if admin_enabled {
        router = router.nest(
            "/admin/faqs",
            admin_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                require_api_key,
            )),
        );
        info!("Admin routes mounted at /admin/faqs");
    } else {
        info!("ADMIN_API_KEY not set, admin routes disabled");
    }

    router.with_state(state).layer(TraceLayer::new_for_http())
}

fn admin_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(admin_list).post(admin_create))
        .route("/:id", patch(admin_update).delete(admin_delete))
        .route("/:id/retranslate", post(admin_retranslate))
        .route("/:id/clear-cache", post(admin_clear_cache))
}

async fn require_api_key(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let authorized = state
        .admin_api_key
        .as_deref()
        .is_some_and(|expected| has_valid_api_key(request.headers(), expected));

    if !authorized {
        warn!("Rejected admin request to {}: missing or invalid API key", request.uri().path());
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({
                "error": "UNAUTHORIZED",
                "message": "missing or invalid API key"
            })),
        )
            .into_response();
    }

    next.run(request).await
}

// ==================== Public handlers ====================

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        metrics: state.app.metrics.report(),
    })
}

async fn list_faqs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LangQuery>,
) -> Result<Json<FaqList>, FaqError> {
    let list = state.app.query.list(query.lang.as_deref()).await?;
    Ok(Json(list))
}

async fn get_faq(
    State(state): State<Arc<AppState>>,
    Path(id): Path<FaqId>,
    Query(query): Query<LangQuery>,
) -> Result<Json<FaqView>, FaqError> {
    let view = state.app.query.retrieve(id, query.lang.as_deref()).await?;
    Ok(Json(view))
}

// ==================== Admin handlers ====================

async fn admin_list(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<AdminFilter>,
) -> Result<Json<AdminList>, FaqError> {
    let results = state.app.admin.list_all(&filter).await?;
    Ok(Json(AdminList {
        count: results.len(),
        results,
    }))
}

async fn admin_create(
    State(state): State<Arc<AppState>>,
    Json(faq): Json<NewFaq>,
) -> Result<(StatusCode, Json<FaqRecord>), FaqError> {
    let record = state.app.admin.create(faq).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn admin_update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<FaqId>,
    Json(changes): Json<FaqUpdate>,
) -> Result<Json<FaqRecord>, FaqError> {
    let record = state.app.admin.update(id, changes).await?;
    Ok(Json(record))
}

async fn admin_delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<FaqId>,
) -> Result<StatusCode, FaqError> {
    state.app.admin.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn admin_retranslate(
    State(state): State<Arc<AppState>>,
    Path(id): Path<FaqId>,
) -> Result<Json<FaqRecord>, FaqError> {
    let record = state.app.admin.retranslate(id).await?;
    Ok(Json(record))
}

async fn admin_clear_cache(
    State(state): State<Arc<AppState>>,
    Path(id): Path<FaqId>,
) -> Result<StatusCode, FaqError> {
    state.app.admin.clear_cache(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
