use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use adaptc_tooling::history::{AdaptiveSummary, ErrorHistory};
use adaptc_tooling::report::{
    analyze_code, apply_code, fix_code, AnalysisReport, ApplyReport, ApplyRequest, FixReport,
};
use adaptc_tooling::Ruleset;

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

pub struct ServeOptions {
    pub host: String,
    pub port: u16,
    pub rules: Ruleset,
    pub history: Option<PathBuf>,
}

/// Rules are fixed for the server's lifetime; only the history mutates.
pub struct AppState {
    rules: Ruleset,
    history: Option<Mutex<ErrorHistory>>,
}

type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(rules: Ruleset, history: Option<ErrorHistory>) -> Self {
        AppState {
            rules,
            history: history.map(Mutex::new),
        }
    }

    fn record(&self, report: &AnalysisReport) {
        let Some(history) = &self.history else {
            return;
        };
        if report.diagnostics.is_empty() {
            return;
        }
        let mut history = history.lock().unwrap_or_else(PoisonError::into_inner);
        history.record(&report.diagnostics);
        if let Err(e) = history.save() {
            warn!(error = %e, "failed to persist history");
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(handle_index))
        .route("/compile", post(handle_compile))
        .route("/fix", post(handle_fix))
        .route("/apply", post(handle_apply))
        .route("/history", get(handle_history))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
pub async fn run_serve(opts: ServeOptions) -> anyhow::Result<()> {
    let history = opts
        .history
        .as_deref()
        .map(ErrorHistory::load)
        .transpose()?;
    if let Some(h) = &history {
        info!(path = %h.path().display(), entries = h.entries().len(), "recording history");
    }
    let state = Arc::new(AppState::new(opts.rules, history));

    let listener = tokio::net::TcpListener::bind((opts.host.as_str(), opts.port)).await?;
    info!("serving on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        debug!(error = %rejection.body_text(), "rejected request body");
        ApiError {
            status: StatusCode::BAD_REQUEST,
            message: rejection.body_text(),
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CodePayload {
    code: String,
}

async fn handle_index() -> Json<Value> {
    Json(json!({ "message": "Adaptive Compiler Backend Running Successfully!" }))
}

async fn handle_compile(
    State(state): State<SharedState>,
    payload: Result<Json<CodePayload>, JsonRejection>,
) -> Result<Json<AnalysisReport>, ApiError> {
    let Json(CodePayload { code }) = payload?;
    let report = analyze_code(&code, &state.rules);
    state.record(&report);
    Ok(Json(report))
}

async fn handle_fix(
    State(state): State<SharedState>,
    payload: Result<Json<CodePayload>, JsonRejection>,
) -> Result<Json<FixReport>, ApiError> {
    let Json(CodePayload { code }) = payload?;
    Ok(Json(fix_code(&code, &state.rules)))
}

async fn handle_apply(
    payload: Result<Json<ApplyRequest>, JsonRejection>,
) -> Result<Json<ApplyReport>, ApiError> {
    let Json(request) = payload?;
    Ok(Json(apply_code(&request)))
}

async fn handle_history(State(state): State<SharedState>) -> Json<AdaptiveSummary> {
    let summary = match &state.history {
        Some(history) => history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .summary(),
        None => AdaptiveSummary::default(),
    };
    Json(summary)
}
