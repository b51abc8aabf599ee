//! HTTP surface: the dashboard page, two JSON endpoints and a health check.

use crate::config::ServerConfig;
use crate::error::ApiError;
use crate::query::parse_query;
use crate::render::{render_page, PageBody};
use advisor_core::data::DataProvider;
use advisor_core::frame::LongRow;
use advisor_core::{
    build_dashboard, DashboardRequest, DashboardSettings, DashboardView, Period, PlanOutcome,
};
use axum::extract::{RawQuery, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;

/// Shared by every handler. Cloned per request.
#[derive(Clone)]
pub struct AppState {
    provider: Arc<dyn DataProvider>,
    settings: DashboardSettings,
    title: Arc<str>,
    choices: Arc<[String]>,
    /// One pipeline run at a time.
    pipeline: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(provider: Arc<dyn DataProvider>, config: &ServerConfig) -> Self {
        Self {
            provider,
            settings: config.dashboard_settings(),
            title: Arc::from(config.title.as_str()),
            choices: config.ticker_choices().into(),
            pipeline: Arc::new(Mutex::new(())),
        }
    }

    /// Run the blocking pipeline off the async workers.
    async fn run(&self, request: DashboardRequest) -> Result<DashboardView, ApiError> {
        let _guard = self.pipeline.lock().await;
        let provider = Arc::clone(&self.provider);
        let settings = self.settings.clone();
        tokio::task::spawn_blocking(move || {
            build_dashboard(provider.as_ref(), &request, &settings)
        })
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .map_err(ApiError::from)
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/returns", get(api_returns))
        .route("/api/optimize", get(api_optimize))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index(State(state): State<AppState>, RawQuery(query): RawQuery) -> Response {
    let page = |request: &DashboardRequest, body: PageBody<'_>| {
        Html(render_page(&state.title, &state.choices, request, body))
    };

    let request = match parse_query(query.as_deref()) {
        Ok(request) => request,
        Err(e) => {
            let message = e.to_string();
            let fallback = DashboardRequest::default();
            return (StatusCode::BAD_REQUEST, page(&fallback, PageBody::Error(&message)))
                .into_response();
        }
    };

    match state.run(request.clone()).await {
        Ok(view) => page(&view.request, PageBody::View(&view)).into_response(),
        Err(e) => {
            let message = e.to_string();
            let shown = request
                .normalized(&state.settings.default_ticker)
                .unwrap_or(request);
            (e.status(), page(&shown, PageBody::Error(&message))).into_response()
        }
    }
}

#[derive(Debug, Serialize)]
struct ReturnsBody {
    period: Period,
    tickers: Vec<String>,
    rows: Vec<LongRow>,
}

async fn api_returns(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Json<ReturnsBody>, ApiError> {
    let mut request = parse_query(query.as_deref())?;
    // The plan is not part of this response
    request.investment = None;
    let view = state.run(request).await?;
    Ok(Json(ReturnsBody {
        period: view.request.period,
        tickers: view.request.tickers,
        rows: view.long.rows,
    }))
}

#[derive(Debug, Serialize)]
struct OptimizeBody {
    period: Period,
    tickers: Vec<String>,
    investment: f64,
    plan: PlanOutcome,
}

async fn api_optimize(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Json<OptimizeBody>, ApiError> {
    let request = parse_query(query.as_deref())?;
    let investment = request
        .investment
        .filter(|v| *v > 0.0)
        .ok_or(ApiError::MissingParameter(
            "investment must be a positive amount",
        ))?;
    let view = state.run(request).await?;
    let plan = view
        .plan
        .ok_or_else(|| ApiError::Internal("pipeline returned no plan".into()))?;
    Ok(Json(OptimizeBody {
        period: view.request.period,
        tickers: view.request.tickers,
        investment,
        plan,
    }))
}

async fn health() -> &'static str {
    "ok"
}
