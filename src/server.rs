use crate::config::AppConfig;
use crate::coverage::{self, CountryMetrics};
use crate::dashboard_html::DASHBOARD_HTML;
use crate::data::Dataset;
use crate::distribution::{self, ClinicDistribution};
use crate::layers::{self, CoverageMap};
use crate::treatment::{self, TreatmentAnalysis};
use crate::types::{CountryScope, CoverageMetrics};
use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    response::{Html, Json},
    routing::get,
    Router,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

/// Loaded tables, shared read-only by every request.
pub struct AppState {
    pub dataset: Dataset,
    pub config: AppConfig,
}

#[derive(Debug, Default, Deserialize)]
pub struct ScopeParams {
    country: Option<String>,
}

impl ScopeParams {
    fn scope(&self) -> CountryScope {
        CountryScope::from_selection(self.country.as_deref())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct MapParams {
    country: Option<String>,
    radius: Option<u32>,
}

pub fn router(state: Arc<AppState>) -> Router {
    let chart_service = ServeDir::new(&state.config.output.chart_dir);

    Router::new()
        .route("/", get(index_handler))
        .route("/api/countries", get(countries_handler))
        .route("/api/metrics", get(metrics_handler))
        .route("/api/breakdown", get(breakdown_handler))
        .route("/api/map", get(map_handler))
        .route("/api/distribution", get(distribution_handler))
        .route("/api/treatment", get(treatment_handler))
        .nest_service("/charts", chart_service)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start_server(config: AppConfig, dataset: Dataset) -> Result<()> {
    let port = config.server.port;
    let state = Arc::new(AppState { dataset, config });
    let app = router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    tracing::info!("Starting dashboard on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn index_handler() -> Html<&'static str> {
    Html(DASHBOARD_HTML)
}

async fn countries_handler(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(distribution::available_countries(&state.dataset.clinics))
}

async fn metrics_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ScopeParams>,
) -> Json<CoverageMetrics> {
    Json(coverage::calculate_metrics(
        &state.dataset.clinics,
        &state.dataset.patients,
        &params.scope(),
        &state.config.coverage,
    ))
}

async fn breakdown_handler(State(state): State<Arc<AppState>>) -> Json<Vec<CountryMetrics>> {
    Json(coverage::country_breakdown(&state.dataset, &state.config.coverage))
}

async fn map_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MapParams>,
) -> Json<Option<CoverageMap>> {
    let scope = CountryScope::from_selection(params.country.as_deref());
    let radius = state.config.map.clamp_radius(params.radius);
    Json(layers::build_coverage_map(
        &state.dataset.clinics,
        &state.dataset.patients,
        &scope,
        radius,
    ))
}

async fn distribution_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ScopeParams>,
) -> Json<ClinicDistribution> {
    Json(distribution::clinic_distribution(&state.dataset.clinics, &params.scope()))
}

async fn treatment_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ScopeParams>,
) -> Json<TreatmentAnalysis> {
    Json(treatment::analyze(&state.dataset.treatment, &params.scope()))
}
