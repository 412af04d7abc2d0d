use crate::infra::AppState;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use chrono::Utc;
use deal_scout::error::AppError;
use deal_scout::workflows::enrichment::{BatchSummary, DealTier, ListingFilter};
use deal_scout::workflows::listings::{write_csv, ListingImporter, ListingTable};
use deal_scout::workflows::pipeline::{DealScoutPipeline, EnrichedRow, ZoningSource};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::io::Cursor;
use std::sync::Arc;

pub(crate) const EXPORT_FILE_NAME: &str = "DealScout_Enriched.csv";

#[derive(Debug, Deserialize)]
pub(crate) struct EnrichRequest {
    pub(crate) csv: String,
    #[serde(default)]
    pub(crate) zoning_column: Option<String>,
    #[serde(default)]
    pub(crate) filter: ListingFilter,
}

#[derive(Debug, Serialize)]
pub(crate) struct ListingView {
    pub(crate) line: usize,
    pub(crate) address: Option<String>,
    pub(crate) latitude: Option<f64>,
    pub(crate) longitude: Option<f64>,
    pub(crate) price: Option<f64>,
    pub(crate) lot_size_sq_ft: Option<f64>,
    pub(crate) zoning_code: Option<String>,
    pub(crate) price_per_unit: Option<f64>,
    pub(crate) max_units: Option<u32>,
    pub(crate) sb9_eligible: bool,
    pub(crate) exclusion_reason: Option<&'static str>,
    pub(crate) deal_tier: Option<DealTier>,
}

impl From<&EnrichedRow> for ListingView {
    fn from(row: &EnrichedRow) -> Self {
        let listing = &row.listing;
        Self {
            line: row.line,
            address: row.address.clone(),
            latitude: row.location.map(|point| point.latitude),
            longitude: row.location.map(|point| point.longitude),
            price: listing.record.price,
            lot_size_sq_ft: listing.record.lot_size_sq_ft,
            zoning_code: listing.zoning_code.as_ref().map(ToString::to_string),
            price_per_unit: listing.price_per_unit,
            max_units: listing.max_units,
            sb9_eligible: listing.sb9_eligible,
            exclusion_reason: listing.exclusion_reason.map(|reason| reason.label()),
            deal_tier: DealTier::classify(listing.price_per_unit),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct EnrichResponse {
    pub(crate) summary: BatchSummary,
    pub(crate) missing_columns: Vec<&'static str>,
    pub(crate) matched: usize,
    pub(crate) listings: Vec<ListingView>,
}

pub(crate) fn with_listing_routes(pipeline: Arc<DealScoutPipeline>) -> Router {
    Router::new()
        .route("/api/v1/listings/enrich", post(enrich_endpoint))
        .route("/api/v1/listings/export", post(export_endpoint))
        .with_state(pipeline)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Imports the uploaded CSV and runs every row through the pipeline.
fn enrich_upload(
    pipeline: &DealScoutPipeline,
    request: &EnrichRequest,
) -> Result<(ListingTable, Vec<EnrichedRow>), AppError> {
    let table = ListingImporter::from_reader(Cursor::new(request.csv.as_bytes()))?;
    let rows = match request
        .zoning_column
        .as_deref()
        .map(str::trim)
        .filter(|column| !column.is_empty())
    {
        Some(column) => pipeline
            .with_zoning(ZoningSource::Column(column.to_string()))
            .run(&table),
        None => pipeline.run(&table),
    };
    Ok((table, rows))
}

pub(crate) async fn enrich_endpoint(
    State(pipeline): State<Arc<DealScoutPipeline>>,
    Json(request): Json<EnrichRequest>,
) -> Result<Json<EnrichResponse>, AppError> {
    let (table, rows) = enrich_upload(&pipeline, &request)?;
    let summary = BatchSummary::build(
        pipeline.engine().rules().jurisdiction.clone(),
        rows.iter().map(|row| &row.listing),
        Utc::now(),
    );

    let listings: Vec<ListingView> = rows
        .iter()
        .filter(|row| request.filter.matches(&row.listing))
        .map(ListingView::from)
        .collect();

    Ok(Json(EnrichResponse {
        summary,
        missing_columns: table.missing_columns,
        matched: listings.len(),
        listings,
    }))
}

pub(crate) async fn export_endpoint(
    State(pipeline): State<Arc<DealScoutPipeline>>,
    Json(request): Json<EnrichRequest>,
) -> Result<Response, AppError> {
    let (table, rows) = enrich_upload(&pipeline, &request)?;
    let rows: Vec<EnrichedRow> = rows
        .into_iter()
        .filter(|row| request.filter.matches(&row.listing))
        .collect();

    let mut body = Vec::new();
    write_csv(&mut body, &table.headers, &rows)?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{EXPORT_FILE_NAME}\""),
            ),
        ],
        body,
    )
        .into_response())
}
