use crate::calendar::{
    business_days_diff_with_holidays, is_supported_year, parse_calendar_date, HolidayProvider,
    MAX_CALENDAR_YEAR, MIN_CALENDAR_YEAR,
};
use crate::config::Config;
use crate::dedup::{dedupe_with_audit, ExcludedRecord};
use crate::errors::{AppError, ResultExt};
use crate::models::TrackingRecord;
use crate::policy::{
    does_date_kpi_break_with, should_put_exception_code_with, validate_phase_update, FieldError,
    PhaseUpdateForm,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Calendar used for every business-day computation.
    pub holidays: Arc<dyn HolidayProvider>,
}

impl AppState {
    pub fn new(config: Config, holidays: Box<dyn HolidayProvider>) -> Self {
        Self {
            config,
            holidays: Arc::from(holidays),
        }
    }
}

/// Builds the HTTP router with tracing, CORS and body-size limits.
pub fn router(state: Arc<AppState>) -> Router {
    let max_body = state.config.max_body_bytes;

    let api_routes = Router::new()
        .route("/api/v1/business-days", post(business_days))
        .route("/api/v1/holidays/:year", get(holidays_for_year))
        .route("/api/v1/exception-code/check", post(check_exception_code))
        .route("/api/v1/phase-updates/validate", post(validate_phase))
        .route("/api/v1/tracking/dedupe", post(dedupe_tracking))
        .layer(ServiceBuilder::new().layer(RequestBodyLimitLayer::new(max_body)));

    Router::new()
        .route("/health", get(health))
        .merge(api_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Health check endpoint.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

fn require_date(field: &str, raw: &str) -> Result<NaiveDate, AppError> {
    parse_calendar_date(raw).ok_or_else(|| {
        AppError::BadRequest(format!(
            "{} is not a valid date between {} and {}: '{}'",
            field, MIN_CALENDAR_YEAR, MAX_CALENDAR_YEAR, raw
        ))
    })
}

#[derive(Debug, Deserialize)]
pub struct BusinessDaysRequest {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BusinessDaysResponse {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub business_days: u32,
}

/// POST /api/v1/business-days
///
/// Business days after `start` up to and including `end`. Unlike the policy
/// endpoints, unreadable dates are rejected here.
pub async fn business_days(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BusinessDaysRequest>,
) -> Result<Json<BusinessDaysResponse>, AppError> {
    let start = require_date("start", &req.start).context("business-day range")?;
    let end = require_date("end", &req.end)
        .with_context(|| format!("business-day range from {}", start))?;

    let days = business_days_diff_with_holidays(start, end, state.holidays.as_ref());
    tracing::debug!("Business days {} -> {}: {}", start, end, days);

    Ok(Json(BusinessDaysResponse {
        start,
        end,
        business_days: days,
    }))
}

/// GET /api/v1/holidays/:year
pub async fn holidays_for_year(
    State(state): State<Arc<AppState>>,
    Path(year): Path<i32>,
) -> Result<Json<serde_json::Value>, AppError> {
    if !is_supported_year(year) {
        return Err(AppError::NotFound(format!("No calendar for year {}", year)));
    }

    let holidays: Vec<NaiveDate> = state.holidays.holidays_in(year).into_iter().collect();

    Ok(Json(json!({
        "year": year,
        "holidays": holidays,
    })))
}

#[derive(Debug, Deserialize)]
pub struct ExceptionCheckRequest {
    #[serde(default)]
    pub exception_code: Option<String>,
    #[serde(default)]
    pub initial_date: Option<String>,
    #[serde(default)]
    pub final_date: Option<String>,
    /// Overrides the configured KPI threshold.
    #[serde(default)]
    pub num_days: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExceptionCheckResponse {
    /// `None` when either date is missing or unreadable.
    pub business_days: Option<u32>,
    pub should_put_exception_code: bool,
    pub kpi_break: bool,
}

/// POST /api/v1/exception-code/check
pub async fn check_exception_code(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ExceptionCheckRequest>,
) -> Json<ExceptionCheckResponse> {
    let holidays = state.holidays.as_ref();
    let threshold = req.num_days.unwrap_or(state.config.kpi_max_business_days);
    let code = req.exception_code.as_deref();
    let initial = req.initial_date.as_deref();
    let final_date = req.final_date.as_deref();

    let business_days = initial
        .and_then(parse_calendar_date)
        .zip(final_date.and_then(parse_calendar_date))
        .map(|(start, end)| business_days_diff_with_holidays(start, end, holidays));

    Json(ExceptionCheckResponse {
        business_days,
        should_put_exception_code: should_put_exception_code_with(
            code, initial, final_date, holidays,
        ),
        kpi_break: does_date_kpi_break_with(code, initial, final_date, threshold, holidays),
    })
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PhaseValidationResponse {
    pub valid: bool,
    pub errors: Vec<FieldError>,
}

/// POST /api/v1/phase-updates/validate
pub async fn validate_phase(
    State(state): State<Arc<AppState>>,
    Json(form): Json<PhaseUpdateForm>,
) -> Json<PhaseValidationResponse> {
    tracing::info!(
        "Validating phase update for {} ({} phase(s))",
        form.reference,
        form.phases.len()
    );

    let errors = validate_phase_update(
        &form,
        state.config.kpi_max_business_days,
        state.holidays.as_ref(),
    );

    Json(PhaseValidationResponse {
        valid: errors.is_empty(),
        errors,
    })
}

#[derive(Debug, Default, Deserialize)]
pub struct DedupeParams {
    /// Include excluded records and their reasons in the response.
    #[serde(default)]
    pub audit: bool,
}

#[derive(Debug, Serialize)]
pub struct DedupeResponse {
    pub records: Vec<TrackingRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excluded: Option<Vec<ExcludedRecord>>,
}

/// POST /api/v1/tracking/dedupe
pub async fn dedupe_tracking(
    Query(params): Query<DedupeParams>,
    Json(records): Json<Vec<TrackingRecord>>,
) -> Json<DedupeResponse> {
    let received = records.len();
    let outcome = dedupe_with_audit(records);

    tracing::info!(
        "Dedupe: {} received, {} kept, {} excluded",
        received,
        outcome.kept.len(),
        outcome.excluded.len()
    );

    Json(DedupeResponse {
        records: outcome.kept,
        excluded: params.audit.then_some(outcome.excluded),
    })
}
