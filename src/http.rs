use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ulid::Ulid;

use crate::config::CalendarConfig;
use crate::engine::{Engine, EngineError, NewBooking};
use crate::model::{BookingInfo, BookingStatus, LayoutAssignment, Minute, SlotVerdict};
use crate::observability::{QUERIES_TOTAL, QUERY_DURATION_SECONDS};

// ── Error mapping ────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("unprocessable: {0}")]
    Unprocessable(String),
}

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::NotFound(_) => ApiError::NotFound(e.to_string()),
            EngineError::InvalidConfig(_)
            | EngineError::InvalidDuration(_)
            | EngineError::AmbiguousLocalTime { .. } => ApiError::BadRequest(e.to_string()),
            EngineError::AlreadyExists(_)
            | EngineError::SlotNoLongerAvailable { .. }
            | EngineError::IllegalTransition { .. } => ApiError::Conflict(e.to_string()),
            EngineError::LimitExceeded(_) => ApiError::Unprocessable(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
        };
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

// ── Request/response shapes ──────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SlotsQuery {
    resource: Ulid,
    date: NaiveDate,
    duration: Option<Minute>,
}

#[derive(Debug, Deserialize)]
struct LayoutQuery {
    /// Comma-separated resource ids forming one display column-group.
    resources: String,
    date: NaiveDate,
}

#[derive(Debug, Deserialize)]
struct BookingsQuery {
    resource: Ulid,
    date: NaiveDate,
}

#[derive(Debug, Deserialize)]
struct CreateResourceRequest {
    id: Option<Ulid>,
    name: Option<String>,
    config: Option<CalendarConfig>,
}

#[derive(Debug, Serialize)]
struct CreatedResource {
    id: Ulid,
}

#[derive(Debug, Deserialize)]
struct CreateBookingRequest {
    id: Option<Ulid>,
    resource_id: Ulid,
    date: NaiveDate,
    start_minute: Minute,
    duration_min: Minute,
    label: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusRequest {
    status: BookingStatus,
}

fn parse_group(raw: &str) -> Result<Vec<Ulid>, ApiError> {
    raw.split(',')
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.trim()
                .parse::<Ulid>()
                .map_err(|_| ApiError::BadRequest(format!("invalid resource id: {s}")))
        })
        .collect()
}

// ── Handlers ─────────────────────────────────────────────────────

async fn get_slots(
    State(engine): State<Arc<Engine>>,
    Query(q): Query<SlotsQuery>,
) -> Result<Json<Vec<SlotVerdict>>, ApiError> {
    let started = Instant::now();
    let verdicts = engine
        .available_slots(q.resource, q.date, q.duration, Utc::now())
        .await?;
    metrics::counter!(QUERIES_TOTAL, "query" => "slots").increment(1);
    metrics::histogram!(QUERY_DURATION_SECONDS, "query" => "slots")
        .record(started.elapsed().as_secs_f64());
    Ok(Json(verdicts))
}

async fn get_layout(
    State(engine): State<Arc<Engine>>,
    Query(q): Query<LayoutQuery>,
) -> Result<Json<Vec<LayoutAssignment>>, ApiError> {
    let started = Instant::now();
    let group = parse_group(&q.resources)?;
    let layout = engine.day_layout(&group, q.date).await?;
    metrics::counter!(QUERIES_TOTAL, "query" => "layout").increment(1);
    metrics::histogram!(QUERY_DURATION_SECONDS, "query" => "layout")
        .record(started.elapsed().as_secs_f64());
    Ok(Json(layout))
}

async fn get_bookings(
    State(engine): State<Arc<Engine>>,
    Query(q): Query<BookingsQuery>,
) -> Result<Json<Vec<BookingInfo>>, ApiError> {
    let bookings = engine.bookings_for_day(q.resource, q.date).await?;
    metrics::counter!(QUERIES_TOTAL, "query" => "bookings").increment(1);
    Ok(Json(bookings))
}

async fn list_resources(State(engine): State<Arc<Engine>>) -> impl IntoResponse {
    Json(engine.list_resources().await)
}

async fn create_resource(
    State(engine): State<Arc<Engine>>,
    Json(req): Json<CreateResourceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id = req.id.unwrap_or_else(Ulid::new);
    engine.create_resource(id, req.name, req.config).await?;
    Ok((StatusCode::CREATED, Json(CreatedResource { id })))
}

async fn update_config(
    State(engine): State<Arc<Engine>>,
    Path(id): Path<Ulid>,
    Json(config): Json<CalendarConfig>,
) -> Result<StatusCode, ApiError> {
    engine.update_config(id, config).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn create_booking(
    State(engine): State<Arc<Engine>>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let info = engine
        .create_booking(NewBooking {
            id: req.id,
            resource_id: req.resource_id,
            date: req.date,
            start_minute: req.start_minute,
            duration_min: req.duration_min,
            label: req.label,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(info)))
}

async fn set_booking_status(
    State(engine): State<Arc<Engine>>,
    Path(id): Path<Ulid>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<BookingInfo>, ApiError> {
    Ok(Json(engine.set_booking_status(id, req.status).await?))
}

pub fn router(engine: Arc<Engine>) -> Router {
    Router::new()
        .route("/v1/resources", get(list_resources).post(create_resource))
        .route("/v1/resources/{id}/config", put(update_config))
        .route("/v1/slots", get(get_slots))
        .route("/v1/layout", get(get_layout))
        .route("/v1/bookings", get(get_bookings).post(create_booking))
        .route("/v1/bookings/{id}/status", post(set_booking_status))
        .with_state(engine)
}
