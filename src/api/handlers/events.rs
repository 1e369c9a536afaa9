//! Event handlers: create, list, get, update, delete, cancel,
//! availability.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{
    AvailabilityResponse, CancelEventRequest, CascadeReportResponse, CreateEventRequest,
    EventListResponse, EventResponse, EventSummaryDto, ListEventsParams, PaginationParams,
    UpdateEventRequest,
};
use crate::api::extract::CallerId;
use crate::app_state::AppState;
use crate::domain::{EventId, EventStatus};
use crate::error::{BoxofficeError, ErrorResponse};

/// `POST /events` — Create a new event listing.
///
/// # Errors
///
/// Returns [`BoxofficeError`] on invalid field values or a missing
/// caller id.
#[utoipa::path(
    post,
    path = "/api/v1/events",
    tag = "Events",
    summary = "Create an event",
    description = "Creates an event in the `upcoming` state, owned by the calling user. Capacity and price are validated here; capacity is immutable downward once tickets sell.",
    request_body = CreateEventRequest,
    responses(
        (status = 201, description = "Event created", body = EventResponse),
        (status = 400, description = "Invalid event fields", body = ErrorResponse),
        (status = 403, description = "Missing or malformed caller id", body = ErrorResponse),
    )
)]
pub async fn create_event(
    State(state): State<AppState>,
    CallerId(user_id): CallerId,
    Json(req): Json<CreateEventRequest>,
) -> Result<impl IntoResponse, BoxofficeError> {
    let event = state.event_service.create_event(req.into(), user_id).await?;
    Ok((StatusCode::CREATED, Json(EventResponse::from(event))))
}

/// `GET /events` — List events with pagination and optional status filter.
///
/// # Errors
///
/// Returns [`BoxofficeError`] on an unknown status filter.
#[utoipa::path(
    get,
    path = "/api/v1/events",
    tag = "Events",
    summary = "List events",
    params(ListEventsParams),
    responses(
        (status = 200, description = "Paginated event list", body = EventListResponse),
        (status = 400, description = "Unknown status filter", body = ErrorResponse),
    )
)]
pub async fn list_events(
    State(state): State<AppState>,
    Query(params): Query<ListEventsParams>,
) -> Result<impl IntoResponse, BoxofficeError> {
    let status_filter = params
        .status
        .as_deref()
        .map(str::parse::<EventStatus>)
        .transpose()?;

    let pagination = PaginationParams {
        page: params.page,
        per_page: params.per_page,
    }
    .clamped();

    let summaries = state.event_service.list_events(status_filter).await;
    let total = u32::try_from(summaries.len()).unwrap_or(u32::MAX);

    let data: Vec<EventSummaryDto> = summaries
        .into_iter()
        .skip(pagination.offset())
        .take(pagination.per_page as usize)
        .map(EventSummaryDto::from)
        .collect();

    Ok(Json(EventListResponse {
        data,
        pagination: pagination.meta(total),
    }))
}

/// `GET /events/{id}` — Get event details.
///
/// # Errors
///
/// Returns [`BoxofficeError`] if the event does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/events/{id}",
    tag = "Events",
    summary = "Get an event",
    params(("id" = uuid::Uuid, Path, description = "Event UUID")),
    responses(
        (status = 200, description = "Event details", body = EventResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, BoxofficeError> {
    let event = state.event_service.get_event(EventId::from_uuid(id)).await?;
    Ok(Json(EventResponse::from(event)))
}

/// `PUT /events/{id}` — Update an event while it is still editable.
///
/// # Errors
///
/// Returns [`BoxofficeError`] on unknown event, foreign ownership,
/// closed lifecycle state, or invalid field values.
#[utoipa::path(
    put,
    path = "/api/v1/events/{id}",
    tag = "Events",
    summary = "Update an event",
    description = "Creator-only. Allowed while the event is `upcoming` and before doors open. Capacity can never drop below the sold count.",
    params(("id" = uuid::Uuid, Path, description = "Event UUID")),
    request_body = UpdateEventRequest,
    responses(
        (status = 200, description = "Updated event", body = EventResponse),
        (status = 400, description = "Invalid field values", body = ErrorResponse),
        (status = 403, description = "Not the creator", body = ErrorResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
        (status = 409, description = "Event no longer editable", body = ErrorResponse),
    )
)]
pub async fn update_event(
    State(state): State<AppState>,
    CallerId(user_id): CallerId,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<UpdateEventRequest>,
) -> Result<impl IntoResponse, BoxofficeError> {
    let event = state
        .event_service
        .update_event(EventId::from_uuid(id), req.into(), user_id)
        .await?;
    Ok(Json(EventResponse::from(event)))
}

/// `DELETE /events/{id}` — Destroy an event with no sold tickets.
///
/// # Errors
///
/// Returns [`BoxofficeError`] on unknown event, foreign ownership, or
/// while tickets are sold.
#[utoipa::path(
    delete,
    path = "/api/v1/events/{id}",
    tag = "Events",
    summary = "Delete an event",
    params(("id" = uuid::Uuid, Path, description = "Event UUID")),
    responses(
        (status = 204, description = "Event deleted"),
        (status = 403, description = "Not the creator", body = ErrorResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
        (status = 409, description = "Tickets still sold", body = ErrorResponse),
    )
)]
pub async fn delete_event(
    State(state): State<AppState>,
    CallerId(user_id): CallerId,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, BoxofficeError> {
    state
        .event_service
        .delete_event(EventId::from_uuid(id), user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /events/{id}/cancel` — Administratively cancel an event.
///
/// Cascade-cancels every booked ticket as one atomic batch and reports
/// the outcome per ticket.
///
/// # Errors
///
/// Returns [`BoxofficeError`] on unknown event, foreign ownership, or a
/// closed lifecycle state.
#[utoipa::path(
    post,
    path = "/api/v1/events/{id}/cancel",
    tag = "Events",
    summary = "Cancel an event",
    params(("id" = uuid::Uuid, Path, description = "Event UUID")),
    request_body = CancelEventRequest,
    responses(
        (status = 200, description = "Cascade report", body = CascadeReportResponse),
        (status = 403, description = "Not the creator", body = ErrorResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
        (status = 409, description = "Event already closed", body = ErrorResponse),
    )
)]
pub async fn cancel_event(
    State(state): State<AppState>,
    CallerId(user_id): CallerId,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<CancelEventRequest>,
) -> Result<impl IntoResponse, BoxofficeError> {
    let report = state
        .event_service
        .cancel_event(EventId::from_uuid(id), user_id, &req.reason)
        .await?;
    Ok(Json(CascadeReportResponse::from(report)))
}

/// `GET /events/{id}/availability` — Remaining capacity for an event.
///
/// # Errors
///
/// Returns [`BoxofficeError`] if the event does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/events/{id}/availability",
    tag = "Events",
    summary = "Get event availability",
    params(("id" = uuid::Uuid, Path, description = "Event UUID")),
    responses(
        (status = 200, description = "Capacity snapshot", body = AvailabilityResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn availability(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, BoxofficeError> {
    let availability = state
        .ticket_service
        .availability(EventId::from_uuid(id))
        .await?;
    Ok(Json(AvailabilityResponse::from(availability)))
}

/// Event routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/events", post(create_event).get(list_events))
        .route(
            "/events/{id}",
            get(get_event).put(update_event).delete(delete_event),
        )
        .route("/events/{id}/cancel", post(cancel_event))
        .route("/events/{id}/availability", get(availability))
}
