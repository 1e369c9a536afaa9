//! Ticket handlers: book, list, get, cancel, redeem.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{
    BookTicketRequest, CancelTicketRequest, PaginationParams, TicketListResponse, TicketResponse,
};
use crate::api::extract::CallerId;
use crate::app_state::AppState;
use crate::domain::{EventId, TicketId};
use crate::error::{BoxofficeError, ErrorResponse};

/// `POST /tickets` — Book tickets on an event.
///
/// The engine reserves capacity and persists the ticket as one atomic
/// unit; on contention for the last seats exactly one concurrent caller
/// wins and the rest receive 422 with the remaining count.
///
/// # Errors
///
/// Returns [`BoxofficeError`] on unknown event, a closed or inactive
/// event, zero quantity, or exhausted capacity.
#[utoipa::path(
    post,
    path = "/api/v1/tickets",
    tag = "Tickets",
    summary = "Book tickets",
    request_body = BookTicketRequest,
    responses(
        (status = 201, description = "Ticket booked", body = TicketResponse),
        (status = 400, description = "Invalid quantity", body = ErrorResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
        (status = 409, description = "Event not open for booking", body = ErrorResponse),
        (status = 422, description = "Capacity exceeded", body = ErrorResponse),
        (status = 503, description = "Transient engine contention; retry", body = ErrorResponse),
    )
)]
pub async fn book_ticket(
    State(state): State<AppState>,
    CallerId(user_id): CallerId,
    Json(req): Json<BookTicketRequest>,
) -> Result<impl IntoResponse, BoxofficeError> {
    let ticket = state
        .ticket_service
        .book_ticket(EventId::from_uuid(req.event_id), user_id, req.quantity)
        .await?;
    Ok((StatusCode::CREATED, Json(TicketResponse::from(ticket))))
}

/// `GET /tickets` — List the caller's tickets, newest purchase first.
#[utoipa::path(
    get,
    path = "/api/v1/tickets",
    tag = "Tickets",
    summary = "List own tickets",
    params(PaginationParams),
    responses(
        (status = 200, description = "Paginated ticket list", body = TicketListResponse),
        (status = 403, description = "Missing or malformed caller id", body = ErrorResponse),
    )
)]
pub async fn list_tickets(
    State(state): State<AppState>,
    CallerId(user_id): CallerId,
    Query(params): Query<PaginationParams>,
) -> impl IntoResponse {
    let pagination = params.clamped();
    let tickets = state.ticket_service.tickets_for_user(user_id).await;
    let total = u32::try_from(tickets.len()).unwrap_or(u32::MAX);

    let data: Vec<TicketResponse> = tickets
        .into_iter()
        .skip(pagination.offset())
        .take(pagination.per_page as usize)
        .map(TicketResponse::from)
        .collect();

    Json(TicketListResponse {
        data,
        pagination: pagination.meta(total),
    })
}

/// `GET /tickets/{id}` — Get one of the caller's tickets.
///
/// # Errors
///
/// Returns [`BoxofficeError`] if the ticket does not exist or belongs to
/// another user.
#[utoipa::path(
    get,
    path = "/api/v1/tickets/{id}",
    tag = "Tickets",
    summary = "Get a ticket",
    params(("id" = uuid::Uuid, Path, description = "Ticket UUID")),
    responses(
        (status = 200, description = "Ticket details", body = TicketResponse),
        (status = 403, description = "Ticket belongs to another user", body = ErrorResponse),
        (status = 404, description = "Ticket not found", body = ErrorResponse),
    )
)]
pub async fn get_ticket(
    State(state): State<AppState>,
    CallerId(user_id): CallerId,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, BoxofficeError> {
    let ticket = state
        .ticket_service
        .ticket(TicketId::from_uuid(id))
        .await?;
    if ticket.user_id != user_id {
        return Err(BoxofficeError::Unauthorized(format!(
            "ticket {id} belongs to another user"
        )));
    }
    Ok(Json(TicketResponse::from(ticket)))
}

/// `POST /tickets/{id}/cancel` — Cancel a booked ticket.
///
/// Releases the reserved capacity and marks the ticket cancelled as one
/// atomic unit. Retrying an already-cancelled ticket fails with 409 and
/// never double-releases.
///
/// # Errors
///
/// Returns [`BoxofficeError`] on unknown ticket, foreign ownership, or a
/// non-booked ticket.
#[utoipa::path(
    post,
    path = "/api/v1/tickets/{id}/cancel",
    tag = "Tickets",
    summary = "Cancel a ticket",
    params(("id" = uuid::Uuid, Path, description = "Ticket UUID")),
    request_body = CancelTicketRequest,
    responses(
        (status = 200, description = "Cancelled ticket", body = TicketResponse),
        (status = 403, description = "Ticket belongs to another user", body = ErrorResponse),
        (status = 404, description = "Ticket not found", body = ErrorResponse),
        (status = 409, description = "Ticket not in booked state", body = ErrorResponse),
    )
)]
pub async fn cancel_ticket(
    State(state): State<AppState>,
    CallerId(user_id): CallerId,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<CancelTicketRequest>,
) -> Result<impl IntoResponse, BoxofficeError> {
    let ticket = state
        .ticket_service
        .cancel_ticket(TicketId::from_uuid(id), user_id, req.reason)
        .await?;
    Ok(Json(TicketResponse::from(ticket)))
}

/// `POST /tickets/{id}/redeem` — Redeem a ticket at check-in.
///
/// Called by the check-in surface; the gateway in front of this service
/// restricts it to staff.
///
/// # Errors
///
/// Returns [`BoxofficeError`] on unknown ticket or a non-booked ticket.
#[utoipa::path(
    post,
    path = "/api/v1/tickets/{id}/redeem",
    tag = "Tickets",
    summary = "Redeem a ticket",
    params(("id" = uuid::Uuid, Path, description = "Ticket UUID")),
    responses(
        (status = 200, description = "Redeemed ticket", body = TicketResponse),
        (status = 404, description = "Ticket not found", body = ErrorResponse),
        (status = 409, description = "Ticket not in booked state", body = ErrorResponse),
    )
)]
pub async fn redeem_ticket(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, BoxofficeError> {
    let ticket = state
        .ticket_service
        .redeem_ticket(TicketId::from_uuid(id))
        .await?;
    Ok(Json(TicketResponse::from(ticket)))
}

/// Ticket routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/tickets", post(book_ticket).get(list_tickets))
        .route("/tickets/{id}", get(get_ticket))
        .route("/tickets/{id}/cancel", post(cancel_ticket))
        .route("/tickets/{id}/redeem", post(redeem_ticket))
}
