//! REST API layer: route handlers, DTOs, and router composition.
//!
//! All resource endpoints are mounted under `/api/v1`; system endpoints
//! (`/health`, `/config/categories`) live at the root.

pub mod dto;
pub mod extract;
pub mod handlers;

use axum::Router;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// OpenAPI document for the whole REST surface.
#[derive(Debug, OpenApi)]
#[openapi(
    paths(
        handlers::events::create_event,
        handlers::events::list_events,
        handlers::events::get_event,
        handlers::events::update_event,
        handlers::events::delete_event,
        handlers::events::cancel_event,
        handlers::events::availability,
        handlers::tickets::book_ticket,
        handlers::tickets::list_tickets,
        handlers::tickets::get_ticket,
        handlers::tickets::cancel_ticket,
        handlers::tickets::redeem_ticket,
        handlers::system::health_handler,
        handlers::system::categories_handler,
    ),
    tags(
        (name = "Events", description = "Event listings and lifecycle"),
        (name = "Tickets", description = "Booking and cancellation"),
        (name = "System", description = "Health and configuration"),
    )
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    let router = Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes());

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/docs")
            .url("/api-docs/openapi.json", <ApiDoc as OpenApi>::openapi()),
    );

    router
}
