//! End-to-end booking flow through the HTTP router.

#![allow(clippy::panic)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use boxoffice::api;
use boxoffice::app_state::AppState;
use boxoffice::domain::{EntityRegistry, EventBus};
use boxoffice::service::{EventService, TicketService};

fn app() -> Router {
    let registry = Arc::new(EntityRegistry::new());
    let event_bus = EventBus::new(1000);
    let state = AppState {
        event_service: Arc::new(EventService::new(Arc::clone(&registry), event_bus.clone())),
        ticket_service: Arc::new(TicketService::new(registry, event_bus.clone())),
        event_bus,
    };
    api::build_router().with_state(state)
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    user: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header("x-user-id", user);
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    };
    let Ok(request) = request else {
        panic!("failed to build request");
    };

    let Ok(response) = app.clone().oneshot(request).await else {
        panic!("request failed");
    };
    let status = response.status();
    let Ok(collected) = response.into_body().collect().await else {
        panic!("failed to read body");
    };
    let bytes = collected.to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

fn event_body(capacity: u32, unit_price: f64) -> Value {
    json!({
        "title": "Harbour Jazz Night",
        "description": "Three sets, one stage",
        "location": "Pier 3",
        "category": "concert",
        "start_time": (Utc::now() + Duration::days(2)).to_rfc3339(),
        "end_time": (Utc::now() + Duration::days(2) + Duration::hours(4)).to_rfc3339(),
        "capacity": capacity,
        "unit_price": unit_price,
    })
}

fn new_user() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[tokio::test]
async fn health_endpoint_responds() {
    let app = app();
    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.get("status").and_then(Value::as_str), Some("healthy"));
}

#[tokio::test]
async fn booking_round_trip_restores_availability() {
    let app = app();
    let creator = new_user();
    let buyer = new_user();

    let (status, event) = send(
        &app,
        "POST",
        "/api/v1/events",
        Some(&creator),
        Some(event_body(10, 30.0)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let Some(event_id) = event.get("id").and_then(Value::as_str).map(str::to_string) else {
        panic!("missing event id");
    };

    let (status, ticket) = send(
        &app,
        "POST",
        "/api/v1/tickets",
        Some(&buyer),
        Some(json!({ "event_id": event_id, "quantity": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(ticket.get("quantity").and_then(Value::as_u64), Some(2));
    assert_eq!(ticket.get("total_price").and_then(Value::as_f64), Some(60.0));
    let Some(ticket_id) = ticket.get("id").and_then(Value::as_str).map(str::to_string) else {
        panic!("missing ticket id");
    };

    let (status, availability) = send(
        &app,
        "GET",
        &format!("/api/v1/events/{event_id}/availability"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        availability.get("sold_tickets").and_then(Value::as_u64),
        Some(2)
    );
    assert_eq!(availability.get("remaining").and_then(Value::as_u64), Some(8));

    let (status, cancelled) = send(
        &app,
        "POST",
        &format!("/api/v1/tickets/{ticket_id}/cancel"),
        Some(&buyer),
        Some(json!({ "reason": "schedule clash" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        cancelled.get("status").and_then(Value::as_str),
        Some("cancelled")
    );

    let (_, availability) = send(
        &app,
        "GET",
        &format!("/api/v1/events/{event_id}/availability"),
        None,
        None,
    )
    .await;
    assert_eq!(
        availability.get("sold_tickets").and_then(Value::as_u64),
        Some(0)
    );
}

#[tokio::test]
async fn oversell_rejected_with_remaining_count() {
    let app = app();
    let creator = new_user();

    let (_, event) = send(
        &app,
        "POST",
        "/api/v1/events",
        Some(&creator),
        Some(event_body(3, 10.0)),
    )
    .await;
    let Some(event_id) = event.get("id").and_then(Value::as_str).map(str::to_string) else {
        panic!("missing event id");
    };

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/tickets",
        Some(&new_user()),
        Some(json!({ "event_id": event_id, "quantity": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/tickets",
        Some(&new_user()),
        Some(json!({ "event_id": event_id, "quantity": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let error = body.get("error").cloned().unwrap_or(Value::Null);
    assert_eq!(error.get("code").and_then(Value::as_u64), Some(4001));
    assert!(
        error
            .get("message")
            .and_then(Value::as_str)
            .is_some_and(|m| m.contains("only 1 left"))
    );
}

#[tokio::test]
async fn cancel_of_foreign_ticket_forbidden() {
    let app = app();
    let creator = new_user();
    let owner = new_user();

    let (_, event) = send(
        &app,
        "POST",
        "/api/v1/events",
        Some(&creator),
        Some(event_body(5, 10.0)),
    )
    .await;
    let Some(event_id) = event.get("id").and_then(Value::as_str).map(str::to_string) else {
        panic!("missing event id");
    };

    let (_, ticket) = send(
        &app,
        "POST",
        "/api/v1/tickets",
        Some(&owner),
        Some(json!({ "event_id": event_id, "quantity": 1 })),
    )
    .await;
    let Some(ticket_id) = ticket.get("id").and_then(Value::as_str).map(str::to_string) else {
        panic!("missing ticket id");
    };

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/v1/tickets/{ticket_id}/cancel"),
        Some(&new_user()),
        Some(json!({ "reason": "not mine" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, availability) = send(
        &app,
        "GET",
        &format!("/api/v1/events/{event_id}/availability"),
        None,
        None,
    )
    .await;
    assert_eq!(
        availability.get("sold_tickets").and_then(Value::as_u64),
        Some(1)
    );
}

#[tokio::test]
async fn booking_without_caller_id_forbidden() {
    let app = app();
    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/tickets",
        None,
        Some(json!({ "event_id": uuid::Uuid::new_v4().to_string(), "quantity": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn event_cancellation_cascades_over_api() {
    let app = app();
    let creator = new_user();
    let buyer = new_user();

    let (_, event) = send(
        &app,
        "POST",
        "/api/v1/events",
        Some(&creator),
        Some(event_body(10, 20.0)),
    )
    .await;
    let Some(event_id) = event.get("id").and_then(Value::as_str).map(str::to_string) else {
        panic!("missing event id");
    };

    let (_, _) = send(
        &app,
        "POST",
        "/api/v1/tickets",
        Some(&buyer),
        Some(json!({ "event_id": event_id, "quantity": 3 })),
    )
    .await;

    let (status, report) = send(
        &app,
        "POST",
        &format!("/api/v1/events/{event_id}/cancel"),
        Some(&creator),
        Some(json!({ "reason": "venue unavailable" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        report
            .get("cancelled")
            .and_then(Value::as_array)
            .map(Vec::len),
        Some(1)
    );

    let (_, availability) = send(
        &app,
        "GET",
        &format!("/api/v1/events/{event_id}/availability"),
        None,
        None,
    )
    .await;
    assert_eq!(
        availability.get("sold_tickets").and_then(Value::as_u64),
        Some(0)
    );

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/tickets",
        Some(&new_user()),
        Some(json!({ "event_id": event_id, "quantity": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}
