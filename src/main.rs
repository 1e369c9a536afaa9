//! boxoffice server entry point.
//!
//! Starts the Axum HTTP server plus the background tasks: the audit-log
//! writer, the registry snapshot loop, and the lifecycle sweep.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use boxoffice::api;
use boxoffice::app_state::AppState;
use boxoffice::config::BoxofficeConfig;
use boxoffice::domain::{EntityRegistry, EventBus};
use boxoffice::persistence::postgres::PostgresPersistence;
use boxoffice::service::{EventService, TicketService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = BoxofficeConfig::from_env()
        .map_err(|e| anyhow::anyhow!("failed to load configuration: {e}"))?;
    tracing::info!(addr = %config.listen_addr, "starting boxoffice");

    // Build domain layer
    let registry = Arc::new(EntityRegistry::new());
    let event_bus = EventBus::new(config.event_bus_capacity);

    // Optional persistence: migrations, then warm-load the registry
    let persistence = if config.persistence_enabled {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect(&config.database_url)
            .await
            .context("failed to connect to PostgreSQL")?;
        sqlx::migrate!()
            .run(&pool)
            .await
            .context("failed to run migrations")?;

        let persistence = PostgresPersistence::new(pool);
        let restored = persistence
            .restore_registry(&registry)
            .await
            .context("failed to restore registry from snapshots")?;
        tracing::info!(restored, "registry restored from snapshots");
        Some(persistence)
    } else {
        None
    };

    // Build service layer
    let event_service = Arc::new(EventService::new(Arc::clone(&registry), event_bus.clone()));
    let ticket_service = Arc::new(TicketService::new(Arc::clone(&registry), event_bus.clone()));

    // Audit-log writer: every domain event lands in PostgreSQL
    if config.event_log_enabled
        && let Some(persistence) = persistence.clone()
    {
        let mut rx = event_bus.subscribe();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => {
                        let payload = match serde_json::to_value(&event) {
                            Ok(payload) => payload,
                            Err(err) => {
                                tracing::error!(%err, "failed to serialize domain event");
                                continue;
                            }
                        };
                        if let Err(err) = persistence
                            .save_event(
                                *event.event_id().as_uuid(),
                                event.event_type_str(),
                                &payload,
                            )
                            .await
                        {
                            tracing::error!(%err, "failed to append audit event");
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "audit-log writer lagged behind the event bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }

    // Snapshot loop with retention cleanup
    if let Some(persistence) = persistence {
        let registry = Arc::clone(&registry);
        let interval_secs = config.snapshot_interval_secs.max(1);
        let cleanup_after_days = config.cleanup_after_days;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
            loop {
                interval.tick().await;
                match persistence.snapshot_registry(&registry).await {
                    Ok(saved) => tracing::debug!(saved, "registry snapshot complete"),
                    Err(err) => tracing::error!(%err, "registry snapshot failed"),
                }
                if cleanup_after_days > 0
                    && let Err(err) = persistence.delete_old_snapshots(cleanup_after_days).await
                {
                    tracing::error!(%err, "snapshot cleanup failed");
                }
            }
        });
    }

    // Lifecycle sweep: advances upcoming/ongoing events against the clock
    {
        let event_service = Arc::clone(&event_service);
        let sweep_secs = config.lifecycle_sweep_secs.max(1);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(sweep_secs));
            loop {
                interval.tick().await;
                let transitions = event_service.sweep_lifecycles().await;
                if !transitions.is_empty() {
                    tracing::info!(count = transitions.len(), "lifecycle sweep advanced events");
                }
            }
        });
    }

    // Build application state
    let app_state = AppState {
        event_service,
        ticket_service,
        event_bus,
    };

    // Build router
    let app = Router::new()
        .merge(api::build_router())
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .context("failed to bind listen address")?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
