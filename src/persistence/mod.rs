//! Persistence layer: PostgreSQL audit log and registry snapshots.
//!
//! The in-memory registry stays the transactional source of truth; this
//! layer appends every domain event to a durable log for the reporting
//! collaborator and periodically snapshots the registry so a restart can
//! warm-load its state. The concrete implementation uses `sqlx::PgPool`
//! for async PostgreSQL access.

pub mod models;
pub mod postgres;
