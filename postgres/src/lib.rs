//! # Voltbook Postgres
//!
//! `PostgreSQL` implementations of the reservation engine's persistence
//! contracts.
//!
//! The capacity counter is written exclusively through a conditional
//! `UPDATE ... WHERE available_slots = $expected`, the relational form of
//! the compare-and-swap the engine's ledger retries on. All queries use
//! runtime-checked binds, so the crate builds without a live database.

mod booking;
mod station;

pub use booking::PgBookingStore;
pub use station::PgStationStore;

use sqlx::PgPool;

/// Apply this crate's embedded migrations to a database.
///
/// # Errors
///
/// Returns the underlying migration error on failure.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
