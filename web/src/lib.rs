//! # Voltbook Web
//!
//! The HTTP surface of the Voltbook reservation engine: an Axum router over
//! the coordinator, resolver, and auditor, plus the env-driven configuration
//! and the server binary's building blocks.

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::Config;
pub use error::AppError;
pub use routes::build_router;
pub use state::AppState;
