//! HTTP API for microcred.
//!
//! [`router`] wires every endpoint to a shared [`AppState`]; [`serve`] binds
//! it and runs until the shutdown future resolves.

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod metrics;
pub mod server;
pub mod shutdown;
pub mod state;

pub use config::{ApiConfig, Environment};
pub use error::{ApiError, ServerError};
pub use metrics::ApiMetrics;
pub use server::{router, serve};
pub use shutdown::ShutdownController;
pub use state::AppState;
