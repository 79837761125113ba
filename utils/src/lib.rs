//! Shared utilities for microcred.

pub mod logging;
pub mod round;

pub use logging::{init_logging, LogFormat};
pub use round::round_dp;
