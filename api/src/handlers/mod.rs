//! Endpoint handlers, grouped by concern.

pub mod auth;
pub mod identity;
pub mod lending;
pub mod survey;
pub mod system;
