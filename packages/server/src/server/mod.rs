//! HTTP surface: router, routes, error mapping.

pub mod app;
pub mod error;
pub mod routes;

pub use app::{build_app, AppState};
