//! Library crate for articulate-back, exposing modules for binaries and integration tests.

/// Runtime configuration.
pub mod config;
/// Storage backends, persistence and the completion client.
pub mod dao;
/// Request and response types.
pub mod dto;
/// Service and HTTP error types.
pub mod error;
/// HTTP routes.
pub mod routes;
/// Application services.
pub mod services;
/// Shared application state.
pub mod state;
