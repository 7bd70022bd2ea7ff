//! Error types for the regional cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for caches, the replication hub and the HTTP API.
///
/// A cache miss is not an error: lookups return `Option`. `NotFound` is
/// only produced by the HTTP layer when it has to answer a miss.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Key not found in cache
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Region id is not registered with the hub
    #[error("Region not found: {0}")]
    RegionNotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Invalid construction parameters
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Region id already registered
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Region was closed and no longer accepts updates
    #[error("Region closed: {0}")]
    RegionClosed(String),

    /// A replicated update did not complete in time
    #[error("Replication timed out: {0}")]
    ReplicationTimeout(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) | CacheError::RegionNotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) | CacheError::Config(_) => StatusCode::BAD_REQUEST,
            CacheError::Conflict(_) => StatusCode::CONFLICT,
            CacheError::RegionClosed(_) => StatusCode::SERVICE_UNAVAILABLE,
            CacheError::ReplicationTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            CacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the regional cache.
pub type Result<T> = std::result::Result<T, CacheError>;
