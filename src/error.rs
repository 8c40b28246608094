//! Error types for the contact ETL pipeline.
//!
//! This module defines custom error types using `thiserror` for precise error handling.

use thiserror::Error;

/// Errors that can occur when interacting with the CRM API.
#[derive(Error, Debug)]
pub enum CrmApiError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// API returned an error status code
    #[error("API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    /// Failed to parse JSON response
    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Network timeout
    #[error("Request timeout")]
    Timeout,

    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Authentication failed
    #[error("Authentication failed")]
    Unauthorized,

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Invalid request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Errors that can occur during configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Required environment variable is missing
    #[error("Missing required environment variable: {0}")]
    MissingVar(String),

    /// Environment variable has invalid value
    #[error("Invalid value for {var}: {reason}")]
    InvalidValue { var: String, reason: String },
}

/// Errors that can occur during geocoding lookups.
///
/// These never reach the pipeline output: the geo resolver degrades them
/// to sentinel strings after its retry budget is spent.
#[derive(Error, Debug)]
pub enum GeoError {
    /// Geocoding service is temporarily unreachable
    #[error("Geocoding service unavailable: {0}")]
    Unavailable(String),

    /// Geocoding service returned something we cannot interpret
    #[error("Unexpected geocoder response: {0}")]
    InvalidResponse(String),
}

/// Errors that can occur during the dedup/merge stage.
///
/// Merge ordering depends on create dates, so an unparsable date is fatal
/// for the whole stage rather than silently dropped.
#[derive(Error, Debug)]
pub enum MergeError {
    /// A record carried a create date that does not parse as YYYY-MM-DD
    #[error("Unparseable create date: {0:?}")]
    InvalidDate(String),
}

/// Convenience type alias for Results with CrmApiError
pub type CrmApiResult<T> = Result<T, CrmApiError>;

/// Convenience type alias for Results with ConfigError
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Convenience type alias for Results with GeoError
pub type GeoResult<T> = Result<T, GeoError>;

/// Convenience type alias for Results with MergeError
pub type MergeResult<T> = Result<T, MergeError>;
