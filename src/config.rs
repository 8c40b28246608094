//! Configuration management for the contact ETL pipeline.
//!
//! This module handles loading and validating configuration from environment variables.
//! Two credential strings are required: a read-capable token for the search API and a
//! write-capable token for the batch create/update API.

use crate::error::{ConfigError, ConfigResult};
use std::env;

/// Default base URL for the CRM API.
pub const DEFAULT_CRM_BASE_URL: &str = "https://api.hubapi.com";

/// Default base URL for the geocoding service.
pub const DEFAULT_GEO_BASE_URL: &str = "https://nominatim.openstreetmap.org";

/// Configuration for the contact ETL pipeline.
#[derive(Debug, Clone)]
pub struct Config {
    /// CRM API base URL
    pub crm_base_url: String,

    /// Token used for the search (read) API
    pub read_token: String,

    /// Token used for the batch create/update (write) API
    pub write_token: String,

    /// Geocoding service base URL
    pub geo_base_url: String,

    /// HTTP request timeout in seconds (default: 10)
    pub request_timeout: u64,

    /// Number of geocoding attempts before degrading to a sentinel (default: 3)
    pub geo_retries: u32,

    /// Fixed delay in seconds between geocoding attempts (default: 2)
    pub geo_retry_delay_secs: u64,

    /// Directory where stage snapshots (CSV) are written (default: ".")
    pub snapshot_dir: String,

    /// Log level (default: "info")
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required environment variables:
    /// - `HUBSPOT_READ_TOKEN`: token for the search API
    /// - `HUBSPOT_WRITE_TOKEN`: token for the batch upsert API
    ///
    /// Optional environment variables:
    /// - `CRM_BASE_URL`: CRM API base URL (default: https://api.hubapi.com)
    /// - `GEO_BASE_URL`: geocoder base URL (default: https://nominatim.openstreetmap.org)
    /// - `REQUEST_TIMEOUT`: HTTP timeout in seconds (default: 10)
    /// - `GEO_RETRIES`: geocoding attempt count (default: 3)
    /// - `GEO_RETRY_DELAY_SECS`: delay between geocoding attempts (default: 2)
    /// - `SNAPSHOT_DIR`: output directory for CSV snapshots (default: ".")
    /// - `LOG_LEVEL`: logging level (default: "info")
    pub fn from_env() -> ConfigResult<Self> {
        // Load .env if present, without failing when it is absent
        let _ = dotenvy::dotenv();

        let read_token = env::var("HUBSPOT_READ_TOKEN")
            .map_err(|_| ConfigError::MissingVar("HUBSPOT_READ_TOKEN".to_string()))?;

        let write_token = env::var("HUBSPOT_WRITE_TOKEN")
            .map_err(|_| ConfigError::MissingVar("HUBSPOT_WRITE_TOKEN".to_string()))?;

        if read_token.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                var: "HUBSPOT_READ_TOKEN".to_string(),
                reason: "Cannot be empty".to_string(),
            });
        }

        if write_token.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                var: "HUBSPOT_WRITE_TOKEN".to_string(),
                reason: "Cannot be empty".to_string(),
            });
        }

        let crm_base_url =
            env::var("CRM_BASE_URL").unwrap_or_else(|_| DEFAULT_CRM_BASE_URL.to_string());
        let geo_base_url =
            env::var("GEO_BASE_URL").unwrap_or_else(|_| DEFAULT_GEO_BASE_URL.to_string());

        for (var, url) in [("CRM_BASE_URL", &crm_base_url), ("GEO_BASE_URL", &geo_base_url)] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::InvalidValue {
                    var: var.to_string(),
                    reason: "Must start with http:// or https://".to_string(),
                });
            }
        }

        let request_timeout = Self::parse_env_u64("REQUEST_TIMEOUT", 10)?;
        let geo_retries = Self::parse_env_u32("GEO_RETRIES", 3)?;
        let geo_retry_delay_secs = Self::parse_env_u64("GEO_RETRY_DELAY_SECS", 2)?;

        if geo_retries == 0 {
            return Err(ConfigError::InvalidValue {
                var: "GEO_RETRIES".to_string(),
                reason: "Must be at least 1".to_string(),
            });
        }

        let snapshot_dir = env::var("SNAPSHOT_DIR").unwrap_or_else(|_| ".".to_string());
        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Config {
            crm_base_url,
            read_token,
            write_token,
            geo_base_url,
            request_timeout,
            geo_retries,
            geo_retry_delay_secs,
            snapshot_dir,
            log_level,
        })
    }

    /// Parse an environment variable as u64 with a default value.
    fn parse_env_u64(var_name: &str, default: u64) -> ConfigResult<u64> {
        match env::var(var_name) {
            Ok(val) => val.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                var: var_name.to_string(),
                reason: format!("Must be a positive number, got: {}", val),
            }),
            Err(_) => Ok(default),
        }
    }

    /// Parse an environment variable as u32 with a default value.
    fn parse_env_u32(var_name: &str, default: u32) -> ConfigResult<u32> {
        match env::var(var_name) {
            Ok(val) => val.parse::<u32>().map_err(|_| ConfigError::InvalidValue {
                var: var_name.to_string(),
                reason: format!("Must be a positive number, got: {}", val),
            }),
            Err(_) => Ok(default),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            crm_base_url: DEFAULT_CRM_BASE_URL.to_string(),
            read_token: String::new(),
            write_token: String::new(),
            geo_base_url: DEFAULT_GEO_BASE_URL.to_string(),
            request_timeout: 10,
            geo_retries: 3,
            geo_retry_delay_secs: 2,
            snapshot_dir: ".".to_string(),
            log_level: "info".to_string(),
        }
    }
}
