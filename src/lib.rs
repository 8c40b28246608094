//! Contact ETL pipeline for a CRM contacts dataset.
//!
//! Pulls contact records from the CRM search API, normalizes and
//! deduplicates them, and writes the result back through the batch
//! create/update API.
//!
//! # Architecture
//!
//! - **models**: contact record and wire contract types
//! - **error**: custom error types for precise error handling
//! - **config**: configuration management from environment variables
//! - **domain**: pure email extraction and phone formatting
//! - **geo**: city-to-country resolution with bounded retry
//! - **merge**: the dedup & field-merge engine
//! - **client**: HTTP client for the CRM search and batch APIs
//! - **pipeline**: Extract -> Transform -> Load orchestration + snapshots

pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod geo;
pub mod merge;
pub mod models;
pub mod pipeline;

pub use client::{CrmClient, MAX_BATCH_SIZE};
pub use config::Config;
pub use domain::{extract_all_emails, extract_email, format_phone, PhoneError};
pub use error::{ConfigError, CrmApiError, GeoError, MergeError};
pub use geo::{GeoResolver, Geocoder, NominatimGeocoder};
pub use merge::{merge_by_key, merge_duplicates};
pub use models::ContactRecord;
pub use pipeline::{ContactPipeline, LoadMode, LoadReport, SnapshotWriter};
