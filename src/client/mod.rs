//! HTTP client for the CRM search and batch upsert APIs.
//!
//! The search endpoint is read with one bearer token, the batch endpoints are
//! written with another; both are plain synchronous `ureq` calls. Pagination
//! follows the `paging.next.after` cursor until the API stops returning one.

use crate::config::Config;
use crate::error::{CrmApiError, CrmApiResult};
use crate::models::{
    BatchCreateRequest, BatchUpdateRequest, BatchUpsertResponse, ContactRecord, SearchRequest,
    SearchResponse,
};
use serde::Serialize;
use std::time::Duration;

/// Contact search endpoint path.
const SEARCH_PATH: &str = "/crm/v3/objects/contacts/search";

/// Batch create endpoint path.
const BATCH_CREATE_PATH: &str = "/crm/v3/objects/contacts/batch/create";

/// Batch update endpoint path.
const BATCH_UPDATE_PATH: &str = "/crm/v3/objects/contacts/batch/update";

/// The upstream API's maximum number of inputs per batch call.
pub const MAX_BATCH_SIZE: usize = 100;

/// Page size requested from the search endpoint.
pub const SEARCH_PAGE_LIMIT: usize = 100;

/// HTTP client for the CRM contacts API.
#[derive(Clone)]
pub struct CrmClient {
    base_url: String,
    read_token: String,
    write_token: String,
    agent: ureq::Agent,
}

impl CrmClient {
    /// Create a new CrmClient from configuration.
    pub fn new(config: &Config) -> Self {
        Self::build(
            config.crm_base_url.clone(),
            config.read_token.clone(),
            config.write_token.clone(),
            Duration::from_secs(config.request_timeout),
        )
    }

    /// Create a CrmClient with a custom base URL (useful for testing).
    #[doc(hidden)]
    pub fn with_base_url(base_url: String, read_token: String, write_token: String) -> Self {
        Self::build(base_url, read_token, write_token, Duration::from_secs(10))
    }

    fn build(base_url: String, read_token: String, write_token: String, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();

        CrmClient {
            base_url,
            read_token,
            write_token,
            agent,
        }
    }

    /// Build a full URL from a path.
    fn build_url(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{}/{}", base, path)
    }

    /// Execute a POST request with a bearer token and JSON body.
    fn post<B: Serialize>(&self, path: &str, token: &str, body: &B) -> CrmApiResult<ureq::Response> {
        let url = self.build_url(path);
        tracing::debug!("POST {}", url);

        self.agent
            .post(&url)
            .set("Authorization", &format!("Bearer {}", token))
            .set("Content-Type", "application/json")
            .send_json(serde_json::to_value(body)?)
            .map_err(map_error)
    }

    /// Fetch one page of collectable contacts.
    pub fn search_page(&self, after: Option<String>) -> CrmApiResult<SearchResponse> {
        let request = SearchRequest::collectable(SEARCH_PAGE_LIMIT, after);
        let response = self.post(SEARCH_PATH, &self.read_token, &request)?;

        response
            .into_json::<SearchResponse>()
            .map_err(|e| CrmApiError::HttpError(e.to_string()))
    }

    /// Fetch all collectable contacts, following the pagination cursor until
    /// the API stops returning one.
    ///
    /// A transport failure on any page aborts the whole fetch; a partial
    /// contact list would corrupt the merge stage's completeness guarantee.
    pub fn fetch_all_contacts(&self) -> CrmApiResult<Vec<ContactRecord>> {
        let mut contacts = Vec::new();
        let mut after: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let page = self.search_page(after.take())?;
            pages += 1;

            contacts.extend(
                page.results
                    .iter()
                    .cloned()
                    .map(|result| ContactRecord::from(result.properties)),
            );

            match page.next_cursor() {
                Some(cursor) => after = Some(cursor.to_string()),
                None => break,
            }
        }

        tracing::info!("Fetched {} contacts across {} pages", contacts.len(), pages);
        Ok(contacts)
    }

    /// Create up to [`MAX_BATCH_SIZE`] contacts in one batch call.
    pub fn batch_create(&self, records: &[ContactRecord]) -> CrmApiResult<BatchUpsertResponse> {
        if records.len() > MAX_BATCH_SIZE {
            return Err(CrmApiError::InvalidRequest(format!(
                "Batch of {} exceeds the API maximum of {}",
                records.len(),
                MAX_BATCH_SIZE
            )));
        }

        let request = BatchCreateRequest::from_records(records);
        let response = self.post(BATCH_CREATE_PATH, &self.write_token, &request)?;
        self.inspect_batch_response(response, records.len(), "create")
    }

    /// Update up to [`MAX_BATCH_SIZE`] contacts in one batch call, matching
    /// each input by its `temporary_id`.
    pub fn batch_update(&self, records: &[ContactRecord]) -> CrmApiResult<BatchUpsertResponse> {
        if records.len() > MAX_BATCH_SIZE {
            return Err(CrmApiError::InvalidRequest(format!(
                "Batch of {} exceeds the API maximum of {}",
                records.len(),
                MAX_BATCH_SIZE
            )));
        }

        let request = BatchUpdateRequest::from_records(records);
        let response = self.post(BATCH_UPDATE_PATH, &self.write_token, &request)?;
        self.inspect_batch_response(response, records.len(), "update")
    }

    /// Parse the batch response and report upstream errors.
    ///
    /// `CONFLICT` errors are the expected outcome of re-running an idempotent
    /// upsert and are logged at debug level only; anything else with an error
    /// status is surfaced as a warning but still returned to the caller.
    fn inspect_batch_response(
        &self,
        response: ureq::Response,
        batch_len: usize,
        operation: &str,
    ) -> CrmApiResult<BatchUpsertResponse> {
        let status: BatchUpsertResponse = response
            .into_json()
            .map_err(|e| CrmApiError::HttpError(e.to_string()))?;

        if status.is_reportable_error() {
            tracing::warn!(
                "Batch {} of {} contacts reported an error: {}",
                operation,
                batch_len,
                status.message.as_deref().unwrap_or("no message")
            );
        } else if status.status.as_deref() == Some("error") {
            tracing::debug!("Batch {} reported CONFLICT (already upserted)", operation);
        } else {
            tracing::info!("Batch {} of {} contacts processed", operation, batch_len);
        }

        Ok(status)
    }
}

/// Map a ureq error to a CrmApiError.
fn map_error(error: ureq::Error) -> CrmApiError {
    match error {
        ureq::Error::Status(code, response) => {
            let message = response
                .into_string()
                .unwrap_or_else(|_| "Unknown error".to_string());

            match code {
                401 => CrmApiError::Unauthorized,
                404 => CrmApiError::NotFound(message),
                429 => CrmApiError::RateLimitExceeded,
                _ => CrmApiError::ApiError {
                    status: code,
                    message,
                },
            }
        }
        ureq::Error::Transport(transport) => {
            if transport.kind() == ureq::ErrorKind::Io {
                CrmApiError::Timeout
            } else {
                CrmApiError::HttpError(transport.to_string())
            }
        }
    }
}
