//! Request and response types for the CRM search and batch upsert endpoints.

use crate::models::contact::ContactRecord;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Properties requested from the search endpoint, in request order.
pub const SEARCH_PROPERTIES: [&str; 9] = [
    "firstname",
    "lastname",
    "raw_email",
    "country",
    "phone",
    "technical_test___create_date",
    "industry",
    "address",
    "hs_object_id",
];

/// One filter inside a search filter group.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilter {
    pub property_name: String,
    pub operator: String,
    pub value: String,
}

/// A group of filters combined with AND semantics.
#[derive(Debug, Clone, Serialize)]
pub struct SearchFilterGroup {
    pub filters: Vec<SearchFilter>,
}

/// Body of the contact search request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub filter_groups: Vec<SearchFilterGroup>,
    pub properties: Vec<String>,
    pub limit: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,
}

impl SearchRequest {
    /// Build the standard collection request: contacts marked
    /// `allowed_to_collect = true`, all nine pipeline properties.
    pub fn collectable(limit: usize, after: Option<String>) -> Self {
        SearchRequest {
            filter_groups: vec![SearchFilterGroup {
                filters: vec![SearchFilter {
                    property_name: "allowed_to_collect".to_string(),
                    operator: "EQ".to_string(),
                    value: "true".to_string(),
                }],
            }],
            properties: SEARCH_PROPERTIES.iter().map(|p| p.to_string()).collect(),
            limit,
            after,
        }
    }
}

/// Contact property bag as returned by the search endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactProperties {
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub raw_email: Option<String>,
    pub country: Option<String>,
    pub phone: Option<String>,
    #[serde(rename = "technical_test___create_date")]
    pub create_date: Option<String>,
    pub industry: Option<String>,
    pub address: Option<String>,
    pub hs_object_id: Option<String>,
}

/// One search hit.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub properties: ContactProperties,
}

/// Pagination cursor.
#[derive(Debug, Clone, Deserialize)]
pub struct PageCursor {
    pub after: String,
}

/// Pagination block; absence of `next` ends pagination.
#[derive(Debug, Clone, Deserialize)]
pub struct Paging {
    #[serde(default)]
    pub next: Option<PageCursor>,
}

/// Response from the contact search endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<SearchResult>,
    #[serde(default)]
    pub paging: Option<Paging>,
}

impl SearchResponse {
    /// Cursor for the next page, if any.
    pub fn next_cursor(&self) -> Option<&str> {
        self.paging
            .as_ref()
            .and_then(|p| p.next.as_ref())
            .map(|n| n.after.as_str())
    }
}

impl From<ContactProperties> for ContactRecord {
    fn from(props: ContactProperties) -> Self {
        ContactRecord {
            external_id: props.hs_object_id,
            first_name: props.firstname,
            last_name: props.lastname,
            raw_email: props.raw_email,
            email: None,
            country: props.country,
            city: None,
            country_code: None,
            phone: props.phone,
            industry: props.industry,
            address: props.address,
            create_date: props.create_date,
        }
    }
}

/// Property bag submitted with each batch upsert input.
#[derive(Debug, Clone, Serialize)]
pub struct UpsertProperties {
    pub email: String,
    pub phone: String,
    pub country: String,
    pub city: String,
    pub firstname: String,
    pub lastname: String,
    pub address: String,
    /// Create date as epoch milliseconds, empty when absent
    pub original_create_date: String,
    /// Merged industry string, carries its leading `;`
    pub original_industry: String,
    /// The source record's `hs_object_id`, used as the idempotent match key
    pub temporary_id: String,
    pub hs_country_region_code: String,
}

impl From<&ContactRecord> for UpsertProperties {
    fn from(record: &ContactRecord) -> Self {
        let field = |value: &Option<String>| value.clone().unwrap_or_default();

        UpsertProperties {
            email: field(&record.email),
            phone: field(&record.phone),
            country: field(&record.country),
            city: field(&record.city),
            firstname: field(&record.first_name),
            lastname: field(&record.last_name),
            address: field(&record.address),
            original_create_date: create_date_millis(record.create_date.as_deref()),
            original_industry: field(&record.industry),
            temporary_id: field(&record.external_id),
            hs_country_region_code: field(&record.country_code),
        }
    }
}

/// Convert a `YYYY-MM-DD` create date to epoch milliseconds at midnight UTC.
///
/// Absent or unparsable dates serialize as the empty string; the merge stage
/// has already rejected unparsable dates before load.
fn create_date_millis(date: Option<&str>) -> String {
    date.and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis().to_string())
        .unwrap_or_default()
}

/// One input of the batch create request.
#[derive(Debug, Clone, Serialize)]
pub struct CreateInput {
    pub properties: UpsertProperties,
}

/// Body of the batch create request.
#[derive(Debug, Clone, Serialize)]
pub struct BatchCreateRequest {
    pub inputs: Vec<CreateInput>,
}

impl BatchCreateRequest {
    pub fn from_records(records: &[ContactRecord]) -> Self {
        BatchCreateRequest {
            inputs: records
                .iter()
                .map(|r| CreateInput {
                    properties: UpsertProperties::from(r),
                })
                .collect(),
        }
    }
}

/// One input of the batch update request; matched by `temporary_id`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInput {
    pub id_property: String,
    pub id: String,
    pub properties: UpsertProperties,
}

/// Body of the batch update request.
#[derive(Debug, Clone, Serialize)]
pub struct BatchUpdateRequest {
    pub inputs: Vec<UpdateInput>,
}

impl BatchUpdateRequest {
    pub fn from_records(records: &[ContactRecord]) -> Self {
        BatchUpdateRequest {
            inputs: records
                .iter()
                .map(|r| UpdateInput {
                    id_property: "temporary_id".to_string(),
                    id: r.external_id.clone().unwrap_or_default(),
                    properties: UpsertProperties::from(r),
                })
                .collect(),
        }
    }
}

/// Structured status portion of a batch upsert response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BatchUpsertResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

impl BatchUpsertResponse {
    /// True for error statuses that should be reported. `CONFLICT` is the
    /// expected outcome of re-running an idempotent upsert and is not
    /// treated as a failure.
    pub fn is_reportable_error(&self) -> bool {
        self.status.as_deref() == Some("error") && self.category.as_deref() != Some("CONFLICT")
    }
}
