//! Contact record as it flows through the pipeline.

use serde::{Deserialize, Serialize};

/// A single contact record.
///
/// Field names mirror the upstream CRM properties. `country` holds a city
/// name on input (a known upstream data-quality quirk); `city`, the resolved
/// `country` and `country_code` are derived from it during transform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactRecord {
    /// The CRM's own identifier (`hs_object_id`), re-submitted as the
    /// `temporary_id` custom property for idempotent upsert matching
    pub external_id: Option<String>,

    /// First name
    pub first_name: Option<String>,

    /// Last name
    pub last_name: Option<String>,

    /// Free text that may embed an email address
    pub raw_email: Option<String>,

    /// Email resolved out of `raw_email`
    pub email: Option<String>,

    /// On input: a city name, despite the upstream property name.
    /// After transform: the resolved country name or a sentinel string.
    pub country: Option<String>,

    /// City, copied from the raw `country` input during transform
    pub city: Option<String>,

    /// ISO 3166-1 alpha-2 code or a sentinel string
    pub country_code: Option<String>,

    /// Phone number: raw on input, internationally formatted (or a
    /// sentinel string) after transform
    pub phone: Option<String>,

    /// `;`-joined industry memberships; merged records carry a leading `;`
    pub industry: Option<String>,

    /// Postal address
    pub address: Option<String>,

    /// Creation date as `YYYY-MM-DD`
    pub create_date: Option<String>,
}

impl ContactRecord {
    /// Identity key for the full-name merge pass: lowercased concatenation
    /// of first and last name, empty when both are absent.
    pub fn full_name_key(&self) -> String {
        let first = self.first_name.as_deref().unwrap_or("");
        let last = self.last_name.as_deref().unwrap_or("");
        format!("{}{}", first, last).to_lowercase()
    }

    /// Distinct non-empty industry segments of this record.
    pub fn industry_segments(&self) -> Vec<String> {
        self.industry
            .as_deref()
            .unwrap_or("")
            .split(';')
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// True when an optional field counts as absent for backfill purposes
/// (missing or empty string).
pub(crate) fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, str::is_empty)
}
