//! Pipeline orchestrator: Extract -> Transform -> Load.
//!
//! Extraction paginates the CRM search API, transformation resolves emails
//! then merges duplicates then resolves geo/phone per survivor, and load
//! pushes fixed-size batches back through the upsert API. Stage snapshots
//! are written as CSV along the way.

pub mod snapshot;
pub use snapshot::SnapshotWriter;

use crate::client::{CrmClient, MAX_BATCH_SIZE};
use crate::domain;
use crate::error::{CrmApiError, MergeError};
use crate::geo::{GeoResolver, Geocoder};
use crate::merge;
use crate::models::contact::is_blank;
use crate::models::ContactRecord;
use thiserror::Error;

/// Errors that abort a pipeline run.
///
/// Geo and phone failures never appear here: they degrade to sentinel
/// strings inside the transformed records.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Extraction or load setup failed at the HTTP level
    #[error(transparent)]
    Api(#[from] CrmApiError),

    /// The merge stage rejected its input
    #[error(transparent)]
    Merge(#[from] MergeError),
}

/// Which batch upsert variant the load stage uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// `batch/create`: first run against an empty target
    Create,
    /// `batch/update`: idempotent re-run matching by `temporary_id`
    Update,
}

/// Outcome of the load stage. Chunk failures are isolated, so a run can
/// partially succeed; the report says how far it got.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Records handed to the load stage
    pub records: usize,
    /// Batch calls attempted
    pub chunks_attempted: usize,
    /// Batch calls that completed
    pub chunks_succeeded: usize,
    /// Per-chunk failures: (chunk index, error description)
    pub failures: Vec<(usize, String)>,
}

impl LoadReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// The contact ETL pipeline.
pub struct ContactPipeline<G> {
    client: CrmClient,
    geo: GeoResolver<G>,
    snapshots: SnapshotWriter,
}

impl<G: Geocoder> ContactPipeline<G> {
    pub fn new(client: CrmClient, geo: GeoResolver<G>, snapshots: SnapshotWriter) -> Self {
        ContactPipeline {
            client,
            geo,
            snapshots,
        }
    }

    /// Run all three stages and return the load report.
    pub fn run(&self, mode: LoadMode) -> Result<LoadReport, PipelineError> {
        let extracted = self.extract()?;
        let transformed = self.transform(extracted)?;
        self.snapshots
            .write(snapshot::RESULT_SNAPSHOT, &transformed);
        Ok(self.load(&transformed, mode))
    }

    /// Extract: fetch every collectable contact page by page.
    pub fn extract(&self) -> Result<Vec<ContactRecord>, PipelineError> {
        tracing::info!("Extracting contacts");
        let records = self.client.fetch_all_contacts()?;
        self.snapshots.write(snapshot::COLLECT_SNAPSHOT, &records);
        Ok(records)
    }

    /// Transform: resolve emails, merge duplicates, then resolve geography
    /// and phone formatting per survivor.
    pub fn transform(
        &self,
        mut records: Vec<ContactRecord>,
    ) -> Result<Vec<ContactRecord>, PipelineError> {
        tracing::info!("Transforming {} contacts", records.len());

        for record in &mut records {
            record.email = record
                .raw_email
                .as_deref()
                .and_then(domain::extract_email);
        }

        let mut merged = merge::merge_duplicates(records)?;

        for record in &mut merged {
            self.resolve_geography(record);
        }

        self.snapshots
            .write(snapshot::TRANSFORM_SNAPSHOT, &merged);
        tracing::info!("{} contacts after merge", merged.len());
        Ok(merged)
    }

    /// Derive city/country/country code from the city-bearing raw `country`
    /// field and format the phone number against the resolved region.
    ///
    /// Lookup and parse failures become sentinel strings in the record.
    fn resolve_geography(&self, record: &mut ContactRecord) {
        let city = match record.country.clone().filter(|c| !c.is_empty()) {
            Some(city) => city,
            None => return,
        };

        let country = self.geo.country_from_city(&city);
        let country_code = self.geo.country_code_from_city(&country);

        record.city = Some(city);
        record.country = Some(country);
        record.country_code = Some(country_code.clone());

        if !is_blank(&record.phone) {
            let raw_phone = record.phone.as_deref().unwrap_or("");
            record.phone = Some(match domain::format_phone(raw_phone, &country_code) {
                Ok(formatted) => formatted,
                Err(err) => err.to_string(),
            });
        }
    }

    /// Load: push `records` in chunks of [`MAX_BATCH_SIZE`].
    ///
    /// A failing chunk is recorded and the remaining chunks are still
    /// attempted; one bad batch must not strand the rest of the data.
    pub fn load(&self, records: &[ContactRecord], mode: LoadMode) -> LoadReport {
        tracing::info!("Loading {} contacts in batches of {}", records.len(), MAX_BATCH_SIZE);

        let mut report = LoadReport {
            records: records.len(),
            ..Default::default()
        };

        for (index, chunk) in records.chunks(MAX_BATCH_SIZE).enumerate() {
            report.chunks_attempted += 1;

            let result = match mode {
                LoadMode::Create => self.client.batch_create(chunk),
                LoadMode::Update => self.client.batch_update(chunk),
            };

            match result {
                Ok(_) => report.chunks_succeeded += 1,
                Err(err) => {
                    tracing::error!("Batch {} of {} contacts failed: {}", index, chunk.len(), err);
                    report.failures.push((index, err.to_string()));
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_report_completeness() {
        let report = LoadReport {
            records: 250,
            chunks_attempted: 3,
            chunks_succeeded: 3,
            failures: Vec::new(),
        };
        assert!(report.is_complete());

        let report = LoadReport {
            records: 250,
            chunks_attempted: 3,
            chunks_succeeded: 2,
            failures: vec![(1, "API error (status 500): boom".to_string())],
        };
        assert!(!report.is_complete());
    }
}
