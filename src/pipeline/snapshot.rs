//! CSV snapshots of each pipeline stage.
//!
//! Written after extract, transform and load for inspection and manual
//! resumability. Not required for correctness: a snapshot failure is logged
//! and the pipeline keeps going.

use crate::models::ContactRecord;
use std::path::{Path, PathBuf};

/// Snapshot written after extraction.
pub const COLLECT_SNAPSHOT: &str = "contacts_data_collect.csv";
/// Snapshot written after transformation.
pub const TRANSFORM_SNAPSHOT: &str = "contacts_data_transformation.csv";
/// Snapshot of the final pipeline result.
pub const RESULT_SNAPSHOT: &str = "contacts_data_result.csv";

/// Column header, using the upstream property names.
const HEADER: [&str; 12] = [
    "hs_object_id",
    "firstname",
    "lastname",
    "raw_email",
    "email",
    "country",
    "city",
    "country_code",
    "phone",
    "industry",
    "address",
    "technical_test___create_date",
];

/// Writes stage snapshots into a directory.
pub struct SnapshotWriter {
    dir: PathBuf,
}

impl SnapshotWriter {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        SnapshotWriter {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Write `records` to `file_name` under the snapshot directory.
    ///
    /// Failures are logged and swallowed; snapshots must never abort a run.
    pub fn write(&self, file_name: &str, records: &[ContactRecord]) {
        let path = self.dir.join(file_name);
        match self.write_csv(&path, records) {
            Ok(()) => tracing::info!("Data saved to {}", path.display()),
            Err(e) => tracing::warn!("Failed to write snapshot {}: {}", path.display(), e),
        }
    }

    fn write_csv(&self, path: &Path, records: &[ContactRecord]) -> Result<(), csv::Error> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(HEADER)?;

        for record in records {
            let field = |value: &Option<String>| value.clone().unwrap_or_default();
            writer.write_record([
                field(&record.external_id),
                field(&record.first_name),
                field(&record.last_name),
                field(&record.raw_email),
                field(&record.email),
                field(&record.country),
                field(&record.city),
                field(&record.country_code),
                field(&record.phone),
                field(&record.industry),
                field(&record.address),
                field(&record.create_date),
            ])?;
        }

        writer.flush()?;
        Ok(())
    }
}
