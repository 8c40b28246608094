//! End-to-end pipeline tests: mockito CRM on both ends, stub geocoder in
//! the middle.

use contact_etl::error::GeoError;
use contact_etl::{
    ContactPipeline, ContactRecord, CrmClient, GeoResolver, Geocoder, LoadMode, SnapshotWriter,
};
use mockito::{Matcher, Server};
use serde_json::json;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// Geocoder that places every query in Ireland.
struct IrelandGeocoder;

impl Geocoder for IrelandGeocoder {
    fn lookup(&self, _query: &str) -> Result<Option<String>, GeoError> {
        Ok(Some("Dublin, County Dublin, Leinster, Ireland".to_string()))
    }
}

/// Geocoder that always fails, to exercise the retry-then-sentinel path.
struct DownGeocoder {
    calls: AtomicU32,
}

impl Geocoder for DownGeocoder {
    fn lookup(&self, _query: &str) -> Result<Option<String>, GeoError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(GeoError::Unavailable("503".to_string()))
    }
}

fn pipeline_for<G: Geocoder>(server: &Server, geocoder: G) -> ContactPipeline<G> {
    let client = CrmClient::with_base_url(
        server.url(),
        "read-token".to_string(),
        "write-token".to_string(),
    );
    let geo = GeoResolver::new(geocoder, 3, Duration::from_millis(0));
    let snapshot_dir = std::env::temp_dir().join(format!(
        "contact_etl_pipeline_test_{}",
        std::process::id()
    ));
    std::fs::create_dir_all(&snapshot_dir).unwrap();
    ContactPipeline::new(client, geo, SnapshotWriter::new(snapshot_dir))
}

fn search_page(properties: Vec<serde_json::Value>) -> String {
    let results: Vec<_> = properties
        .into_iter()
        .map(|props| json!({"properties": props}))
        .collect();
    json!({"results": results}).to_string()
}

#[test]
fn test_transform_resolves_merges_and_formats() {
    let mut server = Server::new();

    server
        .mock("POST", "/crm/v3/objects/contacts/search")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(search_page(vec![
            json!({
                "firstname": "Jane",
                "lastname": "Doe",
                "raw_email": "Jane Doe <jane@example.com> Primary Contact",
                "country": "Dublin",
                "phone": "0891234567",
                "technical_test___create_date": "2021-06-01",
                "industry": "Finance",
                "hs_object_id": "2"
            }),
            json!({
                "firstname": "Jane",
                "lastname": "Doe",
                "country": "Dublin",
                "technical_test___create_date": "2021-01-01",
                "industry": "Tech",
                "address": "1 Old Street",
                "hs_object_id": "1"
            }),
        ]))
        .create();

    let pipeline = pipeline_for(&server, IrelandGeocoder);
    let extracted = pipeline.extract().unwrap();
    assert_eq!(extracted.len(), 2);

    let transformed = pipeline.transform(extracted).unwrap();
    assert_eq!(transformed.len(), 1, "duplicates merge to one survivor");

    let survivor = &transformed[0];
    assert_eq!(survivor.external_id.as_deref(), Some("2"));
    assert_eq!(survivor.email.as_deref(), Some("jane@example.com"));
    assert_eq!(survivor.industry.as_deref(), Some(";Finance;Tech"));
    // Backfilled from the older duplicate
    assert_eq!(survivor.address.as_deref(), Some("1 Old Street"));
    // Geo derivation from the city-bearing "country" input
    assert_eq!(survivor.city.as_deref(), Some("Dublin"));
    assert_eq!(survivor.country.as_deref(), Some("Ireland"));
    assert_eq!(survivor.country_code.as_deref(), Some("IE"));
    // Phone formatted against the resolved region
    let phone = survivor.phone.as_deref().unwrap();
    assert!(phone.starts_with("+353"), "got {}", phone);
}

#[test]
fn test_transform_degrades_geo_outage_to_sentinels() {
    let mut server = Server::new();

    server
        .mock("POST", "/crm/v3/objects/contacts/search")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(search_page(vec![json!({
            "firstname": "Jane",
            "lastname": "Doe",
            "country": "Dublin",
            "phone": "0891234567",
            "technical_test___create_date": "2021-06-01",
            "hs_object_id": "1"
        })]))
        .create();

    let pipeline = pipeline_for(&server, DownGeocoder { calls: AtomicU32::new(0) });
    let extracted = pipeline.extract().unwrap();
    let transformed = pipeline.transform(extracted).unwrap();

    let survivor = &transformed[0];
    assert_eq!(
        survivor.country.as_deref(),
        Some("Service unavailable after retries")
    );
    assert_eq!(
        survivor.country_code.as_deref(),
        Some("Service unavailable after retries")
    );
    // The sentinel is not a region, so formatting degrades too
    assert_eq!(
        survivor.phone.as_deref(),
        Some("Could not parse the phone number")
    );
}

#[test]
fn test_transform_rejects_unparsable_dates() {
    let mut server = Server::new();

    server
        .mock("POST", "/crm/v3/objects/contacts/search")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(search_page(vec![json!({
            "firstname": "Jane",
            "lastname": "Doe",
            "technical_test___create_date": "06/01/2021",
            "hs_object_id": "1"
        })]))
        .create();

    let pipeline = pipeline_for(&server, IrelandGeocoder);
    let extracted = pipeline.extract().unwrap();
    assert!(pipeline.transform(extracted).is_err());
}

#[test]
fn test_load_chunks_and_isolates_failures() {
    let mut server = Server::new();

    // 250 records -> 3 chunks of 100/100/50, distinguished by their first id
    let chunk1 = server
        .mock("POST", "/crm/v3/objects/contacts/batch/create")
        .match_body(Matcher::PartialJson(json!({
            "inputs": [{"properties": {"temporary_id": "id-0"}}]
        })))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(r#"{"status": "COMPLETE"}"#)
        .expect(1)
        .create();

    let chunk2 = server
        .mock("POST", "/crm/v3/objects/contacts/batch/create")
        .match_body(Matcher::PartialJson(json!({
            "inputs": [{"properties": {"temporary_id": "id-100"}}]
        })))
        .with_status(500)
        .with_body("batch exploded")
        .expect(1)
        .create();

    let chunk3 = server
        .mock("POST", "/crm/v3/objects/contacts/batch/create")
        .match_body(Matcher::PartialJson(json!({
            "inputs": [{"properties": {"temporary_id": "id-200"}}]
        })))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(r#"{"status": "COMPLETE"}"#)
        .expect(1)
        .create();

    let records: Vec<ContactRecord> = (0..250)
        .map(|i| ContactRecord {
            external_id: Some(format!("id-{}", i)),
            ..Default::default()
        })
        .collect();

    let pipeline = pipeline_for(&server, IrelandGeocoder);
    let report = pipeline.load(&records, LoadMode::Create);

    chunk1.assert();
    chunk2.assert();
    chunk3.assert();

    assert_eq!(report.records, 250);
    assert_eq!(report.chunks_attempted, 3);
    assert_eq!(report.chunks_succeeded, 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].0, 1, "the failing chunk is the second");
    assert!(!report.is_complete());
}

#[test]
fn test_full_run_create_mode() {
    let mut server = Server::new();

    let search = server
        .mock("POST", "/crm/v3/objects/contacts/search")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(search_page(vec![json!({
            "firstname": "Jane",
            "lastname": "Doe",
            "raw_email": "jane@example.com",
            "country": "Dublin",
            "technical_test___create_date": "2021-06-01",
            "industry": "Tech",
            "hs_object_id": "1"
        })]))
        .expect(1)
        .create();

    let load = server
        .mock("POST", "/crm/v3/objects/contacts/batch/create")
        .match_body(Matcher::PartialJson(json!({
            "inputs": [{"properties": {
                "email": "jane@example.com",
                "city": "Dublin",
                "country": "Ireland",
                "hs_country_region_code": "IE",
                "original_industry": ";Tech",
                "original_create_date": "1622505600000",
                "temporary_id": "1"
            }}]
        })))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(r#"{"status": "COMPLETE"}"#)
        .expect(1)
        .create();

    let pipeline = pipeline_for(&server, IrelandGeocoder);
    let report = pipeline.run(LoadMode::Create).unwrap();

    search.assert();
    load.assert();
    assert!(report.is_complete());
    assert_eq!(report.records, 1);
}
