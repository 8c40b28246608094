//! City-to-country resolution with bounded retry.
//!
//! The geocoding service is consumed through the [`Geocoder`] trait so tests
//! can substitute a stub; production uses [`NominatimGeocoder`]. Lookup
//! failures degrade to sentinel strings rather than errors: a bad value in
//! the output is visible to a human fixing source data, while an aborted run
//! is not.

mod nominatim;
pub use nominatim::NominatimGeocoder;

use crate::error::{GeoError, GeoResult};
use std::thread;
use std::time::Duration;

/// Sentinel for absent input.
pub const CITY_NOT_PROVIDED: &str = "City not provided";
/// Sentinel for a city the geocoder cannot place.
pub const COUNTRY_NOT_FOUND: &str = "Country not found";
/// Sentinel for an exhausted retry budget.
pub const SERVICE_UNAVAILABLE: &str = "Service unavailable after retries";
/// Sentinel for a country name missing from the ISO reference table.
pub const COUNTRY_CODE_NOT_FOUND: &str = "Country code not found";
/// Sentinel for a city the geocoder cannot place when resolving a code.
pub const CITY_NOT_FOUND: &str = "City not found";

/// Looks up a place name and returns its formatted display address.
///
/// `Ok(None)` is a permanent miss; `Err` is a transient failure eligible
/// for retry.
pub trait Geocoder: Send + Sync {
    fn lookup(&self, query: &str) -> GeoResult<Option<String>>;
}

/// Resolves cities to countries and country codes through a [`Geocoder`],
/// retrying transient failures a bounded number of times with a fixed delay.
///
/// This is the only retried operation in the pipeline.
pub struct GeoResolver<G> {
    geocoder: G,
    retries: u32,
    retry_delay: Duration,
}

impl<G: Geocoder> GeoResolver<G> {
    pub fn new(geocoder: G, retries: u32, retry_delay: Duration) -> Self {
        GeoResolver {
            geocoder,
            retries,
            retry_delay,
        }
    }

    /// Resolve a city name to a country name.
    ///
    /// Returns one of the sentinel strings on empty input, a lookup miss, or
    /// an exhausted retry budget; never an `Err`.
    pub fn country_from_city(&self, city: &str) -> String {
        let city = city.trim_matches('\'');
        if city.is_empty() {
            return CITY_NOT_PROVIDED.to_string();
        }

        match self.lookup_with_retry(city) {
            Ok(Some(address)) => country_from_address(&address),
            Ok(None) => COUNTRY_NOT_FOUND.to_string(),
            Err(_) => SERVICE_UNAVAILABLE.to_string(),
        }
    }

    /// Resolve a city name to an ISO 3166-1 alpha-2 country code.
    ///
    /// The country is derived from the display address with the same parsing
    /// rule as [`country_from_city`](Self::country_from_city), then mapped
    /// through the ISO reference table. The two miss sentinels are distinct:
    /// `"City not found"` when the geocoder has no hit, `"Country code not
    /// found"` when the country name is not in the table.
    pub fn country_code_from_city(&self, city: &str) -> String {
        let city = city.trim_matches('\'');
        if city.is_empty() {
            return CITY_NOT_PROVIDED.to_string();
        }

        match self.lookup_with_retry(city) {
            Ok(Some(address)) => {
                let country = country_from_address(&address);
                match alpha2_for_country_name(&country) {
                    Some(code) => code,
                    None => COUNTRY_CODE_NOT_FOUND.to_string(),
                }
            }
            Ok(None) => CITY_NOT_FOUND.to_string(),
            Err(_) => SERVICE_UNAVAILABLE.to_string(),
        }
    }

    /// Bounded retry with a fixed delay between attempts.
    fn lookup_with_retry(&self, query: &str) -> GeoResult<Option<String>> {
        let mut last_error = GeoError::Unavailable("no attempts made".to_string());

        for attempt in 1..=self.retries.max(1) {
            match self.geocoder.lookup(query) {
                Ok(result) => return Ok(result),
                Err(err) => {
                    tracing::warn!(
                        "Geocoding attempt {}/{} for {:?} failed: {}",
                        attempt,
                        self.retries.max(1),
                        query,
                        err
                    );
                    last_error = err;
                    if attempt < self.retries.max(1) {
                        thread::sleep(self.retry_delay);
                    }
                }
            }
        }

        Err(last_error)
    }
}

/// Derive the country from a formatted display address.
///
/// The country is the last comma-separated segment; a `/`-delimited compound
/// region string ("Éire / Ireland") yields its second component.
pub fn country_from_address(address: &str) -> String {
    let last_segment = address.rsplit(',').next().unwrap_or(address).trim();

    if let Some((_, second)) = last_segment.split_once('/') {
        second.trim().to_string()
    } else {
        last_segment.to_string()
    }
}

/// Map a country display name to its ISO 3166-1 alpha-2 code.
fn alpha2_for_country_name(name: &str) -> Option<String> {
    rust_iso3166::ALL
        .iter()
        .find(|country| country.name.eq_ignore_ascii_case(name))
        .map(|country| country.alpha2.to_string())
}
