//! Nominatim-backed [`Geocoder`] implementation.

use super::Geocoder;
use crate::error::{GeoError, GeoResult};
use serde::Deserialize;
use std::time::Duration;

/// User agent sent with every lookup, as Nominatim's usage policy requires.
const USER_AGENT: &str = concat!("contact-etl/", env!("CARGO_PKG_VERSION"));

/// One hit of a Nominatim search response.
#[derive(Debug, Deserialize)]
struct Place {
    display_name: String,
}

/// HTTP client for the Nominatim search API.
pub struct NominatimGeocoder {
    base_url: String,
    agent: ureq::Agent,
}

impl NominatimGeocoder {
    /// Create a geocoder against `base_url` with the given request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();

        NominatimGeocoder {
            base_url: base_url.into(),
            agent,
        }
    }

    fn build_url(&self, query: &str) -> String {
        format!(
            "{}/search?q={}&format=json&limit=1",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(query)
        )
    }
}

impl Geocoder for NominatimGeocoder {
    /// Look up a place and return the display address of the best hit.
    ///
    /// An empty result array is a permanent miss (`Ok(None)`); transport
    /// failures and server errors are transient (`Err(Unavailable)`).
    fn lookup(&self, query: &str) -> GeoResult<Option<String>> {
        let url = self.build_url(query);
        tracing::debug!("GET {}", url);

        let response = self
            .agent
            .get(&url)
            .set("User-Agent", USER_AGENT)
            .call()
            .map_err(|e| match e {
                ureq::Error::Status(status, response) => {
                    let message = response
                        .into_string()
                        .unwrap_or_else(|_| "Unknown error".to_string());
                    if (400..500).contains(&status) {
                        GeoError::InvalidResponse(format!("status {}: {}", status, message))
                    } else {
                        GeoError::Unavailable(format!("status {}: {}", status, message))
                    }
                }
                ureq::Error::Transport(transport) => GeoError::Unavailable(transport.to_string()),
            })?;

        let places: Vec<Place> = response
            .into_json()
            .map_err(|e| GeoError::InvalidResponse(e.to_string()))?;

        Ok(places.into_iter().next().map(|place| place.display_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_url_encodes_query() {
        let geocoder =
            NominatimGeocoder::new("https://nominatim.example.com/", Duration::from_secs(5));
        assert_eq!(
            geocoder.build_url("Rio de Janeiro"),
            "https://nominatim.example.com/search?q=Rio%20de%20Janeiro&format=json&limit=1"
        );
    }

    #[test]
    fn test_lookup_hit_and_miss() {
        let mut server = mockito::Server::new();

        let hit = server
            .mock("GET", "/search")
            .match_query(mockito::Matcher::UrlEncoded("q".into(), "Dublin".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"display_name": "Dublin, Leinster, Ireland", "lat": "53.35", "lon": "-6.26"}]"#)
            .create();

        let miss = server
            .mock("GET", "/search")
            .match_query(mockito::Matcher::UrlEncoded("q".into(), "Xyzzy".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .create();

        let geocoder = NominatimGeocoder::new(server.url(), Duration::from_secs(5));

        assert_eq!(
            geocoder.lookup("Dublin").unwrap(),
            Some("Dublin, Leinster, Ireland".to_string())
        );
        assert_eq!(geocoder.lookup("Xyzzy").unwrap(), None);

        hit.assert();
        miss.assert();
    }

    #[test]
    fn test_lookup_server_error_is_transient() {
        let mut server = mockito::Server::new();

        let mock = server
            .mock("GET", "/search")
            .match_query(mockito::Matcher::Any)
            .with_status(503)
            .with_body("overloaded")
            .create();

        let geocoder = NominatimGeocoder::new(server.url(), Duration::from_secs(5));
        let result = geocoder.lookup("Dublin");

        mock.assert();
        assert!(matches!(result, Err(GeoError::Unavailable(_))));
    }
}
