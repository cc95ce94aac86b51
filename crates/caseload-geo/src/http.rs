//! HTTP client for the Google Geocoding API (reverse lookup, country only).

use async_trait::async_trait;
use caseload_core::Coordinates;
use serde::Deserialize;
use tracing::debug;

use crate::{GeocodeError, Geocoder};

pub const DEFAULT_GEOCODE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";

/// Reverse-geocodes coordinates to a country short name.
pub struct GeocodeClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    #[serde(default)]
    address_components: Vec<AddressComponent>,
}

#[derive(Debug, Deserialize)]
struct AddressComponent {
    short_name: String,
}

impl GeocodeClient {
    /// `base_url` is the full JSON endpoint, e.g. [`DEFAULT_GEOCODE_URL`].
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Query string for one reverse lookup. The API wants latitude first.
    fn query(&self, coordinates: Coordinates) -> [(&'static str, String); 3] {
        [
            ("key", self.api_key.clone()),
            ("latlng", format!("{},{}", coordinates.lat, coordinates.lng)),
            ("result_type", "country".to_string()),
        ]
    }
}

#[async_trait]
impl Geocoder for GeocodeClient {
    async fn country_code(&self, coordinates: Coordinates) -> Result<String, GeocodeError> {
        debug!(%coordinates, "geocoding coordinate");
        let resp = self
            .client
            .get(&self.base_url)
            .query(&self.query(coordinates))
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GeocodeError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let body = resp.text().await?;
        country_from_body(&body)
    }
}

/// Country short name from the first address component of the first result.
fn country_from_body(body: &str) -> Result<String, GeocodeError> {
    let parsed: GeocodeResponse = serde_json::from_str(body)?;
    parsed
        .results
        .into_iter()
        .next()
        .and_then(|r| r.address_components.into_iter().next())
        .map(|c| c.short_name)
        .filter(|code| !code.is_empty())
        .ok_or_else(|| GeocodeError::NoResult(parsed.status.unwrap_or_else(|| "unknown".into())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn country_from_first_component() {
        let body = r#"{
            "results": [
                {
                    "address_components": [
                        {"long_name": "Italy", "short_name": "IT", "types": ["country", "political"]}
                    ],
                    "formatted_address": "Italy"
                },
                {
                    "address_components": [{"long_name": "San Marino", "short_name": "SM"}]
                }
            ],
            "status": "OK"
        }"#;
        assert_eq!(country_from_body(body).unwrap(), "IT");
    }

    #[test]
    fn zero_results_is_no_result() {
        let body = r#"{"results": [], "status": "ZERO_RESULTS"}"#;
        match country_from_body(body) {
            Err(GeocodeError::NoResult(status)) => assert_eq!(status, "ZERO_RESULTS"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn denied_request_is_no_result() {
        let body = r#"{
            "error_message": "The provided API key is invalid.",
            "results": [],
            "status": "REQUEST_DENIED"
        }"#;
        assert!(matches!(
            country_from_body(body),
            Err(GeocodeError::NoResult(_))
        ));
    }

    #[test]
    fn result_without_components_is_no_result() {
        let body = r#"{"results": [{"address_components": []}], "status": "OK"}"#;
        assert!(matches!(
            country_from_body(body),
            Err(GeocodeError::NoResult(_))
        ));
    }

    #[test]
    fn malformed_body_is_json_error() {
        assert!(matches!(
            country_from_body("<html>oops</html>"),
            Err(GeocodeError::Json(_))
        ));
    }

    #[test]
    fn query_puts_latitude_first() {
        let client = GeocodeClient::new(DEFAULT_GEOCODE_URL.into(), "secret".into());
        let query = client.query(Coordinates::new(112.2707, 30.9756));
        assert_eq!(query[0], ("key", "secret".to_string()));
        assert_eq!(query[1], ("latlng", "30.9756,112.2707".to_string()));
        assert_eq!(query[2], ("result_type", "country".to_string()));
    }

    #[test]
    fn request_url_carries_query() {
        let client = GeocodeClient::new("http://localhost:8080/geocode/".into(), "k".into());
        let request = client
            .client
            .get(&client.base_url)
            .query(&client.query(Coordinates::new(-3.5, 40.25)))
            .build()
            .unwrap();
        assert_eq!(request.url().path(), "/geocode");
        assert_eq!(
            request.url().query(),
            Some("key=k&latlng=40.25%2C-3.5&result_type=country")
        );
    }

    #[test]
    fn client_trims_trailing_slash() {
        let client = GeocodeClient::new("http://localhost:8080/geocode/".into(), "k".into());
        assert_eq!(client.base_url, "http://localhost:8080/geocode");
    }
}
