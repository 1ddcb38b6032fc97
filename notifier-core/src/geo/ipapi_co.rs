use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, header};
use serde::Deserialize;

use crate::http::{USER_AGENT, endpoint, read_json};

use super::GeoLocator;

const DEFAULT_BASE_URL: &str = "https://ipapi.co";

/// Primary locator: `GET https://ipapi.co/<ip>/json/`.
#[derive(Debug, Clone)]
pub struct IpApiCoLocator {
    base_url: String,
    http: Client,
}

impl IpApiCoLocator {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }
}

impl Default for IpApiCoLocator {
    fn default() -> Self {
        Self::new()
    }
}

/// ipapi.co answers lookup errors with `{"error": true, "reason": ...}` and no city.
#[derive(Debug, Deserialize)]
struct IpApiCoResponse {
    city: Option<String>,
    country_name: Option<String>,
    #[serde(default)]
    error: bool,
    reason: Option<String>,
}

#[async_trait]
impl GeoLocator for IpApiCoLocator {
    fn name(&self) -> &str {
        "ipapi.co"
    }

    async fn locate(&self, ip: &str) -> Result<Option<String>> {
        let url = endpoint(&self.base_url, &[ip, "json", ""])?;

        let res = self
            .http
            .get(url)
            .header(header::USER_AGENT, USER_AGENT)
            .send()
            .await
            .context("Failed to send request to ipapi.co")?;

        let parsed: IpApiCoResponse = read_json(res, "ipapi.co").await?;

        if parsed.error {
            anyhow::bail!(
                "ipapi.co rejected lookup: {}",
                parsed.reason.as_deref().unwrap_or("no reason given")
            );
        }

        tracing::debug!(
            ip,
            city = parsed.city.as_deref().unwrap_or_default(),
            country = parsed.country_name.as_deref().unwrap_or_default(),
            "ipapi.co lookup"
        );

        Ok(parsed.city.filter(|c| !c.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn reads_city() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/8.8.8.8/json/"))
            .and(header("User-Agent", "WeatherNotifier/1.0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ip": "8.8.8.8",
                "city": "Mountain View",
                "country_name": "United States"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let locator = IpApiCoLocator::with_base_url(&mock_server.uri());
        let city = locator.locate("8.8.8.8").await.unwrap();

        assert_eq!(city.as_deref(), Some("Mountain View"));
    }

    #[tokio::test]
    async fn ip_stays_a_single_path_segment() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/8.8.8.8%2F..%2F..%2F1.1.1.1%3Fkey=x/json/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "error": true,
                "reason": "Invalid IP Address"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/1.1.1.1/json/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "city": "Sydney"
            })))
            .expect(0)
            .mount(&mock_server)
            .await;

        let locator = IpApiCoLocator::with_base_url(&mock_server.uri());
        let err = locator.locate("8.8.8.8/../../1.1.1.1?key=x").await.unwrap_err();

        assert!(err.to_string().contains("Invalid IP Address"));
    }

    #[tokio::test]
    async fn dot_segment_ip_is_rejected_before_sending() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "city": "Sydney"
            })))
            .expect(0)
            .mount(&mock_server)
            .await;

        let locator = IpApiCoLocator::with_base_url(&mock_server.uri());
        assert!(locator.locate("..").await.is_err());
    }

    #[tokio::test]
    async fn unreachable_host_is_an_error() {
        let addr = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };

        let locator = IpApiCoLocator::with_base_url(&format!("http://{addr}"));
        let err = locator.locate("8.8.8.8").await.unwrap_err();
        assert!(err.to_string().contains("Failed to send request to ipapi.co"));
    }

    #[tokio::test]
    async fn missing_city_is_none() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ip": "10.0.0.1",
                "country_name": ""
            })))
            .mount(&mock_server)
            .await;

        let locator = IpApiCoLocator::with_base_url(&mock_server.uri());
        assert_eq!(locator.locate("10.0.0.1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn error_payload_is_an_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ip": "8.8.8.8",
                "error": true,
                "reason": "RateLimited"
            })))
            .mount(&mock_server)
            .await;

        let locator = IpApiCoLocator::with_base_url(&mock_server.uri());
        let err = locator.locate("8.8.8.8").await.unwrap_err();
        assert!(err.to_string().contains("RateLimited"));
    }

    #[tokio::test]
    async fn server_error_is_an_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .mount(&mock_server)
            .await;

        let locator = IpApiCoLocator::with_base_url(&mock_server.uri());
        let err = locator.locate("8.8.8.8").await.unwrap_err();
        assert!(err.to_string().contains("503"));
    }
}
