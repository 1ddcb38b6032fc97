use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, header};
use serde::Deserialize;

use crate::http::{USER_AGENT, endpoint, read_json};

use super::GeoLocator;

// The free tier is HTTP only.
const DEFAULT_BASE_URL: &str = "http://ip-api.com";

/// Backup locator: `GET http://ip-api.com/json/<ip>`.
#[derive(Debug, Clone)]
pub struct IpApiComLocator {
    base_url: String,
    http: Client,
}

impl IpApiComLocator {
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

impl Default for IpApiComLocator {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct IpApiComResponse {
    #[serde(default)]
    status: String,
    city: Option<String>,
    message: Option<String>,
}

#[async_trait]
impl GeoLocator for IpApiComLocator {
    fn name(&self) -> &str {
        "ip-api.com"
    }

    async fn locate(&self, ip: &str) -> Result<Option<String>> {
        let url = endpoint(&self.base_url, &["json", ip])?;

        let res = self
            .http
            .get(url)
            .header(header::USER_AGENT, USER_AGENT)
            .send()
            .await
            .context("Failed to send request to ip-api.com")?;

        let parsed: IpApiComResponse = read_json(res, "ip-api.com").await?;

        if parsed.status != "success" {
            tracing::debug!(
                ip,
                status = %parsed.status,
                message = parsed.message.as_deref().unwrap_or_default(),
                "ip-api.com lookup unsuccessful"
            );
            return Ok(None);
        }

        Ok(parsed.city.filter(|c| !c.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn reads_city_on_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/json/1.1.1.1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "success",
                "country": "Australia",
                "city": "South Brisbane"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let locator = IpApiComLocator::with_base_url(&mock_server.uri());
        let city = locator.locate("1.1.1.1").await.unwrap();

        assert_eq!(city.as_deref(), Some("South Brisbane"));
    }

    #[tokio::test]
    async fn ip_stays_a_single_path_segment() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/json/8.8.8.8%2F..%2F1.1.1.1%3Flang=de%23x"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "fail",
                "message": "invalid query"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let locator = IpApiComLocator::with_base_url(&mock_server.uri());
        let city = locator.locate("8.8.8.8/../1.1.1.1?lang=de#x").await.unwrap();

        assert_eq!(city, None);
    }

    #[tokio::test]
    async fn fail_status_is_none() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "fail",
                "message": "private range",
                "city": "ignored"
            })))
            .mount(&mock_server)
            .await;

        let locator = IpApiComLocator::with_base_url(&mock_server.uri());
        assert_eq!(locator.locate("192.168.1.1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn unreachable_host_is_an_error() {
        let addr = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };

        let locator = IpApiComLocator::with_base_url(&format!("http://{addr}"));
        let err = locator.locate("8.8.8.8").await.unwrap_err();
        assert!(err.to_string().contains("Failed to send request to ip-api.com"));
    }
}
