use crate::{
    BestEffort, Config,
    geo::{ip_api_com::IpApiComLocator, ipapi_co::IpApiCoLocator},
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod ip_api_com;
pub mod ipapi_co;

pub const DEFAULT_CITY: &str = "Mumbai";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeoProviderId {
    IpApiCo,
    IpApiCom,
}

impl GeoProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeoProviderId::IpApiCo => "ipapi.co",
            GeoProviderId::IpApiCom => "ip-api.com",
        }
    }

    pub const fn all() -> &'static [GeoProviderId] {
        &[GeoProviderId::IpApiCo, GeoProviderId::IpApiCom]
    }
}

impl std::fmt::Display for GeoProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for GeoProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "ipapi.co" => Ok(GeoProviderId::IpApiCo),
            "ip-api.com" => Ok(GeoProviderId::IpApiCom),
            _ => Err(anyhow::anyhow!(
                "Unknown geolocation provider '{value}'. Supported providers: ipapi.co, ip-api.com."
            )),
        }
    }
}

#[async_trait]
pub trait GeoLocator: Send + Sync + Debug {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// City for `ip`, or `None` when the provider has no answer.
    async fn locate(&self, ip: &str) -> anyhow::Result<Option<String>>;
}

pub fn locator_from_id(id: GeoProviderId) -> Box<dyn GeoLocator> {
    match id {
        GeoProviderId::IpApiCo => Box::new(IpApiCoLocator::new()),
        GeoProviderId::IpApiCom => Box::new(IpApiComLocator::new()),
    }
}

/// Addresses that never reach a geolocation provider.
pub fn is_local_address(ip: Option<&str>) -> bool {
    matches!(ip, None | Some("" | "127.0.0.1" | "localhost"))
}

/// Resolves a city from an IP address by trying each locator in order.
#[derive(Debug)]
pub struct GeoService {
    locators: Vec<Box<dyn GeoLocator>>,
    default_city: String,
}

impl GeoService {
    pub fn new(locators: Vec<Box<dyn GeoLocator>>, default_city: impl Into<String>) -> Self {
        Self { locators, default_city: default_city.into() }
    }

    /// Build the chain in the order given by `geo_providers`.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let locators = config
            .geo_provider_ids()?
            .into_iter()
            .map(locator_from_id)
            .collect();

        Ok(Self::new(locators, config.default_city.clone()))
    }

    pub fn default_city(&self) -> &str {
        &self.default_city
    }

    /// City for `ip`; always non-empty.
    ///
    /// Local or missing addresses resolve to the default city without a
    /// lookup. When every locator fails or comes back empty the default city
    /// is returned as a degraded outcome.
    pub async fn detect_city(&self, ip: Option<&str>) -> BestEffort<String> {
        let ip = match ip {
            Some(ip) if !is_local_address(Some(ip)) => ip,
            _ => {
                tracing::debug!(
                    default_city = %self.default_city,
                    "No public IP given, using default city"
                );
                return BestEffort::ok(self.default_city.clone());
            }
        };

        let mut misses = Vec::with_capacity(self.locators.len());

        for locator in &self.locators {
            match locator.locate(ip).await {
                Ok(Some(city)) if !city.is_empty() => {
                    tracing::info!(
                        ip,
                        provider = locator.name(),
                        city = %city,
                        "Detected city from IP"
                    );
                    return BestEffort::ok(city);
                }
                Ok(_) => {
                    tracing::debug!(
                        ip,
                        provider = locator.name(),
                        "Geolocation provider returned no city"
                    );
                    misses.push(format!("{}: no city", locator.name()));
                }
                Err(err) => {
                    tracing::warn!(
                        ip,
                        provider = locator.name(),
                        error = %format!("{err:#}"),
                        "Geolocation lookup failed"
                    );
                    misses.push(format!("{}: {err:#}", locator.name()));
                }
            }
        }

        let failure = if misses.is_empty() {
            anyhow::anyhow!("No geolocation providers configured")
        } else {
            anyhow::anyhow!("No geolocation provider resolved {ip} ({})", misses.join("; "))
        };

        tracing::warn!(ip, default_city = %self.default_city, "Falling back to default city");
        BestEffort::degraded(self.default_city.clone(), failure)
    }
}
