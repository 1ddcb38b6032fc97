use crate::{BestEffort, Config, model::Forecast, weather::openweather::OpenWeatherProvider};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

/// Substituted for the forecast line when the provider call fails.
pub const WEATHER_UNAVAILABLE: &str = "Unable to fetch weather data";

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Current conditions for `city`, temperatures in Celsius.
    async fn current(&self, city: &str) -> anyhow::Result<Forecast>;
}

#[derive(Debug)]
pub struct WeatherService {
    provider: Box<dyn WeatherProvider>,
}

impl WeatherService {
    pub fn new(provider: Box<dyn WeatherProvider>) -> Self {
        Self { provider }
    }

    /// Construct the OpenWeather-backed service from config.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let api_key = config.openweather_api_key()?;
        Ok(Self::new(Box::new(OpenWeatherProvider::new(api_key.to_owned()))))
    }

    /// Fetch the forecast for `city` as a full [`Forecast`].
    pub async fn current(&self, city: &str) -> anyhow::Result<Forecast> {
        self.provider.current(city).await
    }

    /// Forecast line for `city`, e.g. `"Rain, 18.3°C"`.
    ///
    /// Never fails: on any provider error the value is [`WEATHER_UNAVAILABLE`].
    pub async fn get_forecast(&self, city: &str) -> BestEffort<String> {
        match self.provider.current(city).await {
            Ok(forecast) => {
                tracing::debug!(
                    city,
                    location = %forecast.location_name,
                    observed_at = %forecast.observed_at,
                    "Fetched current weather"
                );
                BestEffort::ok(forecast.to_string())
            }
            Err(err) => {
                tracing::warn!(city, error = %format!("{err:#}"), "Weather lookup failed");
                BestEffort::degraded(WEATHER_UNAVAILABLE.to_string(), err)
            }
        }
    }
}
