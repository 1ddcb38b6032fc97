use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Incoming notification event, e.g. `{"email": "a@b.com", "city": "Paris"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifyRequest {
    pub email: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
}

impl NotifyRequest {
    pub fn new(email: impl Into<String>) -> Self {
        Self { email: email.into(), city: None, ip: None }
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = Some(ip.into());
        self
    }

    /// The requested city, treating an empty string as absent.
    pub fn requested_city(&self) -> Option<&str> {
        self.city.as_deref().filter(|c| !c.is_empty())
    }
}

/// Current conditions for a city as reported by a weather provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub location_name: String,
    pub condition: String,
    pub temperature_c: f64,
    pub observed_at: DateTime<Utc>,
}

/// Renders as `"<Condition>, <temp>°C"`, e.g. `"Rain, 18.3°C"`.
impl fmt::Display for Forecast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {:.1}°C", self.condition, self.temperature_c)
    }
}
