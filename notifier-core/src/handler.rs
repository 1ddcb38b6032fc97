use crate::{
    Config, EmailService, GeoService, NotifyRequest, WeatherService, email::build_email,
    suggestion::get_suggestion,
};

/// Returned for every handled request, whether or not delivery succeeded.
pub const NOTIFICATION_SENT: &str = "Notification sent.";

/// Entry point: resolves the city, fetches weather and emails the summary.
#[derive(Debug)]
pub struct Notifier {
    geo: GeoService,
    weather: WeatherService,
    email: EmailService,
}

impl Notifier {
    pub fn new(geo: GeoService, weather: WeatherService, email: EmailService) -> Self {
        Self { geo, weather, email }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self::new(
            GeoService::from_config(config)?,
            WeatherService::from_config(config)?,
            EmailService::from_config(config)?,
        ))
    }

    pub async fn handle(&self, request: &NotifyRequest) -> &'static str {
        let city = match request.requested_city() {
            Some(city) => city.to_string(),
            None => self.geo.detect_city(request.ip.as_deref()).await.into_value(),
        };

        let forecast = self.weather.get_forecast(&city).await.into_value();
        let suggestion = get_suggestion(&forecast);

        // The detected IP is not passed on, so the location line never renders here.
        let html = build_email(&city, &forecast, suggestion, None);

        let sent = self.email.send_email(&request.email, &html).await;
        tracing::info!(
            city = %city,
            forecast = %forecast,
            delivered = !sent.is_degraded(),
            "Handled notification request"
        );

        NOTIFICATION_SENT
    }
}
