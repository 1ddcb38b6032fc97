use crate::{BestEffort, Config, email::smtp::SmtpMailer};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod smtp;

pub use smtp::EmailError;

pub const SUBJECT: &str = "Weather Notification";

#[async_trait]
pub trait Mailer: Send + Sync + Debug {
    async fn send_html(&self, to: &str, subject: &str, html: &str) -> Result<(), EmailError>;
}

/// Render the notification body.
///
/// Values are interpolated as-is, without HTML escaping. The location line
/// appears only for a real detected address (not `"unknown"` or loopback).
pub fn build_email(
    city: &str,
    forecast: &str,
    suggestion: &str,
    detected_ip: Option<&str>,
) -> String {
    let location_info = match detected_ip {
        Some(ip) if ip != "unknown" && ip != "127.0.0.1" => format!(
            "<p><small><em>Location auto-detected from your IP: {ip}</em></small></p>"
        ),
        _ => String::new(),
    };

    format!(
        r#"<html><body style="font-family: Arial, sans-serif; margin: 20px;">
<div style="max-width: 600px; margin: 0 auto; border: 1px solid #ddd; border-radius: 10px; padding: 20px;">
<h2 style="color: #4CAF50; text-align: center;">Weather Update</h2>
<h3 style="color: #333;">{city}</h3>
<div style="background: #f9f9f9; padding: 15px; border-radius: 5px; margin: 10px 0;">
<p><strong>Current Weather:</strong> {forecast}</p>
<p><strong>Suggestion:</strong> {suggestion}</p>
</div>
{location_info}
<hr style="margin: 20px 0; border: none; height: 1px; background: #ddd;">
<p style="text-align: center; color: #666;">
<small>Powered by your Weather Notifier | Data from OpenWeatherMap | Sent via Gmail SMTP</small>
</p>
<p style="text-align: center; margin-top: 20px;">Have a great day! ☀️</p>
</div></body></html>"#
    )
}

#[derive(Debug)]
pub struct EmailService {
    mailer: Box<dyn Mailer>,
}

impl EmailService {
    pub fn new(mailer: Box<dyn Mailer>) -> Self {
        Self { mailer }
    }

    /// SMTP-backed service using the configured sender credentials.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let settings = config.smtp_settings()?;
        Ok(Self::new(Box::new(SmtpMailer::new(settings))))
    }

    /// Send `html` to `to`. Failures are logged and reported only through
    /// the returned outcome; the caller is never blocked on delivery.
    pub async fn send_email(&self, to: &str, html: &str) -> BestEffort<()> {
        match self.mailer.send_html(to, SUBJECT, html).await {
            Ok(()) => {
                tracing::info!(to, "Weather notification sent");
                BestEffort::ok(())
            }
            Err(err) => {
                tracing::warn!(to, error = %err, "Failed to send email");
                BestEffort::degraded((), err.into())
            }
        }
    }
}
