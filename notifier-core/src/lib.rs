//! Core library for the weather notifier.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Weather and IP geolocation providers behind async traits
//! - Email rendering and SMTP delivery
//! - The request handler tying them together
//!
//! It is used by `notifier-cli`, but can also be embedded in other binaries or
//! serverless handlers.

pub mod config;
pub mod email;
pub mod geo;
mod http;
pub mod handler;
pub mod model;
pub mod outcome;
pub mod suggestion;
pub mod weather;

pub use config::{Config, SmtpConfig, SmtpSettings};
pub use email::{EmailError, EmailService, Mailer, build_email};
pub use geo::{GeoLocator, GeoProviderId, GeoService};
pub use handler::{NOTIFICATION_SENT, Notifier};
pub use model::{Forecast, NotifyRequest};
pub use outcome::BestEffort;
pub use suggestion::get_suggestion;
pub use weather::{WeatherProvider, WeatherService};
