use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::fmt;

use crate::config::SmtpSettings;

use super::Mailer;

#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("Invalid email address format: {0}")]
    AddressFormat(#[from] lettre::address::AddressError),

    #[error("Failed to build email message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    #[error("SMTP transport error: {0}")]
    SmtpTransport(#[from] lettre::transport::smtp::Error),

    #[error("Failed to connect to SMTP relay: {0}")]
    SmtpRelay(lettre::transport::smtp::Error),

    /// For `Mailer` implementations whose relay answers outside SMTP.
    #[error("SMTP server rejected message: {0}")]
    Rejected(String),
}

/// Sends mail through an authenticated STARTTLS relay.
#[derive(Clone)]
pub struct SmtpMailer {
    settings: SmtpSettings,
}

impl fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpMailer")
            .field("host", &self.settings.host)
            .field("port", &self.settings.port)
            .field("from_email", &self.settings.from_email)
            .finish_non_exhaustive()
    }
}

impl SmtpMailer {
    pub fn new(settings: SmtpSettings) -> Self {
        Self { settings }
    }

    fn transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, EmailError> {
        let creds = Credentials::new(
            self.settings.from_email.clone(),
            self.settings.password.clone(),
        );

        Ok(
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.settings.host)
                .map_err(EmailError::SmtpRelay)?
                .port(self.settings.port)
                .credentials(creds)
                .build(),
        )
    }
}

/// Build an HTML message; addresses are parsed here so bad input fails before
/// any connection is made.
fn build_message(from: &str, to: &str, subject: &str, html: &str) -> Result<Message, EmailError> {
    let email = Message::builder()
        .from(from.parse()?)
        .to(to.parse()?)
        .subject(subject)
        .header(ContentType::TEXT_HTML)
        .body(html.to_string())?;

    Ok(email)
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_html(&self, to: &str, subject: &str, html: &str) -> Result<(), EmailError> {
        let email = build_message(&self.settings.from_email, to, subject, html)?;
        let mailer = self.transport()?;

        tracing::debug!(
            to,
            relay = %self.settings.host,
            port = self.settings.port,
            "Sending email over SMTP"
        );

        // lettre turns negative SMTP replies into `SmtpTransport` errors.
        mailer.send(email).await?;
        Ok(())
    }
}
