//! Notification sink implementations: a logging mailer for local development
//! and an SMTP mailer for production.

use anyhow::{Context, Result};
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use secrecy::{ExposeSecret, SecretString};
use tracing::info;

use crate::auth::store::Mailer;

/// Local dev sender that logs the message instead of delivering it.
#[derive(Clone, Debug)]
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, to_email: &str, subject: &str, body: &str) -> Result<()> {
        info!(to_email = %to_email, subject = %subject, body = %body, "mailer send stub");
        Ok(())
    }
}

/// SMTP relay settings, typically sourced from the CLI/environment.
#[derive(Clone, Debug)]
pub struct SmtpConfig {
    pub host: String,
    pub username: String,
    pub password: SecretString,
}

/// Delivers through an SMTP relay over TLS.
pub struct SmtpMailer {
    transport: SmtpTransport,
    from: Mailbox,
}

impl SmtpMailer {
    /// Build a pooled relay transport.
    ///
    /// # Errors
    /// Returns an error when the relay host or from-address is invalid.
    pub fn new(config: &SmtpConfig, from_email: &str) -> Result<Self> {
        let from = from_email
            .parse::<Mailbox>()
            .with_context(|| format!("invalid from address: {from_email}"))?;

        let transport = SmtpTransport::relay(&config.host)
            .with_context(|| format!("invalid SMTP relay host: {}", config.host))?
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.expose_secret().to_string(),
            ))
            .build();

        Ok(Self { transport, from })
    }
}

impl Mailer for SmtpMailer {
    fn send(&self, to_email: &str, subject: &str, body: &str) -> Result<()> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(to_email
                .parse::<Mailbox>()
                .with_context(|| format!("invalid recipient address: {to_email}"))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .context("failed to build message")?;

        self.transport
            .send(&message)
            .with_context(|| format!("failed to deliver mail to {to_email}"))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_mailer_always_succeeds() {
        let result = LogMailer.send("alice@example.com", "subject", "body");
        assert!(result.is_ok());
    }

    #[test]
    fn smtp_mailer_rejects_bad_from_address() {
        let config = SmtpConfig {
            host: "smtp.example.com".to_string(),
            username: "mailer".to_string(),
            password: SecretString::from("secret".to_string()),
        };
        assert!(SmtpMailer::new(&config, "not-an-address").is_err());
        assert!(SmtpMailer::new(&config, "no-reply@example.com").is_ok());
    }
}
