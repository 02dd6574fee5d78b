//! Relays contact form submissions to the site owner over SMTP.

use std::time::Duration;

use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::Serialize;

use crate::config::MailConfig;

pub const CONTACT_SUBJECT: &str = "New Message";

const SMTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("mail relay is not configured")]
    NotConfigured,

    /// Authentication, connection and protocol failures.
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("email build error: {0}")]
    Build(String),
}

/// A validated contact form submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub message: String,
}

impl ContactMessage {
    pub fn body(&self) -> String {
        format!(
            "Name: {}\nEmail: {}\nPhone#: {}\nMessage: {}",
            self.name, self.email, self.phone, self.message
        )
    }
}

#[derive(Debug, Clone)]
pub struct ContactMailer {
    config: MailConfig,
}

impl ContactMailer {
    pub fn new(config: MailConfig) -> Self {
        Self { config }
    }

    pub fn is_configured(&self) -> bool {
        !self.config.smtp_host.is_empty()
            && !self.config.username.is_empty()
            && !self.config.password.is_empty()
            && !self.config.to_address.is_empty()
    }

    /// Build the plain-text mail for `contact`, from the relay account to
    /// the configured inbox.
    pub fn build_message(&self, contact: &ContactMessage) -> Result<Message, MailError> {
        Message::builder()
            .from(self.config.username.parse()?)
            .to(self.config.to_address.parse()?)
            .subject(CONTACT_SUBJECT)
            .header(ContentType::TEXT_PLAIN)
            .body(contact.body())
            .map_err(|e| MailError::Build(e.to_string()))
    }

    /// Send `contact` through the relay using STARTTLS.
    pub async fn send(&self, contact: &ContactMessage) -> Result<(), MailError> {
        if !self.is_configured() {
            return Err(MailError::NotConfigured);
        }

        let email = self.build_message(contact)?;

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_host)?
            .port(self.config.smtp_port)
            .credentials(Credentials::new(
                self.config.username.clone(),
                self.config.password.clone(),
            ))
            .timeout(Some(SMTP_TIMEOUT))
            .build();

        mailer.send(email).await?;
        log::info!("Contact message from {} relayed", contact.email);
        Ok(())
    }
}
