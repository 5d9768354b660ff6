//! Gmail SMTP alerts.

use std::time::Duration;

use async_trait::async_trait;
use heartbeat_core::config::GmailConfig;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::debug;

use crate::error::{AlertError, AlertResult};
use crate::Notifier;

/// Gmail's submission relay. Implicit TLS on port 465.
pub const GMAIL_SMTP_HOST: &str = "smtp.gmail.com";

const SMTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Mails each alert from `sent_from` to every address in `to`.
pub struct GmailNotifier {
    config: GmailConfig,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl GmailNotifier {
    pub fn new(config: GmailConfig) -> AlertResult<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(GMAIL_SMTP_HOST)
            .map_err(|e| AlertError::Smtp(e.to_string()))?
            .credentials(Credentials::new(
                config.sent_from.clone(),
                config.gmail_password.clone(),
            ))
            .timeout(Some(SMTP_TIMEOUT))
            .build();
        Ok(Self { config, transport })
    }

    /// Build the email for `message` without sending it.
    pub fn build_message(&self, message: &str) -> AlertResult<Message> {
        build_message(&self.config, message)
    }
}

fn parse_mailbox(address: &str) -> AlertResult<Mailbox> {
    address.parse().map_err(|e: lettre::address::AddressError| AlertError::Address {
        address: address.to_string(),
        reason: e.to_string(),
    })
}

/// Recipients from the comma-separated `to` field.
pub fn recipients(to: &str) -> Vec<&str> {
    to.split(',')
        .map(str::trim)
        .filter(|address| !address.is_empty())
        .collect()
}

pub fn build_message(config: &GmailConfig, message: &str) -> AlertResult<Message> {
    let mut builder = Message::builder()
        .from(parse_mailbox(&config.sent_from)?)
        .subject(config.subject.clone())
        .header(ContentType::TEXT_PLAIN);

    let to = recipients(&config.to);
    if to.is_empty() {
        return Err(AlertError::Address {
            address: config.to.clone(),
            reason: "no recipients".into(),
        });
    }
    for address in to {
        builder = builder.to(parse_mailbox(address)?);
    }

    builder
        .body(message.to_string())
        .map_err(|e| AlertError::Email(e.to_string()))
}

#[async_trait]
impl Notifier for GmailNotifier {
    fn kind(&self) -> &'static str {
        "gmail"
    }

    async fn send(&self, message: &str) -> AlertResult<()> {
        let email = self.build_message(message)?;
        debug!(to = %self.config.to, "sending email");
        self.transport
            .send(email)
            .await
            .map_err(|e| AlertError::Smtp(e.to_string()))?;
        Ok(())
    }
}
