//! Twilio SMS alerts.

use std::time::Duration;

use async_trait::async_trait;
use heartbeat_core::config::TwilioConfig;
use tracing::debug;

use crate::error::{AlertError, AlertResult};
use crate::Notifier;

/// Public Twilio REST endpoint.
pub const TWILIO_API_BASE: &str = "https://api.twilio.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_ERROR_BODY: usize = 512;

/// Sends each alert as an SMS through the Twilio Messages API.
pub struct TwilioNotifier {
    config: TwilioConfig,
    client: reqwest::Client,
    base_url: String,
}

impl TwilioNotifier {
    pub fn new(config: TwilioConfig) -> AlertResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            config,
            client,
            base_url: TWILIO_API_BASE.to_string(),
        })
    }

    /// Point the notifier at another API root (used by tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url, self.config.account_sid
        )
    }
}

#[async_trait]
impl Notifier for TwilioNotifier {
    fn kind(&self) -> &'static str {
        "twilio"
    }

    async fn send(&self, message: &str) -> AlertResult<()> {
        let url = self.messages_url();
        debug!(%url, to = %self.config.to_number, "sending sms");

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&[
                ("To", self.config.to_number.as_str()),
                ("From", self.config.from_number.as_str()),
                ("Body", message),
            ])
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let mut body = response.text().await.unwrap_or_default();
        if body.len() > MAX_ERROR_BODY {
            let mut cut = MAX_ERROR_BODY;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
        }
        Err(AlertError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}
