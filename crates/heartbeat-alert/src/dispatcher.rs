//! Fan-out of one message to every configured channel.

use heartbeat_core::AlertConfig;
use tracing::{debug, error, info, warn};

use crate::error::AlertResult;
use crate::gmail::GmailNotifier;
use crate::shell::ShellNotifier;
use crate::twilio::TwilioNotifier;
use crate::Notifier;

/// Outcome counts of one [`AlertDispatcher::notify`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Construct the channel for one `alerts` entry.
pub fn build_notifier(config: &AlertConfig) -> AlertResult<Box<dyn Notifier>> {
    Ok(match config {
        AlertConfig::Shell(shell) => Box::new(ShellNotifier::new(shell.command.clone())),
        AlertConfig::Twilio(twilio) => Box::new(TwilioNotifier::new(twilio.clone())?),
        AlertConfig::Gmail(gmail) => Box::new(GmailNotifier::new(gmail.clone())?),
    })
}

/// Sends alert messages to all channels in configuration order.
#[derive(Default)]
pub struct AlertDispatcher {
    notifiers: Vec<Box<dyn Notifier>>,
}

impl AlertDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_configs(configs: &[AlertConfig]) -> AlertResult<Self> {
        let notifiers = configs
            .iter()
            .map(build_notifier)
            .collect::<AlertResult<Vec<_>>>()?;
        Ok(Self { notifiers })
    }

    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifiers.push(notifier);
        self
    }

    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }

    /// Deliver `message` through every channel.
    ///
    /// Never fails: each channel's error is logged and counted, and the
    /// remaining channels are still tried.
    pub async fn notify(&self, message: &str) -> DispatchReport {
        let mut report = DispatchReport::default();

        if self.notifiers.is_empty() {
            warn!(%message, "no alert channels configured; alert dropped");
            return report;
        }

        for (index, notifier) in self.notifiers.iter().enumerate() {
            match notifier.send(message).await {
                Ok(()) => {
                    report.delivered += 1;
                    debug!(channel = notifier.kind(), index, "alert delivered");
                }
                Err(e) => {
                    report.failed += 1;
                    error!(channel = notifier.kind(), index, error = %e, "alert delivery failed");
                }
            }
        }

        info!(
            %message,
            delivered = report.delivered,
            failed = report.failed,
            "alert dispatched"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AlertError;
    use async_trait::async_trait;
    use heartbeat_core::config::ShellAlertConfig;
    use std::sync::{Arc, Mutex};

    struct Recording {
        sent: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Notifier for Recording {
        fn kind(&self) -> &'static str {
            "recording"
        }

        async fn send(&self, message: &str) -> AlertResult<()> {
            self.sent.lock().unwrap().push(message.to_string());
            Ok(())
        }
    }

    struct Broken;

    #[async_trait]
    impl Notifier for Broken {
        fn kind(&self) -> &'static str {
            "broken"
        }

        async fn send(&self, _message: &str) -> AlertResult<()> {
            Err(AlertError::Smtp("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn failing_channel_does_not_block_others() {
        let first = Arc::new(Mutex::new(Vec::new()));
        let last = Arc::new(Mutex::new(Vec::new()));
        let dispatcher = AlertDispatcher::new()
            .with_notifier(Box::new(Recording { sent: first.clone() }))
            .with_notifier(Box::new(Broken))
            .with_notifier(Box::new(Recording { sent: last.clone() }));

        let report = dispatcher.notify("db is down").await;

        assert_eq!(report, DispatchReport { delivered: 2, failed: 1 });
        assert_eq!(*first.lock().unwrap(), vec!["db is down"]);
        assert_eq!(*last.lock().unwrap(), vec!["db is down"]);
    }

    #[tokio::test]
    async fn empty_dispatcher_drops_message() {
        let dispatcher = AlertDispatcher::new();
        assert!(dispatcher.is_empty());
        assert_eq!(dispatcher.notify("x").await, DispatchReport::default());
    }

    #[tokio::test]
    async fn from_configs_preserves_order() {
        let configs = vec![
            AlertConfig::Shell(ShellAlertConfig { command: "true".into() }),
            AlertConfig::Shell(ShellAlertConfig { command: "false".into() }),
        ];
        let dispatcher = AlertDispatcher::from_configs(&configs).unwrap();
        assert_eq!(dispatcher.len(), 2);

        let report = dispatcher.notify("x").await;
        assert_eq!(report, DispatchReport { delivered: 1, failed: 1 });
    }
}
