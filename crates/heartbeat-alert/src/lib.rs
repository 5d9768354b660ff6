//! heartbeat-alert — delivery of rendered alert messages.
//!
//! Every channel implements [`Notifier`]; the [`AlertDispatcher`] sends each
//! message to all configured channels in order. A failing channel is logged
//! and counted but never stops the remaining channels or the run.
//!
//! ```text
//! AlertDispatcher::notify(message)
//!   ├── ShellNotifier   sh -c "<command with $message>"
//!   ├── TwilioNotifier  POST /2010-04-01/Accounts/{sid}/Messages.json
//!   └── GmailNotifier   SMTP over TLS to smtp.gmail.com:465
//! ```

pub mod dispatcher;
pub mod error;
pub mod gmail;
pub mod shell;
pub mod twilio;

use async_trait::async_trait;

pub use dispatcher::{AlertDispatcher, DispatchReport, build_notifier};
pub use error::{AlertError, AlertResult};
pub use gmail::GmailNotifier;
pub use shell::ShellNotifier;
pub use twilio::TwilioNotifier;

/// An alert transport.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Short channel label used in logs.
    fn kind(&self) -> &'static str;

    /// Deliver `message`. Errors are reported, never retried.
    async fn send(&self, message: &str) -> AlertResult<()>;
}
