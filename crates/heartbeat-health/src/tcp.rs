//! TCP connect probe.

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::debug;

use crate::error::CheckResult;
use crate::probe::Probe;

/// Passes when a TCP connection to `host:port` can be opened.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    host: String,
    port: u16,
    target: String,
}

impl TcpProbe {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        let host = host.into();
        let target = format!("{host}:{port}");
        Self { host, port, target }
    }
}

#[async_trait]
impl Probe for TcpProbe {
    fn target(&self) -> &str {
        &self.target
    }

    async fn check(&self) -> CheckResult<String> {
        let mut stream = TcpStream::connect((self.host.as_str(), self.port)).await?;
        if let Err(e) = stream.shutdown().await {
            debug!(target_addr = %self.target, error = %e, "tcp shutdown failed");
        }
        Ok("OK".into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::{run_probe, ProbeResult};
    use std::time::Duration;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn open_port_passes() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(async move {
            let _ = listener.accept().await;
        });

        let probe = TcpProbe::new("127.0.0.1", port);
        let outcome = run_probe(&probe, Duration::from_secs(5)).await;
        assert_eq!(outcome.result, ProbeResult::Healthy);
        assert_eq!(format!("{} {}", probe.target(), outcome.detail), format!("127.0.0.1:{port} OK"));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn closed_port_fails() {
        // Bind then drop to find a port nothing listens on.
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };

        let outcome = run_probe(&TcpProbe::new("127.0.0.1", port), Duration::from_secs(5)).await;
        assert_eq!(outcome.result, ProbeResult::Failed);
        assert!(!outcome.detail.is_empty());
    }
}
