//! HTTP GET probe.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::StatusCode;
use tracing::debug;

use crate::error::{CheckResult, ProbeError};
use crate::probe::Probe;

/// Passes only when `GET url` answers `200`. Redirects are followed.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    url: String,
    headers: BTreeMap<String, String>,
    timeout: Duration,
}

impl HttpProbe {
    pub fn new(url: impl Into<String>, headers: BTreeMap<String, String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            headers,
            timeout,
        }
    }

    fn header_map(&self) -> CheckResult<HeaderMap> {
        let mut map = HeaderMap::with_capacity(self.headers.len());
        for (name, value) in &self.headers {
            let header_name =
                HeaderName::from_bytes(name.as_bytes()).map_err(|e| ProbeError::Header {
                    name: name.clone(),
                    reason: e.to_string(),
                })?;
            let header_value = HeaderValue::from_str(value).map_err(|e| ProbeError::Header {
                name: name.clone(),
                reason: e.to_string(),
            })?;
            map.insert(header_name, header_value);
        }
        Ok(map)
    }
}

#[async_trait]
impl Probe for HttpProbe {
    fn target(&self) -> &str {
        &self.url
    }

    async fn check(&self) -> CheckResult<String> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .default_headers(self.header_map()?)
            .build()?;

        let response = client.get(&self.url).send().await?;
        let status = response.status();
        let reason = status.canonical_reason().unwrap_or_default();
        debug!(url = %self.url, status = status.as_u16(), "http probe answered");

        if status == StatusCode::OK {
            Ok(format!("{} {reason}", status.as_u16()))
        } else {
            Err(ProbeError::Status {
                status: status.as_u16(),
                reason: reason.to_string(),
            })
        }
    }
}
