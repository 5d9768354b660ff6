//! heartbeat.yaml configuration parser.
//!
//! The document holds two lists, `tests` and `alerts`. Every entry maps a
//! kind (`shell`/`tcp`/`http` for tests, `shell`/`twilio`/`gmail` for alerts)
//! to that kind's fields. Probe fields the parser does not recognize are kept
//! so they can be referenced from message templates.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use chrono::format::{Item, StrftimeItems};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{ConfigError, ConfigResult};
use crate::identity::ProbeIdentity;

pub const DEFAULT_DOWN_MESSAGE: &str = "$name is down, since $last_pass_time";
pub const DEFAULT_UP_MESSAGE: &str = "$name is up";
pub const DEFAULT_ALERT_PERIOD_HOURS: f64 = 1.0;
pub const DEFAULT_TIME_FORMAT: &str = "%m/%d %H:%M";
pub const DEFAULT_EMAIL_SUBJECT: &str = "heartbeat alert";

/// Applied when a probe does not set `timeout`.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

const PROBE_KINDS: [&str; 3] = ["shell", "tcp", "http"];
const ALERT_KINDS: [&str; 3] = ["shell", "twilio", "gmail"];

/// Fully parsed and validated configuration.
#[derive(Debug, Clone)]
pub struct HeartbeatConfig {
    /// Probes, in the order they run.
    pub tests: Vec<ProbeConfig>,
    /// Alert channels every rendered message is sent to.
    pub alerts: Vec<AlertConfig>,
    /// strftime format for the `*_time` state fields.
    pub time_format: String,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    tests: Vec<Map<String, Value>>,
    #[serde(default)]
    alerts: Vec<Map<String, Value>>,
    #[serde(default = "default_time_format")]
    time_format: String,
}

impl HeartbeatConfig {
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        let raw: RawConfig = serde_yaml::from_str(content)?;

        if raw.tests.is_empty() {
            return Err(ConfigError::invalid("tests", "must contain at least one test"));
        }
        if StrftimeItems::new(&raw.time_format).any(|item| matches!(item, Item::Error)) {
            return Err(ConfigError::invalid(
                "time_format",
                format!("invalid strftime format '{}'", raw.time_format),
            ));
        }

        let mut tests = Vec::new();
        for (index, entry) in raw.tests.iter().enumerate() {
            let location = format!("tests[{index}]");
            for (kind, fields) in split_entry(entry, &PROBE_KINDS, &location)? {
                let location = format!("{location}.{kind}");
                tests.push(ProbeConfig::from_fields(kind, fields, &location)?);
            }
        }

        let mut alerts = Vec::new();
        for (index, entry) in raw.alerts.iter().enumerate() {
            let location = format!("alerts[{index}]");
            for (kind, fields) in split_entry(entry, &ALERT_KINDS, &location)? {
                let location = format!("{location}.{kind}");
                alerts.push(AlertConfig::from_fields(kind, fields, &location)?);
            }
        }

        Ok(HeartbeatConfig {
            tests,
            alerts,
            time_format: raw.time_format,
        })
    }
}

// ── Probes ─────────────────────────────────────────────────────────

/// One configured probe plus the settings that drive its alerting.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeConfig {
    /// Fingerprint of the user-supplied fields (defaults excluded).
    pub identity: ProbeIdentity,
    pub name: String,
    pub down_message: String,
    pub up_message: String,
    /// Consecutive failures absorbed before the probe counts as down.
    pub ignore_fail_count: u32,
    /// Minimum gap between repeated down-alerts.
    pub alert_period_hours: f64,
    pub timeout: Option<Duration>,
    pub kind: ProbeKind,
    /// User fields with defaults filled in, exposed to `$key` templates.
    pub fields: Map<String, Value>,
}

/// Kind-specific probe parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeKind {
    Shell {
        command: String,
    },
    Tcp {
        host: String,
        port: u16,
    },
    Http {
        url: String,
        headers: BTreeMap<String, String>,
    },
}

impl ProbeKind {
    pub fn label(&self) -> &'static str {
        match self {
            ProbeKind::Shell { .. } => "shell",
            ProbeKind::Tcp { .. } => "tcp",
            ProbeKind::Http { .. } => "http",
        }
    }
}

#[derive(Deserialize)]
struct CommonFields {
    name: String,
    #[serde(default = "default_down_message")]
    down_message: String,
    #[serde(default = "default_up_message")]
    up_message: String,
    #[serde(default)]
    ignore_fail_count: u32,
    #[serde(default = "default_alert_period_hours")]
    alert_period_hours: f64,
    #[serde(default)]
    timeout: Option<f64>,
}

#[derive(Deserialize)]
struct ShellFields {
    command: String,
}

#[derive(Deserialize)]
struct TcpFields {
    host: String,
    port: u16,
}

#[derive(Deserialize)]
struct HttpFields {
    url: String,
    #[serde(default)]
    headers: BTreeMap<String, String>,
}

impl ProbeConfig {
    /// Build a probe from the field map of a `{kind: {...}}` entry.
    pub fn from_fields(
        kind: &str,
        fields: &Map<String, Value>,
        location: &str,
    ) -> ConfigResult<Self> {
        let common: CommonFields = parse_fields(fields, location)?;

        if common.name.trim().is_empty() {
            return Err(ConfigError::invalid(location, "name cannot be empty"));
        }
        if !(common.alert_period_hours.is_finite() && common.alert_period_hours > 0.0) {
            return Err(ConfigError::invalid(
                location,
                "alert_period_hours must be greater than 0",
            ));
        }
        let timeout = match common.timeout {
            Some(secs) => Some(
                Duration::try_from_secs_f64(secs)
                    .ok()
                    .filter(|d| !d.is_zero())
                    .ok_or_else(|| ConfigError::invalid(location, "timeout must be greater than 0"))?,
            ),
            None => None,
        };

        let kind = match kind {
            "shell" => {
                let shell: ShellFields = parse_fields(fields, location)?;
                if shell.command.trim().is_empty() {
                    return Err(ConfigError::invalid(location, "command cannot be empty"));
                }
                ProbeKind::Shell {
                    command: shell.command,
                }
            }
            "tcp" => {
                let tcp: TcpFields = parse_fields(fields, location)?;
                if tcp.host.trim().is_empty() {
                    return Err(ConfigError::invalid(location, "host cannot be empty"));
                }
                if tcp.port == 0 {
                    return Err(ConfigError::invalid(location, "port must be 1..=65535"));
                }
                ProbeKind::Tcp {
                    host: tcp.host,
                    port: tcp.port,
                }
            }
            "http" => {
                let http: HttpFields = parse_fields(fields, location)?;
                if !(http.url.starts_with("http://") || http.url.starts_with("https://")) {
                    return Err(ConfigError::invalid(
                        location,
                        format!("url '{}' must start with http:// or https://", http.url),
                    ));
                }
                ProbeKind::Http {
                    url: http.url,
                    headers: http.headers,
                }
            }
            other => {
                return Err(ConfigError::UnknownKind {
                    location: location.to_string(),
                    kind: other.to_string(),
                });
            }
        };

        // Hash before defaults are filled in.
        let identity = ProbeIdentity::from_fields(fields);

        let mut template_fields = fields.clone();
        template_fields
            .entry("down_message")
            .or_insert_with(|| Value::from(common.down_message.clone()));
        template_fields
            .entry("up_message")
            .or_insert_with(|| Value::from(common.up_message.clone()));
        template_fields
            .entry("ignore_fail_count")
            .or_insert_with(|| Value::from(common.ignore_fail_count));
        template_fields
            .entry("alert_period_hours")
            .or_insert_with(|| Value::from(common.alert_period_hours));

        Ok(ProbeConfig {
            identity,
            name: common.name,
            down_message: common.down_message,
            up_message: common.up_message,
            ignore_fail_count: common.ignore_fail_count,
            alert_period_hours: common.alert_period_hours,
            timeout,
            kind,
            fields: template_fields,
        })
    }

    pub fn timeout_or_default(&self) -> Duration {
        self.timeout.unwrap_or(DEFAULT_PROBE_TIMEOUT)
    }

    /// Re-alert cadence in seconds.
    pub fn alert_period_secs(&self) -> f64 {
        self.alert_period_hours * 60.0 * 60.0
    }
}

// ── Alerts ─────────────────────────────────────────────────────────

/// A configured alert channel.
#[derive(Debug, Clone, PartialEq)]
pub enum AlertConfig {
    Shell(ShellAlertConfig),
    Twilio(TwilioConfig),
    Gmail(GmailConfig),
}

/// Runs `command` with `$message` replaced by the alert text.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ShellAlertConfig {
    pub command: String,
}

/// SMS through the Twilio REST API.
#[derive(Clone, PartialEq, Deserialize)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
    pub to_number: String,
}

impl fmt::Debug for TwilioConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwilioConfig")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"<redacted>")
            .field("from_number", &self.from_number)
            .field("to_number", &self.to_number)
            .finish()
    }
}

/// Email through Gmail's SMTP relay.
#[derive(Clone, PartialEq, Deserialize)]
pub struct GmailConfig {
    pub gmail_password: String,
    pub sent_from: String,
    /// One address, or several separated by commas.
    pub to: String,
    #[serde(default = "default_email_subject")]
    pub subject: String,
}

impl fmt::Debug for GmailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GmailConfig")
            .field("gmail_password", &"<redacted>")
            .field("sent_from", &self.sent_from)
            .field("to", &self.to)
            .field("subject", &self.subject)
            .finish()
    }
}

impl AlertConfig {
    pub fn from_fields(
        kind: &str,
        fields: &Map<String, Value>,
        location: &str,
    ) -> ConfigResult<Self> {
        match kind {
            "shell" => {
                let shell: ShellAlertConfig = parse_fields(fields, location)?;
                if shell.command.trim().is_empty() {
                    return Err(ConfigError::invalid(location, "command cannot be empty"));
                }
                Ok(AlertConfig::Shell(shell))
            }
            "twilio" => Ok(AlertConfig::Twilio(parse_fields(fields, location)?)),
            "gmail" => Ok(AlertConfig::Gmail(parse_fields(fields, location)?)),
            other => Err(ConfigError::UnknownKind {
                location: location.to_string(),
                kind: other.to_string(),
            }),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AlertConfig::Shell(_) => "shell",
            AlertConfig::Twilio(_) => "twilio",
            AlertConfig::Gmail(_) => "gmail",
        }
    }
}

// ── Helpers ────────────────────────────────────────────────────────

/// Split a `{kind: {...}}` entry into its known kinds, in canonical order.
fn split_entry<'a>(
    entry: &'a Map<String, Value>,
    kinds: &[&'static str],
    location: &str,
) -> ConfigResult<Vec<(&'static str, &'a Map<String, Value>)>> {
    if entry.is_empty() {
        return Err(ConfigError::EmptyEntry {
            location: location.to_string(),
        });
    }
    if let Some(unknown) = entry.keys().find(|key| !kinds.contains(&key.as_str())) {
        return Err(ConfigError::UnknownKind {
            location: location.to_string(),
            kind: unknown.clone(),
        });
    }

    let mut parts = Vec::new();
    for kind in kinds {
        if let Some(value) = entry.get(*kind) {
            let fields = value.as_object().ok_or_else(|| {
                ConfigError::invalid(format!("{location}.{kind}"), "expected a map of fields")
            })?;
            parts.push((*kind, fields));
        }
    }
    Ok(parts)
}

fn parse_fields<T: DeserializeOwned>(fields: &Map<String, Value>, location: &str) -> ConfigResult<T> {
    serde_json::from_value(Value::Object(fields.clone())).map_err(|source| ConfigError::Field {
        location: location.to_string(),
        source,
    })
}

fn default_down_message() -> String {
    DEFAULT_DOWN_MESSAGE.to_string()
}

fn default_up_message() -> String {
    DEFAULT_UP_MESSAGE.to_string()
}

fn default_alert_period_hours() -> f64 {
    DEFAULT_ALERT_PERIOD_HOURS
}

fn default_time_format() -> String {
    DEFAULT_TIME_FORMAT.to_string()
}

fn default_email_subject() -> String {
    DEFAULT_EMAIL_SUBJECT.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
tests:
  - shell:
      name: disk
      command: "test -w /var/tmp"
      timeout: 5
  - tcp:
      name: db
      host: 10.0.0.5
      port: 5432
      ignore_fail_count: 2
  - http:
      name: web
      url: https://example.com/healthz
      headers:
        Authorization: Bearer abc
      alert_period_hours: 0.5
      down_message: "$name ($url) is down"
alerts:
  - shell:
      command: "logger -t heartbeat '$message'"
  - twilio:
      account_sid: AC123
      auth_token: secret
      from_number: "+15550001"
      to_number: "+15550002"
  - gmail:
      gmail_password: hunter2
      sent_from: ops@example.com
      to: oncall@example.com
"#;

    #[test]
    fn test_parse_full() {
        let config = HeartbeatConfig::from_yaml_str(FULL).unwrap();
        assert_eq!(config.tests.len(), 3);
        assert_eq!(config.alerts.len(), 3);
        assert_eq!(config.time_format, DEFAULT_TIME_FORMAT);

        let disk = &config.tests[0];
        assert_eq!(disk.kind, ProbeKind::Shell { command: "test -w /var/tmp".to_string() });
        assert_eq!(disk.timeout, Some(Duration::from_secs(5)));

        let db = &config.tests[1];
        assert_eq!(db.ignore_fail_count, 2);
        assert_eq!(db.kind, ProbeKind::Tcp { host: "10.0.0.5".to_string(), port: 5432 });
        assert_eq!(db.timeout_or_default(), DEFAULT_PROBE_TIMEOUT);

        let web = &config.tests[2];
        assert_eq!(web.alert_period_secs(), 1800.0);
        assert_eq!(web.down_message, "$name ($url) is down");
        match &web.kind {
            ProbeKind::Http { url, headers } => {
                assert_eq!(url, "https://example.com/healthz");
                assert_eq!(headers.get("Authorization").map(String::as_str), Some("Bearer abc"));
            }
            other => panic!("expected http probe, got {other:?}"),
        }

        assert_eq!(config.alerts[0].label(), "shell");
        assert_eq!(config.alerts[1].label(), "twilio");
        match &config.alerts[2] {
            AlertConfig::Gmail(gmail) => assert_eq!(gmail.subject, DEFAULT_EMAIL_SUBJECT),
            other => panic!("expected gmail alert, got {other:?}"),
        }
    }

    #[test]
    fn test_defaults_fill_template_fields() {
        let config = HeartbeatConfig::from_yaml_str(
            "tests:\n  - shell:\n      name: x\n      command: \"true\"\n",
        )
        .unwrap();
        let probe = &config.tests[0];
        assert_eq!(probe.down_message, DEFAULT_DOWN_MESSAGE);
        assert_eq!(probe.up_message, DEFAULT_UP_MESSAGE);
        assert_eq!(probe.ignore_fail_count, 0);
        assert_eq!(probe.alert_period_hours, 1.0);
        assert_eq!(probe.fields["up_message"], Value::from(DEFAULT_UP_MESSAGE));
        assert_eq!(probe.fields["ignore_fail_count"], Value::from(0));
        assert!(config.alerts.is_empty());
    }

    #[test]
    fn test_identity_excludes_defaults() {
        let implicit = HeartbeatConfig::from_yaml_str(
            "tests:\n  - shell: {name: x, command: \"true\"}\n",
        )
        .unwrap();
        let reordered = HeartbeatConfig::from_yaml_str(
            "tests:\n  - shell: {command: \"true\", name: x}\n",
        )
        .unwrap();
        let explicit = HeartbeatConfig::from_yaml_str(
            "tests:\n  - shell: {name: x, command: \"true\", ignore_fail_count: 0}\n",
        )
        .unwrap();
        assert_eq!(implicit.tests[0].identity, reordered.tests[0].identity);
        assert_ne!(implicit.tests[0].identity, explicit.tests[0].identity);
    }

    #[test]
    fn test_extra_fields_kept_for_templates() {
        let config = HeartbeatConfig::from_yaml_str(
            "tests:\n  - tcp: {name: db, host: h, port: 1, owner: alice}\n",
        )
        .unwrap();
        assert_eq!(config.tests[0].fields["owner"], Value::from("alice"));
    }

    #[test]
    fn test_multi_kind_entry_yields_each_kind() {
        let config = HeartbeatConfig::from_yaml_str(
            "tests:\n  - http: {name: a, url: \"http://h/\"}\n    shell: {name: b, command: \"true\"}\n",
        )
        .unwrap();
        let kinds: Vec<_> = config.tests.iter().map(|t| t.kind.label()).collect();
        assert_eq!(kinds, vec!["shell", "http"]);
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let err = HeartbeatConfig::from_yaml_str("tests:\n  - ping: {name: x}\n").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownKind { ref kind, .. } if kind == "ping"));
        assert_eq!(err.to_string(), "tests[0]: unknown kind 'ping'");
    }

    #[test]
    fn test_missing_name_rejected() {
        let err =
            HeartbeatConfig::from_yaml_str("tests:\n  - shell: {command: \"true\"}\n").unwrap_err();
        assert!(matches!(err, ConfigError::Field { .. }));
        assert!(err.to_string().starts_with("tests[0].shell: missing field `name`"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let cases = [
            "tests:\n  - tcp: {name: x, host: h, port: 0}\n",
            "tests:\n  - http: {name: x, url: \"ftp://h\"}\n",
            "tests:\n  - shell: {name: x, command: \"\"}\n",
            "tests:\n  - shell: {name: \" \", command: \"true\"}\n",
            "tests:\n  - shell: {name: x, command: \"true\", alert_period_hours: 0}\n",
            "tests:\n  - shell: {name: x, command: \"true\", timeout: -1}\n",
            "tests:\n  - shell: {name: x, command: \"true\", ignore_fail_count: -1}\n",
            "tests: []\n",
            "tests:\n  - {}\n",
            "tests:\n  - shell: \"true\"\n",
        ];
        for case in cases {
            assert!(HeartbeatConfig::from_yaml_str(case).is_err(), "accepted: {case}");
        }
    }

    #[test]
    fn test_time_format_validated() {
        let ok = HeartbeatConfig::from_yaml_str(
            "time_format: \"%Y-%m-%d %H:%M:%S\"\ntests:\n  - shell: {name: x, command: \"true\"}\n",
        )
        .unwrap();
        assert_eq!(ok.time_format, "%Y-%m-%d %H:%M:%S");

        let err = HeartbeatConfig::from_yaml_str(
            "time_format: \"%Q\"\ntests:\n  - shell: {name: x, command: \"true\"}\n",
        )
        .unwrap_err();
        assert!(err.to_string().starts_with("time_format:"));
    }

    #[test]
    fn test_missing_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.yaml");
        let err = HeartbeatConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().contains("missing.yaml"));
    }

    #[test]
    fn test_malformed_yaml_is_parse_error() {
        let err = HeartbeatConfig::from_yaml_str("tests: [shell: {").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_secrets_redacted_in_debug() {
        let config = HeartbeatConfig::from_yaml_str(FULL).unwrap();
        let debug = format!("{:?}", config.alerts);
        assert!(!debug.contains("secret"));
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }
}
