//! Persisted per-probe state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{StateError, StateResult};

/// Up/down label of a probe. Absent (`null`) means the probe has never
/// crossed a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStatus {
    Passing,
    Failing,
}

impl ProbeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeStatus::Passing => "passing",
            ProbeStatus::Failing => "failing",
        }
    }
}

/// History of one probe across invocations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProbeState {
    #[serde(default)]
    pub state: Option<ProbeStatus>,
    /// Consecutive failures since the last pass; see [`ProbeState::fail_count`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_pass_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_pass_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_fail_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_fail_time: Option<String>,
    /// Unix timestamp (seconds) of the last down-alert; 0 when none is pending.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_fail_alert_time: Option<f64>,
    /// Copy of the configured name, refreshed every run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Keys this version does not know about, preserved verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ProbeState {
    pub fn is_passing(&self) -> bool {
        self.state == Some(ProbeStatus::Passing)
    }

    pub fn is_failing(&self) -> bool {
        self.state == Some(ProbeStatus::Failing)
    }

    /// Failure count, 0 when never recorded.
    pub fn fail_count(&self) -> u32 {
        self.fail_count.unwrap_or(0)
    }

    /// Epoch of the last down-alert, 0 when never recorded.
    pub fn last_fail_alert_time(&self) -> f64 {
        self.last_fail_alert_time.unwrap_or(0.0)
    }

    /// All fields that have been set, as a JSON object keyed by their
    /// persisted names.
    pub fn to_fields(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(mut map)) => {
                map.retain(|_, value| !value.is_null());
                map
            }
            _ => Map::new(),
        }
    }

    /// Look up a field by its persisted name. `None` when it was never set.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.to_fields().remove(key)
    }

    /// Assign a field by its persisted name.
    ///
    /// Known fields keep their types: assigning a string to `fail_count`
    /// fails and leaves the state untouched.
    pub fn set(&mut self, key: &str, value: Value) -> StateResult<()> {
        let mut fields = self.to_fields();
        fields.insert(key.to_string(), value);
        *self = serde_json::from_value(Value::Object(fields))
            .map_err(|e| StateError::Deserialize(format!("{key}: {e}")))?;
        Ok(())
    }
}
