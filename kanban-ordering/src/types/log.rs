//! Log entry types for activity tracking

use super::ids::LogEntryId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A log entry recording one executed command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// Unique ID for this log entry
    pub id: LogEntryId,

    /// When the command ran
    pub timestamp: DateTime<Utc>,

    /// Canonical op string (e.g., "move item")
    pub op: String,

    /// The normalized input parameters
    pub input: Value,

    /// The result (or error)
    pub output: Value,

    /// How long the command took
    pub duration_ms: u64,

    /// Who issued the command, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
}

impl LogEntry {
    /// Create a log entry for a successful command
    pub fn success(op: impl Into<String>, input: Value, output: Value, duration_ms: u64) -> Self {
        Self {
            id: LogEntryId::new(),
            timestamp: Utc::now(),
            op: op.into(),
            input,
            output,
            duration_ms,
            actor: None,
        }
    }

    /// Attribute this entry to an actor
    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    /// Create a log entry for a failed command
    pub fn failure(op: impl Into<String>, input: Value, error: &str, duration_ms: u64) -> Self {
        Self::success(op, input, serde_json::json!({ "error": error }), duration_ms)
    }

    /// Whether this entry records a failure
    pub fn is_failure(&self) -> bool {
        self.output.get("error").is_some()
    }
}
