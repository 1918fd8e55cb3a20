//! Remote job record as stored by the backend and mutated by the
//! workflow engine.
//!
//! The record is read-only from this side. Status strings the client
//! does not recognise are folded into the non-terminal `pending` state
//! so that a newer engine cannot stop tracking by accident.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// Status values
// ---------------------------------------------------------------------------

/// Overall lifecycle status of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum JobStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl JobStatus {
    /// `completed` and `failed` end tracking.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::InProgress => "in_progress",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl From<String> for JobStatus {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "in_progress" | "running" | "processing" => JobStatus::InProgress,
            "completed" => JobStatus::Completed,
            "failed" => JobStatus::Failed,
            _ => JobStatus::Pending,
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a single pipeline step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum StepStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl StepStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            StepStatus::Pending => "pending",
            StepStatus::InProgress => "in_progress",
            StepStatus::Completed => "completed",
            StepStatus::Failed => "failed",
        }
    }
}

impl From<String> for StepStatus {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "in_progress" | "running" | "processing" => StepStatus::InProgress,
            "completed" | "done" => StepStatus::Completed,
            "failed" | "error" => StepStatus::Failed,
            _ => StepStatus::Pending,
        }
    }
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// JobRecord
// ---------------------------------------------------------------------------

/// Status entry for one step inside `steps_status`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteStep {
    #[serde(default)]
    pub status: StepStatus,
    #[serde(default)]
    pub message: Option<String>,
}

/// The authoritative job row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    #[serde(default)]
    pub overall_status: JobStatus,
    /// Step id -> status. `null` in the row is read as an empty map.
    #[serde(default, deserialize_with = "null_as_default")]
    pub steps_status: HashMap<String, RemoteStep>,
    /// Final analysis document, present once the engine finishes.
    #[serde(default)]
    pub final_result: Option<serde_json::Value>,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl JobRecord {
    pub fn is_terminal(&self) -> bool {
        self.overall_status.is_terminal()
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_record() {
        let json = r#"{
            "overall_status": "in_progress",
            "steps_status": {
                "security_check": {"status": "completed", "message": "ok"},
                "data_retrieval": {"status": "in_progress"}
            },
            "final_result": null,
            "error_message": null
        }"#;
        let record: JobRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.overall_status, JobStatus::InProgress);
        assert_eq!(record.steps_status.len(), 2);
        assert_eq!(
            record.steps_status["security_check"].message.as_deref(),
            Some("ok")
        );
        assert_eq!(
            record.steps_status["data_retrieval"].status,
            StepStatus::InProgress
        );
        assert!(record.final_result.is_none());
        assert!(!record.is_terminal());
    }

    #[test]
    fn null_steps_status_is_empty() {
        let record: JobRecord =
            serde_json::from_str(r#"{"overall_status":"pending","steps_status":null}"#).unwrap();
        assert!(record.steps_status.is_empty());
    }

    #[test]
    fn unknown_status_is_pending() {
        let record: JobRecord =
            serde_json::from_str(r#"{"overall_status":"queued_somewhere"}"#).unwrap();
        assert_eq!(record.overall_status, JobStatus::Pending);
        assert!(!record.is_terminal());
    }

    #[test]
    fn terminal_statuses() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::InProgress.is_terminal());
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&JobStatus::InProgress).unwrap();
        assert_eq!(json, r#""in_progress""#);
    }
}
