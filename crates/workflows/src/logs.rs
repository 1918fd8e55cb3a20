//! Entries of the job history returned by the logs webhook.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use signaldesk_core::job::JobStatus;
use signaldesk_core::types::Timestamp;

/// One past analysis job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobSummary {
    pub id: String,
    pub pair: Option<String>,
    pub style: Option<String>,
    pub status: Option<JobStatus>,
    pub created_at: Option<Timestamp>,
    /// The entry as received.
    pub raw: Value,
}

impl JobSummary {
    /// Build a summary from one array entry. Entries without an id are
    /// skipped.
    pub fn from_value(value: Value) -> Option<Self> {
        let id = match value.get("id").or_else(|| value.get("job_id")) {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => return None,
        };
        let text = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_string);

        Some(Self {
            id,
            pair: text("pair"),
            style: text("style"),
            status: text("overall_status")
                .or_else(|| text("status"))
                .map(JobStatus::from),
            created_at: text("created_at")
                .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
                .map(|dt| dt.with_timezone(&Utc)),
            raw: value,
        })
    }
}

/// Sort newest first. Entries without a timestamp go last, in their
/// original order.
pub fn sort_newest_first(entries: &mut [JobSummary]) {
    entries.sort_by(|a, b| match (a.created_at, b.created_at) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}
