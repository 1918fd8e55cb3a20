/// Opaque identifier assigned to a job by the trigger webhook.
pub type JobId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
