//! Local display state published by the synchronizer.

use serde::Serialize;
use signaldesk_core::job::{JobRecord, JobStatus};
use signaldesk_core::steps::{initial_steps, merge_steps, Step};
use signaldesk_core::types::JobId;

/// Where the synchronizer currently is in its state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", content = "status", rename_all = "snake_case")]
pub enum SyncPhase {
    NoJob,
    Checking,
    Subscribing,
    Subscribed,
    Polling,
    Terminal(JobStatus),
}

impl SyncPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, SyncPhase::Terminal(_))
    }
}

/// Snapshot of everything the screen needs to render one job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobView {
    pub job_id: Option<JobId>,
    pub phase: SyncPhase,
    pub status: Option<JobStatus>,
    pub steps: Vec<Step>,
    pub final_result: Option<serde_json::Value>,
    /// Error reported by the workflow engine.
    pub error_message: Option<String>,
    /// Transient local problem (fetch failure, feed retry) shown inline.
    pub notice: Option<String>,
    /// Subscription retries since the last acknowledgment.
    pub subscribe_retries: u32,
    /// Run generation that owns this view. Writes from older runs are
    /// discarded.
    #[serde(skip)]
    pub(crate) generation: u64,
}

impl Default for JobView {
    fn default() -> Self {
        Self {
            job_id: None,
            phase: SyncPhase::NoJob,
            status: None,
            steps: initial_steps(),
            final_result: None,
            error_message: None,
            notice: None,
            subscribe_retries: 0,
            generation: 0,
        }
    }
}

impl JobView {
    pub(crate) fn started(job_id: JobId, generation: u64) -> Self {
        Self {
            job_id: Some(job_id),
            phase: SyncPhase::Checking,
            generation,
            ..Default::default()
        }
    }

    pub(crate) fn cleared(generation: u64) -> Self {
        Self {
            generation,
            ..Default::default()
        }
    }

    /// Reflect a remote record. Moves to `Terminal` on a terminal status.
    pub(crate) fn apply_record(&mut self, record: &JobRecord) {
        self.status = Some(record.overall_status);
        self.error_message = record.error_message.clone();
        self.steps = merge_steps(&self.steps, &record.steps_status);
        if record.final_result.is_some() {
            self.final_result = record.final_result.clone();
        }
        self.notice = None;
        if record.is_terminal() {
            self.phase = SyncPhase::Terminal(record.overall_status);
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use signaldesk_core::job::{RemoteStep, StepStatus};
    use signaldesk_core::steps::STEP_ANALYSIS;

    use super::*;

    #[test]
    fn apply_in_progress_record() {
        let mut view = JobView::started("job-1".into(), 1);
        view.notice = Some("fetch failed".into());

        let mut steps = HashMap::new();
        steps.insert(
            STEP_ANALYSIS.to_string(),
            RemoteStep {
                status: StepStatus::InProgress,
                message: Some("RSI divergence".into()),
            },
        );
        let record = JobRecord {
            overall_status: JobStatus::InProgress,
            steps_status: steps,
            ..Default::default()
        };

        view.apply_record(&record);

        assert_eq!(view.phase, SyncPhase::Checking);
        assert_eq!(view.status, Some(JobStatus::InProgress));
        assert_eq!(view.steps[2].status, StepStatus::InProgress);
        assert!(view.notice.is_none());
    }

    #[test]
    fn apply_failed_record_is_terminal() {
        let mut view = JobView::started("job-1".into(), 1);
        let record = JobRecord {
            overall_status: JobStatus::Failed,
            error_message: Some("market closed".into()),
            ..Default::default()
        };
        view.apply_record(&record);
        assert_eq!(view.phase, SyncPhase::Terminal(JobStatus::Failed));
        assert_eq!(view.error_message.as_deref(), Some("market closed"));
    }

    #[test]
    fn missing_final_result_keeps_previous() {
        let mut view = JobView::started("job-1".into(), 1);
        view.final_result = Some(serde_json::json!({"partial": true}));
        view.apply_record(&JobRecord::default());
        assert!(view.final_result.is_some());
    }
}
