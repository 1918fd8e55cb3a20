//! The fixed analysis pipeline steps and the merge of remote step
//! statuses into local display state.

use std::collections::HashMap;

use serde::Serialize;

use crate::job::{RemoteStep, StepStatus};

// ---------------------------------------------------------------------------
// Step identifiers
// ---------------------------------------------------------------------------

pub const STEP_SECURITY_CHECK: &str = "security_check";
pub const STEP_DATA_RETRIEVAL: &str = "data_retrieval";
pub const STEP_ANALYSIS: &str = "analysis";
pub const STEP_SIGNAL_GENERATION: &str = "signal_generation";
pub const STEP_FINALIZATION: &str = "finalization";

/// Step ids and display labels, in pipeline order.
pub const PIPELINE_STEPS: &[(&str, &str)] = &[
    (STEP_SECURITY_CHECK, "Security check"),
    (STEP_DATA_RETRIEVAL, "Market data retrieval"),
    (STEP_ANALYSIS, "Technical analysis"),
    (STEP_SIGNAL_GENERATION, "Signal generation"),
    (STEP_FINALIZATION, "Finalization"),
];

// ---------------------------------------------------------------------------
// Step
// ---------------------------------------------------------------------------

/// Locally tracked state of one pipeline step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Step {
    pub id: &'static str,
    pub label: &'static str,
    pub status: StepStatus,
    pub message: Option<String>,
}

/// The step list in its initial state: every step pending, no message.
pub fn initial_steps() -> Vec<Step> {
    PIPELINE_STEPS
        .iter()
        .map(|&(id, label)| Step {
            id,
            label,
            status: StepStatus::Pending,
            message: None,
        })
        .collect()
}

/// Reflect a remote `steps_status` map onto the local step list.
///
/// Steps present in `remote` take the remote status and message; steps
/// absent from `remote` are returned unchanged. Remote entries with no
/// matching local step are ignored. Order always follows `local`.
pub fn merge_steps(local: &[Step], remote: &HashMap<String, RemoteStep>) -> Vec<Step> {
    local
        .iter()
        .map(|step| match remote.get(step.id) {
            Some(entry) => Step {
                status: entry.status,
                message: entry.message.clone(),
                ..step.clone()
            },
            None => step.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote(entries: &[(&str, StepStatus, Option<&str>)]) -> HashMap<String, RemoteStep> {
        entries
            .iter()
            .map(|(id, status, message)| {
                (
                    id.to_string(),
                    RemoteStep {
                        status: *status,
                        message: message.map(str::to_string),
                    },
                )
            })
            .collect()
    }

    #[test]
    fn initial_steps_are_pending_in_order() {
        let steps = initial_steps();
        let ids: Vec<_> = steps.iter().map(|s| s.id).collect();
        assert_eq!(
            ids,
            vec![
                STEP_SECURITY_CHECK,
                STEP_DATA_RETRIEVAL,
                STEP_ANALYSIS,
                STEP_SIGNAL_GENERATION,
                STEP_FINALIZATION
            ]
        );
        assert!(steps.iter().all(|s| s.status == StepStatus::Pending));
        assert!(steps.iter().all(|s| s.message.is_none()));
    }

    #[test]
    fn merge_updates_matching_steps_only() {
        let local = initial_steps();
        let update = remote(&[
            (STEP_SECURITY_CHECK, StepStatus::Completed, Some("token ok")),
            (STEP_DATA_RETRIEVAL, StepStatus::InProgress, None),
        ]);

        let merged = merge_steps(&local, &update);

        assert_eq!(merged[0].status, StepStatus::Completed);
        assert_eq!(merged[0].message.as_deref(), Some("token ok"));
        assert_eq!(merged[1].status, StepStatus::InProgress);
        assert_eq!(merged[2], local[2]);
        assert_eq!(merged[4], local[4]);
    }

    #[test]
    fn merge_ignores_unknown_remote_steps() {
        let local = initial_steps();
        let update = remote(&[("backtest", StepStatus::Failed, Some("nope"))]);
        assert_eq!(merge_steps(&local, &update), local);
    }

    #[test]
    fn merge_does_not_touch_input() {
        let local = initial_steps();
        let update = remote(&[(STEP_ANALYSIS, StepStatus::Failed, Some("no data"))]);
        let merged = merge_steps(&local, &update);
        assert_eq!(local[2].status, StepStatus::Pending);
        assert_eq!(merged[2].status, StepStatus::Failed);
    }

    #[test]
    fn merge_replaces_message_with_remote_value() {
        let mut local = initial_steps();
        local[0].message = Some("stale".into());
        let update = remote(&[(STEP_SECURITY_CHECK, StepStatus::Completed, None)]);
        let merged = merge_steps(&local, &update);
        assert!(merged[0].message.is_none());
    }
}
