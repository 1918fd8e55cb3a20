//! Plain-text rendering of screen state.
//!
//! Every function here is total: whatever shape the remote documents
//! take, rendering produces text and never panics.

use std::fmt::Write as _;

use serde_json::Value;
use signaldesk_core::job::{JobStatus, StepStatus};
use signaldesk_core::outcome::{AnalysisOutcome, TradeSignal};
use signaldesk_sync::{JobView, SyncPhase};
use signaldesk_workflows::JobSummary;

use crate::screens::{ChatEntry, ChatRole};

fn phase_label(phase: SyncPhase) -> &'static str {
    match phase {
        SyncPhase::NoJob => "idle",
        SyncPhase::Checking => "checking",
        SyncPhase::Subscribing => "subscribing",
        SyncPhase::Subscribed => "live",
        SyncPhase::Polling => "polling",
        SyncPhase::Terminal(JobStatus::Failed) => "failed",
        SyncPhase::Terminal(_) => "done",
    }
}

fn step_marker(status: StepStatus) -> &'static str {
    match status {
        StepStatus::Pending => "[ ]",
        StepStatus::InProgress => "[~]",
        StepStatus::Completed => "[x]",
        StepStatus::Failed => "[!]",
    }
}

/// Header, step list and any notice for the tracked job.
pub fn render_progress(view: &JobView) -> String {
    let mut out = String::new();
    let Some(job_id) = &view.job_id else {
        out.push_str("No analysis in progress.");
        return out;
    };

    let status = view.status.map(|s| s.as_str()).unwrap_or("unknown");
    let _ = writeln!(out, "Job {job_id}: {status} ({})", phase_label(view.phase));
    for step in &view.steps {
        let _ = write!(out, "  {} {}", step_marker(step.status), step.label);
        if let Some(message) = step.message.as_deref().filter(|m| !m.is_empty()) {
            let _ = write!(out, ": {message}");
        }
        out.push('\n');
    }
    if let Some(notice) = &view.notice {
        let _ = writeln!(out, "  note: {notice}");
    }
    if let Some(error) = &view.error_message {
        let _ = writeln!(out, "  error: {error}");
    }
    out.truncate(out.trim_end().len());
    out
}

/// Final verdict of a terminal job.
pub fn render_outcome(view: &JobView) -> String {
    if view.status == Some(JobStatus::Failed) {
        let reason = view.error_message.as_deref().unwrap_or("no reason given");
        return format!("Analysis failed: {reason}");
    }

    match &view.final_result {
        None | Some(Value::Null) => "Analysis finished without a result.".to_string(),
        Some(result) => match AnalysisOutcome::from_result(result) {
            AnalysisOutcome::Signal { signal, commentary } => {
                let mut out = render_signal(&signal);
                if let Some(commentary) = commentary {
                    let _ = write!(out, "\n\n{commentary}");
                }
                out
            }
            AnalysisOutcome::NoSignal { reason } => match reason {
                Some(reason) => format!("No signal: {reason}"),
                None => "No signal.".to_string(),
            },
            AnalysisOutcome::Unrecognized { raw } => {
                let body = serde_json::to_string_pretty(&raw).unwrap_or_else(|_| raw.to_string());
                format!("Result:\n{body}")
            }
        },
    }
}

fn render_signal(signal: &TradeSignal) -> String {
    let mut out = format!("Signal: {}", signal.direction.as_str());
    if let Some(entry) = signal.entry {
        let _ = write!(out, "\n  entry:       {entry}");
    }
    if let Some(stop) = signal.stop_loss {
        let _ = write!(out, "\n  stop loss:   {stop}");
    }
    if !signal.take_profit.is_empty() {
        let targets: Vec<String> = signal.take_profit.iter().map(f64::to_string).collect();
        let _ = write!(out, "\n  take profit: {}", targets.join(", "));
    }
    if let Some(confidence) = signal.confidence {
        let _ = write!(out, "\n  confidence:  {confidence}%");
    }
    out
}

pub fn render_chat(transcript: &[ChatEntry]) -> String {
    transcript
        .iter()
        .map(|entry| match entry.role {
            ChatRole::User => format!("> {}", entry.text),
            ChatRole::Assistant => entry.text.clone(),
            ChatRole::Error => format!("(error) {}", entry.text),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_history(entries: &[JobSummary]) -> String {
    if entries.is_empty() {
        return "No past analyses.".to_string();
    }
    entries
        .iter()
        .map(|entry| {
            let when = entry
                .created_at
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "----------------".to_string());
            let status = entry.status.map(|s| s.as_str()).unwrap_or("-");
            format!(
                "{when}  {:<10} {:<10} {:<12} {}",
                entry.pair.as_deref().unwrap_or("-"),
                entry.style.as_deref().unwrap_or("-"),
                status,
                entry.id,
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
