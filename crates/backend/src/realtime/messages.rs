//! Realtime channel message types and parser.
//!
//! The realtime service speaks the Phoenix channel protocol: every
//! frame is JSON with `topic`, `event`, `payload` and `ref`. This
//! module builds the outgoing frames the client needs and classifies
//! incoming frames into [`ChannelMessage`] variants.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use signaldesk_core::job::JobRecord;

/// Topic used for socket-level heartbeats.
pub const PHOENIX_TOPIC: &str = "phoenix";

pub const EVENT_JOIN: &str = "phx_join";
pub const EVENT_LEAVE: &str = "phx_leave";
pub const EVENT_REPLY: &str = "phx_reply";
pub const EVENT_ERROR: &str = "phx_error";
pub const EVENT_CLOSE: &str = "phx_close";
pub const EVENT_HEARTBEAT: &str = "heartbeat";
pub const EVENT_SYSTEM: &str = "system";
pub const EVENT_POSTGRES_CHANGES: &str = "postgres_changes";

// ---------------------------------------------------------------------------
// Frames
// ---------------------------------------------------------------------------

/// A raw channel frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    pub topic: String,
    pub event: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(rename = "ref", default)]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_ref: Option<String>,
}

/// Channel topic for one job's change stream.
pub fn job_topic(job_id: &str) -> String {
    format!("realtime:job-{job_id}")
}

/// Join a topic with an UPDATE filter on a single row.
pub fn join_frame(
    topic: &str,
    table: &str,
    job_id: &str,
    access_token: &str,
    join_ref: &str,
) -> Frame {
    Frame {
        topic: topic.to_string(),
        event: EVENT_JOIN.to_string(),
        payload: serde_json::json!({
            "config": {
                "broadcast": { "self": false },
                "presence": { "key": "" },
                "postgres_changes": [{
                    "event": "UPDATE",
                    "schema": "public",
                    "table": table,
                    "filter": format!("id=eq.{job_id}"),
                }],
            },
            "access_token": access_token,
        }),
        reference: Some(join_ref.to_string()),
        join_ref: Some(join_ref.to_string()),
    }
}

pub fn leave_frame(topic: &str, reference: &str, join_ref: &str) -> Frame {
    Frame {
        topic: topic.to_string(),
        event: EVENT_LEAVE.to_string(),
        payload: serde_json::json!({}),
        reference: Some(reference.to_string()),
        join_ref: Some(join_ref.to_string()),
    }
}

pub fn heartbeat_frame(reference: &str) -> Frame {
    Frame {
        topic: PHOENIX_TOPIC.to_string(),
        event: EVENT_HEARTBEAT.to_string(),
        payload: serde_json::json!({}),
        reference: Some(reference.to_string()),
        join_ref: None,
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// What an incoming frame means for a joined channel.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelMessage {
    /// Reply to our join: accepted.
    Joined,
    /// Reply to our join: refused, with the server's reason.
    JoinRefused(String),
    /// The watched row changed.
    RowChanged(JobRecord),
    /// The server reported a channel or extension failure.
    ChannelError(String),
    /// The server closed the channel.
    Closed,
    /// Heartbeat replies, system ok notices, other topics.
    Ignored,
}

/// Parse a text frame.
pub fn parse_frame(text: &str) -> Result<Frame, serde_json::Error> {
    serde_json::from_str(text)
}

/// Classify a frame received on a socket carrying one joined `topic`.
pub fn classify(frame: &Frame, topic: &str, join_ref: &str) -> ChannelMessage {
    if frame.topic != topic {
        return ChannelMessage::Ignored;
    }

    match frame.event.as_str() {
        EVENT_REPLY if frame.reference.as_deref() == Some(join_ref) => {
            let status = frame.payload.get("status").and_then(Value::as_str);
            if status == Some("ok") {
                ChannelMessage::Joined
            } else {
                ChannelMessage::JoinRefused(reason(&frame.payload))
            }
        }
        EVENT_POSTGRES_CHANGES => {
            let record = frame
                .payload
                .get("data")
                .and_then(|data| data.get("record"))
                .cloned()
                .map(serde_json::from_value::<JobRecord>);
            match record {
                Some(Ok(record)) => ChannelMessage::RowChanged(record),
                Some(Err(e)) => {
                    tracing::warn!(topic, error = %e, "Malformed change record");
                    ChannelMessage::Ignored
                }
                None => ChannelMessage::Ignored,
            }
        }
        EVENT_SYSTEM => {
            let status = frame.payload.get("status").and_then(Value::as_str);
            if status == Some("error") {
                ChannelMessage::ChannelError(reason(&frame.payload))
            } else {
                ChannelMessage::Ignored
            }
        }
        EVENT_ERROR => ChannelMessage::ChannelError(reason(&frame.payload)),
        EVENT_CLOSE => ChannelMessage::Closed,
        _ => ChannelMessage::Ignored,
    }
}

/// Whether `frame` answers the heartbeat sent with `reference`.
pub fn is_heartbeat_reply(frame: &Frame, reference: &str) -> bool {
    frame.topic == PHOENIX_TOPIC
        && frame.event == EVENT_REPLY
        && frame.reference.as_deref() == Some(reference)
}

/// Best-effort human-readable reason from a reply or system payload.
fn reason(payload: &Value) -> String {
    payload
        .pointer("/response/reason")
        .or_else(|| payload.get("message"))
        .or_else(|| payload.get("reason"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| "unknown channel error".to_string())
}
