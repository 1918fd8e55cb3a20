//! HTTP clients for the hosted workflow automations.
//!
//! Analysis runs, chat answers and job history all live behind
//! webhooks. [`WorkflowApi`](api::WorkflowApi) wraps them with typed
//! requests and responses.

pub mod api;
pub mod logs;

pub use api::{ChatReply, WorkflowApi, WorkflowEndpoints, WorkflowError};
pub use logs::JobSummary;
