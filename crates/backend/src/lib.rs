//! Clients for the backend-as-a-service.
//!
//! - [`auth`]: password sessions and token refresh.
//! - [`rest`]: point reads of job rows.
//! - [`realtime`]: change notifications for a single job row over the
//!   realtime WebSocket.
//! - [`http`]: response helpers, also used by the webhook client.

pub mod auth;
pub mod config;
pub mod http;
pub mod realtime;
pub mod rest;

pub use auth::{AuthClient, StaticToken};
pub use config::BackendConfig;
pub use realtime::RealtimeFeed;
pub use rest::RestJobStore;
