//! Change notifications for job rows over the realtime WebSocket.

pub mod client;
pub mod feed;
pub mod messages;

pub use feed::{RealtimeFeed, RealtimeSubscription};
