//! Collaborator traits.
//!
//! The synchronizer and the screens only see these traits. The
//! backend crate provides the network implementations; tests provide
//! in-memory fakes.

use async_trait::async_trait;

use crate::job::JobRecord;

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

/// Errors from the auth collaborator.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthError {
    /// No session is available; the user must sign in.
    #[error("Not authenticated")]
    NotAuthenticated,

    /// The auth endpoint refused the credentials or refresh token.
    #[error("Authentication rejected ({status}): {body}")]
    Rejected { status: u16, body: String },

    /// The request could not be completed.
    #[error("Auth request failed: {0}")]
    Transport(String),
}

/// Source of the current session's access token.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Access token of the current session, refreshed if needed.
    async fn access_token(&self) -> Result<String, AuthError>;
}

// ---------------------------------------------------------------------------
// Job store
// ---------------------------------------------------------------------------

/// Errors from reading a job record.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("Job {0} not found")]
    NotFound(String),

    #[error("Job store error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Job store request failed: {0}")]
    Transport(String),

    #[error("Malformed job record: {0}")]
    Decode(String),
}

/// Point reads of the job record.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn fetch_job(&self, job_id: &str) -> Result<JobRecord, StoreError>;
}

// ---------------------------------------------------------------------------
// Change feed
// ---------------------------------------------------------------------------

/// Errors raised while opening a subscription.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FeedError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Protocol error: {0}")]
    Protocol(String),
}

/// One notification delivered on a subscription.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    /// The server acknowledged the subscription.
    Subscribed,
    /// The watched record changed; carries the new row.
    Changed(JobRecord),
    /// The channel failed. No further events follow.
    Error(String),
}

/// An open subscription scoped to one job id.
#[async_trait]
pub trait JobSubscription: Send {
    /// Next event, or `None` once the channel is closed.
    async fn next_event(&mut self) -> Option<FeedEvent>;

    /// Close the subscription and release its connection.
    async fn unsubscribe(self: Box<Self>);
}

/// Push-based change notification for job records.
#[async_trait]
pub trait ChangeFeed: Send + Sync {
    async fn subscribe(&self, job_id: &str) -> Result<Box<dyn JobSubscription>, FeedError>;
}
