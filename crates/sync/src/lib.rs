//! Job status synchronization.
//!
//! [`JobSynchronizer`](synchronizer::JobSynchronizer) keeps a local
//! [`JobView`](view::JobView) in step with the remote job record. It
//! prefers a realtime change subscription, retries it with exponential
//! backoff, and falls back to fixed-interval polling when the feed keeps
//! failing.

pub mod backoff;
pub mod synchronizer;
pub mod view;

pub use backoff::SyncConfig;
pub use synchronizer::{wait_for_terminal, JobSynchronizer};
pub use view::{JobView, SyncPhase};
