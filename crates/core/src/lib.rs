//! Domain types shared by every signaldesk crate.
//!
//! Holds the job and step model reflected from the remote job record,
//! analysis request parameters, interpretation of final results, and
//! the collaborator traits ([`ports`]) that the synchronizer and the
//! screens are written against.

pub mod error;
pub mod job;
pub mod outcome;
pub mod ports;
pub mod request;
pub mod steps;
pub mod types;
