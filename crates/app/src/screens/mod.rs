//! One screen per user-facing feature.

pub mod analysis;
pub mod chat;
pub mod history;

pub use analysis::AnalysisScreen;
pub use chat::{ChatEntry, ChatRole, ChatScreen};
pub use history::HistoryScreen;
