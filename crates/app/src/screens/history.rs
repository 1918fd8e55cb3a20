//! Past analysis jobs of the signed-in user.

use std::sync::Arc;

use signaldesk_core::ports::SessionProvider;
use signaldesk_workflows::logs::sort_newest_first;
use signaldesk_workflows::{JobSummary, WorkflowApi, WorkflowError};

pub struct HistoryScreen {
    workflows: Arc<WorkflowApi>,
    session: Arc<dyn SessionProvider>,
    entries: Vec<JobSummary>,
}

impl HistoryScreen {
    pub fn new(workflows: Arc<WorkflowApi>, session: Arc<dyn SessionProvider>) -> Self {
        Self {
            workflows,
            session,
            entries: Vec::new(),
        }
    }

    /// Reload the history, newest first. On failure the previous entries
    /// are kept.
    pub async fn refresh(&mut self) -> Result<&[JobSummary], WorkflowError> {
        let mut entries = self.workflows.fetch_logs(self.session.as_ref()).await?;
        sort_newest_first(&mut entries);
        self.entries = entries;
        Ok(&self.entries)
    }

    pub fn entries(&self) -> &[JobSummary] {
        &self.entries
    }
}
