//! Submit an analysis request and follow the resulting job.

use std::sync::Arc;

use signaldesk_core::ports::SessionProvider;
use signaldesk_core::request::AnalysisRequest;
use signaldesk_core::types::JobId;
use signaldesk_sync::{JobSynchronizer, JobView};
use signaldesk_workflows::{WorkflowApi, WorkflowError};
use tokio::sync::watch;

pub struct AnalysisScreen {
    workflows: Arc<WorkflowApi>,
    session: Arc<dyn SessionProvider>,
    sync: JobSynchronizer,
    error: Option<String>,
}

impl AnalysisScreen {
    pub fn new(
        workflows: Arc<WorkflowApi>,
        session: Arc<dyn SessionProvider>,
        sync: JobSynchronizer,
    ) -> Self {
        Self {
            workflows,
            session,
            sync,
            error: None,
        }
    }

    /// Trigger an analysis and start tracking the returned job.
    ///
    /// Any job tracked so far is dropped first. When the trigger fails
    /// the error is kept for display and nothing is tracked.
    pub async fn submit(&mut self, request: &AnalysisRequest) -> Result<JobId, WorkflowError> {
        self.error = None;
        self.sync.reset();

        match self
            .workflows
            .trigger_analysis(request, self.session.as_ref())
            .await
        {
            Ok(job_id) => {
                self.sync.start(job_id.clone());
                Ok(job_id)
            }
            Err(e) => {
                tracing::warn!(pair = %request.pair, error = %e, "Analysis trigger failed");
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Stop tracking and clear the view.
    pub fn cancel(&mut self) {
        self.sync.reset();
    }

    pub fn watch(&self) -> watch::Receiver<JobView> {
        self.sync.watch()
    }

    pub fn view(&self) -> JobView {
        self.sync.view()
    }

    pub fn tracked_job(&self) -> Option<&str> {
        self.sync.job_id()
    }

    /// Error from the last submission, if it failed.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Stop tracking and wait for the run to exit.
    pub async fn close(mut self) {
        self.sync.shutdown().await;
    }
}
