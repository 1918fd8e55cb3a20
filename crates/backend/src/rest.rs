//! Point reads of job rows through the backend REST API.

use std::sync::Arc;

use async_trait::async_trait;
use signaldesk_core::job::JobRecord;
use signaldesk_core::ports::{JobStore, SessionProvider, StoreError};

use crate::auth::bearer_or_anon;
use crate::config::BackendConfig;
use crate::http::ensure_success;

/// Columns read for status tracking.
const JOB_COLUMNS: &str = "overall_status,steps_status,final_result,error_message";

/// [`JobStore`] backed by `GET /rest/v1/{table}?id=eq.{id}`.
pub struct RestJobStore {
    client: reqwest::Client,
    config: Arc<BackendConfig>,
    session: Arc<dyn SessionProvider>,
}

impl RestJobStore {
    pub fn new(
        client: reqwest::Client,
        config: Arc<BackendConfig>,
        session: Arc<dyn SessionProvider>,
    ) -> Self {
        Self {
            client,
            config,
            session,
        }
    }
}

#[async_trait]
impl JobStore for RestJobStore {
    async fn fetch_job(&self, job_id: &str) -> Result<JobRecord, StoreError> {
        let token = bearer_or_anon(self.session.as_ref(), &self.config)
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        let response = self
            .client
            .get(self.config.rest_url(&self.config.jobs_table))
            .query(&[("id", format!("eq.{job_id}").as_str()), ("select", JOB_COLUMNS)])
            .header("apikey", &self.config.anon_key)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        let response = ensure_success(response)
            .await
            .map_err(|(status, body)| StoreError::Api { status, body })?;

        let rows = response
            .json::<Vec<JobRecord>>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;

        tracing::trace!(job_id, rows = rows.len(), "Fetched job row");

        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::NotFound(job_id.to_string()))
    }
}
