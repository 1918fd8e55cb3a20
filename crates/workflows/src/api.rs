//! Webhook client for the analysis, chat and logs workflows.
//!
//! Each call is a single `POST` with a JSON body. There is no retry at
//! this layer; failures go straight back to the caller.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use signaldesk_backend::http::ensure_success;
use signaldesk_core::ports::{AuthError, SessionProvider};
use signaldesk_core::request::AnalysisRequest;
use signaldesk_core::types::JobId;

use crate::logs::JobSummary;

/// Webhook URLs for one deployment of the workflows.
#[derive(Debug, Clone)]
pub struct WorkflowEndpoints {
    pub trigger_url: String,
    pub chat_url: String,
    pub logs_url: String,
}

/// HTTP client for the workflow webhooks.
pub struct WorkflowApi {
    client: reqwest::Client,
    endpoints: WorkflowEndpoints,
}

/// Errors from the workflow webhook layer.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// No access token could be obtained.
    #[error("Authentication required: {0}")]
    Auth(#[from] AuthError),

    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The webhook returned a non-2xx status code.
    #[error("Webhook error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The response did not carry an expected field.
    #[error("Malformed webhook response: missing {0}")]
    MissingField(&'static str),

    /// The response body was not the expected JSON shape.
    #[error("Malformed webhook response: {0}")]
    Format(String),

    /// The request was rejected locally before sending.
    #[error("Invalid request: {0}")]
    InvalidInput(String),
}

/// Body sent to the trigger webhook.
#[derive(Debug, Serialize)]
struct TriggerBody<'a> {
    #[serde(flatten)]
    request: &'a AnalysisRequest,
    /// Submission time, RFC 3339 UTC.
    time: String,
    #[serde(rename = "accessToken")]
    access_token: &'a str,
}

/// Reply of the chat webhook.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    /// The assistant's answer.
    pub analysis: String,
    /// Any other fields returned alongside it.
    pub extra: serde_json::Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct TriggerResponse {
    #[serde(rename = "jobId", default)]
    job_id: Option<Value>,
}

impl WorkflowApi {
    pub fn new(client: reqwest::Client, endpoints: WorkflowEndpoints) -> Self {
        Self { client, endpoints }
    }

    /// Submit an analysis request and return the job id to track.
    pub async fn trigger_analysis(
        &self,
        request: &AnalysisRequest,
        session: &dyn SessionProvider,
    ) -> Result<JobId, WorkflowError> {
        let access_token = session.access_token().await?;
        let body = TriggerBody {
            request,
            time: Utc::now().to_rfc3339(),
            access_token: &access_token,
        };

        let response = self
            .client
            .post(&self.endpoints.trigger_url)
            .json(&body)
            .send()
            .await?;
        let response: TriggerResponse = Self::parse_response(response).await?;

        let job_id = match response.job_id {
            Some(Value::String(id)) if !id.trim().is_empty() => id,
            Some(Value::Number(n)) => n.to_string(),
            _ => return Err(WorkflowError::MissingField("jobId")),
        };

        tracing::info!(
            job_id = %job_id,
            pair = %request.pair,
            style = %request.style,
            "Analysis triggered",
        );
        Ok(job_id)
    }

    /// Ask the chat workflow about a symbol.
    pub async fn chat(&self, symbol: &str) -> Result<ChatReply, WorkflowError> {
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return Err(WorkflowError::InvalidInput("symbol must not be empty".into()));
        }

        let response = self
            .client
            .post(&self.endpoints.chat_url)
            .json(&serde_json::json!({ "symbol": symbol }))
            .send()
            .await?;
        let body: Value = Self::parse_response(response).await?;

        let Value::Object(mut fields) = body else {
            return Err(WorkflowError::Format("expected a JSON object".into()));
        };
        match fields.remove("analysis") {
            Some(Value::String(analysis)) => {
                tracing::debug!(symbol, chars = analysis.len(), "Chat reply received");
                Ok(ChatReply {
                    analysis,
                    extra: fields,
                })
            }
            _ => Err(WorkflowError::MissingField("analysis")),
        }
    }

    /// Fetch the signed-in user's past analysis jobs.
    pub async fn fetch_logs(
        &self,
        session: &dyn SessionProvider,
    ) -> Result<Vec<JobSummary>, WorkflowError> {
        let access_token = session.access_token().await?;
        let response = self
            .client
            .post(&self.endpoints.logs_url)
            .json(&serde_json::json!({ "accessToken": access_token }))
            .send()
            .await?;
        let body: Value = Self::parse_response(response).await?;

        let Value::Array(entries) = body else {
            return Err(WorkflowError::Format("expected a JSON array".into()));
        };
        let summaries: Vec<JobSummary> = entries
            .into_iter()
            .filter_map(JobSummary::from_value)
            .collect();
        tracing::debug!(count = summaries.len(), "Job history fetched");
        Ok(summaries)
    }

    // ---- private helpers ----

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, WorkflowError> {
        let response = ensure_success(response)
            .await
            .map_err(|(status, body)| WorkflowError::ApiError { status, body })?;
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| WorkflowError::Format(e.to_string()))
    }
}
