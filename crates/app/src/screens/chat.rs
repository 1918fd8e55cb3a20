//! Symbol chat with an in-memory transcript.

use std::sync::Arc;

use serde::Serialize;
use signaldesk_workflows::{ChatReply, WorkflowApi, WorkflowError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
    /// A failed exchange, shown inline.
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatEntry {
    pub role: ChatRole,
    pub text: String,
}

pub struct ChatScreen {
    workflows: Arc<WorkflowApi>,
    transcript: Vec<ChatEntry>,
}

impl ChatScreen {
    pub fn new(workflows: Arc<WorkflowApi>) -> Self {
        Self {
            workflows,
            transcript: Vec::new(),
        }
    }

    /// Ask about `symbol` and append both sides of the exchange.
    pub async fn ask(&mut self, symbol: &str) -> Result<ChatReply, WorkflowError> {
        self.push(ChatRole::User, symbol.trim());

        match self.workflows.chat(symbol).await {
            Ok(reply) => {
                self.push(ChatRole::Assistant, &reply.analysis);
                Ok(reply)
            }
            Err(e) => {
                tracing::warn!(symbol, error = %e, "Chat request failed");
                self.push(ChatRole::Error, &e.to_string());
                Err(e)
            }
        }
    }

    pub fn transcript(&self) -> &[ChatEntry] {
        &self.transcript
    }

    pub fn clear(&mut self) {
        self.transcript.clear();
    }

    fn push(&mut self, role: ChatRole, text: &str) {
        self.transcript.push(ChatEntry {
            role,
            text: text.to_string(),
        });
    }
}
