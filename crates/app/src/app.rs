//! Wiring of the backend, workflow and sync clients for one session.

use std::sync::Arc;
use std::time::Duration;

use signaldesk_backend::{AuthClient, BackendConfig, RealtimeFeed, RestJobStore, StaticToken};
use signaldesk_core::ports::{AuthError, ChangeFeed, JobStore, SessionProvider};
use signaldesk_sync::{JobSynchronizer, SyncConfig};
use signaldesk_workflows::WorkflowApi;

use crate::config::{AppConfig, Credentials};
use crate::screens::{AnalysisScreen, ChatScreen, HistoryScreen};

/// Shared clients for the screens of one session.
pub struct App {
    session: Arc<dyn SessionProvider>,
    auth: Option<Arc<AuthClient>>,
    workflows: Arc<WorkflowApi>,
    store: Arc<dyn JobStore>,
    feed: Arc<dyn ChangeFeed>,
    sync_config: SyncConfig,
}

impl App {
    /// Build the clients and sign in with the configured credentials.
    pub async fn connect(config: &AppConfig) -> Result<Self, AuthError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .map_err(|e| AuthError::Transport(e.to_string()))?;
        let backend = Arc::new(
            BackendConfig::new(&config.backend_url, &config.anon_key)
                .with_jobs_table(&config.jobs_table),
        );

        let (session, auth): (Arc<dyn SessionProvider>, Option<Arc<AuthClient>>) =
            match &config.credentials {
                Credentials::Password { email, password } => {
                    let auth = Arc::new(AuthClient::new(http.clone(), Arc::clone(&backend)));
                    auth.sign_in_with_password(email, password).await?;
                    (auth.clone() as Arc<dyn SessionProvider>, Some(auth))
                }
                Credentials::AccessToken(token) => {
                    (Arc::new(StaticToken::new(token.clone())) as Arc<dyn SessionProvider>, None)
                }
            };

        let store = Arc::new(RestJobStore::new(
            http.clone(),
            Arc::clone(&backend),
            Arc::clone(&session),
        ));
        let feed = Arc::new(RealtimeFeed::new(Arc::clone(&backend), Arc::clone(&session)));
        let workflows = Arc::new(WorkflowApi::new(http, config.endpoints.clone()));

        Ok(Self::from_parts(session, workflows, store, feed, config.sync.clone()).with_auth(auth))
    }

    /// Assemble from already-built collaborators.
    pub fn from_parts(
        session: Arc<dyn SessionProvider>,
        workflows: Arc<WorkflowApi>,
        store: Arc<dyn JobStore>,
        feed: Arc<dyn ChangeFeed>,
        sync_config: SyncConfig,
    ) -> Self {
        Self {
            session,
            auth: None,
            workflows,
            store,
            feed,
            sync_config,
        }
    }

    fn with_auth(mut self, auth: Option<Arc<AuthClient>>) -> Self {
        self.auth = auth;
        self
    }

    pub fn analysis_screen(&self) -> AnalysisScreen {
        let sync = JobSynchronizer::new(
            Arc::clone(&self.store),
            Arc::clone(&self.feed),
            self.sync_config.clone(),
        );
        AnalysisScreen::new(Arc::clone(&self.workflows), Arc::clone(&self.session), sync)
    }

    pub fn chat_screen(&self) -> ChatScreen {
        ChatScreen::new(Arc::clone(&self.workflows))
    }

    pub fn history_screen(&self) -> HistoryScreen {
        HistoryScreen::new(Arc::clone(&self.workflows), Arc::clone(&self.session))
    }

    /// End the backend session, if this process opened one.
    pub async fn sign_out(&self) {
        if let Some(auth) = &self.auth {
            if let Err(e) = auth.sign_out().await {
                tracing::warn!(error = %e, "Sign-out failed");
            }
        }
    }
}
