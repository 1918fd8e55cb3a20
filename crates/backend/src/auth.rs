//! Session handling against the backend auth service.
//!
//! [`AuthClient`] signs in with email and password, keeps the session
//! in memory and refreshes it shortly before expiry. It implements
//! [`SessionProvider`] so the trigger, logs and store clients can ask it
//! for the current access token.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::Deserialize;
use signaldesk_core::ports::{AuthError, SessionProvider};
use signaldesk_core::types::Timestamp;
use tokio::sync::RwLock;

use crate::config::BackendConfig;
use crate::http::ensure_success;

/// Refresh the session when it expires within this window.
const REFRESH_MARGIN_SECS: i64 = 60;

/// Token response of the auth endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    /// Lifetime in seconds.
    expires_in: i64,
    #[serde(default)]
    user: Option<UserInfo>,
}

#[derive(Debug, Clone, Deserialize)]
struct UserInfo {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

/// An authenticated session held in memory.
#[derive(Debug, Clone)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: Timestamp,
    pub user_id: Option<String>,
    pub email: Option<String>,
}

impl Session {
    fn from_response(response: TokenResponse) -> Self {
        let user = response.user.unwrap_or(UserInfo {
            id: None,
            email: None,
        });
        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            expires_at: Utc::now() + Duration::seconds(response.expires_in),
            user_id: user.id,
            email: user.email,
        }
    }

    /// Whether the token expires within the refresh margin.
    pub fn needs_refresh(&self) -> bool {
        self.expires_at - Utc::now() < Duration::seconds(REFRESH_MARGIN_SECS)
    }
}

/// Client for the backend auth service.
pub struct AuthClient {
    client: reqwest::Client,
    config: Arc<BackendConfig>,
    session: RwLock<Option<Session>>,
}

impl AuthClient {
    pub fn new(client: reqwest::Client, config: Arc<BackendConfig>) -> Self {
        Self {
            client,
            config,
            session: RwLock::new(None),
        }
    }

    /// Sign in with email and password, replacing any current session.
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        let body = serde_json::json!({
            "email": email,
            "password": password,
        });
        let session = self.request_token("password", &body).await?;
        tracing::info!(email, "Signed in");
        *self.session.write().await = Some(session.clone());
        Ok(session)
    }

    /// Exchange the refresh token for a new session.
    pub async fn refresh(&self) -> Result<Session, AuthError> {
        let refresh_token = self
            .session
            .read()
            .await
            .as_ref()
            .map(|s| s.refresh_token.clone())
            .ok_or(AuthError::NotAuthenticated)?;

        let body = serde_json::json!({ "refresh_token": refresh_token });
        match self.request_token("refresh_token", &body).await {
            Ok(session) => {
                tracing::debug!("Session refreshed");
                *self.session.write().await = Some(session.clone());
                Ok(session)
            }
            Err(e @ AuthError::Rejected { .. }) => {
                tracing::warn!(error = %e, "Refresh rejected, clearing session");
                *self.session.write().await = None;
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// Revoke the session server-side and forget it locally.
    ///
    /// The local session is cleared even if the logout call fails.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        let Some(session) = self.session.write().await.take() else {
            return Ok(());
        };

        let response = self
            .client
            .post(self.config.auth_url("logout"))
            .header("apikey", &self.config.anon_key)
            .bearer_auth(&session.access_token)
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        ensure_success(response)
            .await
            .map_err(|(status, body)| AuthError::Rejected { status, body })?;
        tracing::info!("Signed out");
        Ok(())
    }

    /// The current session, if signed in.
    pub async fn current_session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    async fn request_token(
        &self,
        grant_type: &str,
        body: &serde_json::Value,
    ) -> Result<Session, AuthError> {
        let response = self
            .client
            .post(self.config.auth_url("token"))
            .query(&[("grant_type", grant_type)])
            .header("apikey", &self.config.anon_key)
            .json(body)
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        let response = ensure_success(response)
            .await
            .map_err(|(status, body)| AuthError::Rejected { status, body })?;

        let token = response
            .json::<TokenResponse>()
            .await
            .map_err(|e| AuthError::Transport(format!("Malformed token response: {e}")))?;
        Ok(Session::from_response(token))
    }
}

#[async_trait]
impl SessionProvider for AuthClient {
    async fn access_token(&self) -> Result<String, AuthError> {
        let session = self
            .current_session()
            .await
            .ok_or(AuthError::NotAuthenticated)?;
        if session.needs_refresh() {
            return Ok(self.refresh().await?.access_token);
        }
        Ok(session.access_token)
    }
}

/// A pre-issued access token, for service accounts and scripts.
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl SessionProvider for StaticToken {
    async fn access_token(&self) -> Result<String, AuthError> {
        if self.0.is_empty() {
            return Err(AuthError::NotAuthenticated);
        }
        Ok(self.0.clone())
    }
}

/// Token used for backend reads: the session token when signed in,
/// otherwise the public key.
pub(crate) async fn bearer_or_anon(
    session: &dyn SessionProvider,
    config: &BackendConfig,
) -> Result<String, AuthError> {
    match session.access_token().await {
        Ok(token) => Ok(token),
        Err(AuthError::NotAuthenticated) => Ok(config.anon_key.clone()),
        Err(e) => Err(e),
    }
}
