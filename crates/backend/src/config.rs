//! Connection settings for one backend project.

/// Default table holding analysis job rows.
pub const DEFAULT_JOBS_TABLE: &str = "analysis_jobs";

/// Base URL, public API key and table name for a backend project.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// HTTP base URL, e.g. `https://project.example.co`.
    pub base_url: String,
    /// Public (anon) API key sent as `apikey` on every request.
    pub anon_key: String,
    /// Table holding job rows.
    pub jobs_table: String,
}

impl BackendConfig {
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            jobs_table: DEFAULT_JOBS_TABLE.to_string(),
        }
    }

    pub fn with_jobs_table(mut self, table: impl Into<String>) -> Self {
        self.jobs_table = table.into();
        self
    }

    pub(crate) fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{path}", self.base_url)
    }

    pub(crate) fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }

    /// WebSocket endpoint of the realtime service. `http(s)` becomes
    /// `ws(s)`.
    pub fn realtime_url(&self) -> String {
        let ws_base = if let Some(rest) = self.base_url.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = self.base_url.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            self.base_url.clone()
        };
        format!(
            "{ws_base}/realtime/v1/websocket?apikey={}&vsn=1.0.0",
            self.anon_key
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_trimmed() {
        let config = BackendConfig::new("https://demo.example.co/", "anon");
        assert_eq!(
            config.rest_url("analysis_jobs"),
            "https://demo.example.co/rest/v1/analysis_jobs"
        );
        assert_eq!(config.auth_url("logout"), "https://demo.example.co/auth/v1/logout");
    }

    #[test]
    fn realtime_url_uses_ws_scheme() {
        let config = BackendConfig::new("https://demo.example.co", "k1");
        assert_eq!(
            config.realtime_url(),
            "wss://demo.example.co/realtime/v1/websocket?apikey=k1&vsn=1.0.0"
        );
        let local = BackendConfig::new("http://127.0.0.1:54321", "k2");
        assert!(local.realtime_url().starts_with("ws://127.0.0.1:54321/realtime/v1/"));
    }

    #[test]
    fn default_table() {
        let config = BackendConfig::new("http://x", "k");
        assert_eq!(config.jobs_table, DEFAULT_JOBS_TABLE);
        assert_eq!(config.with_jobs_table("jobs").jobs_table, "jobs");
    }
}
