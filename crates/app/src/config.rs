use std::time::Duration;

use signaldesk_backend::config::DEFAULT_JOBS_TABLE;
use signaldesk_sync::SyncConfig;
use signaldesk_workflows::WorkflowEndpoints;

/// How the client authenticates against the backend.
#[derive(Debug, Clone)]
pub enum Credentials {
    /// Sign in with email and password at startup.
    Password { email: String, password: String },
    /// Use a pre-issued access token as-is.
    AccessToken(String),
}

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Backend base URL.
    pub backend_url: String,
    /// Public backend API key.
    pub anon_key: String,
    /// Table holding job rows (default: `analysis_jobs`).
    pub jobs_table: String,
    pub credentials: Credentials,
    pub endpoints: WorkflowEndpoints,
    /// HTTP request timeout in seconds (default: `30`).
    pub http_timeout_secs: u64,
    /// Synchronizer timing.
    pub sync: SyncConfig,
}

/// Errors raised while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("{var} must be {expected}, got '{value}'")]
    Invalid {
        var: &'static str,
        value: String,
        expected: &'static str,
    },
}

impl AppConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default          |
    /// |-------------------------|------------------|
    /// | `BACKEND_URL`           | required         |
    /// | `BACKEND_ANON_KEY`      | required         |
    /// | `BACKEND_EMAIL`         | --               |
    /// | `BACKEND_PASSWORD`      | --               |
    /// | `BACKEND_ACCESS_TOKEN`  | used when no email/password |
    /// | `JOBS_TABLE`            | `analysis_jobs`  |
    /// | `TRIGGER_WEBHOOK_URL`   | required         |
    /// | `CHAT_WEBHOOK_URL`      | required         |
    /// | `LOGS_WEBHOOK_URL`      | required         |
    /// | `HTTP_TIMEOUT_SECS`     | `30`             |
    /// | `POLL_INTERVAL_SECS`    | `10`             |
    /// | `SUBSCRIBE_MAX_RETRIES` | `3`              |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let credentials = match (get("BACKEND_EMAIL"), get("BACKEND_PASSWORD")) {
            (Some(email), Some(password)) => Credentials::Password { email, password },
            (Some(_), None) => return Err(ConfigError::Missing("BACKEND_PASSWORD")),
            _ => Credentials::AccessToken(required("BACKEND_ACCESS_TOKEN")?),
        };

        let defaults = SyncConfig::default();
        let poll_interval_secs = parse_or(
            get("POLL_INTERVAL_SECS"),
            "POLL_INTERVAL_SECS",
            defaults.poll_interval.as_secs(),
        )?;
        if poll_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "POLL_INTERVAL_SECS",
                value: "0".into(),
                expected: "a positive number of seconds",
            });
        }
        let sync = SyncConfig {
            max_subscribe_retries: parse_or(
                get("SUBSCRIBE_MAX_RETRIES"),
                "SUBSCRIBE_MAX_RETRIES",
                defaults.max_subscribe_retries,
            )?,
            poll_interval: Duration::from_secs(poll_interval_secs),
            ..defaults
        };

        Ok(Self {
            backend_url: required("BACKEND_URL")?,
            anon_key: required("BACKEND_ANON_KEY")?,
            jobs_table: get("JOBS_TABLE").unwrap_or_else(|| DEFAULT_JOBS_TABLE.to_string()),
            credentials,
            endpoints: WorkflowEndpoints {
                trigger_url: required("TRIGGER_WEBHOOK_URL")?,
                chat_url: required("CHAT_WEBHOOK_URL")?,
                logs_url: required("LOGS_WEBHOOK_URL")?,
            },
            http_timeout_secs: parse_or(get("HTTP_TIMEOUT_SECS"), "HTTP_TIMEOUT_SECS", 30)?,
            sync,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    raw: Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
            var,
            value,
            expected: "a non-negative integer",
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;

    use super::*;

    fn base_vars() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("BACKEND_URL", "https://demo.example.co"),
            ("BACKEND_ANON_KEY", "anon"),
            ("BACKEND_EMAIL", "trader@example.com"),
            ("BACKEND_PASSWORD", "hunter2"),
            ("TRIGGER_WEBHOOK_URL", "https://hooks.example.com/analyze"),
            ("CHAT_WEBHOOK_URL", "https://hooks.example.com/chat"),
            ("LOGS_WEBHOOK_URL", "https://hooks.example.com/logs"),
        ])
    }

    fn load(vars: &HashMap<&'static str, &'static str>) -> Result<AppConfig, ConfigError> {
        AppConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn defaults_applied() {
        let config = load(&base_vars()).unwrap();
        assert_eq!(config.jobs_table, "analysis_jobs");
        assert_eq!(config.http_timeout_secs, 30);
        assert_eq!(config.sync.poll_interval, Duration::from_secs(10));
        assert_eq!(config.sync.max_subscribe_retries, 3);
        assert_matches!(config.credentials, Credentials::Password { .. });
    }

    #[test]
    fn access_token_used_without_password() {
        let mut vars = base_vars();
        vars.remove("BACKEND_EMAIL");
        vars.remove("BACKEND_PASSWORD");
        vars.insert("BACKEND_ACCESS_TOKEN", "tok");
        let config = load(&vars).unwrap();
        assert_matches!(config.credentials, Credentials::AccessToken(t) if t == "tok");
    }

    #[test]
    fn missing_credentials_reported() {
        let mut vars = base_vars();
        vars.remove("BACKEND_EMAIL");
        vars.remove("BACKEND_PASSWORD");
        assert_matches!(load(&vars), Err(ConfigError::Missing("BACKEND_ACCESS_TOKEN")));
    }

    #[test]
    fn email_without_password_reported() {
        let mut vars = base_vars();
        vars.remove("BACKEND_PASSWORD");
        assert_matches!(load(&vars), Err(ConfigError::Missing("BACKEND_PASSWORD")));
    }

    #[test]
    fn missing_webhook_reported() {
        let mut vars = base_vars();
        vars.remove("CHAT_WEBHOOK_URL");
        assert_matches!(load(&vars), Err(ConfigError::Missing("CHAT_WEBHOOK_URL")));
    }

    #[test]
    fn invalid_number_reported() {
        let mut vars = base_vars();
        vars.insert("POLL_INTERVAL_SECS", "ten");
        assert_matches!(
            load(&vars),
            Err(ConfigError::Invalid { var: "POLL_INTERVAL_SECS", .. })
        );
    }

    #[test]
    fn zero_poll_interval_rejected() {
        let mut vars = base_vars();
        vars.insert("POLL_INTERVAL_SECS", "0");
        assert!(load(&vars).is_err());
    }

    #[test]
    fn overrides_applied() {
        let mut vars = base_vars();
        vars.insert("POLL_INTERVAL_SECS", "5");
        vars.insert("SUBSCRIBE_MAX_RETRIES", "1");
        vars.insert("JOBS_TABLE", "jobs");
        let config = load(&vars).unwrap();
        assert_eq!(config.sync.poll_interval, Duration::from_secs(5));
        assert_eq!(config.sync.max_subscribe_retries, 1);
        assert_eq!(config.jobs_table, "jobs");
    }
}
