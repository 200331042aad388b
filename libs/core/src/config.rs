use std::env;
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

pub const ENV_TIMEOUT_SECS: &str = "TEAMS_NOTIFY_TIMEOUT_SECS";
pub const ENV_USER_AGENT: &str = "TEAMS_NOTIFY_USER_AGENT";
pub const ENV_PROXY: &str = "TEAMS_NOTIFY_PROXY";
pub const ENV_SKIP_URL_VALIDATION: &str = "TEAMS_NOTIFY_SKIP_URL_VALIDATION";
pub const ENV_URL_PATTERNS: &str = "TEAMS_NOTIFY_URL_PATTERNS";

pub fn default_user_agent() -> String {
    format!("teams-notify/{}", env!("CARGO_PKG_VERSION"))
}

/// Settings for [`crate::TeamsClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub timeout: Duration,
    pub user_agent: String,
    pub proxy: Option<String>,
    pub skip_url_validation: bool,
    /// Appended to the default webhook patterns unless `replace_default_patterns` is set.
    pub url_patterns: Vec<String>,
    pub replace_default_patterns: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: default_user_agent(),
            proxy: None,
            skip_url_validation: false,
            url_patterns: Vec::new(),
            replace_default_patterns: false,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.timeout = Duration::from_secs(secs),
                _ => tracing::warn!(
                    value = %raw,
                    "ignoring invalid {ENV_TIMEOUT_SECS}; using default timeout"
                ),
            }
        }
        if let Some(agent) = lookup(ENV_USER_AGENT).filter(|v| !v.trim().is_empty()) {
            config.user_agent = agent;
        }
        config.proxy = lookup(ENV_PROXY).filter(|v| !v.trim().is_empty());
        if let Some(raw) = lookup(ENV_SKIP_URL_VALIDATION) {
            config.skip_url_validation =
                matches!(raw.to_lowercase().as_str(), "1" | "true" | "yes" | "on");
        }
        if let Some(raw) = lookup(ENV_URL_PATTERNS) {
            config.url_patterns = raw
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect();
        }

        config
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }
}
