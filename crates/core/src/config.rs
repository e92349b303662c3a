use serde::Deserialize;
use tracing::debug;

use crate::error::{CampaignError, CampaignResult};

pub const DEFAULT_BASE_URL: &str = "https://app.loops.so/api";
pub const DEFAULT_SESSION_COOKIE: &str = "__Secure-next-auth.session-token";

/// Connection settings for the campaign platform. Loaded from environment
/// variables with the prefix `CAMPAIGN_PLATFORM__`, or built in code.
#[derive(Clone, Deserialize)]
pub struct PlatformConfig {
    /// Session cookie value captured from a signed-in browser.
    pub session_token: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Name of the cookie that carries `session_token`.
    #[serde(default = "default_session_cookie")]
    pub session_cookie: String,
    /// Template new campaigns are minted from; the platform default when unset.
    #[serde(default)]
    pub template_id: Option<String>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
fn default_session_cookie() -> String {
    DEFAULT_SESSION_COOKIE.to_string()
}

impl std::fmt::Debug for PlatformConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformConfig")
            .field("session_token", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("session_cookie", &self.session_cookie)
            .field("template_id", &self.template_id)
            .finish()
    }
}

impl PlatformConfig {
    pub fn new(session_token: impl Into<String>) -> Self {
        Self {
            session_token: session_token.into(),
            base_url: default_base_url(),
            session_cookie: default_session_cookie(),
            template_id: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_session_cookie(mut self, name: impl Into<String>) -> Self {
        self.session_cookie = name.into();
        self
    }

    pub fn with_template_id(mut self, template_id: impl Into<String>) -> Self {
        self.template_id = Some(template_id.into());
        self
    }

    /// Load configuration from environment variables.
    pub fn load() -> CampaignResult<Self> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("CAMPAIGN_PLATFORM")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .and_then(|c| c.try_deserialize::<Self>())
            .map_err(|e| CampaignError::Config(e.to_string()))?
            .validated()?;

        debug!(
            base_url = %config.base_url,
            template = config.template_id.is_some(),
            "Platform configuration loaded"
        );
        Ok(config)
    }

    /// Checks required fields and normalizes the base URL.
    pub fn validated(mut self) -> CampaignResult<Self> {
        if self.session_token.trim().is_empty() {
            return Err(CampaignError::Config("session_token must not be empty".into()));
        }
        if self.session_cookie.trim().is_empty() {
            return Err(CampaignError::Config("session_cookie must not be empty".into()));
        }

        let parsed = url::Url::parse(&self.base_url)
            .map_err(|e| CampaignError::Config(format!("invalid base_url {:?}: {e}", self.base_url)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(CampaignError::Config(format!(
                "base_url must be http or https, got {}",
                parsed.scheme()
            )));
        }

        self.base_url = self.base_url.trim_end_matches('/').to_string();
        Ok(self)
    }

    /// Value of the `Cookie` header sent with every platform call.
    pub fn cookie_header(&self) -> String {
        format!("{}={}", self.session_cookie, self.session_token)
    }
}
