//! Outbound email configuration

use serde::{Deserialize, Serialize};

use super::EnvReader;

/// Email delivery provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailProvider {
    /// Write notifications to the log only
    Log,
    /// Deliver through the Resend HTTP API
    Resend,
}

impl std::str::FromStr for EmailProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "log" | "mock" => Ok(EmailProvider::Log),
            "resend" => Ok(EmailProvider::Resend),
            _ => Err(format!("Invalid email provider: {}", s)),
        }
    }
}

#[derive(Clone, Deserialize, Serialize)]
pub struct EmailConfig {
    pub provider: EmailProvider,

    /// Resend API key, required for the Resend provider
    #[serde(default)]
    pub api_key: Option<String>,

    /// Resend API base URL
    pub api_base_url: String,

    /// Sender address
    pub from: String,

    /// Frontend base URL used to build links in notifications
    pub frontend_url: String,

    /// Request timeout for the provider, in seconds
    pub timeout_seconds: u64,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            provider: EmailProvider::Log,
            api_key: None,
            api_base_url: String::from("https://api.resend.com"),
            from: String::from("onboarding@resend.dev"),
            frontend_url: String::from("http://localhost:3000"),
            timeout_seconds: 10,
        }
    }
}

impl EmailConfig {
    pub fn load(env: &mut EnvReader) -> Self {
        let defaults = Self::default();
        let provider = match env.optional("EMAIL_PROVIDER").map(|raw| raw.parse()) {
            None => defaults.provider,
            Some(Ok(provider)) => provider,
            Some(Err(message)) => {
                env.record("EMAIL_PROVIDER", message);
                defaults.provider
            }
        };

        let api_key = match provider {
            EmailProvider::Resend => Some(env.required("RESEND_API_KEY", 1)),
            EmailProvider::Log => env.optional("RESEND_API_KEY"),
        };

        Self {
            provider,
            api_key,
            api_base_url: env.url("RESEND_API_URL", &defaults.api_base_url),
            from: env.email("EMAIL_FROM", &defaults.from),
            frontend_url: env.url("FRONTEND_URL", &defaults.frontend_url),
            timeout_seconds: env.parse("EMAIL_TIMEOUT_SECONDS", defaults.timeout_seconds),
        }
    }
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("provider", &self.provider)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_base_url", &self.api_base_url)
            .field("from", &self.from)
            .field("frontend_url", &self.frontend_url)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}
