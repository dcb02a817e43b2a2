use std::fmt::Debug;
use thiserror::Error;

pub const URL_VAR: &str = "HARVARD_DATAVERSE_URL";
pub const TOKEN_VAR: &str = "HARVARD_DATAVERSE_TOKEN";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(&'static str),
}

/// Connection settings for a Dataverse installation.
///
/// Fields:
/// - base_url: installation root, e.g. `https://dataverse.harvard.edu`
/// - api_token: optional API token, redacted in Debug
#[derive(Clone)]
pub struct DataverseConfig {
    pub base_url: String,
    pub api_token: Option<String>,
}

impl DataverseConfig {
    pub fn new(base_url: impl Into<String>, api_token: Option<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            api_token: api_token.filter(|t| !t.is_empty()),
        }
    }

    /// Load settings from the process environment.
    ///
    /// Expected variables: HARVARD_DATAVERSE_URL (required),
    /// HARVARD_DATAVERSE_TOKEN (optional). Call `dotenvy::dotenv()` first to
    /// pick up a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = std::env::var(URL_VAR)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::MissingVar(URL_VAR))?;
        Ok(Self::new(base_url, std::env::var(TOKEN_VAR).ok()))
    }
}

impl Debug for DataverseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(stringify!(DataverseConfig))
            .field("base_url", &self.base_url)
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
