//! Runtime configuration.
//!
//! Values come from environment variables, with builder-style overrides:
//!
//! | Variable | Default |
//! |---|---|
//! | `GEMINI_API_KEY` | required |
//! | `AYUSHLENS_MODEL` | `gemini-3-flash-preview` |
//! | `AYUSHLENS_TIMEOUT_SECS` | `60` |
//! | `AYUSHLENS_BASE_URL` | official Gemini endpoint |
//! | `AYUSHLENS_STORE` | `<data dir>/ayushlens/ayushlens_reports.json` |
//! | `AYUSHLENS_PRIMARY_POLICY` | `trust` (or `derive`) |

use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

use crate::analysis::{DEFAULT_DEADLINE, PrimaryConditionPolicy};
use crate::error::{LensError, Result};
use crate::store::default_path_in;

#[derive(Debug, Clone)]
pub struct LensConfig {
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub timeout: Duration,
    pub base_url: Option<String>,
    pub store_path: PathBuf,
    pub primary_policy: PrimaryConditionPolicy,
}

impl LensConfig {
    pub fn new(api_key: impl Into<String>, store_path: impl Into<PathBuf>) -> Self {
        Self {
            api_key: api_key.into(),
            model: "gemini-3-flash-preview".to_string(),
            temperature: 0.0,
            timeout: DEFAULT_DEADLINE,
            base_url: None,
            store_path: store_path.into(),
            primary_policy: PrimaryConditionPolicy::default(),
        }
    }

    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`, which maps a variable name to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = get("GEMINI_API_KEY").ok_or_else(|| {
            LensError::Config("GEMINI_API_KEY environment variable is not set".to_string())
        })?;

        let store_path = match get("AYUSHLENS_STORE") {
            Some(path) => PathBuf::from(path),
            None => dirs::data_dir()
                .map(|dir| default_path_in(&dir))
                .ok_or_else(|| {
                    LensError::Config(
                        "Cannot determine a data directory; set AYUSHLENS_STORE".to_string(),
                    )
                })?,
        };

        let mut config = Self::new(api_key, store_path);

        if let Some(model) = get("AYUSHLENS_MODEL") {
            config.model = model;
        }
        if let Some(secs) = get("AYUSHLENS_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                LensError::Config(format!("AYUSHLENS_TIMEOUT_SECS is not a number: {}", secs))
            })?;
            config.timeout = Duration::from_secs(secs.max(1));
        }
        config.base_url = get("AYUSHLENS_BASE_URL");
        if let Some(policy) = get("AYUSHLENS_PRIMARY_POLICY") {
            config.primary_policy = policy.parse().map_err(LensError::Config)?;
        }

        debug!(
            model = %config.model,
            timeout = ?config.timeout,
            store = %config.store_path.display(),
            policy = ?config.primary_policy,
            "Loaded configuration"
        );
        Ok(config)
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn primary_policy(mut self, policy: PrimaryConditionPolicy) -> Self {
        self.primary_policy = policy;
        self
    }

    /// Build a Gemini client from this configuration.
    #[cfg(feature = "gemini")]
    pub fn gemini_client(&self) -> Result<crate::backend::GeminiClient> {
        let mut client = crate::backend::GeminiClient::new(self.api_key.clone())?
            .model(crate::backend::GeminiModel::from_string(self.model.clone()))
            .temperature(self.temperature)
            .timeout(self.timeout);
        if let Some(base_url) = &self.base_url {
            client = client.base_url(base_url.clone());
        }
        Ok(client)
    }
}
