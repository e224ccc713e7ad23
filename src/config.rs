//! Configuration for the teller assistant
//!
//! Loaded once at process start from a TOML file (every section is optional
//! and falls back to the demo defaults) and passed down read-only. The API
//! key itself never lives in the file: `llm.api_key_env` names the
//! environment variable that holds it.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TellerConfig {
    #[serde(default)]
    pub llm: LlmSection,
    #[serde(default)]
    pub bank: BankSection,
    #[serde(default)]
    pub guardrails: GuardrailSection,
    #[serde(default)]
    pub router: RouterSection,
}

/// Remote completion endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LlmSection {
    /// OpenAI-compatible base URL (chat completions live under it)
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model identifier used by every built-in agent
    #[serde(default = "default_model")]
    pub model: String,
    /// Environment variable containing API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    /// HTTP timeout per request in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub timeout_secs: u64,
    /// Retries after a network or 5xx failure (0 disables retrying)
    #[serde(default)]
    pub max_retries: u32,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            temperature: None,
            max_tokens: None,
            timeout_secs: default_request_timeout_secs(),
            max_retries: 0,
        }
    }
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta/openai".to_string()
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_request_timeout_secs() -> u64 {
    60
}

/// Starting state for new conversations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BankSection {
    #[serde(default = "default_opening_balance")]
    pub opening_balance: Decimal,
}

impl Default for BankSection {
    fn default() -> Self {
        Self {
            opening_balance: default_opening_balance(),
        }
    }
}

fn default_opening_balance() -> Decimal {
    dec!(1000)
}

/// Guardrail vocabulary
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GuardrailSection {
    /// Phrase preceding the account number in a query (matched case-insensitively)
    #[serde(default = "default_account_marker")]
    pub account_marker: String,
    #[serde(default = "default_account_digits")]
    pub account_digits: usize,
    #[serde(default = "default_apology_keywords")]
    pub apology_keywords: Vec<String>,
    #[serde(default = "default_error_keywords")]
    pub error_keywords: Vec<String>,
}

impl Default for GuardrailSection {
    fn default() -> Self {
        Self {
            account_marker: default_account_marker(),
            account_digits: default_account_digits(),
            apology_keywords: default_apology_keywords(),
            error_keywords: default_error_keywords(),
        }
    }
}

fn default_account_marker() -> String {
    "account number".to_string()
}

fn default_account_digits() -> usize {
    16
}

fn default_apology_keywords() -> Vec<String> {
    vec!["sorry".to_string()]
}

fn default_error_keywords() -> Vec<String> {
    vec!["error".to_string()]
}

/// Router limits
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RouterSection {
    /// Agent that receives every query first
    #[serde(default = "default_start_agent")]
    pub start_agent: String,
    /// Maximum handoffs within one run before it is treated as a loop
    #[serde(default = "default_max_handoffs")]
    pub max_handoffs: u32,
    /// Upper bound on a single completion call, including retries
    #[serde(default = "default_completion_timeout_secs")]
    pub completion_timeout_secs: u64,
}

impl Default for RouterSection {
    fn default() -> Self {
        Self {
            start_agent: default_start_agent(),
            max_handoffs: default_max_handoffs(),
            completion_timeout_secs: default_completion_timeout_secs(),
        }
    }
}

fn default_start_agent() -> String {
    crate::agents::bank::TRIAGE_AGENT.to_string()
}

fn default_max_handoffs() -> u32 {
    8
}

fn default_completion_timeout_secs() -> u64 {
    90
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl TellerConfig {
    /// Load configuration from a TOML file and validate it
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: TellerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        let base_url = url::Url::parse(&self.llm.base_url).map_err(|e| {
            ConfigError::InvalidConfig(format!("llm.base_url '{}': {e}", self.llm.base_url))
        })?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidConfig(format!(
                "llm.base_url must use http or https, got '{}'",
                base_url.scheme()
            )));
        }

        if self.llm.model.trim().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "llm.model must not be empty".to_string(),
            ));
        }

        if let Some(temperature) = self.llm.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(ConfigError::InvalidConfig(format!(
                    "llm.temperature must be within 0.0..=2.0, got {temperature}"
                )));
            }
        }

        if self.bank.opening_balance.is_sign_negative() {
            return Err(ConfigError::InvalidConfig(format!(
                "bank.opening_balance must not be negative, got {}",
                self.bank.opening_balance
            )));
        }

        if self.guardrails.account_marker.trim().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "guardrails.account_marker must not be empty".to_string(),
            ));
        }

        if self.guardrails.account_digits == 0 {
            return Err(ConfigError::InvalidConfig(
                "guardrails.account_digits must be positive".to_string(),
            ));
        }

        let keywords = self
            .guardrails
            .apology_keywords
            .iter()
            .chain(self.guardrails.error_keywords.iter());
        for keyword in keywords {
            if keyword.trim().is_empty() {
                return Err(ConfigError::InvalidConfig(
                    "guardrail keywords must not be empty".to_string(),
                ));
            }
        }

        if self.router.completion_timeout_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "router.completion_timeout_secs must be positive".to_string(),
            ));
        }

        Ok(())
    }

    /// Get LLM API key from environment variable
    pub fn get_llm_api_key(&self) -> Result<String, ConfigError> {
        std::env::var(&self.llm.api_key_env)
            .map_err(|_| ConfigError::EnvVarNotFound(self.llm.api_key_env.clone()))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.llm.timeout_secs)
    }

    pub fn completion_timeout(&self) -> Duration {
        Duration::from_secs(self.router.completion_timeout_secs)
    }
}
