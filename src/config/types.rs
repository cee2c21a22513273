use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for VC Scout
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scraper: ScraperConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub throttle: ThrottleConfig,
    pub llm: LlmConfig,
    pub server: ServerConfig,
}

/// Page fetching and text budget configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ScraperConfig {
    /// Hard wall-clock limit for a single fetch attempt (milliseconds)
    pub fetch_timeout_ms: u64,

    /// Attempts per candidate URL, including the first one
    pub max_attempts: u32,

    /// Base delay between attempts (milliseconds)
    pub backoff_base_ms: u64,

    /// Characters kept from each page after cleaning
    pub max_chars_per_page: usize,

    /// Characters kept across all pages of one company
    pub max_total_chars: usize,

    /// Pages with less cleaned text than this are discarded
    pub min_page_chars: usize,
}

impl ScraperConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_ms: 7_000,
            max_attempts: 3,
            backoff_base_ms: 300,
            max_chars_per_page: 3_000,
            max_total_chars: 10_000,
            min_page_chars: 50,
        }
    }
}

/// User agent identification sent with every page fetch
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    pub name: String,
    pub version: String,
}

impl UserAgentConfig {
    /// Format: `Mozilla/5.0 (compatible; Name/Version)`
    pub fn header_value(&self) -> String {
        format!("Mozilla/5.0 (compatible; {}/{})", self.name, self.version)
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            name: "VCScout".to_string(),
            version: "1.0".to_string(),
        }
    }
}

/// Per-client request budget for the enrichment endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ThrottleConfig {
    /// Requests allowed per window
    pub capacity: u32,

    /// Window length (seconds)
    pub window_secs: u64,

    /// How often the server sweeps stale buckets (seconds)
    pub sweep_interval_secs: u64,
}

impl ThrottleConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            capacity: 5,
            window_secs: 60,
            sweep_interval_secs: 60,
        }
    }
}

/// Which completion API the extraction step talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// OpenAI-compatible chat completions, bearer token auth
    #[default]
    OpenAi,
    /// Anthropic messages API, `x-api-key` auth
    Anthropic,
    /// Google Gemini `generateContent`, key passed as query parameter
    Gemini,
}

impl LlmProvider {
    /// Human-readable provider name used in error messages
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::OpenAi => "OpenAI",
            Self::Anthropic => "Anthropic",
            Self::Gemini => "Gemini",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com",
            Self::Anthropic => "https://api.anthropic.com",
            Self::Gemini => "https://generativelanguage.googleapis.com",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-4o-mini",
            Self::Anthropic => "claude-3-5-haiku-latest",
            Self::Gemini => "gemini-1.5-flash",
        }
    }
}

/// Language model endpoint configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LlmConfig {
    pub provider: LlmProvider,

    /// API root; the provider-specific path is appended. Defaults per provider.
    pub base_url: Option<String>,

    /// Model identifier. Defaults per provider.
    pub model: Option<String>,

    /// Name of the environment variable holding the credential
    pub api_key_env: String,

    pub temperature: f32,

    pub max_output_tokens: u32,

    /// Scraped text must be longer than this to ground the profile in it
    pub real_content_threshold: usize,
}

impl LlmConfig {
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.provider.default_base_url())
    }

    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }

    /// Reads the credential from the configured environment variable
    ///
    /// Blank values count as missing.
    pub fn api_key_from_env(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            base_url: None,
            model: None,
            api_key_env: "LLM_API_KEY".to_string(),
            temperature: 0.3,
            max_output_tokens: 1024,
            real_content_threshold: 100,
        }
    }
}

/// HTTP listener configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to listen on
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
        }
    }
}
