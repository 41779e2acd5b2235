use service_core::config::{self as core_config, get_env, get_env_parsed, is_production, split_list};
use service_core::error::AppError;
use service_core::retry::RetryPolicy;
use std::env;
use std::time::Duration;

/// Upload ceiling (20 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash-preview-09-2025";
pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

pub const DEFAULT_INSTRUCTION: &str =
    "Analyze this video according to the system instructions provided.";

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a professional video production expert. \
Analyze the provided video objectively, covering composition, lighting, audio, pacing, \
editing and storytelling. Point out concrete strengths and weaknesses with timestamps \
where relevant, and give actionable suggestions for improvement. \
Respond with a single JSON object only.";

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub common: core_config::Config,
    pub gemini: GeminiSettings,
    pub prompts: PromptSettings,
    pub retry: RetrySettings,
    pub upload: UploadSettings,
    pub cors: CorsSettings,
    pub observability: ObservabilitySettings,
}

#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub api_key: String,
    /// Model identifier, e.g. `gemini-2.5-flash-preview-09-2025`.
    pub model: String,
    pub api_base: String,
    /// Per-attempt request timeout.
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct PromptSettings {
    /// User-turn text sent next to the video.
    pub instruction: String,
    pub system_instruction: String,
}

#[derive(Debug, Clone)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
}

#[derive(Debug, Clone)]
pub struct UploadSettings {
    pub max_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct CorsSettings {
    /// `*` allows any origin.
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ObservabilitySettings {
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
}

impl RelayConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = is_production();

        Ok(RelayConfig {
            common: common_config,
            gemini: GeminiSettings {
                api_key: get_env("GEMINI_API_KEY", None, is_prod)?,
                model: get_env("GEMINI_MODEL", Some(DEFAULT_GEMINI_MODEL), is_prod)?,
                api_base: get_env("GEMINI_API_BASE", Some(DEFAULT_GEMINI_API_BASE), false)?,
                timeout_secs: get_env_parsed("GEMINI_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS, false)?,
            },
            // Everything below has a built-in default even in production.
            prompts: PromptSettings {
                instruction: get_env("ANALYSIS_INSTRUCTION", Some(DEFAULT_INSTRUCTION), false)?,
                system_instruction: get_env(
                    "ANALYSIS_SYSTEM_PROMPT",
                    Some(DEFAULT_SYSTEM_PROMPT),
                    false,
                )?,
            },
            retry: RetrySettings {
                max_attempts: get_env_parsed("RETRY_MAX_ATTEMPTS", 5, false)?,
                base_delay_ms: get_env_parsed("RETRY_BASE_DELAY_MS", 1000, false)?,
            },
            upload: UploadSettings {
                max_bytes: get_env_parsed("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES, false)?,
            },
            cors: CorsSettings {
                allowed_origins: split_list(&get_env("CORS_ALLOWED_ORIGINS", Some("*"), false)?),
            },
            observability: ObservabilitySettings {
                log_level: get_env("LOG_LEVEL", Some("info"), false)?,
                otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|s| !s.is_empty()),
            },
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry.max_attempts,
            Duration::from_millis(self.retry.base_delay_ms),
        )
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.gemini.timeout_secs)
    }
}
