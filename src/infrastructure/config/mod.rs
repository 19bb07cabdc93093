use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::domain::shared::RetryPolicy;
use crate::domain::tts::DEFAULT_MAX_MARKUP_BYTES;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    pub log_format: LogFormat,
    pub aws_region: String,
    // Model services
    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_image_model: String,
    // Speech
    pub tts_provider: TtsProvider,
    pub google_tts_api_key: Option<String>,
    pub tts_voices: Vec<String>,
    pub tts_max_bytes: usize,
    pub tts_concurrency: usize,
    // Storage
    pub asset_bucket: String,
    pub staging_dir: PathBuf,
    pub prompt_catalog_path: PathBuf,
    // Retry
    pub retry_max_attempts: u32,
    pub retry_base_delay_ms: u64,
    pub retry_max_delay_ms: u64,
    pub call_timeout_secs: u64,
    // Orchestration
    pub level_concurrency: usize,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum TtsProvider {
    Google,
    Polly,
}

const DEFAULT_GOOGLE_VOICES: &str = "en-US-Neural2-A,en-US-Neural2-C,en-US-Neural2-D,en-US-Neural2-F";
const DEFAULT_POLLY_VOICES: &str = "Joanna,Matthew,Ruth,Stephen";

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let tts_provider = match env::var("TTS_PROVIDER")
            .unwrap_or_else(|_| "google".to_string())
            .to_lowercase()
            .as_str()
        {
            "polly" => TtsProvider::Polly,
            _ => TtsProvider::Google,
        };
        let google_tts_api_key = env::var("GOOGLE_TTS_API_KEY").ok();
        if tts_provider == TtsProvider::Google && google_tts_api_key.is_none() {
            return Err("GOOGLE_TTS_API_KEY is required when TTS_PROVIDER=google".into());
        }

        let default_voices = match tts_provider {
            TtsProvider::Google => DEFAULT_GOOGLE_VOICES,
            TtsProvider::Polly => DEFAULT_POLLY_VOICES,
        };

        let config = Config {
            database_url: env::var("DATABASE_URL")?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()?,
            environment: match env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string())
                .as_str()
            {
                "production" => Environment::Production,
                _ => Environment::Development,
            },
            log_format: match env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .as_str()
            {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
            aws_region: env::var("AWS_REGION").unwrap_or_else(|_| "eu-west-1".to_string()),
            openai_api_key: env::var("OPENAI_API_KEY")?,
            openai_model: env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            openai_image_model: env::var("OPENAI_IMAGE_MODEL")
                .unwrap_or_else(|_| "dall-e-3".to_string()),
            tts_provider,
            google_tts_api_key,
            tts_voices: parse_list(
                &env::var("TTS_VOICES").unwrap_or_else(|_| default_voices.to_string()),
            ),
            tts_max_bytes: env::var("TTS_MAX_BYTES")
                .unwrap_or_else(|_| DEFAULT_MAX_MARKUP_BYTES.to_string())
                .parse()?,
            tts_concurrency: env::var("TTS_CONCURRENCY")
                .unwrap_or_else(|_| "2".to_string())
                .parse()?,
            asset_bucket: env::var("ASSET_BUCKET")?,
            staging_dir: env::var("STAGING_DIR")
                .unwrap_or_else(|_| "data/staging".to_string())
                .into(),
            prompt_catalog_path: env::var("PROMPT_CATALOG_PATH")
                .unwrap_or_else(|_| "config/prompt_catalog.json".to_string())
                .into(),
            retry_max_attempts: env::var("RETRY_MAX_ATTEMPTS")
                .unwrap_or_else(|_| "3".to_string())
                .parse()?,
            retry_base_delay_ms: env::var("RETRY_BASE_DELAY_MS")
                .unwrap_or_else(|_| "500".to_string())
                .parse()?,
            retry_max_delay_ms: env::var("RETRY_MAX_DELAY_MS")
                .unwrap_or_else(|_| "10000".to_string())
                .parse()?,
            call_timeout_secs: env::var("CALL_TIMEOUT_SECS")
                .unwrap_or_else(|_| "120".to_string())
                .parse()?,
            level_concurrency: env::var("LEVEL_CONCURRENCY")
                .unwrap_or_else(|_| "1".to_string())
                .parse()?,
        };

        Ok(config)
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry_max_attempts.max(1),
            base_delay: Duration::from_millis(self.retry_base_delay_ms),
            max_delay: Duration::from_millis(self.retry_max_delay_ms),
            jitter: true,
            attempt_timeout: match self.call_timeout_secs {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
        }
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
