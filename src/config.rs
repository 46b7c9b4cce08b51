//! # Configuration Module
//!
//! This module defines configuration structures for the bot, the AI collaborators
//! and the grocery pipeline, and loads them from the environment.

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

// Constants for AI configuration
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_VERTEX_LOCATION: &str = "us-central1";
pub const DEFAULT_LOCALES_DIR: &str = "./locales";

// Constants for the grocery pipeline
pub const DEFAULT_BASELINE_SERVINGS: u32 = 4;
pub const DEFAULT_PLANNED_SERVINGS: u32 = 2;

/// Recovery configuration for model calls
#[derive(Debug, Clone)]
pub struct RecoveryConfig {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Base delay between retries in milliseconds
    pub base_retry_delay_ms: u64,
    /// Maximum delay between retries in milliseconds
    pub max_retry_delay_ms: u64,
    /// Timeout for a single model call in seconds
    pub operation_timeout_secs: u64,
    /// Circuit breaker failure threshold
    pub circuit_breaker_threshold: u32,
    /// Circuit breaker reset timeout in seconds
    pub circuit_breaker_reset_secs: u64,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_retry_delay_ms: 1000,  // 1 second
            max_retry_delay_ms: 8000,   // 8 seconds
            operation_timeout_secs: 90, // audio and video prompts are slow
            circuit_breaker_threshold: 5,
            circuit_breaker_reset_secs: 60, // 1 minute
        }
    }
}

/// Which hosted endpoint serves `generateContent`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AiProvider {
    /// Generative Language API, authenticated with an API key
    Gemini { api_key: String },
    /// Vertex AI, authenticated with an OAuth access token
    Vertex {
        project_id: String,
        location: String,
        access_token: String,
    },
}

/// Configuration for the generative model client
#[derive(Debug, Clone)]
pub struct AiConfig {
    pub provider: AiProvider,
    pub model: String,
    /// Sampling temperature for recipe extraction and categorization
    pub temperature: Option<f32>,
    pub recovery: RecoveryConfig,
}

impl AiConfig {
    /// Gemini configuration with default model and recovery settings
    pub fn gemini(api_key: impl Into<String>) -> Self {
        Self {
            provider: AiProvider::Gemini {
                api_key: api_key.into(),
            },
            model: DEFAULT_MODEL.to_string(),
            temperature: Some(0.2),
            recovery: RecoveryConfig::default(),
        }
    }

    /// Load from `AI_API_TYPE` (`gemini` or `vertex`) and the matching credentials
    pub fn from_env() -> Result<Self> {
        let api_type = env::var("AI_API_TYPE").unwrap_or_else(|_| "gemini".to_string());

        let provider = match api_type.trim().to_lowercase().as_str() {
            "vertex" => AiProvider::Vertex {
                project_id: env::var("VERTEX_PROJECT_ID")
                    .context("VERTEX_PROJECT_ID must be set when AI_API_TYPE=vertex")?,
                location: env::var("VERTEX_LOCATION")
                    .unwrap_or_else(|_| DEFAULT_VERTEX_LOCATION.to_string()),
                access_token: env::var("VERTEX_ACCESS_TOKEN")
                    .context("VERTEX_ACCESS_TOKEN must be set when AI_API_TYPE=vertex")?,
            },
            "gemini" => AiProvider::Gemini {
                api_key: env::var("GEMINI_API_KEY")
                    .context("GEMINI_API_KEY must be set when AI_API_TYPE=gemini")?,
            },
            other => anyhow::bail!("Unsupported AI_API_TYPE: {other}"),
        };

        let mut recovery = RecoveryConfig::default();
        if let Some(secs) = parse_env::<u64>("AI_TIMEOUT_SECS")? {
            recovery.operation_timeout_secs = secs;
        }
        if let Some(retries) = parse_env::<u32>("AI_MAX_RETRIES")? {
            recovery.max_retries = retries;
        }

        Ok(Self {
            provider,
            model: env::var("AI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            temperature: Some(0.2),
            recovery,
        })
    }
}

/// Servings assumptions used when scaling recipes for the grocery list
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroceryConfig {
    /// Servings a recipe is assumed to yield
    pub baseline_servings: u32,
    /// Servings used when a meal plan entry has none
    pub default_planned_servings: u32,
}

impl GroceryConfig {
    /// Ratio applied to every ingredient of a planned meal
    pub fn servings_multiplier(&self, planned: Option<u32>) -> f64 {
        let planned = planned
            .filter(|s| *s > 0)
            .unwrap_or(self.default_planned_servings);
        let baseline = self.baseline_servings.max(1);
        f64::from(planned) / f64::from(baseline)
    }
}

impl Default for GroceryConfig {
    fn default() -> Self {
        Self {
            baseline_servings: DEFAULT_BASELINE_SERVINGS,
            default_planned_servings: DEFAULT_PLANNED_SERVINGS,
        }
    }
}

/// Whether log lines are rendered for humans or as JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Top-level application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub telegram_bot_token: String,
    pub database_url: String,
    pub locales_dir: PathBuf,
    pub log_format: LogFormat,
    pub ai: AiConfig,
    pub grocery: GroceryConfig,
}

impl AppConfig {
    /// Load configuration from the process environment (after `.env`)
    pub fn from_env() -> Result<Self> {
        let telegram_bot_token =
            env::var("TELEGRAM_BOT_TOKEN").context("TELEGRAM_BOT_TOKEN must be set")?;
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

        let log_format = match env::var("LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        let mut grocery = GroceryConfig::default();
        if let Some(baseline) = parse_env::<u32>("GROCERY_BASELINE_SERVINGS")? {
            grocery.baseline_servings = baseline;
        }
        if let Some(planned) = parse_env::<u32>("GROCERY_DEFAULT_SERVINGS")? {
            grocery.default_planned_servings = planned;
        }

        Ok(Self {
            telegram_bot_token,
            database_url,
            locales_dir: env::var("LOCALES_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_LOCALES_DIR)),
            log_format,
            ai: AiConfig::from_env()?,
            grocery,
        })
    }
}

fn parse_env<T>(name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .with_context(|| format!("{name} has an invalid value: {raw}")),
        Err(_) => Ok(None),
    }
}
