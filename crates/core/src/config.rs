use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn env_u16(key: &str, default: u16) -> u16 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_f32(key: &str, default: f32) -> f32 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub forecast: ForecastConfig,
    pub insight: InsightConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig::from_env(),
            forecast: ForecastConfig::from_env(),
            insight: InsightConfig::from_env(),
        }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded:");
        tracing::info!("  server:    host={}, port={}", self.server.host, self.server.port);
        tracing::info!(
            "  forecast:  python={}, model={}, data_dir={}",
            self.forecast.python_bin,
            self.forecast.model_script.display(),
            self.forecast.data_dir.display()
        );
        tracing::info!(
            "  insight:   base_url={}, model={}, configured={}",
            self.insight.base_url,
            self.insight.model,
            self.insight.is_configured()
        );
    }

    /// Return a redacted view safe for API responses (no secrets).
    pub fn redacted_summary(&self) -> serde_json::Value {
        serde_json::json!({
            "server": { "host": self.server.host, "port": self.server.port },
            "forecast": {
                "python_bin": self.forecast.python_bin,
                "model_script": self.forecast.model_script,
                "profile_script": self.forecast.profile_script,
                "data_dir": self.forecast.data_dir,
                "timeout_secs": self.forecast.timeout_secs,
            },
            "insight": {
                "base_url": self.insight.base_url,
                "model": self.insight.model,
                "timeout_secs": self.insight.timeout_secs,
                "max_attempts": self.insight.max_attempts,
                "configured": self.insight.is_configured(),
            },
        })
    }
}

// ── Server ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origin: String,
}

impl ServerConfig {
    fn from_env() -> Self {
        Self {
            host: env_or("HOST", "0.0.0.0"),
            port: env_u16("PORT", 3001),
            cors_origin: env_or("CORS_ORIGIN", "*"),
        }
    }
}

// ── Forecast model (local subprocess) ─────────────────────────

/// Where the trained forecast model and the dataset profiler live and
/// how long a single invocation may run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastConfig {
    pub python_bin: String,
    pub model_script: PathBuf,
    pub profile_script: PathBuf,
    pub data_dir: PathBuf,
    pub timeout_secs: u64,
}

impl ForecastConfig {
    fn from_env() -> Self {
        Self {
            python_bin: env_or("PYTHON_BIN", "python3"),
            model_script: PathBuf::from(env_or("FORECAST_MODEL", "models/forecast_model.py")),
            profile_script: PathBuf::from(env_or("PROFILE_SCRIPT", "models/profile_dataset.py")),
            data_dir: PathBuf::from(env_or("DATA_DIR", "data")),
            timeout_secs: env_u64("FORECAST_TIMEOUT_SECS", 120),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn history_default(&self) -> PathBuf {
        self.data_dir.join("history.csv")
    }

    pub fn future_default(&self) -> PathBuf {
        self.data_dir.join("future.csv")
    }
}

// ── Insight service (hosted LLM reasoning) ────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    /// Attempt ceiling for retryable stages (transport/timeout only).
    pub max_attempts: u32,
}

impl InsightConfig {
    fn from_env() -> Self {
        Self {
            base_url: env_or("INSIGHT_BASE_URL", "https://api.openai.com"),
            api_key: env_opt("OPENAI_API_KEY"),
            model: env_or("INSIGHT_MODEL", "gpt-4o-mini"),
            temperature: env_f32("INSIGHT_TEMPERATURE", 0.7),
            max_tokens: env_u32("INSIGHT_MAX_TOKENS", 2048),
            timeout_secs: env_u64("INSIGHT_TIMEOUT_SECS", 30),
            max_attempts: env_u32("STAGE_MAX_ATTEMPTS", 2),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}
