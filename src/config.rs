use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use url::Url;

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_base_ms: 1000,
            timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

impl FetchConfig {
    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_url: Url,
    pub session_file: PathBuf,
    pub fetch: FetchConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let raw_url =
            std::env::var("API_URL").unwrap_or_else(|_| "http://localhost:3000".into());
        let api_url = Url::parse(&raw_url).with_context(|| format!("parse API_URL {}", raw_url))?;

        let session_file = std::env::var("SESSION_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| std::env::temp_dir().join("recipebook-session.json"));

        let defaults = FetchConfig::default();
        let fetch = FetchConfig {
            max_retries: env_or("FETCH_MAX_RETRIES", defaults.max_retries),
            backoff_base_ms: env_or("FETCH_BACKOFF_BASE_MS", defaults.backoff_base_ms),
            timeout_secs: env_or("HTTP_TIMEOUT_SECS", defaults.timeout_secs),
            connect_timeout_secs: env_or(
                "HTTP_CONNECT_TIMEOUT_SECS",
                defaults.connect_timeout_secs,
            ),
        };

        Ok(Self {
            api_url,
            session_file,
            fetch,
        })
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
