use std::env;
use std::time::Duration;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // LLM provider
    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_base_url: Option<String>,
    pub openai_timeout: Duration,

    // Inbound API authentication
    pub api_key: String,

    // Durable store
    pub database_url: String,

    // Fast cache tier (redis:// for the network backend, memory:// for the
    // in-process map)
    pub fast_cache_url: String,

    // Web server
    pub web_host: String,
    pub web_port: u16,

    // Pipeline tuning
    pub scrape_concurrency: usize,
    pub browser_pool_size: usize,
    pub cache_ttl_scraping: Duration,
    pub rate_limit_max: u32,
    pub request_timeout: Duration,
    pub run_expiration_days: i64,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing.
    pub fn from_env() -> Self {
        Self {
            openai_api_key: required_env("OPENAI_API_KEY"),
            openai_model: env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            openai_base_url: env::var("OPENAI_BASE_URL").ok(),
            openai_timeout: Duration::from_secs(env_parse("OPENAI_TIMEOUT", 60)),
            api_key: required_env("API_KEY"),
            database_url: required_env("DATABASE_URL"),
            fast_cache_url: required_env("FAST_CACHE_URL"),
            web_host: env::var("WEB_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            web_port: env::var("WEB_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .expect("WEB_PORT must be a number"),
            scrape_concurrency: env_parse("SCRAPE_CONCURRENCY", 5),
            browser_pool_size: env_parse("BROWSER_POOL_SIZE", 3),
            cache_ttl_scraping: Duration::from_secs(env_parse("CACHE_TTL_SCRAPING", 86_400)),
            rate_limit_max: env_parse("RATE_LIMIT_MAX", 20),
            request_timeout: Duration::from_millis(env_parse("REQUEST_TIMEOUT", 120_000)),
            run_expiration_days: env_parse("RUN_EXPIRATION_DAYS", 7),
        }
    }

    /// Log presence and length of each sensitive variable, never the value.
    pub fn log_redacted(&self) {
        let vars = [
            ("OPENAI_API_KEY", &self.openai_api_key),
            ("API_KEY", &self.api_key),
            ("DATABASE_URL", &self.database_url),
            ("FAST_CACHE_URL", &self.fast_cache_url),
        ];
        for (name, value) in vars {
            if value.is_empty() {
                tracing::info!("{name} = (empty)");
            } else {
                tracing::info!("{name} = ({} chars)", value.len());
            }
        }
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_parse_falls_back_on_missing_or_garbage() {
        assert_eq!(env_parse("BRANDSCOPE_TEST_UNSET_VAR", 42u64), 42);
        env::set_var("BRANDSCOPE_TEST_GARBAGE_VAR", "not-a-number");
        assert_eq!(env_parse("BRANDSCOPE_TEST_GARBAGE_VAR", 7usize), 7);
        env::remove_var("BRANDSCOPE_TEST_GARBAGE_VAR");
    }
}
