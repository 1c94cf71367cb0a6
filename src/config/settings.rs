use std::env;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub compiler: CompilerConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub log: LogConfig,
}

/// Cache sizing and default entry lifetime, shared by the compiled template cache
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of entries before LRU eviction
    #[serde(default = "default_cache_max_size")]
    pub max_size: usize,
    /// Entry lifetime in seconds when `set` gets no explicit TTL
    #[serde(default = "default_cache_ttl")]
    pub default_ttl_seconds: u64,
}

/// Compiled template cache
#[derive(Debug, Clone, Deserialize)]
pub struct CompilerConfig {
    /// Lifetime of a compiled template in seconds
    #[serde(default = "default_compiler_ttl")]
    pub cache_ttl_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenderConfig {
    /// Locale used by formatting helpers when none is passed
    #[serde(default = "default_locale")]
    pub default_locale: String,
    /// ISO 4217 code used by `formatCurrency` when none is passed
    #[serde(default = "default_currency")]
    pub default_currency: String,
    /// Partials nested deeper than this are left unexpanded
    #[serde(default = "default_max_partial_depth")]
    pub max_partial_depth: usize,
    /// `#if` / `#each` blocks nested deeper than this are kept as text
    #[serde(default = "default_max_block_depth")]
    pub max_block_depth: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// "pretty" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_cache_max_size() -> usize {
    1000
}

fn default_cache_ttl() -> u64 {
    1800 // 30 minutes
}

fn default_compiler_ttl() -> u64 {
    3600 // 1 hour
}

fn default_locale() -> String {
    "en-US".to_string()
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_max_partial_depth() -> usize {
    32
}

fn default_max_block_depth() -> usize {
    64
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            .set_default("cache.max_size", default_cache_max_size() as i64)?
            .set_default("cache.default_ttl_seconds", default_cache_ttl() as i64)?
            .set_default("compiler.cache_ttl_seconds", default_compiler_ttl() as i64)?
            .set_default("render.default_locale", default_locale())?
            .set_default("render.default_currency", default_currency())?
            .set_default("render.max_partial_depth", default_max_partial_depth() as i64)?
            .set_default("render.max_block_depth", default_max_block_depth() as i64)?
            .set_default("log.format", default_log_format())?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // REPORT_ENGINE__CACHE__MAX_SIZE, REPORT_ENGINE__RENDER__DEFAULT_LOCALE, ...
            .add_source(
                Environment::with_prefix("REPORT_ENGINE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }
}

impl CacheConfig {
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_seconds)
    }
}

impl CompilerConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: default_cache_max_size(),
            default_ttl_seconds: default_cache_ttl(),
        }
    }
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            cache_ttl_seconds: default_compiler_ttl(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            default_locale: default_locale(),
            default_currency: default_currency(),
            max_partial_depth: default_max_partial_depth(),
            max_block_depth: default_max_block_depth(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: default_log_format(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let settings = Settings::default();
        assert_eq!(settings.cache.max_size, 1000);
        assert_eq!(settings.cache.default_ttl(), Duration::from_secs(30 * 60));
        assert_eq!(settings.compiler.cache_ttl(), Duration::from_secs(60 * 60));
        assert_eq!(settings.render.default_locale, "en-US");
        assert_eq!(settings.render.max_partial_depth, 32);
        assert_eq!(settings.render.max_block_depth, 64);
        assert_eq!(settings.log.format, "pretty");
    }

    #[test]
    fn test_partial_config_uses_serde_defaults() {
        let render: RenderConfig =
            serde_json::from_value(serde_json::json!({"default_currency": "EUR"})).unwrap();
        assert_eq!(render.default_currency, "EUR");
        assert_eq!(render.default_locale, "en-US");
    }
}
