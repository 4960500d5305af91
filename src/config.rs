use config::{Config, ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;

use crate::core::{pricing::DEFAULT_HOURS_PER_DAY, CategoryDefaultRate, FlatDefaultRate, Matcher, PricingCalculator};
use crate::core::matcher::DEFAULT_RESULT_CAP;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub auth: AuthSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub pricing: PricingSettings,
    #[serde(default)]
    pub rates: CategoryDefaultRate,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Postgres,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageSettings {
    #[serde(default)]
    pub backend: StorageBackend,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthSettings {
    /// HS256 secret shared with the session layer
    pub jwt_secret: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    #[serde(default = "default_result_cap")]
    pub result_cap: usize,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            result_cap: default_result_cap(),
        }
    }
}

fn default_result_cap() -> usize { DEFAULT_RESULT_CAP }

#[derive(Debug, Clone, Deserialize)]
pub struct PricingSettings {
    #[serde(default = "default_flat_rate")]
    pub flat_default_rate_cents: i64,
    #[serde(default = "default_hours_per_day")]
    pub default_hours_per_day: Decimal,
}

impl Default for PricingSettings {
    fn default() -> Self {
        Self {
            flat_default_rate_cents: default_flat_rate(),
            default_hours_per_day: default_hours_per_day(),
        }
    }
}

fn default_flat_rate() -> i64 { FlatDefaultRate::default().0 }
fn default_hours_per_day() -> Decimal { Decimal::from(DEFAULT_HOURS_PER_DAY) }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with CAREMATCH_)
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., CAREMATCH__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("CAREMATCH")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        if let Ok(url) = std::env::var("DATABASE_URL") {
            builder = builder.set_override("database.url", url)?;
        }

        builder.build()?.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("CAREMATCH")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    pub fn flat_default_rate(&self) -> FlatDefaultRate {
        FlatDefaultRate(self.pricing.flat_default_rate_cents)
    }

    pub fn matcher(&self) -> Matcher {
        Matcher::new(self.matching.result_cap, self.rates)
    }

    pub fn pricing_calculator(&self) -> PricingCalculator {
        PricingCalculator::new(self.flat_default_rate(), self.pricing.default_hours_per_day)
    }
}
