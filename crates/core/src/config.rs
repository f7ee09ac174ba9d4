use chrono::Offset;
use serde::Deserialize;
use std::path::Path;

/// Root application configuration. Loaded from an optional TOML file and
/// environment variables with the prefix `ENGAGEMENT_INSIGHTS__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub trend: TrendConfig,
    #[serde(default)]
    pub query: QueryDefaults,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrendConfig {
    /// Window used when the query does not bound the time range.
    #[serde(default = "default_trend_days")]
    pub default_days: u32,
    /// Offset from UTC that defines calendar-day boundaries.
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

/// Selectors used when a request does not carry its own.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryDefaults {
    #[serde(default = "default_time_range")]
    pub time_range: String,
    #[serde(default = "default_channel")]
    pub channel: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_filter")]
    pub filter: String,
    #[serde(default = "default_log_json")]
    pub json: bool,
}

// Default functions
fn default_trend_days() -> u32 {
    7
}
fn default_time_range() -> String {
    "7d".to_string()
}
fn default_channel() -> String {
    "all".to_string()
}
fn default_log_filter() -> String {
    "engagement_insights=info,insights_reporting=info,insights_core=info".to_string()
}
fn default_log_json() -> bool {
    true
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            default_days: default_trend_days(),
            utc_offset_minutes: 0,
        }
    }
}

impl Default for QueryDefaults {
    fn default() -> Self {
        Self {
            time_range: default_time_range(),
            channel: default_channel(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: default_log_json(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            trend: TrendConfig::default(),
            query: QueryDefaults::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl TrendConfig {
    /// Calendar timezone for day bucketing. Out-of-range offsets fall back to UTC.
    pub fn offset(&self) -> chrono::FixedOffset {
        chrono::FixedOffset::east_opt(self.utc_offset_minutes.saturating_mul(60))
            .unwrap_or_else(|| {
                tracing::warn!(
                    utc_offset_minutes = self.utc_offset_minutes,
                    "Invalid UTC offset, using UTC"
                );
                chrono::Utc.fix()
            })
    }
}

impl AppConfig {
    /// Load configuration from an optional file and environment variables.
    /// Environment values win over the file.
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix("ENGAGEMENT_INSIGHTS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        config.try_deserialize()
    }
}
