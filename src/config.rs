use std::env;
use std::path::PathBuf;

use crate::error::ConfigError;

pub const ENV_NAME_VAR: &str = "env";
pub const LOOKBACK_DAYS_VAR: &str = "LOOKBACK_DAYS";
pub const SCRATCH_DIR_VAR: &str = "SCRATCH_DIR";
pub const PATH_STYLE_VAR: &str = "USE_PATH_STYLE_BUCKETS";

pub const BUCKET_SUFFIX: &str = "-analytics-quicksight-usage";
pub const REPORT_KEY_PREFIX: &str = "quicksight-usage-";
pub const QUICKSIGHT_EVENT_SOURCE: &str = "quicksight.amazonaws.com";
pub const DEFAULT_LOOKBACK_DAYS: u32 = 31;
pub const DEFAULT_SCRATCH_DIR: &str = "/tmp";

/// Everything the exporter needs to know about its environment, resolved once at cold start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExporterConfig {
    pub bucket: String,
    pub key_prefix: String,
    pub event_source: String,
    pub lookback_days: u32,
    pub scratch_dir: PathBuf,
    pub use_path_style_buckets: bool,
}

impl ExporterConfig {
    pub fn for_environment(env_name: &str) -> Self {
        Self {
            bucket: format!("{}{}", env_name, BUCKET_SUFFIX),
            key_prefix: REPORT_KEY_PREFIX.to_string(),
            event_source: QUICKSIGHT_EVENT_SOURCE.to_string(),
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            scratch_dir: PathBuf::from(DEFAULT_SCRATCH_DIR),
            use_path_style_buckets: false,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env_name = lookup(ENV_NAME_VAR)
            .filter(|value| !value.trim().is_empty())
            .ok_or(ConfigError::Missing(ENV_NAME_VAR))?;

        let mut config = Self::for_environment(env_name.trim());

        if let Some(value) = lookup(LOOKBACK_DAYS_VAR) {
            config.lookback_days = match value.trim().parse::<u32>() {
                Ok(days) if days > 0 => days,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: LOOKBACK_DAYS_VAR,
                        value,
                    });
                }
            };
        }

        if let Some(dir) = lookup(SCRATCH_DIR_VAR).filter(|dir| !dir.is_empty()) {
            config.scratch_dir = PathBuf::from(dir);
        }

        config.use_path_style_buckets = lookup(PATH_STYLE_VAR)
            .map(|var| var.to_lowercase() == "true")
            .unwrap_or(false);

        Ok(config)
    }
}
