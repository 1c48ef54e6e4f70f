/// Runtime configuration for the degree-day pipeline.
///
/// Loaded from a TOML file (`degday.toml` by default). Every field has a
/// working default, so a missing file runs the built-in station set against
/// the production endpoints with outputs in the working directory.

use crate::climatology::MissingValuePolicy;
use crate::ingest::snap::{SNAP_DEGREE_DAYS_BASE_URL, SNAP_PLACES_BASE_URL};
use crate::logging::LogLevel;
use crate::model::{DegDayError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default config filename, looked up in the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "degday.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub paths: PathsConfig,
    pub sources: SourcesConfig,
    pub pipeline: PipelineConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    /// Directory of per-station daily-normals CSVs.
    pub station_csv_dir: PathBuf,
    /// Directory for derived tables and projection JSON.
    pub output_dir: PathBuf,
    /// Optional station lookup CSV replacing the built-in registry.
    pub station_lookup: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourcesConfig {
    /// Host serving the SNAP community lookup.
    pub snap_places_url: String,
    /// Host serving the SNAP degree-day endpoint.
    pub snap_degree_days_url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// How a day with a missing temperature extreme is handled:
    /// "skip" or "fail-station".
    pub missing_value_policy: String,
    /// Pause between WRCC requests, in milliseconds.
    pub scrape_delay_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Minimum level: "debug", "info", "warn", "error".
    pub level: String,
    /// Optional log file appended to alongside console output.
    pub file: Option<String>,
    /// Timestamps on console lines.
    pub console_timestamps: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            paths: PathsConfig::default(),
            sources: SourcesConfig::default(),
            pipeline: PipelineConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        PathsConfig {
            station_csv_dir: PathBuf::from("wrcc_station_csvs"),
            output_dir: PathBuf::from("output"),
            station_lookup: None,
        }
    }
}

impl Default for SourcesConfig {
    fn default() -> Self {
        SourcesConfig {
            snap_places_url: SNAP_PLACES_BASE_URL.to_string(),
            snap_degree_days_url: SNAP_DEGREE_DAYS_BASE_URL.to_string(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            missing_value_policy: "skip".to_string(),
            scrape_delay_ms: 1000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
            file: None,
            console_timestamps: false,
        }
    }
}

impl Config {
    /// Parses a config from TOML text.
    pub fn from_toml(text: &str) -> Result<Config> {
        toml::from_str(text).map_err(|e| DegDayError::Parse(format!("config: {}", e)))
    }

    /// Loads a config file. A missing file at the default path yields the
    /// defaults; an explicitly requested file must exist.
    pub fn load(path: &Path, explicit: bool) -> Result<Config> {
        match std::fs::read_to_string(path) {
            Ok(text) => Config::from_toml(&text),
            Err(e) if !explicit && e.kind() == std::io::ErrorKind::NotFound => {
                Ok(Config::default())
            }
            Err(e) => Err(DegDayError::Io(format!(
                "config {}: {}",
                path.display(),
                e
            ))),
        }
    }

    /// Resolved missing-value policy.
    pub fn missing_value_policy(&self) -> Result<MissingValuePolicy> {
        MissingValuePolicy::from_name(&self.pipeline.missing_value_policy).ok_or_else(|| {
            DegDayError::Parse(format!(
                "config: unknown missing_value_policy '{}'",
                self.pipeline.missing_value_policy
            ))
        })
    }

    /// Resolved minimum log level.
    pub fn log_level(&self) -> LogLevel {
        LogLevel::from_name(&self.logging.level)
    }

    /// Path of the observed climatology table under the output directory.
    pub fn climatology_table_path(&self) -> PathBuf {
        self.paths.output_dir.join("degree_day_metrics.csv")
    }

    /// Path of the wide model-baseline table under the output directory.
    pub fn baseline_table_path(&self) -> PathBuf {
        self.paths.output_dir.join("model_climatologies.csv")
    }
}
