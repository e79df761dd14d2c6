use crate::error::{FlowError, FlowResult};
use crate::logger::{LogLevel, LOGGER};
use crate::progress::{self, BarProgress, LogProgress, ProgressSink, SilentProgress};
use indicatif::ProgressStyle;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Process-wide pipeline settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PipelineConfig {
    /// How producers report progress
    pub progress: ProgressConfig,

    /// Minimum level kept by the in-memory logger
    pub log_level: LogLevel,
}

/// Progress reporting settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressConfig {
    pub mode: ProgressMode,

    /// indicatif template used in `bar` mode
    pub template: String,

    /// Items between two log lines in `log` mode
    pub log_every: u64,
}

/// Progress output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressMode {
    /// Terminal spinner
    Bar,

    /// Periodic log lines
    Log,

    /// No progress output
    Off,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            mode: ProgressMode::Bar,
            template: progress::DEFAULT_TEMPLATE.to_string(),
            log_every: 1000,
        }
    }
}

impl ProgressConfig {
    /// Check the template and the log interval
    ///
    /// Returns a description of the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        if self.template.trim().is_empty() {
            return Err("progress template must not be empty".to_string());
        }
        if let Err(e) = ProgressStyle::with_template(&self.template) {
            return Err(format!("Invalid progress template '{}': {}", self.template, e));
        }
        if self.log_every == 0 {
            return Err("log_every must be greater than zero".to_string());
        }
        Ok(())
    }

    /// Build the sink described by this configuration
    pub fn sink(&self) -> Arc<dyn ProgressSink> {
        match self.mode {
            ProgressMode::Bar => Arc::new(BarProgress::new(self.template.clone())),
            ProgressMode::Log => Arc::new(LogProgress::new(self.log_every)),
            ProgressMode::Off => Arc::new(SilentProgress),
        }
    }
}

impl PipelineConfig {
    /// Parse a configuration from JSON; missing fields take their defaults
    ///
    /// The result is checked the same way [`PipelineConfigBuilder::build`]
    /// checks its input.
    ///
    /// [`PipelineConfigBuilder::build`]: crate::config_builder::PipelineConfigBuilder::build
    pub fn from_json_str(json: &str) -> FlowResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| FlowError::ConfigError(format!("Invalid pipeline config: {}", e)))?;
        config.progress.validate().map_err(FlowError::ConfigError)?;
        Ok(config)
    }

    /// Load a configuration file
    pub fn load(path: &Path) -> FlowResult<Self> {
        let json = fs::read_to_string(path).map_err(|e| {
            FlowError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&json)
    }

    /// Save the configuration as pretty-printed JSON
    pub fn save(&self, path: &Path) -> FlowResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Build the progress sink this configuration asks for
    pub fn progress_sink(&self) -> Arc<dyn ProgressSink> {
        self.progress.sink()
    }

    /// Install the progress sink as the process default and set the log level
    pub fn apply(&self) {
        progress::set_default_sink(self.progress_sink());
        LOGGER.set_min_level(self.log_level);
    }
}
