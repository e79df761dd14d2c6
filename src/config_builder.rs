use crate::config::{PipelineConfig, ProgressConfig, ProgressMode};
use crate::error::{FlowError, FlowResult};
use crate::logger::LogLevel;

/// Builder for constructing PipelineConfig instances with a fluent API
///
/// # Example
/// ```
/// use itemflow::config::ProgressMode;
/// use itemflow::config_builder::PipelineConfigBuilder;
/// use itemflow::logger::LogLevel;
///
/// let config = PipelineConfigBuilder::new()
///     .progress_mode(ProgressMode::Log)
///     .log_every(500)
///     .log_level(LogLevel::Debug)
///     .build()
///     .unwrap();
/// assert_eq!(config.progress.log_every, 500);
/// ```
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    mode: Option<ProgressMode>,
    template: Option<String>,
    log_every: Option<u64>,
    log_level: Option<LogLevel>,
}

impl PipelineConfigBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set how progress is reported
    pub fn progress_mode(mut self, mode: ProgressMode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Set the indicatif template for `bar` mode
    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    /// Set how many items pass between two log lines in `log` mode
    pub fn log_every(mut self, every: u64) -> Self {
        self.log_every = Some(every);
        self
    }

    /// Set the minimum log level
    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.log_level = Some(level);
        self
    }

    /// Build the PipelineConfig instance
    ///
    /// # Errors
    /// Returns `FlowError::BuilderError` if the template is empty or cannot be
    /// parsed, or if `log_every` is zero
    pub fn build(self) -> FlowResult<PipelineConfig> {
        let defaults = ProgressConfig::default();
        let progress = ProgressConfig {
            mode: self.mode.unwrap_or(defaults.mode),
            template: self.template.unwrap_or(defaults.template),
            log_every: self.log_every.unwrap_or(defaults.log_every),
        };
        progress.validate().map_err(FlowError::BuilderError)?;

        Ok(PipelineConfig {
            progress,
            log_level: self.log_level.unwrap_or_default(),
        })
    }
}
