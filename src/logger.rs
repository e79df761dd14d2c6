use chrono::{DateTime, Utc};
use crossbeam_channel::{bounded, Receiver, Sender};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU8, Ordering};

/// Number of entries kept in the in-memory log buffer
const LOG_CAPACITY: usize = 1000;

/// Structured fields attached to a log entry
pub type LogContext = Map<String, Value>;

/// Log level enum for type-safe logging
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug = 0,
    Info = 1,
    Warn = 2,
    Error = 3,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => LogLevel::Debug,
            2 => LogLevel::Warn,
            3 => LogLevel::Error,
            _ => LogLevel::Info,
        }
    }
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Info
    }
}

/// One recorded log line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    /// Pipeline component that emitted the entry ("chain", "export", ...)
    pub target: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<LogContext>,
}

impl LogEntry {
    /// Look up a context field
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.context.as_ref().and_then(|context| context.get(key))
    }
}

/// Most recent entries, oldest first
struct LogBuffer {
    entries: VecDeque<LogEntry>,
    capacity: usize,
}

impl LogBuffer {
    fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    fn push(&mut self, entry: LogEntry) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    fn snapshot(&self) -> Vec<LogEntry> {
        self.entries.iter().cloned().collect()
    }
}

/// Requests handled by the buffer thread
enum LogCommand {
    Record(LogEntry),
    Snapshot(Sender<Vec<LogEntry>>),
}

/// In-memory log of pipeline activity
///
/// Recording never blocks: entries go through a bounded channel to a
/// background thread that owns the buffer, and are dropped when the channel
/// is full.
pub struct Logger {
    sender: Sender<LogCommand>,
    min_level: AtomicU8,
}

impl Logger {
    pub fn new() -> Self {
        let (sender, receiver) = bounded(LOG_CAPACITY);
        std::thread::spawn(move || run_buffer(receiver));

        Self {
            sender,
            min_level: AtomicU8::new(LogLevel::Debug as u8),
        }
    }

    pub fn log(&self, level: LogLevel, target: &str, message: &str) {
        self.record(level, target, message, None);
    }

    /// Record an entry carrying structured fields
    pub fn log_with_context(
        &self,
        level: LogLevel,
        target: &str,
        message: &str,
        context: LogContext,
    ) {
        self.record(level, target, message, Some(context));
    }

    fn record(&self, level: LogLevel, target: &str, message: &str, context: Option<LogContext>) {
        if level < self.min_level() {
            return;
        }

        let _ = self.sender.try_send(LogCommand::Record(LogEntry {
            timestamp: Utc::now(),
            level,
            target: target.to_string(),
            message: message.to_string(),
            context,
        }));
    }

    pub fn set_min_level(&self, level: LogLevel) {
        self.min_level.store(level as u8, Ordering::Relaxed);
    }

    pub fn min_level(&self) -> LogLevel {
        LogLevel::from_u8(self.min_level.load(Ordering::Relaxed))
    }

    /// Entries recorded so far, oldest first
    pub fn entries(&self) -> Vec<LogEntry> {
        let (reply_tx, reply_rx) = bounded(1);
        if self.sender.send(LogCommand::Snapshot(reply_tx)).is_err() {
            return Vec::new();
        }
        reply_rx.recv().unwrap_or_default()
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

fn run_buffer(receiver: Receiver<LogCommand>) {
    let mut buffer = LogBuffer::new(LOG_CAPACITY);
    for command in receiver {
        match command {
            LogCommand::Record(entry) => buffer.push(entry),
            LogCommand::Snapshot(reply) => {
                let _ = reply.send(buffer.snapshot());
            }
        }
    }
}

// Global logger instance
lazy_static::lazy_static! {
    pub static ref LOGGER: Logger = Logger::new();
}

/// Record `message` in [`LOGGER`] and forward it to `tracing`
pub fn emit(level: LogLevel, target: &str, message: &str, context: Option<LogContext>) {
    let fields = context
        .as_ref()
        .map(|context| Value::Object(context.clone()).to_string());
    let fields = fields.as_deref();

    match level {
        LogLevel::Error => tracing::error!(component = target, context = fields, "{}", message),
        LogLevel::Warn => tracing::warn!(component = target, context = fields, "{}", message),
        LogLevel::Info => tracing::info!(component = target, context = fields, "{}", message),
        LogLevel::Debug => tracing::debug!(component = target, context = fields, "{}", message),
    }

    match context {
        Some(context) => LOGGER.log_with_context(level, target, message, context),
        None => LOGGER.log(level, target, message),
    }
}

/// Install a `tracing` fmt subscriber filtered by `filter` (e.g. "itemflow=debug").
///
/// Returns `false` when a global subscriber was already installed.
pub fn init_tracing(filter: &str) -> bool {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}

/// `flow_log!(level, target, "format", args...)`
#[macro_export]
macro_rules! flow_log {
    ($level:expr, $target:expr, $($arg:tt)*) => {
        $crate::logger::emit($level, $target, &format!($($arg)*), None)
    };
}
