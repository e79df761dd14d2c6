//! Progress reporting for item streams
//!
//! Producers report progress through a [`ProgressSink`]: one tracker per
//! traversal, advanced once for every item pulled. Sinks only observe; they
//! never alter the stream.
//!
//! The active sink is the thread-local override installed by
//! [`with_progress_sink`] if there is one, otherwise the process default
//! (an indicatif spinner unless replaced with [`set_default_sink`]).

use crate::flow_log;
use crate::logger::LogLevel;
use indicatif::{ProgressBar, ProgressStyle};
use std::cell::RefCell;
use std::sync::{Arc, Mutex, RwLock};

/// Default indicatif template for item spinners
pub const DEFAULT_TEMPLATE: &str =
    "{spinner:.green} {msg}: {pos} items [{elapsed_precise}, {per_sec}]";

/// Factory for per-traversal progress trackers
pub trait ProgressSink: Send + Sync {
    /// Start tracking a traversal described by `description`
    fn start(&self, description: &str) -> Box<dyn ProgressTracker>;
}

/// Progress of a single traversal
pub trait ProgressTracker {
    /// One more item has been pulled
    fn advance(&mut self);

    /// The traversal ended (exhausted, failed or dropped early)
    fn finish(&mut self);
}

/// Build the description shown for a producer, e.g. `"LocalSource - nightly"`
pub fn describe(name: &str, label: Option<&str>) -> String {
    match label {
        Some(label) if !label.is_empty() => format!("{} - {}", name, label),
        _ => name.to_string(),
    }
}

// ============================================================================
// indicatif spinner
// ============================================================================

/// Terminal spinner rendered with indicatif
///
/// indicatif hides the spinner when stderr is not a terminal.
#[derive(Debug, Clone)]
pub struct BarProgress {
    template: String,
}

impl BarProgress {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    fn style(&self) -> ProgressStyle {
        match ProgressStyle::with_template(&self.template) {
            Ok(style) => style,
            Err(e) => {
                flow_log!(
                    LogLevel::Warn,
                    "progress",
                    "Invalid progress template '{}': {}",
                    self.template,
                    e
                );
                ProgressStyle::default_spinner()
            }
        }
    }
}

impl Default for BarProgress {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATE)
    }
}

impl ProgressSink for BarProgress {
    fn start(&self, description: &str) -> Box<dyn ProgressTracker> {
        let bar = ProgressBar::new_spinner();
        bar.set_style(self.style());
        bar.set_message(description.to_string());
        Box::new(BarTracker { bar })
    }
}

struct BarTracker {
    bar: ProgressBar,
}

impl ProgressTracker for BarTracker {
    fn advance(&mut self) {
        self.bar.inc(1);
    }

    fn finish(&mut self) {
        self.bar.finish();
    }
}

// ============================================================================
// Log lines
// ============================================================================

/// Writes a log line every `every` items and one when the traversal ends
#[derive(Debug, Clone)]
pub struct LogProgress {
    every: u64,
}

impl LogProgress {
    pub fn new(every: u64) -> Self {
        Self {
            every: every.max(1),
        }
    }
}

impl ProgressSink for LogProgress {
    fn start(&self, description: &str) -> Box<dyn ProgressTracker> {
        Box::new(LogTracker {
            description: description.to_string(),
            every: self.every,
            count: 0,
        })
    }
}

struct LogTracker {
    description: String,
    every: u64,
    count: u64,
}

impl ProgressTracker for LogTracker {
    fn advance(&mut self) {
        self.count += 1;
        if self.count % self.every == 0 {
            flow_log!(
                LogLevel::Info,
                "progress",
                "{}: {} items",
                self.description,
                self.count
            );
        }
    }

    fn finish(&mut self) {
        flow_log!(
            LogLevel::Info,
            "progress",
            "{}: finished after {} items",
            self.description,
            self.count
        );
    }
}

// ============================================================================
// No output
// ============================================================================

/// Discards all progress
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentProgress;

impl ProgressSink for SilentProgress {
    fn start(&self, _description: &str) -> Box<dyn ProgressTracker> {
        Box::new(SilentTracker)
    }
}

struct SilentTracker;

impl ProgressTracker for SilentTracker {
    fn advance(&mut self) {}

    fn finish(&mut self) {}
}

// ============================================================================
// In-memory recording
// ============================================================================

/// Snapshot of one recorded traversal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressRecord {
    pub description: String,
    pub items: u64,
    pub finished: bool,
}

/// Keeps every traversal in memory; useful for diagnostics and tests
#[derive(Debug, Clone, Default)]
pub struct RecordingProgress {
    records: Arc<Mutex<Vec<ProgressRecord>>>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// All traversals started so far, in start order
    pub fn records(&self) -> Vec<ProgressRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    /// Descriptions of all traversals started so far
    pub fn descriptions(&self) -> Vec<String> {
        self.records().into_iter().map(|r| r.description).collect()
    }
}

impl ProgressSink for RecordingProgress {
    fn start(&self, description: &str) -> Box<dyn ProgressTracker> {
        let index = match self.records.lock() {
            Ok(mut records) => {
                records.push(ProgressRecord {
                    description: description.to_string(),
                    items: 0,
                    finished: false,
                });
                records.len() - 1
            }
            Err(_) => usize::MAX,
        };
        Box::new(RecordingTracker {
            records: self.records.clone(),
            index,
        })
    }
}

struct RecordingTracker {
    records: Arc<Mutex<Vec<ProgressRecord>>>,
    index: usize,
}

impl RecordingTracker {
    fn update(&self, f: impl FnOnce(&mut ProgressRecord)) {
        if let Ok(mut records) = self.records.lock() {
            if let Some(record) = records.get_mut(self.index) {
                f(record);
            }
        }
    }
}

impl ProgressTracker for RecordingTracker {
    fn advance(&mut self) {
        self.update(|record| record.items += 1);
    }

    fn finish(&mut self) {
        self.update(|record| record.finished = true);
    }
}

// ============================================================================
// Sink selection
// ============================================================================

lazy_static::lazy_static! {
    static ref DEFAULT_SINK: RwLock<Arc<dyn ProgressSink>> =
        RwLock::new(Arc::new(BarProgress::default()));
}

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<Arc<dyn ProgressSink>>> = const { RefCell::new(None) };
}

/// Replace the process-wide default sink
pub fn set_default_sink(sink: Arc<dyn ProgressSink>) {
    let mut default = DEFAULT_SINK
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *default = sink;
}

/// The sink producers on this thread report to
pub fn current_sink() -> Arc<dyn ProgressSink> {
    if let Some(sink) = SINK_OVERRIDE.with(|cell| cell.borrow().clone()) {
        return sink;
    }
    DEFAULT_SINK
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone()
}

/// Run `f` with `sink` overriding the default sink on this thread
pub fn with_progress_sink<R>(sink: Arc<dyn ProgressSink>, f: impl FnOnce() -> R) -> R {
    struct Restore(Option<Arc<dyn ProgressSink>>);

    impl Drop for Restore {
        fn drop(&mut self) {
            let previous = self.0.take();
            SINK_OVERRIDE.with(|cell| *cell.borrow_mut() = previous);
        }
    }

    let _restore = Restore(SINK_OVERRIDE.with(|cell| cell.replace(Some(sink))));
    f()
}
