//! Composable, lazy item pipelines
//!
//! Producers hand out fresh item sequences on demand, stages transform them
//! one item at a time and consumers drain them into a result. See
//! [`pipeline`] for the core contracts and the bundled sources, stages and
//! consumers.

pub mod config;
pub mod config_builder;
pub mod error;
pub mod label;
pub mod logger;
pub mod pipeline;
pub mod progress;

pub use config::{PipelineConfig, ProgressConfig, ProgressMode};
pub use config_builder::PipelineConfigBuilder;
pub use error::{FlowError, FlowResult};
pub use label::{current_label, with_label, LabelScope};
pub use pipeline::{Chain, ChainBuilder, Consumer, ItemStream, Producer, ProducerExt, Stage};
