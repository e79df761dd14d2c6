//! Lazy item pipelines
//!
//! A [`Producer`] hands out a fresh, pull-based sequence of items every time it
//! is iterated. [`ProducerExt::attach`] puts a list of [`Stage`]s behind it and
//! returns a [`Chain`], which is a producer again. [`ProducerExt::export`]
//! drains a producer into a [`Consumer`].
//!
//! Nothing runs ahead of demand: a stage pulls from its upstream only when
//! its own output is pulled, and a consumer that stops pulling stops the whole
//! pipeline.
//!
//! Stages and consumers are cloned and reset for every run, so a chain or a
//! consumer can be reused without one run's state leaking into the next.
//!
//! # Example
//! ```
//! use itemflow::pipeline::consumers::CollectConsumer;
//! use itemflow::pipeline::sources::IterSource;
//! use itemflow::pipeline::stages::{FilterStage, MapStage, TakeStage};
//! use itemflow::pipeline::{stages, ProducerExt};
//!
//! let chain = IterSource::new(|| 1..=100).attach(stages![
//!     FilterStage::new(|n: &i32| n % 3 == 0),
//!     MapStage::new(|n: i32| Ok(n * 10)),
//!     TakeStage::new(3),
//! ]);
//!
//! let items = chain.export(&CollectConsumer::new(), Some("demo")).unwrap();
//! assert_eq!(items, vec![30, 60, 90]);
//! ```

pub mod chain;
pub mod consumers;
pub mod core;
pub mod executor;
pub mod sources;
pub mod stages;

// Re-export main types
pub use self::chain::{Chain, ChainBuilder};
pub use self::core::{
    deferred, fuse_on_error, short_type_name, Consumer, ItemStream, Producer, ProducerExt,
    Stage, StageClone,
};
pub use crate::stages;
