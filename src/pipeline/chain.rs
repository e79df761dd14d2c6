use super::core::{deferred, fuse_on_error, ItemStream, Producer, Stage};
use crate::flow_log;
use crate::logger::LogLevel;
use std::borrow::Cow;

/// A producer whose items are another producer's items run through stages
///
/// The upstream and the stage list are fixed at construction. Each call to
/// [`Producer::iterate`] clones and resets every stage, so runs of the same
/// chain never share stage state. Nothing is cached between runs: each
/// traversal iterates the upstream again.
///
/// Chains are producers themselves and can be attached to again.
///
/// # Example
/// ```
/// use itemflow::pipeline::sources::IterSource;
/// use itemflow::pipeline::stages::{FilterStage, MapStage};
/// use itemflow::pipeline::{stages, Producer, ProducerExt};
///
/// let chain = IterSource::new(|| 1..=3).attach(stages![
///     FilterStage::new(|n: &i32| n % 2 == 0),
///     MapStage::new(|n: i32| Ok(n * 2)),
/// ]);
///
/// let items: Vec<i32> = chain.iterate().collect::<Result<_, _>>().unwrap();
/// assert_eq!(items, vec![4]);
/// ```
pub struct Chain<P: Producer> {
    source: P,
    stages: Vec<Box<dyn Stage<P::Item>>>,
}

impl<P: Producer> Chain<P> {
    /// Create a chain; prefer [`ProducerExt::attach`](super::ProducerExt::attach)
    pub fn new(source: P, stages: Vec<Box<dyn Stage<P::Item>>>) -> Self {
        Self { source, stages }
    }

    /// Start a chain builder on top of `source`
    pub fn builder(source: P) -> ChainBuilder<P> {
        ChainBuilder::new(source)
    }

    /// The upstream producer
    pub fn source(&self) -> &P {
        &self.source
    }

    /// Get the number of stages
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Stage names in transformation order
    pub fn stage_names(&self) -> Vec<String> {
        self.stages.iter().map(|s| s.name().into_owned()).collect()
    }
}

impl<P: Producer> Producer for Chain<P> {
    type Item = P::Item;

    fn name(&self) -> Cow<'_, str> {
        Cow::Owned(format!("Chain({})", self.source.name()))
    }

    /// Stage copies are made and the upstream is started on the first pull
    fn produce_raw(&self) -> ItemStream<'_, Self::Item> {
        deferred(move || {
            flow_log!(
                LogLevel::Debug,
                "chain",
                "Starting chain over '{}' with {} stages: [{}]",
                self.source.name(),
                self.stages.len(),
                self.stage_names().join(", ")
            );

            let mut stream = self.source.iterate();
            for stage in &self.stages {
                let mut run = stage.clone_stage();
                run.reset();
                stream = fuse_on_error(run.transform(stream));
            }
            stream
        })
    }

    /// The chain is not progress-decorated itself; its upstream is.
    fn iterate(&self) -> ItemStream<'_, Self::Item> {
        self.produce_raw()
    }
}

/// Builder for constructing chains one stage at a time
pub struct ChainBuilder<P: Producer> {
    source: P,
    stages: Vec<Box<dyn Stage<P::Item>>>,
}

impl<P: Producer> ChainBuilder<P> {
    /// Create a new chain builder
    pub fn new(source: P) -> Self {
        Self {
            source,
            stages: Vec::new(),
        }
    }

    /// Add a stage to the chain
    pub fn stage<S: Stage<P::Item>>(mut self, stage: S) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Add a boxed stage to the chain
    pub fn boxed_stage(mut self, stage: Box<dyn Stage<P::Item>>) -> Self {
        self.stages.push(stage);
        self
    }

    /// Build the chain
    pub fn build(self) -> Chain<P> {
        Chain::new(self.source, self.stages)
    }
}
