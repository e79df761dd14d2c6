use crate::pipeline::{ItemStream, Producer};

/// Runs several producers one after the other
///
/// Each member is iterated through its own [`Producer::iterate`], so each keeps
/// its own progress reporting (or, for chains, its own stage runs). A member
/// is only started once the previous one is exhausted.
pub struct ConcatSource<T: 'static> {
    sources: Vec<Box<dyn Producer<Item = T>>>,
}

impl<T: 'static> ConcatSource<T> {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    /// Append a producer
    pub fn with<P>(mut self, source: P) -> Self
    where
        P: Producer<Item = T> + 'static,
    {
        self.sources.push(Box::new(source));
        self
    }

    /// Append an already boxed producer
    pub fn with_boxed(mut self, source: Box<dyn Producer<Item = T>>) -> Self {
        self.sources.push(source);
        self
    }

    /// Get the number of member producers
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl<T: 'static> Default for ConcatSource<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> Producer for ConcatSource<T> {
    type Item = T;

    fn produce_raw(&self) -> ItemStream<'_, T> {
        Box::new(self.sources.iter().flat_map(|source| source.iterate()))
    }
}
