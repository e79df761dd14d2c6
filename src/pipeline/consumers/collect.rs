use crate::error::FlowResult;
use crate::pipeline::{Consumer, ItemStream};

/// Collects items into a `Vec`
///
/// With a limit, stops pulling as soon as that many items have been collected;
/// nothing upstream runs for the items that were never requested.
#[derive(Debug, Clone, Copy, Default)]
pub struct CollectConsumer {
    limit: Option<usize>,
}

impl CollectConsumer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect at most `limit` items
    pub fn with_limit(limit: usize) -> Self {
        Self { limit: Some(limit) }
    }
}

impl<T> Consumer<T> for CollectConsumer {
    type Output = Vec<T>;

    fn consume(&mut self, items: ItemStream<'_, T>) -> FlowResult<Vec<T>> {
        match self.limit {
            Some(limit) => items.take(limit).collect(),
            None => items.collect(),
        }
    }
}

/// Counts items
///
/// The running count is run state; it starts from zero after every reset.
#[derive(Debug, Clone, Default)]
pub struct CountConsumer {
    count: u64,
}

impl CountConsumer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Items counted by the last drain of this instance
    pub fn count(&self) -> u64 {
        self.count
    }
}

impl<T> Consumer<T> for CountConsumer {
    type Output = u64;

    fn reset(&mut self) {
        self.count = 0;
    }

    fn consume(&mut self, items: ItemStream<'_, T>) -> FlowResult<u64> {
        for item in items {
            item?;
            self.count += 1;
        }
        Ok(self.count)
    }
}
