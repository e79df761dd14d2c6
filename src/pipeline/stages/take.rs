use crate::error::FlowResult;
use crate::pipeline::{ItemStream, Stage};

/// Stage that passes the first `limit` items of every run
///
/// Once the limit is reached the upstream is no longer pulled. The count is
/// run state and starts from zero after every reset.
#[derive(Debug, Clone)]
pub struct TakeStage {
    limit: usize,
    taken: usize,
}

impl TakeStage {
    pub fn new(limit: usize) -> Self {
        Self { limit, taken: 0 }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

impl<T: 'static> Stage<T> for TakeStage {
    fn reset(&mut self) {
        self.taken = 0;
    }

    fn transform<'a>(self: Box<Self>, upstream: ItemStream<'a, T>) -> ItemStream<'a, T> {
        Box::new(TakeRun {
            stage: self,
            upstream,
        })
    }
}

struct TakeRun<'a, T> {
    stage: Box<TakeStage>,
    upstream: ItemStream<'a, T>,
}

impl<T> Iterator for TakeRun<'_, T> {
    type Item = FlowResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.stage.taken >= self.stage.limit {
            return None;
        }
        let item = self.upstream.next()?;
        if item.is_ok() {
            self.stage.taken += 1;
        }
        Some(item)
    }
}
