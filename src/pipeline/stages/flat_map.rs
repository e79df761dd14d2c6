use crate::error::FlowResult;
use crate::pipeline::{ItemStream, Stage};
use std::borrow::Cow;

/// Stage that expands every item into zero or more items
///
/// The outputs of one input are emitted before the next input is pulled.
/// There is no cap on how many items a single input may expand to; put a
/// [`TakeStage`](super::TakeStage) after it to bound a run.
#[derive(Clone)]
pub struct FlatMapStage<F> {
    name: Option<String>,
    f: F,
}

impl<F> FlatMapStage<F> {
    /// Create an expanding stage
    pub fn new<T>(f: F) -> Self
    where
        F: Fn(T) -> FlowResult<Vec<T>>,
    {
        Self { name: None, f }
    }

    /// Name the stage for logs
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl<T, F> Stage<T> for FlatMapStage<F>
where
    T: 'static,
    F: Fn(T) -> FlowResult<Vec<T>> + Clone + Send + Sync + 'static,
{
    fn name(&self) -> Cow<'_, str> {
        match &self.name {
            Some(name) => Cow::Borrowed(name),
            None => Cow::Borrowed("FlatMapStage"),
        }
    }

    fn transform<'a>(self: Box<Self>, upstream: ItemStream<'a, T>) -> ItemStream<'a, T> {
        Box::new(upstream.flat_map(move |item| {
            let expanded: Box<dyn Iterator<Item = FlowResult<T>>> =
                match item.and_then(|item| (self.f)(item)) {
                    Ok(items) => Box::new(items.into_iter().map(Ok)),
                    Err(e) => Box::new(std::iter::once(Err(e))),
                };
            expanded
        }))
    }
}
