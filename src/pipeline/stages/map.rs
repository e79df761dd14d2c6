use crate::error::FlowResult;
use crate::pipeline::{ItemStream, Stage};
use std::borrow::Cow;

/// Stage that replaces every item with the result of a function
///
/// An `Err` from the function becomes the stream's error at that position.
///
/// # Example
/// ```
/// use itemflow::pipeline::sources::IterSource;
/// use itemflow::pipeline::stages::MapStage;
/// use itemflow::pipeline::{stages, Producer, ProducerExt};
///
/// let chain = IterSource::new(|| vec!["a".to_string(), "b".to_string()])
///     .attach(stages![MapStage::new(|s: String| Ok(s.to_uppercase())).named("Upper")]);
///
/// let items: Vec<String> = chain.iterate().collect::<Result<_, _>>().unwrap();
/// assert_eq!(items, vec!["A", "B"]);
/// ```
#[derive(Clone)]
pub struct MapStage<F> {
    name: Option<String>,
    f: F,
}

impl<F> MapStage<F> {
    /// Create a map stage
    pub fn new<T>(f: F) -> Self
    where
        F: Fn(T) -> FlowResult<T>,
    {
        Self { name: None, f }
    }

    /// Name the stage for logs
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl<T, F> Stage<T> for MapStage<F>
where
    T: 'static,
    F: Fn(T) -> FlowResult<T> + Clone + Send + Sync + 'static,
{
    fn name(&self) -> Cow<'_, str> {
        match &self.name {
            Some(name) => Cow::Borrowed(name),
            None => Cow::Borrowed("MapStage"),
        }
    }

    fn transform<'a>(self: Box<Self>, upstream: ItemStream<'a, T>) -> ItemStream<'a, T> {
        Box::new(upstream.map(move |item| item.and_then(|item| (self.f)(item))))
    }
}
