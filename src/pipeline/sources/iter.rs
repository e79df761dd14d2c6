use crate::error::FlowResult;
use crate::pipeline::{ItemStream, Producer};
use std::marker::PhantomData;

/// Producer backed by a factory closure
///
/// The factory is called once per traversal, so every traversal starts from
/// the beginning.
///
/// # Example
/// ```
/// use itemflow::pipeline::sources::IterSource;
/// use itemflow::pipeline::Producer;
///
/// let source = IterSource::new(|| vec!["a", "b"]);
/// assert_eq!(source.iterate().count(), 2);
/// assert_eq!(source.iterate().count(), 2);
/// ```
#[derive(Clone)]
pub struct IterSource<F> {
    factory: F,
}

impl<F, I> IterSource<F>
where
    F: Fn() -> I,
    I: IntoIterator,
{
    pub fn new(factory: F) -> Self {
        Self { factory }
    }
}

impl<F, I> Producer for IterSource<F>
where
    F: Fn() -> I,
    I: IntoIterator,
    I::IntoIter: 'static,
    I::Item: 'static,
{
    type Item = I::Item;

    fn produce_raw(&self) -> ItemStream<'_, Self::Item> {
        Box::new((self.factory)().into_iter().map(Ok))
    }
}

/// Producer backed by a factory of fallible items
///
/// An `Err` from the factory's iterator ends the traversal with that error.
#[derive(Clone)]
pub struct TrySource<F> {
    factory: F,
}

impl<F, I, T> TrySource<F>
where
    F: Fn() -> I,
    I: IntoIterator<Item = FlowResult<T>>,
{
    pub fn new(factory: F) -> Self {
        Self { factory }
    }
}

impl<F, I, T> Producer for TrySource<F>
where
    F: Fn() -> I,
    I: IntoIterator<Item = FlowResult<T>>,
    I::IntoIter: 'static,
    T: 'static,
{
    type Item = T;

    fn produce_raw(&self) -> ItemStream<'_, T> {
        Box::new((self.factory)().into_iter())
    }
}

/// Producer without items
pub struct EmptySource<T> {
    _item: PhantomData<fn() -> T>,
}

impl<T> EmptySource<T> {
    pub fn new() -> Self {
        Self { _item: PhantomData }
    }
}

impl<T> Default for EmptySource<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for EmptySource<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T: 'static> Producer for EmptySource<T> {
    type Item = T;

    fn produce_raw(&self) -> ItemStream<'_, T> {
        Box::new(std::iter::empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FlowError;
    use crate::pipeline::ProducerExt;
    use crate::progress::{with_progress_sink, RecordingProgress};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_iter_source_is_restartable() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let source = IterSource::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            vec![1, 2, 3]
        });

        let first: Vec<i32> = source.iterate().collect::<FlowResult<_>>().unwrap();
        let second: Vec<i32> = source.iterate().collect::<FlowResult<_>>().unwrap();

        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_iter_source_is_lazy() {
        let pulled = Arc::new(AtomicUsize::new(0));
        let counter = pulled.clone();
        let source = IterSource::new(move || {
            let counter = counter.clone();
            (1..=100).inspect(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
        });

        let first_two: Vec<i32> = source.iterate().take(2).collect::<FlowResult<_>>().unwrap();

        assert_eq!(first_two, vec![1, 2]);
        assert_eq!(pulled.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_try_source_stops_at_error() {
        let source = TrySource::new(|| {
            vec![
                Ok(1),
                Err(FlowError::Source("corrupt record".to_string())),
                Ok(3),
            ]
        });

        let results: Vec<_> = source.iterate().collect();
        assert_eq!(results.len(), 2);
        assert!(matches!(results[1], Err(FlowError::Source(_))));
    }

    #[test]
    fn test_empty_source() {
        let sink = Arc::new(RecordingProgress::new());
        let count = with_progress_sink(sink.clone(), || {
            EmptySource::<String>::new().iterate().count()
        });

        assert_eq!(count, 0);
        assert_eq!(sink.records()[0].description, "EmptySource");
        assert!(sink.records()[0].finished);
    }

    #[test]
    fn test_produce_matches_iterate_for_plain_sources() {
        let source = IterSource::new(|| 1..=3);
        let produced: Vec<i32> = source.produce().collect::<FlowResult<_>>().unwrap();
        let iterated: Vec<i32> = source.iterate().collect::<FlowResult<_>>().unwrap();

        assert_eq!(produced, iterated);
    }
}
