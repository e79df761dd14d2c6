use crate::error::FlowResult;
use crate::label::current_label;
use crate::progress::{self, ProgressTracker};
use std::borrow::Cow;
use std::sync::Arc;

use super::chain::Chain;
use super::executor;

/// A lazy, pull-based sequence of items
///
/// An `Err` element stands for a failure at that position. Streams built by
/// this crate end right after yielding an error.
pub type ItemStream<'a, T> = Box<dyn Iterator<Item = FlowResult<T>> + 'a>;

/// Last path segment of a type name, without generic arguments
///
/// `itemflow::pipeline::sources::IterSource<i32, F>` becomes `IterSource`.
pub fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

// ============================================================================
// Producer
// ============================================================================

/// Anything that can hand out a fresh, finite sequence of items
///
/// Every call to [`Producer::iterate`] must start an independent traversal;
/// nothing about one traversal may leak into the next.
///
/// # Example
/// ```
/// use itemflow::pipeline::{ItemStream, Producer, ProducerExt};
///
/// struct Countdown(u32);
///
/// impl Producer for Countdown {
///     type Item = u32;
///
///     fn produce_raw(&self) -> ItemStream<'_, u32> {
///         Box::new((1..=self.0).rev().map(Ok))
///     }
/// }
///
/// let items: Vec<u32> = Countdown(3).iterate().collect::<Result<_, _>>().unwrap();
/// assert_eq!(items, vec![3, 2, 1]);
/// ```
pub trait Producer {
    type Item: 'static;

    /// Name used in progress descriptions
    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed(short_type_name::<Self>())
    }

    /// The producer's own item logic, without any decoration
    ///
    /// Must terminate once the underlying data is exhausted. Errors from the
    /// underlying data access are yielded as-is.
    fn produce_raw(&self) -> ItemStream<'_, Self::Item>;

    /// Entry point for traversals
    ///
    /// Plain producers report progress; [`Chain`] overrides this to thread
    /// its upstream through its stages instead.
    fn iterate(&self) -> ItemStream<'_, Self::Item> {
        ProducerExt::produce(self)
    }
}

/// Operations every producer gets for free
pub trait ProducerExt: Producer {
    /// [`Producer::produce_raw`] decorated with progress reporting
    ///
    /// Nothing happens until the first item is pulled. At that point the
    /// progress description is resolved once from the producer name and the
    /// run label current at that moment, and the raw sequence is started.
    /// Items pass through untouched.
    fn produce(&self) -> ItemStream<'_, Self::Item> {
        deferred(move || {
            let description = progress::describe(&self.name(), current_label().as_deref());
            let tracker = progress::current_sink().start(&description);
            Box::new(Tracked {
                inner: fuse_on_error(self.produce_raw()),
                tracker,
                finished: false,
            })
        })
    }

    /// Build a [`Chain`] running this producer's items through `stages` in order
    ///
    /// Nothing executes until the chain is iterated.
    fn attach(self, stages: Vec<Box<dyn Stage<Self::Item>>>) -> Chain<Self>
    where
        Self: Sized,
    {
        Chain::new(self, stages)
    }

    /// Drain this producer into a private copy of `consumer`
    ///
    /// The copy is reset before use and `label` is the run label for the whole
    /// drain. Returns whatever the consumer returns, errors included.
    fn export<C>(&self, consumer: &C, label: Option<&str>) -> FlowResult<C::Output>
    where
        C: Consumer<Self::Item>,
    {
        executor::run_export(self, consumer, label)
    }
}

impl<P: Producer + ?Sized> ProducerExt for P {}

impl<P: Producer + ?Sized> Producer for &P {
    type Item = P::Item;

    fn name(&self) -> Cow<'_, str> {
        (**self).name()
    }

    fn produce_raw(&self) -> ItemStream<'_, Self::Item> {
        (**self).produce_raw()
    }

    fn iterate(&self) -> ItemStream<'_, Self::Item> {
        (**self).iterate()
    }
}

impl<P: Producer + ?Sized> Producer for Box<P> {
    type Item = P::Item;

    fn name(&self) -> Cow<'_, str> {
        (**self).name()
    }

    fn produce_raw(&self) -> ItemStream<'_, Self::Item> {
        (**self).produce_raw()
    }

    fn iterate(&self) -> ItemStream<'_, Self::Item> {
        (**self).iterate()
    }
}

impl<P: Producer + ?Sized> Producer for Arc<P> {
    type Item = P::Item;

    fn name(&self) -> Cow<'_, str> {
        (**self).name()
    }

    fn produce_raw(&self) -> ItemStream<'_, Self::Item> {
        (**self).produce_raw()
    }

    fn iterate(&self) -> ItemStream<'_, Self::Item> {
        (**self).iterate()
    }
}

/// Progress-reporting pass-through
struct Tracked<'a, T> {
    inner: ItemStream<'a, T>,
    tracker: Box<dyn ProgressTracker>,
    finished: bool,
}

impl<T> Tracked<'_, T> {
    fn finish(&mut self) {
        if !self.finished {
            self.finished = true;
            self.tracker.finish();
        }
    }
}

impl<T> Iterator for Tracked<'_, T> {
    type Item = FlowResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.inner.next() {
            Some(Ok(item)) => {
                self.tracker.advance();
                Some(Ok(item))
            }
            Some(Err(e)) => {
                self.finish();
                Some(Err(e))
            }
            None => {
                self.finish();
                None
            }
        }
    }
}

impl<T> Drop for Tracked<'_, T> {
    fn drop(&mut self) {
        self.finish();
    }
}

/// A stream built by `start` on its first pull
///
/// A stream that is dropped without being pulled never calls `start`.
pub fn deferred<'a, T: 'a>(start: impl FnOnce() -> ItemStream<'a, T> + 'a) -> ItemStream<'a, T> {
    Box::new(Deferred {
        start: Some(Box::new(start)),
        stream: None,
    })
}

struct Deferred<'a, T> {
    start: Option<Box<dyn FnOnce() -> ItemStream<'a, T> + 'a>>,
    stream: Option<ItemStream<'a, T>>,
}

impl<T> Iterator for Deferred<'_, T> {
    type Item = FlowResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(start) = self.start.take() {
            self.stream = Some(start());
        }
        self.stream.as_mut()?.next()
    }
}

/// Stop a stream right after its first error
pub fn fuse_on_error<'a, T: 'a>(stream: ItemStream<'a, T>) -> ItemStream<'a, T> {
    Box::new(FuseOnError {
        inner: Some(stream),
    })
}

struct FuseOnError<'a, T> {
    inner: Option<ItemStream<'a, T>>,
}

impl<T> Iterator for FuseOnError<'_, T> {
    type Item = FlowResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.inner.as_mut()?.next();
        if !matches!(next, Some(Ok(_))) {
            // Release the upstream so nothing else is pulled from it
            self.inner = None;
        }
        next
    }
}

// ============================================================================
// Stage
// ============================================================================

/// A resettable transformation between a producer and a consumer
///
/// The instance configured on a [`Chain`] is a template: every traversal works
/// on its own clone, which is [`reset`](Stage::reset) and then consumed by
/// [`transform`](Stage::transform). Configuration must survive `reset`;
/// run state must not.
///
/// # Example
/// ```
/// use itemflow::pipeline::{ItemStream, Stage};
///
/// /// Numbers every item with its position in the current run
/// #[derive(Clone)]
/// struct Enumerate {
///     next: usize,
/// }
///
/// impl Stage<String> for Enumerate {
///     fn reset(&mut self) {
///         self.next = 0;
///     }
///
///     fn transform<'a>(
///         mut self: Box<Self>,
///         upstream: ItemStream<'a, String>,
///     ) -> ItemStream<'a, String> {
///         Box::new(upstream.map(move |item| {
///             self.next += 1;
///             item.map(|s| format!("{}: {}", self.next, s))
///         }))
///     }
/// }
/// ```
pub trait Stage<T: 'static>: StageClone<T> + Send + Sync + 'static {
    /// Stage name for logging
    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed(short_type_name::<Self>())
    }

    /// Clear run state, keeping configuration
    fn reset(&mut self) {}

    /// Turn the upstream sequence into this stage's output sequence
    ///
    /// Must stay lazy: pull from `upstream` only as output is demanded.
    fn transform<'a>(self: Box<Self>, upstream: ItemStream<'a, T>) -> ItemStream<'a, T>;
}

/// Independent copies of boxed stages
///
/// Implemented for every `Clone` stage; there is no need to implement it by hand.
pub trait StageClone<T: 'static> {
    fn clone_stage(&self) -> Box<dyn Stage<T>>;
}

impl<T: 'static, S> StageClone<T> for S
where
    S: Stage<T> + Clone,
{
    fn clone_stage(&self) -> Box<dyn Stage<T>> {
        Box::new(self.clone())
    }
}

impl<T: 'static> Clone for Box<dyn Stage<T>> {
    fn clone(&self) -> Self {
        self.as_ref().clone_stage()
    }
}

/// Box a list of stages for [`ProducerExt::attach`]
///
/// ```
/// use itemflow::pipeline::stages::{FilterStage, MapStage};
/// use itemflow::pipeline::{Stage, stages};
///
/// let stages: Vec<Box<dyn Stage<i32>>> = stages![
///     FilterStage::new(|n: &i32| n % 2 == 0),
///     MapStage::new(|n: i32| Ok(n * 2)),
/// ];
/// assert_eq!(stages.len(), 2);
/// ```
#[macro_export]
macro_rules! stages {
    () => {
        ::std::vec::Vec::new()
    };
    ($($stage:expr),+ $(,)?) => {
        ::std::vec![$(
            ::std::boxed::Box::new($stage) as ::std::boxed::Box<dyn $crate::pipeline::Stage<_>>
        ),+]
    };
}

// ============================================================================
// Consumer
// ============================================================================

/// Terminal drain of an item stream
///
/// `Clone` must produce an independent copy: [`ProducerExt::export`] always
/// works on a fresh clone and never touches the caller's instance.
pub trait Consumer<T>: Clone {
    type Output;

    /// Clear run state, keeping configuration
    fn reset(&mut self) {}

    /// Pull items until the stream ends or the consumer has had enough
    fn consume(&mut self, items: ItemStream<'_, T>) -> FlowResult<Self::Output>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FlowError;
    use crate::label::with_label;
    use crate::progress::{with_progress_sink, RecordingProgress};

    struct Numbers(Vec<i32>);

    impl Producer for Numbers {
        type Item = i32;

        fn produce_raw(&self) -> ItemStream<'_, i32> {
            Box::new(self.0.iter().copied().map(Ok))
        }
    }

    #[derive(Clone)]
    struct Negate;

    impl Stage<i32> for Negate {
        fn transform<'a>(self: Box<Self>, upstream: ItemStream<'a, i32>) -> ItemStream<'a, i32> {
            Box::new(upstream.map(|item| item.map(|n| -n)))
        }
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name::<Numbers>(), "Numbers");
        assert_eq!(short_type_name::<Vec<String>>(), "Vec");
    }

    #[test]
    fn test_default_names() {
        assert_eq!(Numbers(vec![]).name(), "Numbers");
        assert_eq!(Negate.name(), "Negate");
        assert_eq!((&Numbers(vec![])).name(), "Numbers");
    }

    #[test]
    fn test_produce_reports_progress() {
        let sink = Arc::new(RecordingProgress::new());
        let items: Vec<i32> = with_progress_sink(sink.clone(), || {
            Numbers(vec![1, 2, 3]).produce().collect::<FlowResult<_>>().unwrap()
        });

        assert_eq!(items, vec![1, 2, 3]);
        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].description, "Numbers");
        assert_eq!(records[0].items, 3);
        assert!(records[0].finished);
    }

    #[test]
    fn test_produce_description_uses_run_label() {
        let sink = Arc::new(RecordingProgress::new());
        with_progress_sink(sink.clone(), || {
            with_label(Some("nightly"), || Numbers(vec![1]).iterate().count());
        });

        assert_eq!(sink.descriptions(), vec!["Numbers - nightly"]);
    }

    #[test]
    fn test_progress_finishes_when_dropped_early() {
        let sink = Arc::new(RecordingProgress::new());
        with_progress_sink(sink.clone(), || {
            let numbers = Numbers(vec![1, 2, 3]);
            let mut stream = numbers.iterate();
            assert_eq!(stream.next().unwrap().unwrap(), 1);
        });

        let record = &sink.records()[0];
        assert_eq!(record.items, 1);
        assert!(record.finished);
    }

    #[test]
    fn test_label_resolved_on_first_pull() {
        let sink = Arc::new(RecordingProgress::new());
        with_progress_sink(sink.clone(), || {
            let numbers = Numbers(vec![1, 2]);
            let stream = numbers.iterate();
            assert_eq!(with_label(Some("nightly"), || stream.count()), 2);
        });

        assert_eq!(sink.descriptions(), vec!["Numbers - nightly"]);
    }

    #[test]
    fn test_unpulled_stream_starts_no_tracker() {
        let sink = Arc::new(RecordingProgress::new());
        with_progress_sink(sink.clone(), || {
            let numbers = Numbers(vec![1, 2]);
            drop(numbers.iterate());
        });

        assert!(sink.records().is_empty());
    }

    #[test]
    fn test_deferred_starts_once() {
        let starts = std::cell::Cell::new(0);
        let stream = deferred(|| {
            starts.set(starts.get() + 1);
            Box::new(vec![Ok(1), Ok(2)].into_iter()) as ItemStream<'_, i32>
        });
        assert_eq!(starts.get(), 0);

        let items: Vec<i32> = stream.collect::<FlowResult<_>>().unwrap();
        assert_eq!(items, vec![1, 2]);
        assert_eq!(starts.get(), 1);
    }

    #[test]
    fn test_fuse_on_error_stops_stream() {
        let raw: ItemStream<'static, i32> = Box::new(
            vec![Ok(1), Err(FlowError::Source("bad row".to_string())), Ok(3)].into_iter(),
        );
        let results: Vec<_> = fuse_on_error(raw).collect();

        assert_eq!(results.len(), 2);
        assert!(matches!(results[0], Ok(1)));
        assert!(matches!(results[1], Err(FlowError::Source(_))));
    }

    #[test]
    fn test_boxed_stage_clone_is_independent() {
        let stage: Box<dyn Stage<i32>> = Box::new(Negate);
        let copy = stage.clone();
        let out: Vec<i32> = copy
            .transform(Box::new(vec![Ok(1), Ok(2)].into_iter()))
            .collect::<FlowResult<_>>()
            .unwrap();

        assert_eq!(out, vec![-1, -2]);
        assert_eq!(stage.name(), "Negate");
    }

    #[test]
    fn test_stages_macro() {
        let empty: Vec<Box<dyn Stage<i32>>> = stages![];
        assert!(empty.is_empty());

        let two: Vec<Box<dyn Stage<i32>>> = stages![Negate, Negate];
        assert_eq!(two.len(), 2);
    }
}
