use itemflow::label::current_label;
use itemflow::pipeline::consumers::{CollectConsumer, CountConsumer, JsonLinesConsumer};
use itemflow::pipeline::sources::{ConcatSource, IterSource, JsonLinesSource};
use itemflow::pipeline::stages::{FilterStage, FlatMapStage, MapStage, TakeStage};
use itemflow::pipeline::{stages, Consumer, ItemStream, Producer, ProducerExt, Stage};
use itemflow::progress::{with_progress_sink, RecordingProgress, SilentProgress};
use itemflow::{FlowError, FlowResult};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

fn quiet<R>(f: impl FnOnce() -> R) -> R {
    with_progress_sink(Arc::new(SilentProgress), f)
}

/// Replaces each item with its position in the current run
#[derive(Clone)]
struct Position {
    count: i32,
}

impl Stage<i32> for Position {
    fn reset(&mut self) {
        self.count = 0;
    }

    fn transform<'a>(self: Box<Self>, upstream: ItemStream<'a, i32>) -> ItemStream<'a, i32> {
        let mut this = *self;
        Box::new(upstream.map(move |item| {
            item.map(|_| {
                this.count += 1;
                this.count
            })
        }))
    }
}

/// Records every item it receives into shared storage
#[derive(Clone, Default)]
struct Recorder {
    received: Arc<Mutex<Vec<i32>>>,
}

impl Consumer<i32> for Recorder {
    type Output = ();

    fn consume(&mut self, items: ItemStream<'_, i32>) -> FlowResult<()> {
        for item in items {
            let item = item?;
            self.received.lock().unwrap().push(item);
        }
        Ok(())
    }
}

/// Records the run label seen while draining, optionally running a nested export
#[derive(Clone, Default)]
struct LabelProbe {
    seen: Arc<Mutex<Vec<Option<String>>>>,
    nested: Option<(String, bool)>,
}

impl Consumer<i32> for LabelProbe {
    type Output = ();

    fn consume(&mut self, items: ItemStream<'_, i32>) -> FlowResult<()> {
        self.seen.lock().unwrap().push(current_label());

        if let Some((label, fail)) = &self.nested {
            let inner = LabelProbe {
                seen: self.seen.clone(),
                nested: None,
            };
            let source = IterSource::new(|| vec![1]);
            let result = if *fail {
                source
                    .attach(stages![MapStage::new(|_: i32| -> FlowResult<i32> {
                        Err(FlowError::stage("Broken", "always fails"))
                    })])
                    .export(&inner, Some(label.as_str()))
            } else {
                source.export(&inner, Some(label.as_str()))
            };
            assert_eq!(result.is_err(), *fail);
            self.seen.lock().unwrap().push(current_label());
        }

        for item in items {
            item?;
        }
        Ok(())
    }
}

#[test]
fn test_empty_chain_matches_source() {
    quiet(|| {
        let source = IterSource::new(|| vec![5, 3, 8]);
        let chain = source.clone().attach(vec![]);

        let direct = source.export(&CollectConsumer::new(), None).unwrap();
        let chained = chain.export(&CollectConsumer::new(), None).unwrap();

        assert_eq!(direct, vec![5, 3, 8]);
        assert_eq!(chained, direct);
    });
}

#[test]
fn test_filter_then_map() {
    quiet(|| {
        let chain = IterSource::new(|| vec![1, 2, 3]).attach(stages![
            FilterStage::new(|n: &i32| n % 2 == 0),
            MapStage::new(|n: i32| Ok(n * 2)),
        ]);

        let items = chain.export(&CollectConsumer::new(), Some("evens")).unwrap();
        assert_eq!(items, vec![4]);
    });
}

#[test]
fn test_stage_state_isolated_between_runs() {
    quiet(|| {
        let chain =
            IterSource::new(|| vec![10, 20, 30]).attach(stages![Position { count: 100 }]);

        let first = chain.export(&CollectConsumer::new(), Some("first")).unwrap();
        let second = chain.export(&CollectConsumer::new(), Some("second")).unwrap();

        assert_eq!(first, vec![1, 2, 3]);
        assert_eq!(second, vec![1, 2, 3]);
    });
}

#[test]
fn test_export_leaves_caller_consumer_untouched() {
    quiet(|| {
        let mut counter = CountConsumer::new();
        let warmup: ItemStream<'static, i32> = Box::new(vec![Ok(1), Ok(2)].into_iter());
        Consumer::<i32>::consume(&mut counter, warmup).unwrap();
        assert_eq!(counter.count(), 2);

        let total = IterSource::new(|| 1..=3)
            .export(&counter, Some("count"))
            .unwrap();

        assert_eq!(total, 3);
        assert_eq!(counter.count(), 2);
    });
}

#[test]
fn test_nested_exports_restore_labels() {
    quiet(|| {
        let probe = LabelProbe {
            seen: Arc::new(Mutex::new(Vec::new())),
            nested: Some(("inner".to_string(), false)),
        };

        assert_eq!(current_label(), None);
        IterSource::new(|| vec![1, 2])
            .export(&probe, Some("outer"))
            .unwrap();
        assert_eq!(current_label(), None);

        let seen = probe.seen.lock().unwrap().clone();
        assert_eq!(
            seen,
            vec![
                Some("outer".to_string()),
                Some("inner".to_string()),
                Some("outer".to_string()),
            ]
        );
    });
}

#[test]
fn test_failed_nested_export_restores_label() {
    quiet(|| {
        let probe = LabelProbe {
            seen: Arc::new(Mutex::new(Vec::new())),
            nested: Some(("broken".to_string(), true)),
        };

        IterSource::new(|| vec![1])
            .export(&probe, Some("outer"))
            .unwrap();

        let seen = probe.seen.lock().unwrap().clone();
        assert_eq!(
            seen,
            vec![
                Some("outer".to_string()),
                Some("broken".to_string()),
                Some("outer".to_string()),
            ]
        );
        assert_eq!(current_label(), None);
    });
}

#[test]
fn test_stage_failure_stops_pipeline() {
    quiet(|| {
        let pulls = Arc::new(AtomicUsize::new(0));
        let counter = pulls.clone();
        let source = IterSource::new(move || {
            let counter = counter.clone();
            (1..=5).map(move |n| {
                counter.fetch_add(1, Ordering::SeqCst);
                n
            })
        });

        let chain = source.attach(stages![MapStage::new(|n: i32| {
            if n == 3 {
                Err(FlowError::stage("Check", "three is not allowed"))
            } else {
                Ok(n)
            }
        })]);

        let recorder = Recorder::default();
        let result = chain.export(&recorder, Some("failing"));

        assert!(matches!(result, Err(FlowError::Stage { .. })));
        assert_eq!(*recorder.received.lock().unwrap(), vec![1, 2]);
        assert_eq!(pulls.load(Ordering::SeqCst), 3);
    });
}

#[test]
fn test_take_stops_pulling_source() {
    quiet(|| {
        let pulls = Arc::new(AtomicUsize::new(0));
        let counter = pulls.clone();
        let source = IterSource::new(move || {
            let counter = counter.clone();
            (1..).map(move |n: u64| {
                counter.fetch_add(1, Ordering::SeqCst);
                n
            })
        });

        let items = source
            .attach(stages![TakeStage::new(4)])
            .export(&CollectConsumer::new(), None)
            .unwrap();

        assert_eq!(items, vec![1, 2, 3, 4]);
        assert_eq!(pulls.load(Ordering::SeqCst), 4);
    });
}

#[test]
fn test_progress_description_uses_label() {
    let recording = Arc::new(RecordingProgress::new());
    with_progress_sink(recording.clone(), || {
        IterSource::new(|| vec![1, 2, 3])
            .attach(stages![FilterStage::new(|n: &i32| *n > 1)])
            .export(&CountConsumer::new(), Some("nightly"))
            .unwrap();
    });

    let records = recording.records();
    assert_eq!(records.len(), 1);
    assert!(records[0].description.contains("nightly"));
    assert_eq!(records[0].items, 3);
    assert!(records[0].finished);
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Photo {
    id: u32,
    tags: Vec<String>,
}

#[test]
fn test_json_lines_round_trip_through_chain() {
    quiet(|| {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("in.jsonl");
        let output = temp_dir.path().join("out").join("tagged.jsonl");

        let photos = vec![
            Photo {
                id: 1,
                tags: vec!["cat".to_string()],
            },
            Photo {
                id: 2,
                tags: vec![],
            },
            Photo {
                id: 3,
                tags: vec!["dog".to_string(), "park".to_string()],
            },
        ];
        let seed = photos.clone();
        let summary = IterSource::new(move || seed.clone())
            .export(&JsonLinesConsumer::new(&input), None)
            .unwrap();
        assert_eq!(summary.items_written, 3);

        let chain = JsonLinesSource::<Photo>::new(&input).attach(stages![
            FilterStage::new(|photo: &Photo| !photo.tags.is_empty()),
            FlatMapStage::new(|photo: Photo| {
                Ok(photo
                    .tags
                    .iter()
                    .map(|tag| Photo {
                        id: photo.id,
                        tags: vec![tag.clone()],
                    })
                    .collect())
            }),
        ]);

        let summary = chain
            .export(&JsonLinesConsumer::new(&output), Some("split-tags"))
            .unwrap();
        assert_eq!(summary.items_written, 3);

        let written = JsonLinesSource::<Photo>::new(&output)
            .export(&CollectConsumer::new(), None)
            .unwrap();
        let ids: Vec<u32> = written.iter().map(|photo| photo.id).collect();
        assert_eq!(ids, vec![1, 3, 3]);
    });
}

#[test]
fn test_concat_of_chains() {
    quiet(|| {
        let evens =
            IterSource::new(|| 1..=6).attach(stages![FilterStage::new(|n: &i32| n % 2 == 0)]);
        let tens = IterSource::new(|| vec![10, 20]);

        let combined = ConcatSource::new().with(evens).with(tens);
        assert_eq!(combined.len(), 2);

        let items = combined
            .attach(stages![MapStage::new(|n: i32| Ok(n + 1))])
            .export(&CollectConsumer::new(), Some("combined"))
            .unwrap();
        assert_eq!(items, vec![3, 5, 7, 11, 21]);
    });
}

#[test]
fn test_chain_can_be_iterated_directly() {
    quiet(|| {
        let chain =
            IterSource::new(|| vec![1, 2, 3]).attach(stages![MapStage::new(|n: i32| Ok(-n))]);

        let first: Vec<i32> = chain.iterate().collect::<FlowResult<_>>().unwrap();
        let second: Vec<i32> = chain.iterate().collect::<FlowResult<_>>().unwrap();
        assert_eq!(first, vec![-1, -2, -3]);
        assert_eq!(first, second);
    });
}
