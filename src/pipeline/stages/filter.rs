use crate::pipeline::{ItemStream, Stage};
use std::borrow::Cow;

/// Stage that drops items failing a predicate
///
/// Errors are always passed on.
#[derive(Clone)]
pub struct FilterStage<F> {
    name: Option<String>,
    predicate: F,
}

impl<F> FilterStage<F> {
    /// Create a filter stage keeping items for which `predicate` is true
    pub fn new<T>(predicate: F) -> Self
    where
        F: Fn(&T) -> bool,
    {
        Self {
            name: None,
            predicate,
        }
    }

    /// Name the stage for logs
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl<T, F> Stage<T> for FilterStage<F>
where
    T: 'static,
    F: Fn(&T) -> bool + Clone + Send + Sync + 'static,
{
    fn name(&self) -> Cow<'_, str> {
        match &self.name {
            Some(name) => Cow::Borrowed(name),
            None => Cow::Borrowed("FilterStage"),
        }
    }

    fn transform<'a>(self: Box<Self>, upstream: ItemStream<'a, T>) -> ItemStream<'a, T> {
        Box::new(upstream.filter(move |item| match item {
            Ok(item) => (self.predicate)(item),
            Err(_) => true,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FlowError, FlowResult};

    #[test]
    fn test_filter_stage_keeps_matching() {
        let stage = Box::new(FilterStage::new(|n: &i32| n % 2 == 0));
        let out: Vec<i32> = stage
            .transform(Box::new((1..=6).map(Ok)))
            .collect::<FlowResult<_>>()
            .unwrap();

        assert_eq!(out, vec![2, 4, 6]);
    }

    #[test]
    fn test_filter_stage_passes_errors() {
        let stage = Box::new(FilterStage::new(|_: &i32| false));
        let out: Vec<_> = stage
            .transform(Box::new(
                vec![Ok(1), Err(FlowError::Source("gone".to_string()))].into_iter(),
            ))
            .collect();

        assert_eq!(out.len(), 1);
        assert!(out[0].is_err());
    }
}
