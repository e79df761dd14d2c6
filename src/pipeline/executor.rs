use super::core::{Consumer, Producer};
use crate::error::FlowResult;
use crate::label::LabelScope;
use crate::logger::{self, LogContext, LogLevel};
use serde_json::Value;
use std::time::Instant;
use uuid::Uuid;

/// One complete, terminal run of `producer` into a copy of `consumer`
///
/// The caller's consumer is cloned and the clone is reset, so it is never
/// touched. `label` is the current run label while the items are drained and
/// the previous label is back in place on every exit path. Errors are returned
/// exactly as the consumer produced them.
///
/// Start, completion and failure are logged with the run id, label and
/// producer name as entry context.
pub(crate) fn run_export<P, C>(
    producer: &P,
    consumer: &C,
    label: Option<&str>,
) -> FlowResult<C::Output>
where
    P: Producer + ?Sized,
    C: Consumer<P::Item>,
{
    let producer_name = producer.name();
    let context = export_context(Uuid::new_v4(), label, &producer_name);

    logger::emit(
        LogLevel::Info,
        "export",
        &format!("Starting export of '{}'", producer_name),
        Some(context.clone()),
    );

    let mut consumer = consumer.clone();
    consumer.reset();

    let started = Instant::now();
    let result = {
        let _scope = LabelScope::enter(label);
        consumer.consume(producer.iterate())
    };
    let elapsed = started.elapsed().as_secs_f64();

    match &result {
        Ok(_) => logger::emit(
            LogLevel::Info,
            "export",
            &format!("Export of '{}' completed in {:.2}s", producer_name, elapsed),
            Some(context),
        ),
        Err(e) => logger::emit(
            LogLevel::Error,
            "export",
            &format!("Export of '{}' failed after {:.2}s: {}", producer_name, elapsed, e),
            Some(context),
        ),
    }

    result
}

fn export_context(run_id: Uuid, label: Option<&str>, producer: &str) -> LogContext {
    let mut context = LogContext::new();
    context.insert("run_id".to_string(), Value::from(run_id.to_string()));
    context.insert("label".to_string(), label.map(Value::from).unwrap_or(Value::Null));
    context.insert("producer".to_string(), Value::from(producer));
    context
}
