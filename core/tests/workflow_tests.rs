// tests/workflow_tests.rs
mod common;

use common::setup_tracing;
use foodloop::workflow::{ContextData, Pipeline};
use foodloop::WorkflowError;
use serial_test::serial;

#[derive(Debug, Default)]
struct Trace {
  steps: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
enum TraceError {
  #[error("workflow: {0}")]
  Workflow(#[from] WorkflowError),
  #[error("step failed: {0}")]
  Step(String),
}

fn record(name: &'static str) -> impl Fn(ContextData<Trace>) -> std::future::Ready<Result<(), TraceError>> {
  move |ctx| {
    ctx.write().steps.push(name.to_string());
    std::future::ready(Ok(()))
  }
}

#[tokio::test]
#[serial]
async fn test_steps_run_in_declared_order_with_after_handlers() {
  setup_tracing();
  let mut p = Pipeline::<Trace, TraceError>::new(&["one", "two"]);
  p.on_step("two", record("two")).unwrap();
  p.on_step("one", record("one")).unwrap();
  p.after_step("one", record("one:after")).unwrap();

  let ctx = ContextData::new(Trace::default());
  p.run(ctx.clone()).await.unwrap();
  assert_eq!(ctx.read().steps, vec!["one", "one:after", "two"]);
}

#[tokio::test]
#[serial]
async fn test_handler_error_aborts_run_and_skips_after_handlers() {
  setup_tracing();
  let mut p = Pipeline::<Trace, TraceError>::new(&["bad", "after_bad"]);
  p.on_step("bad", |_ctx: ContextData<Trace>| async { Err::<(), _>(TraceError::Step("boom".into())) })
    .unwrap();
  p.after_step("bad", record("bad:after")).unwrap();
  p.on_step("after_bad", record("after_bad")).unwrap();

  let ctx = ContextData::new(Trace::default());
  let err = p.run(ctx.clone()).await.unwrap_err();
  assert!(matches!(err, TraceError::Step(ref msg) if msg == "boom"));
  assert!(ctx.read().steps.is_empty());
}

#[tokio::test]
#[serial]
async fn test_unknown_steps_and_missing_handlers_are_reported() {
  setup_tracing();
  let mut p = Pipeline::<Trace, TraceError>::new(&["first", "must"]);
  assert!(matches!(
    p.on_step("nope", record("nope")),
    Err(WorkflowError::StepNotFound { .. })
  ));
  assert!(matches!(
    p.after_step("nope", record("nope")),
    Err(WorkflowError::StepNotFound { .. })
  ));

  p.on_step("first", record("first")).unwrap();
  // An after handler alone does not make a step runnable.
  p.after_step("must", record("must:after")).unwrap();
  let ctx = ContextData::new(Trace::default());
  let err = p.run(ctx.clone()).await.unwrap_err();
  assert!(matches!(
    err,
    TraceError::Workflow(WorkflowError::HandlerMissing { ref step_name }) if step_name == "must"
  ));
  assert_eq!(ctx.read().steps, vec!["first"]);

  p.on_step("must", record("must")).unwrap();
  let ctx = ContextData::new(Trace::default());
  p.run(ctx.clone()).await.unwrap();
  assert_eq!(ctx.read().steps, vec!["first", "must", "must:after"]);
}
