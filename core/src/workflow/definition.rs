// foodloop/src/workflow/definition.rs

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use super::context_data::ContextData;
use crate::error::WorkflowError;

/// A boxed step handler.
pub type Handler<TData, Err> =
  Box<dyn Fn(ContextData<TData>) -> Pin<Box<dyn Future<Output = Result<(), Err>> + Send>> + Send + Sync>;

pub struct Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<WorkflowError> + Send + Sync + 'static,
{
  pub(crate) steps: Vec<String>,
  pub(crate) on: HashMap<String, Vec<Handler<TData, Err>>>,
  pub(crate) after: HashMap<String, Vec<Handler<TData, Err>>>,
}

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<WorkflowError> + Send + Sync + 'static,
{
  /// Creates a pipeline from step names, in run order.
  pub fn new(step_names: &[&str]) -> Self {
    Self {
      steps: step_names.iter().map(|name| (*name).to_string()).collect(),
      on: HashMap::new(),
      after: HashMap::new(),
    }
  }

  pub fn step_names(&self) -> Vec<&str> {
    self.steps.iter().map(String::as_str).collect()
  }

  pub(crate) fn ensure_step_exists(&self, step_name: &str) -> Result<(), WorkflowError> {
    if self.steps.iter().any(|s| s == step_name) {
      Ok(())
    } else {
      Err(WorkflowError::StepNotFound {
        step_name: step_name.to_string(),
      })
    }
  }
}

impl<TData, Err> std::fmt::Debug for Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<WorkflowError> + Send + Sync + 'static,
{
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Pipeline")
      .field("steps", &self.steps)
      .field("on_handlers", &self.on.values().map(Vec::len).sum::<usize>())
      .field("after_handlers", &self.after.values().map(Vec::len).sum::<usize>())
      .finish()
  }
}
