// foodloop/src/workflow/execution.rs

use tracing::{debug, error, info_span, Instrument};

use super::context_data::ContextData;
use super::definition::{Handler, Pipeline};
use crate::error::WorkflowError;

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<WorkflowError> + Send + Sync + 'static,
{
  /// Runs every step in order against `ctx_data`.
  ///
  /// The first handler error aborts the run and is returned as-is. A step
  /// with no `on` handler fails with `HandlerMissing`.
  pub async fn run(&self, ctx_data: ContextData<TData>) -> Result<(), Err> {
    for (step_idx, step_name) in self.steps.iter().enumerate() {
      let span = info_span!("pipeline_step", step = step_name.as_str(), index = step_idx);

      let Some(on_handlers) = self.on.get(step_name).filter(|v| !v.is_empty()) else {
        error!(step = step_name.as_str(), "Step has no handlers.");
        return Err(Err::from(WorkflowError::HandlerMissing {
          step_name: step_name.clone(),
        }));
      };
      let after_handlers = self.after.get(step_name);

      async {
        run_phase(on_handlers, &ctx_data, "on").await?;
        if let Some(handlers) = after_handlers {
          run_phase(handlers, &ctx_data, "after").await?;
        }
        Ok::<_, Err>(())
      }
      .instrument(span)
      .await?;
    }

    Ok(())
  }
}

async fn run_phase<TData, Err>(
  handlers: &[Handler<TData, Err>],
  ctx_data: &ContextData<TData>,
  phase: &'static str,
) -> Result<(), Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + Send + Sync + 'static,
{
  for handler_fn in handlers {
    if let Err(e) = handler_fn(ctx_data.clone()).await {
      debug!(phase, error = %e, "Handler failed.");
      return Err(e);
    }
  }
  Ok(())
}
