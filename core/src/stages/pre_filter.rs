// gantry/src/stages/pre_filter.rs

//! Request-entry stage, run before any route-scoped access control.

use crate::core::context::ExecutionContext;
use crate::core::control::FilterFlow;
use crate::core::rejection::StageResult;
use async_trait::async_trait;
use std::future::Future;
use tracing::{event, Level};

/// Sees the raw request before guards run and may answer it directly.
///
/// `FilterFlow::Respond` is the earliest short-circuit of the pipeline: the response
/// is finalized as given and no later stage runs, the exception filter chain
/// included. An `Err` on the other hand is routed to the exception filter chain.
#[async_trait]
pub trait PreFilter: Send + Sync + 'static {
  fn name(&self) -> &str {
    std::any::type_name::<Self>()
  }

  async fn apply(&self, ctx: &ExecutionContext) -> StageResult<FilterFlow>;
}

/// Logs the method and URL of every request it sees.
#[derive(Debug, Clone, Default)]
pub struct LoggerPreFilter;

#[async_trait]
impl PreFilter for LoggerPreFilter {
  fn name(&self) -> &str {
    "LoggerPreFilter"
  }

  async fn apply(&self, ctx: &ExecutionContext) -> StageResult<FilterFlow> {
    let request = ctx.request();
    event!(
      Level::INFO,
      method = %request.method,
      url = %request.url(),
      correlation_id = %ctx.correlation_id(),
      "Request received."
    );
    Ok(FilterFlow::Continue)
  }
}

/// Adapter turning an async closure into a [`PreFilter`]. See [`pre_filter_fn`].
pub struct FnPreFilter<F> {
  name: String,
  func: F,
}

pub fn pre_filter_fn<F, Fut>(name: impl Into<String>, func: F) -> FnPreFilter<F>
where
  F: Fn(ExecutionContext) -> Fut + Send + Sync + 'static,
  Fut: Future<Output = StageResult<FilterFlow>> + Send + 'static,
{
  FnPreFilter { name: name.into(), func }
}

#[async_trait]
impl<F, Fut> PreFilter for FnPreFilter<F>
where
  F: Fn(ExecutionContext) -> Fut + Send + Sync + 'static,
  Fut: Future<Output = StageResult<FilterFlow>> + Send + 'static,
{
  fn name(&self) -> &str {
    &self.name
  }

  async fn apply(&self, ctx: &ExecutionContext) -> StageResult<FilterFlow> {
    (self.func)(ctx.clone()).await
  }
}
