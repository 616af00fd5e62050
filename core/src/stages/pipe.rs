// gantry/src/stages/pipe.rs

//! Argument-transformation stage.

use crate::core::context::ExecutionContext;
use crate::core::handler::ParamMetadata;
use crate::core::rejection::StageResult;
use async_trait::async_trait;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

/// Transforms or validates one raw argument before the handler sees it.
///
/// Pipes bound to the same parameter run in resolution order, each receiving the
/// previous pipe's output. Coercion pipes and schema-validation pipes share this
/// contract; both reject through the same channel.
#[async_trait]
pub trait Pipe: Send + Sync + 'static {
  fn name(&self) -> &str {
    std::any::type_name::<Self>()
  }

  async fn transform(&self, value: Value, meta: &ParamMetadata) -> StageResult<Value>;
}

/// Which parameters a pipe binding applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipeTarget {
  /// Every declared parameter of the handler.
  AllParams,
  /// Only the parameter at this index.
  Param(usize),
}

impl PipeTarget {
  pub fn applies_to(&self, index: usize) -> bool {
    match self {
      PipeTarget::AllParams => true,
      PipeTarget::Param(target) => *target == index,
    }
  }
}

#[derive(Clone)]
pub struct PipeBinding {
  pub target: PipeTarget,
  pub pipe: Arc<dyn Pipe>,
}

impl PipeBinding {
  pub fn new(target: PipeTarget, pipe: impl Pipe) -> Self {
    Self {
      target,
      pipe: Arc::new(pipe),
    }
  }
}

impl std::fmt::Debug for PipeBinding {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("PipeBinding")
      .field("target", &self.target)
      .field("pipe", &self.pipe.name())
      .finish()
  }
}

/// Adapter turning an async closure into a [`Pipe`]. See [`pipe_fn`].
pub struct FnPipe<F> {
  name: String,
  func: F,
}

/// Wraps `func` as a pipe. The closure receives the value and an owned copy of the
/// parameter metadata.
pub fn pipe_fn<F, Fut>(name: impl Into<String>, func: F) -> FnPipe<F>
where
  F: Fn(Value, ParamMetadata) -> Fut + Send + Sync + 'static,
  Fut: Future<Output = StageResult<Value>> + Send + 'static,
{
  FnPipe { name: name.into(), func }
}

#[async_trait]
impl<F, Fut> Pipe for FnPipe<F>
where
  F: Fn(Value, ParamMetadata) -> Fut + Send + Sync + 'static,
  Fut: Future<Output = StageResult<Value>> + Send + 'static,
{
  fn name(&self) -> &str {
    &self.name
  }

  async fn transform(&self, value: Value, meta: &ParamMetadata) -> StageResult<Value> {
    (self.func)(value, meta.clone()).await
  }
}

/// Runs every applicable pipe over every declared parameter, in declaration order.
///
/// Stops at the first rejection; the remaining pipes of that parameter and all
/// later parameters are not evaluated.
pub(crate) async fn apply_pipes(
  pipes: &[&PipeBinding],
  params: &[ParamMetadata],
  raw_args: Vec<Value>,
  ctx: &ExecutionContext,
) -> StageResult<Vec<Value>> {
  let mut args = Vec::with_capacity(raw_args.len());
  for (meta, mut value) in params.iter().zip(raw_args) {
    for binding in pipes.iter().filter(|b| b.target.applies_to(meta.index)) {
      tracing::trace!(pipe = %binding.pipe.name(), param_index = meta.index, route = %ctx.route_id(), "Applying pipe.");
      value = binding.pipe.transform(value, meta).await?;
    }
    args.push(value);
  }
  Ok(args)
}
