// gantry/src/stages/interceptor.rs

//! Wrapping stage with an explicit continuation.
//!
//! The dispatcher composes all resolved interceptors around the handler once per
//! dispatch. The first-registered interceptor is the outermost layer; each layer
//! captures only the [`Next`] handle of the layer beneath it.

use crate::core::context::ExecutionContext;
use crate::core::handler::Handler;
use crate::core::rejection::StageResult;
use async_trait::async_trait;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::time::Instant;
use tracing::{event, Level};

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Runs logic before and after the rest of the pipeline.
///
/// - Not calling `next.run()` short-circuits: the interceptor's own value becomes
///   the result and the handler is never invoked.
/// - Code after `next.run().await` is post-processing of the handler's result.
/// - An `Err` from `next.run()` may be recovered (return a substitute value) or
///   propagated with `?`, in which case it travels on to the exception filter chain.
#[async_trait]
pub trait Interceptor: Send + Sync + 'static {
  fn name(&self) -> &str {
    std::any::type_name::<Self>()
  }

  async fn intercept(&self, ctx: &ExecutionContext, next: Next<'_>) -> StageResult<Value>;
}

/// Single-use handle to the remaining pipeline: inner interceptors, then the handler.
///
/// [`run`](Next::run) consumes the handle, so it cannot be resumed twice.
pub struct Next<'a> {
  inner: NextInner<'a>,
}

enum NextInner<'a> {
  Chain {
    interceptor: &'a dyn Interceptor,
    ctx: &'a ExecutionContext,
    next: Box<Next<'a>>,
  },
  Terminal(Box<dyn FnOnce() -> BoxFuture<'a, StageResult<Value>> + Send + 'a>),
}

impl<'a> Next<'a> {
  /// Terminal continuation invoking `handler` with the transformed arguments.
  pub(crate) fn handler(handler: &'a dyn Handler, ctx: &'a ExecutionContext, args: Vec<Value>) -> Self {
    Self {
      inner: NextInner::Terminal(Box::new(move || handler.handle(ctx, args))),
    }
  }

  /// Wraps `next` in one more interceptor layer.
  pub(crate) fn wrap(interceptor: &'a dyn Interceptor, ctx: &'a ExecutionContext, next: Next<'a>) -> Self {
    Self {
      inner: NextInner::Chain {
        interceptor,
        ctx,
        next: Box::new(next),
      },
    }
  }

  /// Builds the full chain: `interceptors[0]` ends up outermost, the handler innermost.
  pub(crate) fn compose<I>(interceptors: I, handler: &'a dyn Handler, ctx: &'a ExecutionContext, args: Vec<Value>) -> Self
  where
    I: DoubleEndedIterator<Item = &'a dyn Interceptor>,
  {
    interceptors
      .rev()
      .fold(Next::handler(handler, ctx, args), |next, interceptor| Next::wrap(interceptor, ctx, next))
  }

  /// Number of interceptor layers still ahead of the handler.
  pub fn remaining(&self) -> usize {
    match &self.inner {
      NextInner::Chain { next, .. } => 1 + next.remaining(),
      NextInner::Terminal(_) => 0,
    }
  }

  /// Resumes the remaining pipeline and yields its eventual result.
  pub fn run(self) -> BoxFuture<'a, StageResult<Value>> {
    match self.inner {
      NextInner::Chain { interceptor, ctx, next } => {
        event!(Level::TRACE, interceptor = %interceptor.name(), "Entering interceptor.");
        interceptor.intercept(ctx, *next)
      }
      NextInner::Terminal(call) => {
        event!(Level::DEBUG, "Invoking handler.");
        call()
      }
    }
  }
}

/// Logs before and after the rest of the pipeline, and stages the elapsed time in
/// an `x-response-time` header.
///
/// Errors from the continuation are propagated untouched; in that case the
/// "after" log line and the header are not produced.
#[derive(Debug, Clone, Default)]
pub struct TimingInterceptor;

#[async_trait]
impl Interceptor for TimingInterceptor {
  fn name(&self) -> &str {
    "TimingInterceptor"
  }

  async fn intercept(&self, ctx: &ExecutionContext, next: Next<'_>) -> StageResult<Value> {
    event!(Level::INFO, route = %ctx.route_id(), "Before...");
    let started = Instant::now();
    let value = next.run().await?;
    let elapsed = started.elapsed();
    event!(Level::INFO, route = %ctx.route_id(), elapsed_ms = elapsed.as_millis() as u64, "After...");
    if let Some(mut response) = ctx.response_mut() {
      response.set_header("x-response-time", format!("{}ms", elapsed.as_millis()));
    }
    Ok(value)
  }
}

/// Adapter turning a closure into an [`Interceptor`]. See [`interceptor_fn`].
pub struct FnInterceptor<F> {
  name: String,
  func: F,
}

/// Wraps `func` as an interceptor. The closure must box its future:
///
/// ```ignore
/// interceptor_fn("cache", |_ctx, next| Box::pin(async move { next.run().await }))
/// ```
pub fn interceptor_fn<F>(name: impl Into<String>, func: F) -> FnInterceptor<F>
where
  F: for<'a> Fn(ExecutionContext, Next<'a>) -> BoxFuture<'a, StageResult<Value>> + Send + Sync + 'static,
{
  FnInterceptor { name: name.into(), func }
}

#[async_trait]
impl<F> Interceptor for FnInterceptor<F>
where
  F: for<'a> Fn(ExecutionContext, Next<'a>) -> BoxFuture<'a, StageResult<Value>> + Send + Sync + 'static,
{
  fn name(&self) -> &str {
    &self.name
  }

  async fn intercept(&self, ctx: &ExecutionContext, next: Next<'_>) -> StageResult<Value> {
    (self.func)(ctx.clone(), next).await
  }
}
