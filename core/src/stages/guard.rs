// gantry/src/stages/guard.rs

//! Access-control stage.

use crate::core::context::ExecutionContext;
use crate::core::rejection::{RejectionKind, StageResult};
use async_trait::async_trait;
use std::future::Future;
use tracing::{event, Level};

/// A yes/no access decision taken before any argument is transformed.
///
/// Returning `Ok(false)` is not an error: the dispatcher turns it into a standard
/// `Unauthorized` rejection. Returning `Err` routes the rejection to the exception
/// filter chain as-is, except that an `Unhandled` rejection (including one converted
/// from an internal error) is reclassified to [`error_kind`](Guard::error_kind) when
/// the guard declares one.
#[async_trait]
pub trait Guard: Send + Sync + 'static {
  fn name(&self) -> &str {
    std::any::type_name::<Self>()
  }

  async fn can_activate(&self, ctx: &ExecutionContext) -> StageResult<bool>;

  /// Classification applied to `Unhandled` rejections raised by this guard.
  fn error_kind(&self) -> Option<RejectionKind> {
    None
  }
}

/// Allows the request only when a header is present and non-empty.
#[derive(Debug, Clone)]
pub struct HeaderGuard {
  header: String,
}

impl HeaderGuard {
  pub fn new(header: impl Into<String>) -> Self {
    Self { header: header.into() }
  }
}

#[async_trait]
impl Guard for HeaderGuard {
  fn name(&self) -> &str {
    "HeaderGuard"
  }

  async fn can_activate(&self, ctx: &ExecutionContext) -> StageResult<bool> {
    let present = ctx.request().header(&self.header).is_some_and(|v| !v.is_empty());
    if !present {
      event!(Level::DEBUG, header = %self.header, "Required header missing.");
    }
    Ok(present)
  }
}

/// Adapter turning an async closure into a [`Guard`]. See [`guard_fn`].
pub struct FnGuard<F> {
  name: String,
  error_kind: Option<RejectionKind>,
  func: F,
}

impl<F> FnGuard<F> {
  /// Declares the classification used for internal errors raised by the closure.
  pub fn with_error_kind(mut self, kind: RejectionKind) -> Self {
    self.error_kind = Some(kind);
    self
  }
}

pub fn guard_fn<F, Fut>(name: impl Into<String>, func: F) -> FnGuard<F>
where
  F: Fn(ExecutionContext) -> Fut + Send + Sync + 'static,
  Fut: Future<Output = StageResult<bool>> + Send + 'static,
{
  FnGuard {
    name: name.into(),
    error_kind: None,
    func,
  }
}

#[async_trait]
impl<F, Fut> Guard for FnGuard<F>
where
  F: Fn(ExecutionContext) -> Fut + Send + Sync + 'static,
  Fut: Future<Output = StageResult<bool>> + Send + 'static,
{
  fn name(&self) -> &str {
    &self.name
  }

  async fn can_activate(&self, ctx: &ExecutionContext) -> StageResult<bool> {
    (self.func)(ctx.clone()).await
  }

  fn error_kind(&self) -> Option<RejectionKind> {
    self.error_kind
  }
}
