// gantry/src/stages/exception_filter.rs

//! Translation of rejections into caller-visible responses.

use crate::config::DispatcherConfig;
use crate::core::context::ExecutionContext;
use crate::core::message::Response;
use crate::core::rejection::{Rejection, RejectionKind};
use crate::error::{GantryError, GantryResult};
use crate::registry::{ScopePath, StageRegistry};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::future::Future;
use std::sync::Arc;
use tracing::{event, Level};

/// Maps a rejection to a response.
///
/// A filter that fails (returns `Err`) makes the request unrecoverable: there is no
/// further recovery layer above the filter chain.
#[async_trait]
pub trait ExceptionFilter: Send + Sync + 'static {
  fn name(&self) -> &str {
    std::any::type_name::<Self>()
  }

  async fn catch(&self, rejection: &Rejection, ctx: &ExecutionContext) -> anyhow::Result<Response>;
}

/// Which rejections a filter binding handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Catch {
  /// Every classification. Least specific.
  Any,
  Kind(RejectionKind),
}

impl Catch {
  pub fn matches(&self, kind: RejectionKind) -> bool {
    match self {
      Catch::Any => true,
      Catch::Kind(bound) => *bound == kind,
    }
  }

  pub fn is_specific(&self) -> bool {
    matches!(self, Catch::Kind(_))
  }
}

#[derive(Clone)]
pub struct FilterBinding {
  pub catch: Catch,
  pub filter: Arc<dyn ExceptionFilter>,
}

impl FilterBinding {
  pub fn new(catch: Catch, filter: impl ExceptionFilter) -> Self {
    Self {
      catch,
      filter: Arc::new(filter),
    }
  }
}

impl std::fmt::Debug for FilterBinding {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("FilterBinding")
      .field("catch", &self.catch)
      .field("filter", &self.filter.name())
      .finish()
  }
}

/// The exception filters visible from one scope path, plus the default mapping.
pub struct ExceptionFilterChain<'a> {
  registry: &'a StageRegistry,
  path: &'a ScopePath,
  config: &'a DispatcherConfig,
}

impl<'a> ExceptionFilterChain<'a> {
  pub fn new(registry: &'a StageRegistry, path: &'a ScopePath, config: &'a DispatcherConfig) -> Self {
    Self { registry, path, config }
  }

  /// Picks the filter for `kind`.
  ///
  /// Scopes are visited narrowest first (route, controller, module, global). Within a
  /// scope, filters bound to `kind` itself are preferred over `Catch::Any`, each
  /// group in registration order. The first match wins.
  pub fn select(&self, kind: RejectionKind) -> Option<&'a FilterBinding> {
    self.registry.resolve_filters_narrowest_first(self.path).find_map(|level| {
      level
        .iter()
        .find(|binding| binding.catch == Catch::Kind(kind))
        .or_else(|| level.iter().find(|binding| binding.catch == Catch::Any))
    })
  }

  pub async fn handle(&self, rejection: &Rejection, ctx: &ExecutionContext) -> GantryResult<Response> {
    match self.select(rejection.kind()) {
      Some(binding) => {
        let filter_name = binding.filter.name().to_string();
        event!(Level::DEBUG, filter = %filter_name, kind = %rejection.kind(), "Exception filter selected.");
        binding
          .filter
          .catch(rejection, ctx)
          .await
          .map_err(|source| GantryError::FilterFailure {
            filter: filter_name,
            source,
          })
      }
      None => {
        event!(Level::DEBUG, kind = %rejection.kind(), "No exception filter matched, using default mapping.");
        Ok(default_response(rejection, ctx, self.config))
      }
    }
  }
}

/// The mapping applied when no registered filter matches.
///
/// `Unhandled` rejections only ever expose the configured generic message and,
/// optionally, the correlation id; their internal payload stays in the logs.
pub fn default_response(rejection: &Rejection, ctx: &ExecutionContext, config: &DispatcherConfig) -> Response {
  let kind = rejection.kind();
  let mut body = Map::new();
  body.insert("statusCode".to_string(), json!(kind.status_code()));

  match kind {
    RejectionKind::Unhandled => {
      body.insert("message".to_string(), json!(config.unhandled_message));
      if config.expose_correlation_id {
        body.insert("correlationId".to_string(), json!(ctx.correlation_id().to_string()));
      }
    }
    RejectionKind::ValidationFailed => {
      body.insert("message".to_string(), json!(rejection.message().unwrap_or(kind.reason())));
      body.insert("error".to_string(), json!(kind.reason()));
      if config.expose_validation_details {
        if let Some(field) = rejection.field() {
          body.insert("field".to_string(), json!(field));
        }
        if let Some(details) = rejection.details() {
          body.insert("violations".to_string(), details.clone());
        }
      }
    }
    RejectionKind::Unauthorized | RejectionKind::NotFound => {
      body.insert("message".to_string(), json!(rejection.message().unwrap_or(kind.reason())));
      body.insert("error".to_string(), json!(kind.reason()));
    }
  }

  Response::new(kind.status_code(), Value::Object(body))
}

/// Renders every rejection with its status code and the request path.
///
/// Messages of `Unhandled` rejections are replaced by a generic text.
#[derive(Debug, Clone, Default)]
pub struct HttpExceptionFilter;

#[async_trait]
impl ExceptionFilter for HttpExceptionFilter {
  fn name(&self) -> &str {
    "HttpExceptionFilter"
  }

  async fn catch(&self, rejection: &Rejection, ctx: &ExecutionContext) -> anyhow::Result<Response> {
    let kind = rejection.kind();
    let message = match kind {
      RejectionKind::Unhandled => kind.reason(),
      _ => rejection.message().unwrap_or(kind.reason()),
    };
    Ok(Response::new(
      kind.status_code(),
      json!({
        "statusCode": kind.status_code(),
        "path": ctx.request().path,
        "message": message,
      }),
    ))
  }
}

/// Adapter turning an async closure into an [`ExceptionFilter`]. See [`filter_fn`].
pub struct FnExceptionFilter<F> {
  name: String,
  func: F,
}

/// Wraps `func` as an exception filter.
///
/// The closure receives the rejection's classification, message and field (the
/// rejection itself is borrowed and cannot move into a `'static` future) and a clone
/// of the context handle.
pub fn filter_fn<F, Fut>(name: impl Into<String>, func: F) -> FnExceptionFilter<F>
where
  F: Fn(RejectionSummary, ExecutionContext) -> Fut + Send + Sync + 'static,
  Fut: Future<Output = anyhow::Result<Response>> + Send + 'static,
{
  FnExceptionFilter { name: name.into(), func }
}

/// Owned copy of the caller-safe parts of a rejection.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectionSummary {
  pub kind: RejectionKind,
  pub message: Option<String>,
  pub field: Option<String>,
  pub details: Option<Value>,
}

impl From<&Rejection> for RejectionSummary {
  fn from(rejection: &Rejection) -> Self {
    Self {
      kind: rejection.kind(),
      message: rejection.message().map(str::to_string),
      field: rejection.field().map(str::to_string),
      details: rejection.details().cloned(),
    }
  }
}

#[async_trait]
impl<F, Fut> ExceptionFilter for FnExceptionFilter<F>
where
  F: Fn(RejectionSummary, ExecutionContext) -> Fut + Send + Sync + 'static,
  Fut: Future<Output = anyhow::Result<Response>> + Send + 'static,
{
  fn name(&self) -> &str {
    &self.name
  }

  async fn catch(&self, rejection: &Rejection, ctx: &ExecutionContext) -> anyhow::Result<Response> {
    (self.func)(RejectionSummary::from(rejection), ctx.clone()).await
  }
}
