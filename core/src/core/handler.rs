// gantry/src/core/handler.rs

//! The handler contract and the metadata describing a handler's parameters.

use crate::core::context::ExecutionContext;
use crate::core::message::Request;
use crate::core::rejection::StageResult;
use async_trait::async_trait;
use serde_json::Value;
use std::future::Future;

/// Where a handler parameter takes its raw value from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamSource {
  /// The whole request body.
  Body,
  /// A path parameter extracted by the router.
  Param(String),
  Query(String),
  Header(String),
  /// The request itself, serialized as JSON.
  Request,
}

/// Declaration of one handler parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamMetadata {
  pub index: usize,
  pub source: ParamSource,
}

impl ParamMetadata {
  pub fn new(index: usize, source: ParamSource) -> Self {
    Self { index, source }
  }

  /// The key the parameter is read from, when it has one.
  pub fn name(&self) -> Option<&str> {
    match &self.source {
      ParamSource::Param(name) | ParamSource::Query(name) | ParamSource::Header(name) => Some(name),
      ParamSource::Body | ParamSource::Request => None,
    }
  }

  /// Reads the raw value of this parameter. Missing values are `Value::Null`.
  pub fn extract(&self, request: &Request) -> Value {
    let text = |found: Option<&str>| found.map_or(Value::Null, |v| Value::String(v.to_string()));
    match &self.source {
      ParamSource::Body => request.body.clone(),
      ParamSource::Param(name) => text(request.param(name)),
      ParamSource::Query(name) => text(request.query_value(name)),
      ParamSource::Header(name) => text(request.header(name)),
      ParamSource::Request => serde_json::to_value(request).unwrap_or(Value::Null),
    }
  }
}

/// The target of a dispatch: arbitrary user code that receives the
/// pipe-transformed arguments and produces the response body.
#[async_trait]
pub trait Handler: Send + Sync + 'static {
  async fn handle(&self, ctx: &ExecutionContext, args: Vec<Value>) -> StageResult<Value>;
}

/// Adapter turning an async closure into a [`Handler`]. See [`handler_fn`].
pub struct FnHandler<F> {
  func: F,
}

/// Wraps `func` as a handler. The closure receives a clone of the context handle
/// and the transformed arguments.
pub fn handler_fn<F, Fut>(func: F) -> FnHandler<F>
where
  F: Fn(ExecutionContext, Vec<Value>) -> Fut + Send + Sync + 'static,
  Fut: Future<Output = StageResult<Value>> + Send + 'static,
{
  FnHandler { func }
}

#[async_trait]
impl<F, Fut> Handler for FnHandler<F>
where
  F: Fn(ExecutionContext, Vec<Value>) -> Fut + Send + Sync + 'static,
  Fut: Future<Output = StageResult<Value>> + Send + 'static,
{
  async fn handle(&self, ctx: &ExecutionContext, args: Vec<Value>) -> StageResult<Value> {
    (self.func)(ctx.clone(), args).await
  }
}
