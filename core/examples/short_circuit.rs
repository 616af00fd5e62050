// gantry/examples/short_circuit.rs

use async_trait::async_trait;
use gantry::{
  handler_fn, pre_filter_fn, Dispatcher, ExecutionContext, FilterFlow, GantryError, HeaderGuard, Interceptor, Next,
  Request, ResolvedRoute, Response, Scope, ScopePath, StageBinding, StageRegistry, StageResult,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::info;

// An interceptor that answers from a cache without resuming the pipeline.
#[derive(Default)]
struct CacheInterceptor {
  entries: Mutex<HashMap<String, Value>>,
}

#[async_trait]
impl Interceptor for CacheInterceptor {
  fn name(&self) -> &str {
    "CacheInterceptor"
  }

  async fn intercept(&self, ctx: &ExecutionContext, next: Next<'_>) -> StageResult<Value> {
    let key = ctx.request().url();
    if let Some(hit) = self.entries.lock().get(&key).cloned() {
      info!(key = %key, "Cache hit, skipping handler.");
      return Ok(hit);
    }
    let value = next.run().await?;
    self.entries.lock().insert(key, value.clone());
    Ok(value)
  }
}

#[tokio::main]
async fn main() -> Result<(), GantryError> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

  info!("--- Short-Circuit Example ---");

  // 1. A pre-filter answering CORS preflight requests directly.
  let preflight = pre_filter_fn("preflight", |ctx: ExecutionContext| async move {
    if ctx.request().method == "OPTIONS" {
      return Ok(FilterFlow::Respond(Response::no_content().with_header("allow", "GET, OPTIONS")));
    }
    Ok(FilterFlow::Continue)
  });

  // 2. A guard, then a caching interceptor.
  let registry = StageRegistry::builder()
    .with(Scope::Global, StageBinding::pre_filter(preflight))
    .with(Scope::controller("reports"), StageBinding::guard(HeaderGuard::new("auth")))
    .with(Scope::route("reports.daily"), StageBinding::interceptor(CacheInterceptor::default()))
    .freeze();

  let route = ResolvedRoute::new(
    ScopePath::new("reports.daily").in_controller("reports"),
    handler_fn(|_ctx: ExecutionContext, _args: Vec<Value>| async move {
      info!("Computing the daily report.");
      Ok(json!({ "visits": 1234 }))
    }),
  );
  let dispatcher = Dispatcher::new(registry);

  let requests = [
    Request::new("OPTIONS", "/reports/daily"),
    Request::get("/reports/daily"),
    Request::get("/reports/daily").with_header("auth", "token"),
    Request::get("/reports/daily").with_header("auth", "token"),
  ];
  for request in requests {
    let label = format!("{} {}", request.method, request.url());
    let response = dispatcher.dispatch(&route, request).await?;
    info!(status = response.status, body = %response.body, "Response for {}.", label);
  }

  Ok(())
}
