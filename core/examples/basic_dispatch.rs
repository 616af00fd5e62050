// gantry/examples/basic_dispatch.rs

use gantry::{
  handler_fn, Dispatcher, ExecutionContext, GantryError, LoggerPreFilter, ParamSource, ParseIntPipe, Rejection,
  Request, ResolvedRoute, Scope, ScopePath, StageBinding, StageRegistry, TimingInterceptor,
};
use serde_json::{json, Value};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), GantryError> {
  // Initialize tracing (optional, for demonstration)
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

  info!("--- Basic Dispatch Example ---");

  // 1. Register stages against scopes, then freeze the registry.
  let registry = StageRegistry::builder()
    .with(Scope::Global, StageBinding::pre_filter(LoggerPreFilter))
    .with(Scope::Global, StageBinding::interceptor(TimingInterceptor))
    .with(Scope::route("items.find_one"), StageBinding::param_pipe(0, ParseIntPipe))
    .freeze();

  // 2. Describe the route: where it lives and what its handler receives.
  let handler = handler_fn(|_ctx: ExecutionContext, args: Vec<Value>| async move {
    let id = args.first().and_then(Value::as_i64).unwrap_or_default();
    if id > 100 {
      return Err(Rejection::not_found(format!("Item {} not found", id)));
    }
    Ok(json!({ "id": id, "name": format!("item-{}", id) }))
  });
  let route = ResolvedRoute::builder(ScopePath::new("items.find_one").in_controller("items"), handler)
    .param(ParamSource::Param("id".to_string()))
    .build()?;

  // 3. Dispatch a few requests.
  let dispatcher = Dispatcher::new(registry);
  for id in ["7", "abc", "404"] {
    let response = dispatcher
      .dispatch(&route, Request::get(format!("/items/{}", id)).with_param("id", id))
      .await?;
    info!(status = response.status, body = %response.body, "Response for id '{}'.", id);
  }

  Ok(())
}
