// gantry/examples/exception_filters.rs

use gantry::{
  filter_fn, handler_fn, Dispatcher, DispatcherConfig, ExecutionContext, GantryError, HttpExceptionFilter, Rejection,
  RejectionKind, RejectionSummary, Request, ResolvedRoute, Response, Scope, ScopePath, StageBinding, StageRegistry,
};
use serde_json::{json, Value};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), GantryError> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

  info!("--- Exception Filter Example ---");

  // A NotFound filter scoped to the controller, and a catch-all at global scope.
  let not_found = filter_fn("NotFoundFilter", |summary: RejectionSummary, ctx: ExecutionContext| async move {
    Ok(Response::new(
      404,
      json!({ "missing": ctx.request().path, "reason": summary.message }),
    ))
  });
  let registry = StageRegistry::builder()
    .with(Scope::Global, StageBinding::filter(HttpExceptionFilter))
    .with(Scope::controller("orders"), StageBinding::filter_for(RejectionKind::NotFound, not_found))
    .freeze();

  let dispatcher = Dispatcher::new(registry).with_config(DispatcherConfig::default().expose_correlation_id(false));

  let missing = ResolvedRoute::new(
    ScopePath::new("orders.find_one").in_controller("orders"),
    handler_fn(|_ctx: ExecutionContext, _args: Vec<Value>| async move {
      Err::<Value, _>(Rejection::not_found("Order 17 does not exist"))
    }),
  );
  let broken = ResolvedRoute::new(
    ScopePath::new("orders.export").in_controller("orders"),
    handler_fn(|_ctx: ExecutionContext, _args: Vec<Value>| async move {
      Err::<Value, _>(Rejection::from(anyhow::anyhow!("disk quota exceeded")))
    }),
  );

  for (route, path) in [(&missing, "/orders/17"), (&broken, "/orders/export")] {
    let response = dispatcher.dispatch(route, Request::get(path)).await?;
    info!(status = response.status, body = %response.body, "Response for {}.", path);
  }

  Ok(())
}
