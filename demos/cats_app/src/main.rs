// gantry/demos/cats_app/src/main.rs

mod cats;
mod config;
mod errors;

use crate::cats::{CatsController, CatsService};
use crate::config::AppConfig;
use crate::errors::Result as AppResult;

use gantry::{Dispatcher, LoggerPreFilter, Request, ResolvedRoute, Scope, StageBinding, StageRegistry, TimingInterceptor};
use serde_json::json;
use std::sync::Arc;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> AppResult<()> {
  // Load application configuration
  let app_config = AppConfig::from_env()?;

  // Initialize tracing subscriber for logging (RUST_LOG overrides CATS_LOG_LEVEL)
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&app_config.log_level)))
    .with_span_events(FmtSpan::CLOSE) // Log when spans close, showing duration
    .init();

  tracing::info!(config = ?app_config, "Starting cats application...");

  // Register stages: app-wide ones first, then the controller's own.
  let mut builder = StageRegistry::builder();
  builder
    .register(Scope::Global, StageBinding::pre_filter(LoggerPreFilter))
    .register(Scope::Global, StageBinding::interceptor(TimingInterceptor));
  CatsController::register_stages(&mut builder, &app_config);
  let registry = builder.freeze();
  tracing::info!(bindings = registry.binding_count(), "Stage registry frozen.");

  let dispatcher = Dispatcher::new(registry).with_config(app_config.dispatcher_config());
  let controller = CatsController::new(Arc::new(CatsService::default()))?;

  let requests: Vec<(&ResolvedRoute, Request)> = vec![
    (&controller.find_all, Request::get("/cats")),
    (&controller.find_one, Request::get("/cats/1").with_param("id", "1")),
    (&controller.find_one, Request::get("/cats/abc").with_param("id", "abc")),
    (&controller.find_one, Request::get("/cats/7").with_param("id", "7")),
    (&controller.create, Request::post("/cats").with_body(json!({ "name": "ab" }))),
    (&controller.create, Request::post("/cats").with_body(json!({ "name": "Kitty" }))),
    (&controller.find_all, Request::get("/cats")),
    (&controller.find_protected, Request::get("/cats/protected")),
    (
      &controller.find_protected,
      Request::get("/cats/protected").with_header(&app_config.auth_header, "secret"),
    ),
  ];

  for (route, request) in requests {
    let label = format!("{} {}", request.method, request.url());
    let response = dispatcher.dispatch(route, request).await?;
    println!("{} -> {} {}", label, response.status, response.body);
  }

  Ok(())
}
