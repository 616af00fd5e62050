// tests/guard_tests.rs
mod common;

use common::*;
use gantry::{
  guard_fn, Dispatcher, ExecutionContext, HeaderGuard, ParamSource, Rejection, RejectionKind, Request, ResolvedRoute,
  Scope, ScopePath, StageBinding, StageRegistry,
};
use serde_json::json;
use serial_test::serial;

fn protected_path() -> ScopePath {
  ScopePath::new("cats.find_protected").in_module("cats_module").in_controller("cats")
}

#[tokio::test]
#[serial]
async fn test_guard_false_yields_default_unauthorized_response() {
  setup_tracing();
  let log = ExecutionLog::new();
  let calls = CallCounter::new();
  let registry = StageRegistry::builder()
    .with(Scope::route("cats.find_protected"), StageBinding::guard(RecordingGuard::new("deny", false, &log)))
    .freeze();
  let route = ResolvedRoute::new(protected_path(), echo_handler(&calls, &log));

  let response = Dispatcher::new(registry).dispatch(&route, Request::get("/cats/protected")).await.unwrap();

  assert_eq!(calls.count(), 0);
  assert_eq!(response.status, 401);
  assert_eq!(
    response.body,
    json!({ "statusCode": 401, "message": "Unauthorized", "error": "Unauthorized" })
  );
}

#[tokio::test]
#[serial]
async fn test_guards_short_circuit_in_scope_order() {
  setup_tracing();
  let log = ExecutionLog::new();
  let calls = CallCounter::new();

  let global = RecordingGuard::new("global", true, &log);
  let module = RecordingGuard::new("module", true, &log);
  let controller = RecordingGuard::new("controller", false, &log);
  let route_guard = RecordingGuard::new("route", true, &log);
  let counters = [
    global.calls.clone(),
    module.calls.clone(),
    controller.calls.clone(),
    route_guard.calls.clone(),
  ];

  let registry = StageRegistry::builder()
    .with(Scope::route("cats.find_protected"), StageBinding::guard(route_guard))
    .with(Scope::controller("cats"), StageBinding::guard(controller))
    .with(Scope::module("cats_module"), StageBinding::guard(module))
    .with(Scope::Global, StageBinding::guard(global))
    .freeze();
  let route = ResolvedRoute::new(protected_path(), echo_handler(&calls, &log));

  let response = Dispatcher::new(registry).dispatch(&route, Request::get("/cats/protected")).await.unwrap();

  assert_eq!(response.status, 401);
  assert_eq!(log.entries(), vec!["global", "module", "controller"]);
  let counts: Vec<usize> = counters.iter().map(CallCounter::count).collect();
  assert_eq!(counts, vec![1, 1, 1, 0]);
  assert_eq!(calls.count(), 0);
}

#[tokio::test]
#[serial]
async fn test_guard_sees_raw_request_before_pipes() {
  setup_tracing();
  let log = ExecutionLog::new();
  let calls = CallCounter::new();
  let registry = StageRegistry::builder()
    .with(Scope::Global, StageBinding::guard(RecordingGuard::new("guard", true, &log)))
    .with(Scope::Global, StageBinding::pipe(gantry::ParseIntPipe))
    .freeze();
  let route = ResolvedRoute::builder(protected_path(), echo_handler(&calls, &log))
    .param(ParamSource::Param("id".to_string()))
    .build()
    .unwrap();

  // The guard asserts that no transformed argument is visible; the pipe then rejects.
  let response = Dispatcher::new(registry)
    .dispatch(&route, Request::get("/cats/abc").with_param("id", "abc"))
    .await
    .unwrap();

  assert_eq!(log.entries(), vec!["guard"]);
  assert_eq!(response.status, 400);
  assert_eq!(calls.count(), 0);
}

#[tokio::test]
#[serial]
async fn test_guard_errors_keep_or_take_classification() {
  setup_tracing();
  let log = ExecutionLog::new();
  let calls = CallCounter::new();
  let route = ResolvedRoute::new(protected_path(), echo_handler(&calls, &log));

  // Explicitly classified rejection keeps its kind.
  let registry = StageRegistry::builder()
    .with(
      Scope::Global,
      StageBinding::guard(guard_fn("lookup", |_ctx: ExecutionContext| async move {
        Err::<bool, _>(Rejection::not_found("Tenant not found"))
      })),
    )
    .freeze();
  let response = Dispatcher::new(registry).dispatch(&route, Request::get("/")).await.unwrap();
  assert_eq!(response.status, 404);
  assert_eq!(response.body["message"], json!("Tenant not found"));

  // Internal error with a declared classification is reclassified.
  let registry = StageRegistry::builder()
    .with(
      Scope::Global,
      StageBinding::guard(
        guard_fn("token", |_ctx: ExecutionContext| async move {
          Err::<bool, _>(Rejection::from(anyhow::anyhow!("token signature mismatch")))
        })
        .with_error_kind(RejectionKind::Unauthorized),
      ),
    )
    .freeze();
  let response = Dispatcher::new(registry).dispatch(&route, Request::get("/")).await.unwrap();
  assert_eq!(response.status, 401);
  assert!(!response.body.to_string().contains("signature"));

  // An explicit unhandled rejection is reclassified as well.
  let registry = StageRegistry::builder()
    .with(
      Scope::Global,
      StageBinding::guard(
        guard_fn("token", |_ctx: ExecutionContext| async move {
          Err::<bool, _>(Rejection::unhandled("token check failed"))
        })
        .with_error_kind(RejectionKind::Unauthorized),
      ),
    )
    .freeze();
  let response = Dispatcher::new(registry).dispatch(&route, Request::get("/")).await.unwrap();
  assert_eq!(response.status, 401);
  assert_eq!(
    response.body,
    json!({ "statusCode": 401, "message": "token check failed", "error": "Unauthorized" })
  );

  // Internal error without a declared classification stays unhandled.
  let registry = StageRegistry::builder()
    .with(
      Scope::Global,
      StageBinding::guard(guard_fn("token", |_ctx: ExecutionContext| async move {
        Err::<bool, _>(Rejection::from(anyhow::anyhow!("token signature mismatch")))
      })),
    )
    .freeze();
  let response = Dispatcher::new(registry).dispatch(&route, Request::get("/")).await.unwrap();
  assert_eq!(response.status, 500);
  assert!(!response.body.to_string().contains("signature"));
  assert_eq!(calls.count(), 0);
}

#[tokio::test]
#[serial]
async fn test_async_guard_suspends_and_resumes() {
  setup_tracing();
  let log = ExecutionLog::new();
  let calls = CallCounter::new();
  let registry = StageRegistry::builder()
    .with(
      Scope::Global,
      StageBinding::guard(guard_fn("remote_check", |ctx: ExecutionContext| async move {
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        let user = ctx.request().header("x-user").map(str::to_string);
        if let Some(user) = &user {
          ctx.set_attribute("user", json!(user));
        }
        Ok(user.is_some())
      })),
    )
    .freeze();

  let handler = gantry::handler_fn(|ctx: ExecutionContext, _args| async move {
    Ok(json!({ "user": ctx.attribute("user") }))
  });
  let route = ResolvedRoute::new(protected_path(), handler);
  let dispatcher = Dispatcher::new(registry);

  let response = dispatcher
    .dispatch(&route, Request::get("/").with_header("X-User", "tom"))
    .await
    .unwrap();
  assert_eq!(response.status, 200);
  assert_eq!(response.body, json!({ "user": "tom" }));

  let response = dispatcher.dispatch(&route, Request::get("/")).await.unwrap();
  assert_eq!(response.status, 401);
  assert_eq!(calls.count(), 0);
}

#[tokio::test]
#[serial]
async fn test_header_guard() {
  setup_tracing();
  let log = ExecutionLog::new();
  let calls = CallCounter::new();
  let registry = StageRegistry::builder()
    .with(Scope::route("cats.find_protected"), StageBinding::guard(HeaderGuard::new("auth")))
    .freeze();
  let route = ResolvedRoute::new(protected_path(), echo_handler(&calls, &log));
  let dispatcher = Dispatcher::new(registry);

  let denied = dispatcher.dispatch(&route, Request::get("/cats/protected")).await.unwrap();
  assert_eq!(denied.status, 401);

  let empty = dispatcher
    .dispatch(&route, Request::get("/cats/protected").with_header("auth", ""))
    .await
    .unwrap();
  assert_eq!(empty.status, 401);

  let allowed = dispatcher
    .dispatch(&route, Request::get("/cats/protected").with_header("Auth", "token"))
    .await
    .unwrap();
  assert_eq!(allowed.status, 200);
  assert_eq!(calls.count(), 1);
}
