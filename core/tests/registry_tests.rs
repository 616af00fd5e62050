// tests/registry_tests.rs
mod common;

use common::*;
use gantry::{
  BindingRef, HttpExceptionFilter, LoggerPreFilter, ParseIntPipe, PipeTarget, RejectionKind, Scope, ScopePath,
  StageBinding, StageKind, StageRegistry, TimingInterceptor,
};

fn guard(name: &'static str, log: &ExecutionLog) -> StageBinding {
  StageBinding::guard(RecordingGuard::new(name, true, log))
}

fn cats_path() -> ScopePath {
  ScopePath::new("cats.find_all").in_module("cats_module").in_controller("cats")
}

fn names<'a>(bindings: impl Iterator<Item = BindingRef<'a>>) -> Vec<String> {
  bindings.map(|b| b.name().to_string()).collect()
}

#[test]
fn test_resolve_orders_scopes_broad_to_narrow() {
  setup_tracing();
  let log = ExecutionLog::new();
  // Registered deliberately out of scope order.
  let registry = StageRegistry::builder()
    .with(Scope::route("cats.find_all"), guard("route", &log))
    .with(Scope::controller("cats"), guard("controller", &log))
    .with(Scope::Global, guard("global", &log))
    .with(Scope::module("cats_module"), guard("module", &log))
    .freeze();

  let resolved = names(registry.resolve(&cats_path(), StageKind::Guard));
  assert_eq!(resolved, vec!["global", "module", "controller", "route"]);
}

#[test]
fn test_resolve_preserves_registration_order_within_scope() {
  setup_tracing();
  let log = ExecutionLog::new();
  let mut builder = StageRegistry::builder();
  builder
    .register(Scope::Global, guard("g1", &log))
    .register(Scope::Global, guard("g2", &log))
    .register(Scope::controller("cats"), guard("c1", &log))
    .register(Scope::Global, guard("g3", &log))
    .register(Scope::controller("cats"), guard("c2", &log));
  let registry = builder.freeze();

  let resolved: Vec<String> = registry
    .resolve_guards(&cats_path())
    .map(|g| g.name().to_string())
    .collect();
  assert_eq!(resolved, vec!["g1", "g2", "g3", "c1", "c2"]);
}

#[test]
fn test_resolve_ignores_scopes_outside_the_path() {
  setup_tracing();
  let log = ExecutionLog::new();
  let registry = StageRegistry::builder()
    .with(Scope::Global, guard("global", &log))
    .with(Scope::controller("dogs"), guard("dogs_controller", &log))
    .with(Scope::route("dogs.find_all"), guard("dogs_route", &log))
    .with(Scope::module("other_module"), guard("other_module", &log))
    .freeze();

  let resolved = names(registry.resolve(&cats_path(), StageKind::Guard));
  assert_eq!(resolved, vec!["global"]);

  // A path without module or controller only sees global and its own route.
  let bare = ScopePath::new("dogs.find_all");
  let resolved = names(registry.resolve(&bare, StageKind::Guard));
  assert_eq!(resolved, vec!["global", "dogs_route"]);
}

#[test]
fn test_resolve_filters_by_kind() {
  setup_tracing();
  let log = ExecutionLog::new();
  let registry = StageRegistry::builder()
    .with(Scope::Global, StageBinding::pre_filter(LoggerPreFilter))
    .with(Scope::Global, guard("auth", &log))
    .with(Scope::Global, StageBinding::interceptor(TimingInterceptor))
    .with(Scope::route("cats.find_all"), StageBinding::param_pipe(0, ParseIntPipe))
    .with(Scope::Global, StageBinding::filter(HttpExceptionFilter))
    .freeze();

  let path = cats_path();
  assert_eq!(names(registry.resolve(&path, StageKind::PreFilter)), vec!["LoggerPreFilter"]);
  assert_eq!(names(registry.resolve(&path, StageKind::Guard)), vec!["auth"]);
  assert_eq!(names(registry.resolve(&path, StageKind::Interceptor)), vec!["TimingInterceptor"]);
  assert_eq!(names(registry.resolve(&path, StageKind::Pipe)), vec!["ParseIntPipe"]);
  assert_eq!(names(registry.resolve(&path, StageKind::ExceptionFilter)), vec!["HttpExceptionFilter"]);
  assert_eq!(registry.binding_count(), 5);

  let pipes: Vec<_> = registry.resolve_pipes(&path).collect();
  assert_eq!(pipes[0].target, PipeTarget::Param(0));
}

#[test]
fn test_filters_are_grouped_narrowest_scope_first() {
  setup_tracing();
  let registry = StageRegistry::builder()
    .with(Scope::Global, StageBinding::filter(HttpExceptionFilter))
    .with(
      Scope::route("cats.find_all"),
      StageBinding::filter_for(RejectionKind::NotFound, HttpExceptionFilter),
    )
    .with(Scope::controller("cats"), StageBinding::filter(HttpExceptionFilter))
    .freeze();

  let levels: Vec<usize> = registry
    .resolve_filters_narrowest_first(&cats_path())
    .map(|level| level.len())
    .collect();
  // route (1), controller (1), global (1); the module has no set and is skipped.
  assert_eq!(levels, vec![1, 1, 1]);

  let first_level = registry.resolve_filters_narrowest_first(&cats_path()).next().unwrap();
  assert_eq!(first_level[0].catch, gantry::Catch::Kind(RejectionKind::NotFound));
}

#[test]
fn test_binding_reports_its_kind() {
  let log = ExecutionLog::new();
  assert_eq!(StageBinding::pre_filter(LoggerPreFilter).kind(), StageKind::PreFilter);
  assert_eq!(guard("g", &log).kind(), StageKind::Guard);
  assert_eq!(StageBinding::interceptor(TimingInterceptor).kind(), StageKind::Interceptor);
  assert_eq!(StageBinding::pipe(ParseIntPipe).kind(), StageKind::Pipe);
  assert_eq!(StageBinding::filter(HttpExceptionFilter).kind(), StageKind::ExceptionFilter);
  assert_eq!(Scope::controller("cats").level(), gantry::ScopeLevel::Controller);
  assert!(gantry::ScopeLevel::Global < gantry::ScopeLevel::Route);
}

#[test]
fn test_empty_registry_resolves_nothing() {
  let registry = StageRegistry::empty();
  assert_eq!(registry.binding_count(), 0);
  assert_eq!(registry.resolve(&cats_path(), StageKind::Guard).count(), 0);
  assert_eq!(registry.resolve_filters_narrowest_first(&cats_path()).count(), 1); // the (empty) global set
}
