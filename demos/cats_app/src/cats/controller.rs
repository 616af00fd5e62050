// gantry/demos/cats_app/src/cats/controller.rs

use super::service::CatsService;
use crate::config::AppConfig;
use gantry::{
  handler_fn, ExecutionContext, FieldRule, FieldRules, GantryResult, HeaderGuard, HttpExceptionFilter, ParamSource,
  ParseIntPipe, Rejection, RejectionKind, ResolvedRoute, Scope, ScopePath, StageBinding, StageRegistryBuilder,
  ValidationPipe,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

const MODULE: &str = "cats_module";
const CONTROLLER: &str = "cats";

#[derive(Debug, Deserialize)]
struct CreateCatDto {
  name: String,
}

fn route_path(route: &str) -> ScopePath {
  ScopePath::new(route).in_module(MODULE).in_controller(CONTROLLER)
}

/// The resolved routes of the `cats` controller.
pub struct CatsController {
  pub find_all: ResolvedRoute,
  pub find_one: ResolvedRoute,
  pub create: ResolvedRoute,
  pub find_protected: ResolvedRoute,
}

impl CatsController {
  pub fn new(service: Arc<CatsService>) -> GantryResult<Self> {
    let svc = service.clone();
    let find_all = ResolvedRoute::new(
      route_path("cats.find_all"),
      handler_fn(move |_ctx: ExecutionContext, _args: Vec<Value>| {
        let svc = svc.clone();
        async move { Ok(json!(svc.find_all())) }
      }),
    );

    let svc = service.clone();
    let find_one = ResolvedRoute::builder(
      route_path("cats.find_one"),
      handler_fn(move |_ctx: ExecutionContext, args: Vec<Value>| {
        let svc = svc.clone();
        async move {
          let id = args
            .first()
            .and_then(Value::as_i64)
            .ok_or_else(|| Rejection::validation_failed("id must be an integer").with_field("id"))?;
          Ok::<_, Rejection>(json!(svc.find_one(id)?))
        }
      }),
    )
    .param(ParamSource::Param("id".to_string()))
    .build()?;

    let svc = service;
    let create = ResolvedRoute::builder(
      route_path("cats.create"),
      handler_fn(move |_ctx: ExecutionContext, args: Vec<Value>| {
        let svc = svc.clone();
        async move {
          let body = args.into_iter().next().unwrap_or(Value::Null);
          let dto: CreateCatDto = serde_json::from_value(body).map_err(anyhow::Error::from)?;
          svc.create(dto.name);
          Ok::<_, Rejection>(Value::Null)
        }
      }),
    )
    .method("POST")
    .param(ParamSource::Body)
    .http_code(204)
    .build()?;

    let find_protected = ResolvedRoute::new(
      route_path("cats.find_protected"),
      handler_fn(|_ctx: ExecutionContext, _args: Vec<Value>| async move { Ok(json!("This route is protected!")) }),
    );

    Ok(Self {
      find_all,
      find_one,
      create,
      find_protected,
    })
  }

  /// Binds the controller's stages.
  pub fn register_stages(builder: &mut StageRegistryBuilder, config: &AppConfig) {
    let create_rules = FieldRules::new().field(
      "name",
      [FieldRule::Required, FieldRule::IsString, FieldRule::Length { min: 3, max: 20 }],
    );

    builder
      .register(
        Scope::controller(CONTROLLER),
        StageBinding::filter_for(RejectionKind::NotFound, HttpExceptionFilter),
      )
      .register(Scope::route("cats.find_one"), StageBinding::param_pipe(0, ParseIntPipe))
      .register(Scope::route("cats.create"), StageBinding::pipe(ValidationPipe::new(create_rules)))
      .register(
        Scope::route("cats.find_protected"),
        StageBinding::guard(HeaderGuard::new(config.auth_header.clone())),
      );
  }
}
