// gantry/src/pipes/parse.rs

//! Coercion pipes.

use crate::core::handler::ParamMetadata;
use crate::core::rejection::{Rejection, StageResult};
use crate::stages::pipe::Pipe;
use async_trait::async_trait;
use serde_json::Value;

fn coercion_failure(expected: &str, meta: &ParamMetadata) -> Rejection {
  let rejection = Rejection::validation_failed(format!("Validation failed ({} is expected)", expected));
  match meta.name() {
    Some(name) => rejection.with_field(name),
    None => rejection,
  }
}

/// Turns a numeric string into an integer. Integers pass through unchanged.
#[derive(Debug, Clone, Default)]
pub struct ParseIntPipe;

#[async_trait]
impl Pipe for ParseIntPipe {
  fn name(&self) -> &str {
    "ParseIntPipe"
  }

  async fn transform(&self, value: Value, meta: &ParamMetadata) -> StageResult<Value> {
    if value.is_i64() || value.is_u64() {
      return Ok(value);
    }
    match value.as_str() {
      Some(text) => text
        .trim()
        .parse::<i64>()
        .map(Value::from)
        .map_err(|_| coercion_failure("numeric string", meta)),
      None => Err(coercion_failure("numeric string", meta)),
    }
  }
}

/// Turns `"true"` / `"false"` into a boolean. Booleans pass through unchanged.
#[derive(Debug, Clone, Default)]
pub struct ParseBoolPipe;

#[async_trait]
impl Pipe for ParseBoolPipe {
  fn name(&self) -> &str {
    "ParseBoolPipe"
  }

  async fn transform(&self, value: Value, meta: &ParamMetadata) -> StageResult<Value> {
    match value {
      Value::Bool(_) => Ok(value),
      Value::String(text) if text == "true" => Ok(Value::Bool(true)),
      Value::String(text) if text == "false" => Ok(Value::Bool(false)),
      _ => Err(coercion_failure("boolean string", meta)),
    }
  }
}

/// Replaces a missing (`null`) value with a default. Bind it before a coercion pipe.
#[derive(Debug, Clone)]
pub struct DefaultValuePipe {
  default: Value,
}

impl DefaultValuePipe {
  pub fn new(default: impl Into<Value>) -> Self {
    Self { default: default.into() }
  }
}

#[async_trait]
impl Pipe for DefaultValuePipe {
  fn name(&self) -> &str {
    "DefaultValuePipe"
  }

  async fn transform(&self, value: Value, _meta: &ParamMetadata) -> StageResult<Value> {
    if value.is_null() {
      return Ok(self.default.clone());
    }
    Ok(value)
  }
}
