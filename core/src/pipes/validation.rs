// gantry/src/pipes/validation.rs

//! Schema-validation pipe and the validator capability it consumes.

use crate::core::handler::{ParamMetadata, ParamSource};
use crate::core::rejection::{Rejection, StageResult};
use crate::stages::pipe::Pipe;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{event, Level};

/// One failed rule, on one field or on the payload as a whole (`field` unset).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub field: Option<String>,
  pub rule: String,
  pub message: String,
}

/// Source of validation rules. Returns every violation found, or none.
pub trait Validator: Send + Sync + 'static {
  fn validate(&self, value: &Value, meta: &ParamMetadata) -> Vec<FieldViolation>;
}

/// Runs a [`Validator`] over request bodies.
///
/// By default only parameters sourced from the body are validated; other parameters
/// pass through untouched, so the pipe can be bound to every parameter of a handler.
pub struct ValidationPipe {
  validator: Arc<dyn Validator>,
  body_only: bool,
}

impl ValidationPipe {
  pub fn new(validator: impl Validator) -> Self {
    Self {
      validator: Arc::new(validator),
      body_only: true,
    }
  }

  /// Validates parameters of any source, not only the body.
  pub fn all_sources(mut self) -> Self {
    self.body_only = false;
    self
  }
}

#[async_trait]
impl Pipe for ValidationPipe {
  fn name(&self) -> &str {
    "ValidationPipe"
  }

  async fn transform(&self, value: Value, meta: &ParamMetadata) -> StageResult<Value> {
    if self.body_only && meta.source != ParamSource::Body {
      return Ok(value);
    }

    let violations = self.validator.validate(&value, meta);
    let Some(first) = violations.first() else {
      return Ok(value);
    };

    event!(Level::DEBUG, violations = violations.len(), first_field = ?first.field, "Validation failed.");
    let message = violations
      .iter()
      .map(|v| v.message.as_str())
      .collect::<Vec<_>>()
      .join("; ");
    let field = first.field.clone();
    let details = serde_json::to_value(&violations).map_err(anyhow::Error::from)?;
    let rejection = Rejection::validation_failed(message).with_details(details);
    Err(match field {
      Some(field) => rejection.with_field(field),
      None => rejection,
    })
  }
}

/// A single per-field rule understood by [`FieldRules`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldRule {
  /// Present, not null and not an empty string.
  Required,
  IsString,
  IsInt,
  /// String length in characters, bounds inclusive.
  Length { min: usize, max: usize },
}

impl FieldRule {
  fn rule_name(&self) -> &'static str {
    match self {
      FieldRule::Required => "isNotEmpty",
      FieldRule::IsString => "isString",
      FieldRule::IsInt => "isInt",
      FieldRule::Length { .. } => "length",
    }
  }

  fn check(&self, field: &str, value: Option<&Value>) -> Option<String> {
    match self {
      FieldRule::Required => match value {
        None | Some(Value::Null) => Some(format!("{} should not be empty", field)),
        Some(Value::String(s)) if s.is_empty() => Some(format!("{} should not be empty", field)),
        _ => None,
      },
      FieldRule::IsString => match value {
        Some(Value::String(_)) => None,
        _ => Some(format!("{} must be a string", field)),
      },
      FieldRule::IsInt => match value {
        Some(Value::Number(n)) if n.is_i64() || n.is_u64() => None,
        _ => Some(format!("{} must be an integer number", field)),
      },
      FieldRule::Length { min, max } => {
        let len = match value {
          Some(Value::String(s)) => s.chars().count(),
          _ => return Some(format!("{} must be longer than or equal to {} characters", field, min)),
        };
        if len < *min {
          Some(format!("{} must be longer than or equal to {} characters", field, min))
        } else if len > *max {
          Some(format!("{} must be shorter than or equal to {} characters", field, max))
        } else {
          None
        }
      }
    }
  }
}

/// Minimal validator checking declared rules on the fields of a JSON object.
#[derive(Debug, Clone, Default)]
pub struct FieldRules {
  fields: Vec<(String, Vec<FieldRule>)>,
}

impl FieldRules {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn field(mut self, name: impl Into<String>, rules: impl IntoIterator<Item = FieldRule>) -> Self {
    self.fields.push((name.into(), rules.into_iter().collect()));
    self
  }
}

impl Validator for FieldRules {
  fn validate(&self, value: &Value, _meta: &ParamMetadata) -> Vec<FieldViolation> {
    let Some(object) = value.as_object() else {
      return vec![FieldViolation {
        field: None,
        rule: "isObject".to_string(),
        message: "payload must be an object".to_string(),
      }];
    };

    self
      .fields
      .iter()
      .flat_map(|(field, rules)| {
        let found = object.get(field);
        rules.iter().filter_map(move |rule| {
          rule.check(field, found).map(|message| FieldViolation {
            field: Some(field.clone()),
            rule: rule.rule_name().to_string(),
            message,
          })
        })
      })
      .collect()
  }
}
