// gantry/src/core/rejection.rs

//! Classified, non-fatal failures produced by stages and handlers.
//!
//! Guards, pipes, interceptors and handlers never throw to signal an expected
//! failure. They return a [`Rejection`] instead, and the dispatcher routes it to
//! the exception filter chain, which is the single place where a classification
//! becomes a caller-visible response.

use serde_json::Value;
use std::fmt;

/// Classification of a rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectionKind {
  /// A guard denied access.
  Unauthorized,
  /// A pipe failed to coerce or validate an argument.
  ValidationFailed,
  /// The handler signaled that the requested resource does not exist.
  NotFound,
  /// Anything else, including defects inside a stage.
  Unhandled,
}

impl RejectionKind {
  /// Status code used by the default mapping for this classification.
  pub fn status_code(&self) -> u16 {
    match self {
      RejectionKind::Unauthorized => 401,
      RejectionKind::ValidationFailed => 400,
      RejectionKind::NotFound => 404,
      RejectionKind::Unhandled => 500,
    }
  }

  /// Short reason phrase matching [`status_code`](Self::status_code).
  pub fn reason(&self) -> &'static str {
    match self {
      RejectionKind::Unauthorized => "Unauthorized",
      RejectionKind::ValidationFailed => "Bad Request",
      RejectionKind::NotFound => "Not Found",
      RejectionKind::Unhandled => "Internal Server Error",
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      RejectionKind::Unauthorized => "unauthorized",
      RejectionKind::ValidationFailed => "validation_failed",
      RejectionKind::NotFound => "not_found",
      RejectionKind::Unhandled => "unhandled",
    }
  }
}

impl fmt::Display for RejectionKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A classified failure value with an optional payload.
///
/// `source` holds the internal error when the rejection was converted from an
/// arbitrary error (`anyhow::Error`). It is meant for logs only and is never
/// rendered by the default response mapping.
#[derive(Debug)]
pub struct Rejection {
  kind: RejectionKind,
  message: Option<String>,
  field: Option<String>,
  details: Option<Value>,
  source: Option<anyhow::Error>,
}

impl Rejection {
  pub fn new(kind: RejectionKind) -> Self {
    Self {
      kind,
      message: None,
      field: None,
      details: None,
      source: None,
    }
  }

  pub fn unauthorized() -> Self {
    Self::new(RejectionKind::Unauthorized)
  }

  pub fn validation_failed(message: impl Into<String>) -> Self {
    Self::new(RejectionKind::ValidationFailed).with_message(message)
  }

  pub fn not_found(message: impl Into<String>) -> Self {
    Self::new(RejectionKind::NotFound).with_message(message)
  }

  pub fn unhandled(message: impl Into<String>) -> Self {
    Self::new(RejectionKind::Unhandled).with_message(message)
  }

  pub fn with_message(mut self, message: impl Into<String>) -> Self {
    self.message = Some(message.into());
    self
  }

  /// Names the offending field (for validation failures).
  pub fn with_field(mut self, field: impl Into<String>) -> Self {
    self.field = Some(field.into());
    self
  }

  /// Attaches a structured payload, e.g. the list of violated rules.
  pub fn with_details(mut self, details: Value) -> Self {
    self.details = Some(details);
    self
  }

  pub fn with_source(mut self, source: anyhow::Error) -> Self {
    self.source = Some(source);
    self
  }

  pub fn kind(&self) -> RejectionKind {
    self.kind
  }

  pub fn message(&self) -> Option<&str> {
    self.message.as_deref()
  }

  pub fn field(&self) -> Option<&str> {
    self.field.as_deref()
  }

  pub fn details(&self) -> Option<&Value> {
    self.details.as_ref()
  }

  /// The internal error this rejection was converted from, if any.
  pub fn internal_source(&self) -> Option<&anyhow::Error> {
    self.source.as_ref()
  }

  /// True when the rejection wraps an internal error rather than an explicit,
  /// classified failure.
  pub fn is_internal(&self) -> bool {
    self.kind == RejectionKind::Unhandled && self.source.is_some()
  }

  /// Same payload under a different classification.
  pub fn reclassify(mut self, kind: RejectionKind) -> Self {
    self.kind = kind;
    self
  }
}

impl fmt::Display for Rejection {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.kind)?;
    if let Some(message) = &self.message {
      write!(f, ": {}", message)?;
    }
    if let Some(field) = &self.field {
      write!(f, " (field '{}')", field)?;
    }
    if let Some(source) = &self.source {
      write!(f, ". Source: {}", source)?;
    }
    Ok(())
  }
}

impl std::error::Error for Rejection {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    self
      .source
      .as_deref()
      .map(|err| err as &(dyn std::error::Error + 'static))
  }
}

// Errors raised with `?` inside stages land here. A rejection that was boxed into
// an anyhow::Error on the way is recovered as-is instead of being re-wrapped.
impl From<anyhow::Error> for Rejection {
  fn from(err: anyhow::Error) -> Self {
    match err.downcast::<Rejection>() {
      Ok(rejection) => rejection,
      Err(err) => Rejection::new(RejectionKind::Unhandled).with_source(err),
    }
  }
}

/// Result type returned by every stage contract.
pub type StageResult<T> = Result<T, Rejection>;
