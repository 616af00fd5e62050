// gantry/src/dispatch/route.rs

//! The router's output as consumed by the dispatcher.

use crate::core::handler::{Handler, ParamMetadata, ParamSource};
use crate::error::{GantryError, GantryResult};
use crate::registry::ScopePath;
use std::sync::Arc;

/// A handler bound to its scope path, with its declared parameters and success status.
#[derive(Clone)]
pub struct ResolvedRoute {
  scope: ScopePath,
  handler: Arc<dyn Handler>,
  params: Vec<ParamMetadata>,
  success_status: u16,
}

impl ResolvedRoute {
  pub fn builder(scope: ScopePath, handler: impl Handler) -> RouteBuilder {
    RouteBuilder {
      scope,
      handler: Arc::new(handler),
      method: "GET".to_string(),
      params: Vec::new(),
      http_code: None,
    }
  }

  /// Shorthand for a route without parameters answering with 200.
  ///
  /// Performs no validation: an empty route id is taken as-is. Use
  /// [`builder`](Self::builder) to have the declaration checked.
  pub fn new(scope: ScopePath, handler: impl Handler) -> Self {
    Self {
      scope,
      handler: Arc::new(handler),
      params: Vec::new(),
      success_status: 200,
    }
  }

  pub fn id(&self) -> &str {
    &self.scope.route
  }

  pub fn scope(&self) -> &ScopePath {
    &self.scope
  }

  pub fn handler(&self) -> &dyn Handler {
    self.handler.as_ref()
  }

  pub fn params(&self) -> &[ParamMetadata] {
    &self.params
  }

  pub fn success_status(&self) -> u16 {
    self.success_status
  }
}

impl std::fmt::Debug for ResolvedRoute {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ResolvedRoute")
      .field("scope", &self.scope)
      .field("params", &self.params)
      .field("success_status", &self.success_status)
      .finish()
  }
}

pub struct RouteBuilder {
  scope: ScopePath,
  handler: Arc<dyn Handler>,
  method: String,
  params: Vec<ParamMetadata>,
  http_code: Option<u16>,
}

impl RouteBuilder {
  /// HTTP method of the route. `POST` routes answer with 201 unless overridden.
  pub fn method(mut self, method: impl Into<String>) -> Self {
    self.method = method.into().to_ascii_uppercase();
    self
  }

  /// Declares the next handler parameter. Indices follow declaration order.
  pub fn param(mut self, source: ParamSource) -> Self {
    let index = self.params.len();
    self.params.push(ParamMetadata::new(index, source));
    self
  }

  /// Overrides the success status.
  pub fn http_code(mut self, status: u16) -> Self {
    self.http_code = Some(status);
    self
  }

  pub fn build(self) -> GantryResult<ResolvedRoute> {
    if self.scope.route.is_empty() {
      return Err(GantryError::Configuration {
        message: "route id must not be empty".to_string(),
      });
    }
    let success_status = match self.http_code {
      Some(status) if !(100..=599).contains(&status) => {
        return Err(GantryError::Configuration {
          message: format!("invalid status {} for route '{}'", status, self.scope.route),
        });
      }
      Some(status) => status,
      None if self.method == "POST" => 201,
      None => 200,
    };
    Ok(ResolvedRoute {
      scope: self.scope,
      handler: self.handler,
      params: self.params,
      success_status,
    })
  }
}
