// gantry/src/config.rs

//! Dispatcher configuration.

/// Knobs for the default rejection-to-response mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherConfig {
  /// Include the request's correlation id in the generic failure body.
  pub expose_correlation_id: bool,
  /// Include the offending field and the list of violations in bad-input bodies.
  pub expose_validation_details: bool,
  /// Message of the generic failure body. Internal error text never replaces it.
  pub unhandled_message: String,
}

impl Default for DispatcherConfig {
  fn default() -> Self {
    Self {
      expose_correlation_id: true,
      expose_validation_details: true,
      unhandled_message: "Internal server error".to_string(),
    }
  }
}

impl DispatcherConfig {
  pub fn expose_correlation_id(mut self, expose: bool) -> Self {
    self.expose_correlation_id = expose;
    self
  }

  pub fn expose_validation_details(mut self, expose: bool) -> Self {
    self.expose_validation_details = expose;
    self
  }

  pub fn unhandled_message(mut self, message: impl Into<String>) -> Self {
    self.unhandled_message = message.into();
    self
  }
}
