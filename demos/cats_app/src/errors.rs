// gantry/demos/cats_app/src/errors.rs

use gantry::GantryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Dispatch Error: {source}")]
  Dispatch {
    #[from] // Route declaration errors and exception-filter failures
    source: GantryError,
  },

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    match err.downcast::<GantryError>() {
      Ok(source) => AppError::Dispatch { source },
      Err(err) => AppError::Internal(err.to_string()),
    }
  }
}

// Define a Result type alias for the application
pub type Result<T, E = AppError> = std::result::Result<T, E>;
