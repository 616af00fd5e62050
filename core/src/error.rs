// gantry/src/error.rs
use anyhow::Error as AnyhowError;
use thiserror::Error;

/// Framework-level errors.
///
/// These are not rejections: a rejection is an expected, classified outcome that the
/// exception filter chain turns into a response. A `GantryError` means the request
/// could not be answered at all and must be reported by the hosting process.
#[derive(Debug, Error)]
pub enum GantryError {
  #[error("Exception filter '{filter}' failed; the request cannot be answered. Source: {source}")]
  FilterFailure {
    filter: String,
    #[source]
    source: AnyhowError,
  },

  #[error("Configuration error: {message}")]
  Configuration { message: String },
}

pub type GantryResult<T, E = GantryError> = std::result::Result<T, E>;
