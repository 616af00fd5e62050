// gantry/demos/cats_app/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use gantry::DispatcherConfig;
use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
  /// Default filter directive when `RUST_LOG` is not set.
  pub log_level: String,
  pub expose_correlation_id: bool,
  pub expose_validation_details: bool,
  /// Header the protected route requires.
  pub auth_header: String,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present

    let get_env = |var_name: &str, default: &str| env::var(var_name).unwrap_or_else(|_| default.to_string());
    let get_flag = |var_name: &str, default: bool| -> Result<bool> {
      match env::var(var_name) {
        Ok(raw) => raw
          .trim()
          .parse::<bool>()
          .map_err(|e| AppError::Config(format!("Invalid {} value '{}': {}", var_name, raw, e))),
        Err(_) => Ok(default),
      }
    };

    let log_level = get_env("CATS_LOG_LEVEL", "info");
    let expose_correlation_id = get_flag("CATS_EXPOSE_CORRELATION_ID", true)?;
    let expose_validation_details = get_flag("CATS_EXPOSE_VALIDATION_DETAILS", true)?;
    let auth_header = get_env("CATS_AUTH_HEADER", "auth");
    if auth_header.trim().is_empty() {
      return Err(AppError::Config("CATS_AUTH_HEADER must not be empty".to_string()));
    }

    Ok(Self {
      log_level,
      expose_correlation_id,
      expose_validation_details,
      auth_header,
    })
  }

  pub fn dispatcher_config(&self) -> DispatcherConfig {
    DispatcherConfig::default()
      .expose_correlation_id(self.expose_correlation_id)
      .expose_validation_details(self.expose_validation_details)
  }
}
