// gantry/src/dispatch/mod.rs

//! The dispatcher: runs one request through pre-filters, guards, pipes and the
//! interceptor-wrapped handler, and funnels every rejection to the exception
//! filter chain.

pub mod execution;
pub mod route;

pub use route::{ResolvedRoute, RouteBuilder};

use crate::config::DispatcherConfig;
use crate::registry::StageRegistry;
use std::sync::Arc;

/// Orchestrates dispatches against a frozen [`StageRegistry`].
///
/// The dispatcher holds no per-request state and takes no lock; any number of
/// dispatches may run concurrently on the same instance.
#[derive(Clone)]
pub struct Dispatcher {
  pub(crate) registry: Arc<StageRegistry>,
  pub(crate) config: DispatcherConfig,
}

impl Dispatcher {
  pub fn new(registry: impl Into<Arc<StageRegistry>>) -> Self {
    Self {
      registry: registry.into(),
      config: DispatcherConfig::default(),
    }
  }

  pub fn with_config(mut self, config: DispatcherConfig) -> Self {
    self.config = config;
    self
  }

  pub fn registry(&self) -> &StageRegistry {
    &self.registry
  }

  pub fn config(&self) -> &DispatcherConfig {
    &self.config
  }
}
