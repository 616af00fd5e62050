// gantry/src/core/control.rs

//! Signals for controlling dispatch flow and the phases a request moves through.

use crate::core::message::Response;

/// Outcome of a pre-filter.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterFlow {
  /// Hand the request to the next pre-filter, then to the guards.
  Continue,
  /// Finalize this response immediately. Guards, pipes, interceptors and the
  /// handler are skipped, and the exception filter chain is not consulted.
  Respond(Response),
}

/// Phase of a single dispatch.
///
/// The normal path is `Entry → PreFiltering → Guarding → Piping → Intercepting → Responded`.
/// Any rejection moves the request to `Filtering`, which ends in `Responded`, or in
/// `FailedUnrecoverable` when the exception filter chain itself fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchPhase {
  Entry,
  PreFiltering,
  Guarding,
  Piping,
  Intercepting,
  Filtering,
  Responded,
  FailedUnrecoverable,
}

impl DispatchPhase {
  pub fn is_terminal(&self) -> bool {
    matches!(self, DispatchPhase::Responded | DispatchPhase::FailedUnrecoverable)
  }
}
