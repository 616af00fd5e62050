// gantry/src/core/context.rs

//! The per-request execution context shared by every stage of one dispatch.

use crate::core::control::DispatchPhase;
use crate::core::message::{Request, Response};
use parking_lot::{MappedRwLockReadGuard, MappedRwLockWriteGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{event, Level};
use uuid::Uuid;

/// Handle to the state of one in-flight request.
///
/// Created by the dispatcher for each inbound request and passed by reference to
/// every stage. Cloning the handle is cheap and yields the same underlying state,
/// which lets closure-based stages move a copy into a `'static` future.
///
/// The request itself is immutable. The in-flight response, the argument lists,
/// the current phase and free-form attributes sit behind a `parking_lot::RwLock`.
///
/// IMPORTANT: Lock guards returned by the accessors below are blocking and MUST NOT
/// be held across `.await` suspension points.
#[derive(Debug, Clone)]
pub struct ExecutionContext(Arc<ContextInner>);

#[derive(Debug)]
struct ContextInner {
  correlation_id: Uuid,
  route_id: String,
  request: Request,
  state: RwLock<ContextState>,
}

#[derive(Debug)]
struct ContextState {
  phase: DispatchPhase,
  response: Response,
  raw_args: Vec<Value>,
  args: Vec<Value>,
  attributes: HashMap<String, Value>,
  finalized: bool,
}

impl ExecutionContext {
  pub fn new(route_id: impl Into<String>, request: Request) -> Self {
    ExecutionContext(Arc::new(ContextInner {
      correlation_id: Uuid::new_v4(),
      route_id: route_id.into(),
      request,
      state: RwLock::new(ContextState {
        phase: DispatchPhase::Entry,
        response: Response::default(),
        raw_args: Vec::new(),
        args: Vec::new(),
        attributes: HashMap::new(),
        finalized: false,
      }),
    }))
  }

  /// Identifier attached to every log line of this request, and optionally to the
  /// generic failure response.
  pub fn correlation_id(&self) -> Uuid {
    self.0.correlation_id
  }

  pub fn route_id(&self) -> &str {
    &self.0.route_id
  }

  pub fn request(&self) -> &Request {
    &self.0.request
  }

  pub fn phase(&self) -> DispatchPhase {
    self.0.state.read().phase
  }

  pub(crate) fn set_phase(&self, phase: DispatchPhase) {
    self.0.state.write().phase = phase;
  }

  /// The in-flight response. Stages may stage headers here; they are merged into
  /// whatever response finally leaves the dispatcher.
  pub fn response(&self) -> MappedRwLockReadGuard<'_, Response> {
    RwLockReadGuard::map(self.0.state.read(), |state| &state.response)
  }

  /// Mutable access to the in-flight response.
  ///
  /// Returns `None` once the response was finalized, e.g. when a stage kept its
  /// clone of the handle past the end of the dispatch.
  pub fn response_mut(&self) -> Option<MappedRwLockWriteGuard<'_, Response>> {
    let guard = self.0.state.write();
    if guard.finalized {
      event!(
        Level::WARN,
        route = %self.0.route_id,
        correlation_id = %self.0.correlation_id,
        "Response is already finalized; mutation ignored."
      );
      return None;
    }
    Some(RwLockWriteGuard::map(guard, |state| &mut state.response))
  }

  /// Arguments as extracted from the request, before any pipe ran.
  pub fn raw_args(&self) -> MappedRwLockReadGuard<'_, [Value]> {
    RwLockReadGuard::map(self.0.state.read(), |state| state.raw_args.as_slice())
  }

  /// Arguments after pipe transformation. Empty until the piping phase completes.
  pub fn args(&self) -> MappedRwLockReadGuard<'_, [Value]> {
    RwLockReadGuard::map(self.0.state.read(), |state| state.args.as_slice())
  }

  pub(crate) fn set_raw_args(&self, raw_args: Vec<Value>) {
    self.0.state.write().raw_args = raw_args;
  }

  pub(crate) fn set_args(&self, args: Vec<Value>) {
    self.0.state.write().args = args;
  }

  /// Stores a value for later stages, e.g. the identity a guard resolved.
  pub fn set_attribute(&self, key: impl Into<String>, value: Value) {
    self.0.state.write().attributes.insert(key.into(), value);
  }

  pub fn attribute(&self, key: &str) -> Option<Value> {
    self.0.state.read().attributes.get(key).cloned()
  }

  pub fn is_finalized(&self) -> bool {
    self.0.state.read().finalized
  }

  /// Marks the response as final and returns it.
  ///
  /// Headers staged on the in-flight response are merged under `outcome`'s own
  /// headers, so the outcome wins on conflicts.
  pub(crate) fn finalize(&self, mut outcome: Response) -> Response {
    let mut state = self.0.state.write();
    for (name, value) in state.response.headers.iter() {
      outcome.headers.entry(name.clone()).or_insert_with(|| value.clone());
    }
    state.response = outcome.clone();
    state.finalized = true;
    state.phase = DispatchPhase::Responded;
    outcome
  }
}
