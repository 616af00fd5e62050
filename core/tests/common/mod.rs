// tests/common/mod.rs
#![allow(dead_code)] // Allow unused code in this common test module

use async_trait::async_trait;
use gantry::{
  handler_fn, ExecutionContext, FilterFlow, Guard, Handler, Interceptor, Next, PreFilter, Rejection, StageResult,
};
use serde_json::{json, Value};
use parking_lot::Mutex;
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};
use tracing::Level;

// --- Shared execution log ---
// Every recording stage appends "<name>" (or "<name>:before" / "<name>:after") so tests
// can assert the exact order in which stages ran.
#[derive(Clone, Default)]
pub struct ExecutionLog(Arc<Mutex<Vec<String>>>);

impl ExecutionLog {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn push(&self, entry: impl Into<String>) {
    self.0.lock().push(entry.into());
  }

  pub fn entries(&self) -> Vec<String> {
    self.0.lock().clone()
  }
}

// --- Call counter ---
#[derive(Clone, Default)]
pub struct CallCounter(Arc<AtomicUsize>);

impl CallCounter {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn hit(&self) {
    self.0.fetch_add(1, Ordering::SeqCst);
  }

  pub fn count(&self) -> usize {
    self.0.load(Ordering::SeqCst)
  }
}

// --- Recording stages ---
pub struct RecordingPreFilter {
  pub name: &'static str,
  pub log: ExecutionLog,
}

#[async_trait]
impl PreFilter for RecordingPreFilter {
  fn name(&self) -> &str {
    self.name
  }

  async fn apply(&self, _ctx: &ExecutionContext) -> StageResult<FilterFlow> {
    self.log.push(self.name);
    Ok(FilterFlow::Continue)
  }
}

pub struct RecordingGuard {
  pub name: &'static str,
  pub allow: bool,
  pub log: ExecutionLog,
  pub calls: CallCounter,
}

impl RecordingGuard {
  pub fn new(name: &'static str, allow: bool, log: &ExecutionLog) -> Self {
    Self {
      name,
      allow,
      log: log.clone(),
      calls: CallCounter::new(),
    }
  }
}

#[async_trait]
impl Guard for RecordingGuard {
  fn name(&self) -> &str {
    self.name
  }

  async fn can_activate(&self, ctx: &ExecutionContext) -> StageResult<bool> {
    // Guards run before pipes: no transformed argument may be visible yet.
    assert!(ctx.args().is_empty(), "guard '{}' observed transformed arguments", self.name);
    self.calls.hit();
    self.log.push(self.name);
    Ok(self.allow)
  }
}

pub struct RecordingInterceptor {
  pub name: &'static str,
  pub log: ExecutionLog,
}

#[async_trait]
impl Interceptor for RecordingInterceptor {
  fn name(&self) -> &str {
    self.name
  }

  async fn intercept(&self, _ctx: &ExecutionContext, next: Next<'_>) -> StageResult<Value> {
    self.log.push(format!("{}:before", self.name));
    let value = next.run().await?;
    self.log.push(format!("{}:after", self.name));
    Ok(value)
  }
}

// --- Common handler creators ---

/// Counts invocations, records "handler" in the log and answers with the received arguments.
pub fn echo_handler(calls: &CallCounter, log: &ExecutionLog) -> impl Handler {
  let calls = calls.clone();
  let log = log.clone();
  handler_fn(move |_ctx: ExecutionContext, args: Vec<Value>| {
    let calls = calls.clone();
    let log = log.clone();
    async move {
      calls.hit();
      log.push("handler");
      Ok(json!({ "args": args }))
    }
  })
}

pub fn value_handler(calls: &CallCounter, value: Value) -> impl Handler {
  let calls = calls.clone();
  handler_fn(move |_ctx: ExecutionContext, _args: Vec<Value>| {
    let calls = calls.clone();
    let value = value.clone();
    async move {
      calls.hit();
      Ok(value)
    }
  })
}

pub fn failing_handler(calls: &CallCounter, make: fn() -> Rejection) -> impl Handler {
  let calls = calls.clone();
  handler_fn(move |_ctx: ExecutionContext, _args: Vec<Value>| {
    let calls = calls.clone();
    async move {
      calls.hit();
      Err(make())
    }
  })
}

// --- Helper for Tracing Setup (call once per test run if needed) ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer() // Important for tests to capture output
    .try_init()
    .ok(); // Allow multiple initializations in tests (ok if fails)
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
