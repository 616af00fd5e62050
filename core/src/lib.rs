// src/lib.rs

//! Gantry: an ASYNC request-processing pipeline engine for Rust.
//!
//! Gantry runs a request bound to a handler through an ordered, composable sequence
//! of cross-cutting stages:
//!  - Pre-filters that see the raw request and may answer it directly.
//!  - Guards that allow or deny access before any argument is touched.
//!  - Pipes that coerce and validate each handler argument.
//!  - Interceptors that wrap the handler through an explicit, single-use continuation.
//!  - Exception filters that turn classified rejections into responses.
//!
//! Stages are registered at global, module, controller or route scope on a
//! `StageRegistryBuilder`, frozen into an immutable `StageRegistry`, and executed by a
//! `Dispatcher` in the fixed broad-to-narrow scope order.

pub mod config;
pub mod core;
pub mod dispatch;
pub mod error;
pub mod pipes;
pub mod registry;
pub mod stages;

// --- Re-exports for the Public API ---

pub use crate::core::context::ExecutionContext;
pub use crate::core::control::{DispatchPhase, FilterFlow};
pub use crate::core::handler::{handler_fn, FnHandler, Handler, ParamMetadata, ParamSource};
pub use crate::core::message::{Request, Response};
pub use crate::core::rejection::{Rejection, RejectionKind, StageResult};

pub use crate::stages::exception_filter::{
  default_response, filter_fn, Catch, ExceptionFilter, ExceptionFilterChain, FilterBinding, HttpExceptionFilter,
  RejectionSummary,
};
pub use crate::stages::guard::{guard_fn, Guard, HeaderGuard};
pub use crate::stages::interceptor::{interceptor_fn, BoxFuture, Interceptor, Next, TimingInterceptor};
pub use crate::stages::pipe::{pipe_fn, Pipe, PipeBinding, PipeTarget};
pub use crate::stages::pre_filter::{pre_filter_fn, LoggerPreFilter, PreFilter};

pub use crate::pipes::{
  DefaultValuePipe, FieldRule, FieldRules, FieldViolation, ParseBoolPipe, ParseIntPipe, ValidationPipe, Validator,
};

pub use crate::registry::{
  BindingRef, Scope, ScopeLevel, ScopePath, StageBinding, StageKind, StageRegistry, StageRegistryBuilder,
};

pub use crate::config::DispatcherConfig;
pub use crate::dispatch::{Dispatcher, ResolvedRoute, RouteBuilder};
pub use crate::error::{GantryError, GantryResult};

/*
    Core Workflow:
    1. Build a `StageRegistry` with `StageRegistry::builder()`, registering stages with
       `.register(Scope::..., StageBinding::...)`, then call `.freeze()`.
    2. Create a `Dispatcher` from the frozen registry (optionally `.with_config(...)`).
    3. Describe each route as a `ResolvedRoute`: its `ScopePath`, its handler and its
       declared parameters (`ParamSource::Body`, `ParamSource::Param("id")`, ...).
    4. For every inbound request, call `dispatcher.dispatch(&route, request).await`.
       Rejections come back as mapped responses; only a failing exception filter
       yields an `Err(GantryError::FilterFailure)`.
*/
