// gantry/src/stages/mod.rs

//! The five stage contracts and their closure adapters.

pub mod exception_filter;
pub mod guard;
pub mod interceptor;
pub mod pipe;
pub mod pre_filter;

pub use exception_filter::{
  default_response, filter_fn, Catch, ExceptionFilter, ExceptionFilterChain, FilterBinding, FnExceptionFilter,
  HttpExceptionFilter, RejectionSummary,
};
pub use guard::{guard_fn, FnGuard, Guard, HeaderGuard};
pub use interceptor::{interceptor_fn, BoxFuture, FnInterceptor, Interceptor, Next, TimingInterceptor};
pub use pipe::{pipe_fn, FnPipe, Pipe, PipeBinding, PipeTarget};
pub use pre_filter::{pre_filter_fn, FnPreFilter, LoggerPreFilter, PreFilter};
