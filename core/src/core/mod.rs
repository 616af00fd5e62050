pub mod context;
pub mod control;
pub mod handler;
pub mod message;
pub mod rejection;

// Re-export key types for easier access from other Gantry modules (and lib.rs)
pub use context::ExecutionContext;
pub use control::{DispatchPhase, FilterFlow};
pub use handler::{handler_fn, FnHandler, Handler, ParamMetadata, ParamSource};
pub use message::{Request, Response};
pub use rejection::{Rejection, RejectionKind, StageResult};
