// gantry/src/dispatch/execution.rs

//! Contains `Dispatcher::dispatch()`, the per-request state machine.

use crate::core::context::ExecutionContext;
use crate::core::control::{DispatchPhase, FilterFlow};
use crate::core::message::{Request, Response};
use crate::core::rejection::{Rejection, RejectionKind, StageResult};
use crate::dispatch::route::ResolvedRoute;
use crate::dispatch::Dispatcher;
use crate::error::GantryResult;
use crate::stages::exception_filter::ExceptionFilterChain;
use crate::stages::interceptor::{Interceptor, Next};
use crate::stages::pipe::{apply_pipes, PipeBinding};
use tracing::{event, instrument, span, Instrument, Level, Span};

impl Dispatcher {
  /// Runs `request` through the pipeline of `route` and returns the finalized response.
  ///
  /// Order: pre-filters, guards, pipes, then the interceptors wrapped around the
  /// handler. Every rejection on the way is answered by the exception filter chain.
  ///
  /// Returns `Err` only when an exception filter itself fails. The request is then
  /// unrecoverable and the error is for the hosting process to report.
  #[instrument(
    name = "Dispatcher::dispatch",
    skip_all,
    fields(
      route = %route.id(),
      method = %request.method,
      path = %request.path,
      correlation_id = tracing::field::Empty,
    ),
    err(Display)
  )]
  pub async fn dispatch(&self, route: &ResolvedRoute, request: Request) -> GantryResult<Response> {
    let ctx = ExecutionContext::new(route.id(), request);
    Span::current().record("correlation_id", tracing::field::display(ctx.correlation_id()));
    event!(Level::DEBUG, "Dispatch starting.");

    match self.run_stages(route, &ctx).await {
      Ok(response) => {
        let response = ctx.finalize(response);
        event!(Level::DEBUG, status = response.status, "Dispatch completed.");
        Ok(response)
      }
      Err(rejection) => self.handle_rejection(route, &ctx, rejection).await,
    }
  }

  async fn run_stages(&self, route: &ResolvedRoute, ctx: &ExecutionContext) -> StageResult<Response> {
    let path = route.scope();

    // PRE-FILTERS
    ctx.set_phase(DispatchPhase::PreFiltering);
    for (idx, pre_filter) in self.registry.resolve_pre_filters(path).enumerate() {
      let stage_span = span!(Level::DEBUG, "pre_filter", name = %pre_filter.name(), index = idx);
      match pre_filter.apply(ctx).instrument(stage_span).await? {
        FilterFlow::Continue => {}
        FilterFlow::Respond(response) => {
          event!(Level::INFO, pre_filter = %pre_filter.name(), status = response.status, "Request answered by a pre-filter.");
          return Ok(response);
        }
      }
    }

    // GUARDS
    ctx.set_phase(DispatchPhase::Guarding);
    for (idx, guard) in self.registry.resolve_guards(path).enumerate() {
      let stage_span = span!(Level::DEBUG, "guard", name = %guard.name(), index = idx);
      match guard.can_activate(ctx).instrument(stage_span).await {
        Ok(true) => {}
        Ok(false) => {
          event!(Level::WARN, guard = %guard.name(), "Access denied by guard.");
          return Err(Rejection::unauthorized());
        }
        Err(rejection) => {
          event!(Level::WARN, guard = %guard.name(), error = %rejection, "Guard failed.");
          return Err(match guard.error_kind() {
            Some(kind) if rejection.kind() == RejectionKind::Unhandled => rejection.reclassify(kind),
            _ => rejection,
          });
        }
      }
    }

    // PIPES
    ctx.set_phase(DispatchPhase::Piping);
    let raw_args: Vec<_> = route.params().iter().map(|meta| meta.extract(ctx.request())).collect();
    ctx.set_raw_args(raw_args.clone());
    let pipes: Vec<&PipeBinding> = self.registry.resolve_pipes(path).collect();
    let args = apply_pipes(&pipes, route.params(), raw_args, ctx)
      .await
      .map_err(|rejection| {
        event!(Level::WARN, error = %rejection, "Pipe rejected an argument.");
        if rejection.is_internal() {
          rejection
        } else {
          rejection.reclassify(RejectionKind::ValidationFailed)
        }
      })?;
    ctx.set_args(args.clone());

    // INTERCEPTORS + HANDLER
    ctx.set_phase(DispatchPhase::Intercepting);
    let interceptors: Vec<&dyn Interceptor> = self
      .registry
      .resolve_interceptors(path)
      .map(|interceptor| &**interceptor)
      .collect();
    event!(Level::TRACE, interceptors = interceptors.len(), "Composing continuation chain.");
    let chain = Next::compose(interceptors.into_iter(), route.handler(), ctx, args);
    let value = chain.run().await?;

    Ok(Response::new(route.success_status(), value))
  }

  async fn handle_rejection(
    &self,
    route: &ResolvedRoute,
    ctx: &ExecutionContext,
    rejection: Rejection,
  ) -> GantryResult<Response> {
    ctx.set_phase(DispatchPhase::Filtering);
    match rejection.kind() {
      RejectionKind::Unhandled => event!(
        Level::ERROR,
        error = %rejection,
        correlation_id = %ctx.correlation_id(),
        "Unhandled error during dispatch."
      ),
      kind => event!(Level::INFO, kind = %kind, "Request rejected."),
    }

    let chain = ExceptionFilterChain::new(&self.registry, route.scope(), &self.config);
    match chain.handle(&rejection, ctx).await {
      Ok(response) => {
        let response = ctx.finalize(response);
        event!(Level::DEBUG, status = response.status, "Rejection mapped to response.");
        Ok(response)
      }
      Err(err) => {
        ctx.set_phase(DispatchPhase::FailedUnrecoverable);
        event!(
          Level::ERROR,
          error = %err,
          correlation_id = %ctx.correlation_id(),
          "Exception filter chain failed; request is unrecoverable."
        );
        Err(err)
      }
    }
  }
}
