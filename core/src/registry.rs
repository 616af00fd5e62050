// gantry/src/registry.rs

//! The stage registry: scoped, ordered stage bindings.
//!
//! Bindings are registered on a [`StageRegistryBuilder`] during the configuration
//! phase. [`StageRegistryBuilder::freeze`] consumes the builder and produces the
//! immutable [`StageRegistry`] shared by every dispatch. Registering after the
//! freeze is therefore impossible, and concurrent dispatches read the registry
//! without any lock.

use crate::stages::exception_filter::{Catch, ExceptionFilter, FilterBinding};
use crate::stages::guard::Guard;
use crate::stages::interceptor::Interceptor;
use crate::stages::pipe::{Pipe, PipeBinding, PipeTarget};
use crate::stages::pre_filter::PreFilter;
use crate::core::rejection::RejectionKind;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{event, Level};

/// Granularity at which a binding applies.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
  Global,
  Module(String),
  Controller(String),
  Route(String),
}

impl Scope {
  pub fn module(name: impl Into<String>) -> Self {
    Scope::Module(name.into())
  }

  pub fn controller(name: impl Into<String>) -> Self {
    Scope::Controller(name.into())
  }

  pub fn route(name: impl Into<String>) -> Self {
    Scope::Route(name.into())
  }

  pub fn level(&self) -> ScopeLevel {
    match self {
      Scope::Global => ScopeLevel::Global,
      Scope::Module(_) => ScopeLevel::Module,
      Scope::Controller(_) => ScopeLevel::Controller,
      Scope::Route(_) => ScopeLevel::Route,
    }
  }
}

/// Scope levels, ordered broad to narrow. This is also the execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ScopeLevel {
  Global,
  Module,
  Controller,
  Route,
}

/// The chain of scopes a route belongs to, as produced by the router.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScopePath {
  pub module: Option<String>,
  pub controller: Option<String>,
  pub route: String,
}

impl ScopePath {
  pub fn new(route: impl Into<String>) -> Self {
    Self {
      module: None,
      controller: None,
      route: route.into(),
    }
  }

  pub fn in_module(mut self, module: impl Into<String>) -> Self {
    self.module = Some(module.into());
    self
  }

  pub fn in_controller(mut self, controller: impl Into<String>) -> Self {
    self.controller = Some(controller.into());
    self
  }
}

/// The five stage kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
  PreFilter,
  Guard,
  Interceptor,
  Pipe,
  ExceptionFilter,
}

/// One stage instance, tagged with its kind and kind-specific binding data.
#[derive(Clone)]
pub enum StageBinding {
  PreFilter(Arc<dyn PreFilter>),
  Guard(Arc<dyn Guard>),
  Interceptor(Arc<dyn Interceptor>),
  Pipe(PipeBinding),
  ExceptionFilter(FilterBinding),
}

impl StageBinding {
  pub fn pre_filter(stage: impl PreFilter) -> Self {
    StageBinding::PreFilter(Arc::new(stage))
  }

  pub fn guard(stage: impl Guard) -> Self {
    StageBinding::Guard(Arc::new(stage))
  }

  pub fn interceptor(stage: impl Interceptor) -> Self {
    StageBinding::Interceptor(Arc::new(stage))
  }

  /// A pipe applied to every parameter of the handler.
  pub fn pipe(stage: impl Pipe) -> Self {
    StageBinding::Pipe(PipeBinding::new(PipeTarget::AllParams, stage))
  }

  /// A pipe applied to the parameter at `index` only.
  pub fn param_pipe(index: usize, stage: impl Pipe) -> Self {
    StageBinding::Pipe(PipeBinding::new(PipeTarget::Param(index), stage))
  }

  /// An exception filter for every classification.
  pub fn filter(stage: impl ExceptionFilter) -> Self {
    StageBinding::ExceptionFilter(FilterBinding::new(Catch::Any, stage))
  }

  /// An exception filter for one classification.
  pub fn filter_for(kind: RejectionKind, stage: impl ExceptionFilter) -> Self {
    StageBinding::ExceptionFilter(FilterBinding::new(Catch::Kind(kind), stage))
  }

  pub fn kind(&self) -> StageKind {
    match self {
      StageBinding::PreFilter(_) => StageKind::PreFilter,
      StageBinding::Guard(_) => StageKind::Guard,
      StageBinding::Interceptor(_) => StageKind::Interceptor,
      StageBinding::Pipe(_) => StageKind::Pipe,
      StageBinding::ExceptionFilter(_) => StageKind::ExceptionFilter,
    }
  }

  pub fn name(&self) -> &str {
    match self {
      StageBinding::PreFilter(stage) => stage.name(),
      StageBinding::Guard(stage) => stage.name(),
      StageBinding::Interceptor(stage) => stage.name(),
      StageBinding::Pipe(binding) => binding.pipe.name(),
      StageBinding::ExceptionFilter(binding) => binding.filter.name(),
    }
  }
}

impl std::fmt::Debug for StageBinding {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("StageBinding")
      .field("kind", &self.kind())
      .field("name", &self.name())
      .finish()
  }
}

/// Borrowed view of a registered binding, as yielded by [`StageRegistry::resolve`].
#[derive(Clone, Copy)]
pub enum BindingRef<'a> {
  PreFilter(&'a Arc<dyn PreFilter>),
  Guard(&'a Arc<dyn Guard>),
  Interceptor(&'a Arc<dyn Interceptor>),
  Pipe(&'a PipeBinding),
  ExceptionFilter(&'a FilterBinding),
}

impl BindingRef<'_> {
  pub fn name(&self) -> &str {
    match self {
      BindingRef::PreFilter(stage) => stage.name(),
      BindingRef::Guard(stage) => stage.name(),
      BindingRef::Interceptor(stage) => stage.name(),
      BindingRef::Pipe(binding) => binding.pipe.name(),
      BindingRef::ExceptionFilter(binding) => binding.filter.name(),
    }
  }
}

/// Bindings registered at one scope, one ordered list per kind.
#[derive(Default)]
struct StageSet {
  pre_filters: Vec<Arc<dyn PreFilter>>,
  guards: Vec<Arc<dyn Guard>>,
  interceptors: Vec<Arc<dyn Interceptor>>,
  pipes: Vec<PipeBinding>,
  filters: Vec<FilterBinding>,
}

impl StageSet {
  fn push(&mut self, binding: StageBinding) {
    match binding {
      StageBinding::PreFilter(stage) => self.pre_filters.push(stage),
      StageBinding::Guard(stage) => self.guards.push(stage),
      StageBinding::Interceptor(stage) => self.interceptors.push(stage),
      StageBinding::Pipe(binding) => self.pipes.push(binding),
      StageBinding::ExceptionFilter(binding) => self.filters.push(binding),
    }
  }

  fn len(&self) -> usize {
    self.pre_filters.len() + self.guards.len() + self.interceptors.len() + self.pipes.len() + self.filters.len()
  }

  fn bindings(&self, kind: StageKind) -> Box<dyn Iterator<Item = BindingRef<'_>> + '_> {
    match kind {
      StageKind::PreFilter => Box::new(self.pre_filters.iter().map(BindingRef::PreFilter)),
      StageKind::Guard => Box::new(self.guards.iter().map(BindingRef::Guard)),
      StageKind::Interceptor => Box::new(self.interceptors.iter().map(BindingRef::Interceptor)),
      StageKind::Pipe => Box::new(self.pipes.iter().map(BindingRef::Pipe)),
      StageKind::ExceptionFilter => Box::new(self.filters.iter().map(BindingRef::ExceptionFilter)),
    }
  }
}

#[derive(Default)]
struct ScopedSets {
  global: StageSet,
  modules: HashMap<String, StageSet>,
  controllers: HashMap<String, StageSet>,
  routes: HashMap<String, StageSet>,
}

impl ScopedSets {
  fn set_mut(&mut self, scope: Scope) -> &mut StageSet {
    match scope {
      Scope::Global => &mut self.global,
      Scope::Module(name) => self.modules.entry(name).or_default(),
      Scope::Controller(name) => self.controllers.entry(name).or_default(),
      Scope::Route(name) => self.routes.entry(name).or_default(),
    }
  }
}

/// Mutable registry used during the configuration phase.
#[derive(Default)]
pub struct StageRegistryBuilder {
  sets: ScopedSets,
}

impl StageRegistryBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  /// Appends `binding` to the list of its kind at `scope`.
  pub fn register(&mut self, scope: Scope, binding: StageBinding) -> &mut Self {
    event!(Level::DEBUG, scope = ?scope, kind = ?binding.kind(), stage = %binding.name(), "Registering stage.");
    self.sets.set_mut(scope).push(binding);
    self
  }

  /// Chaining form of [`register`](Self::register).
  pub fn with(mut self, scope: Scope, binding: StageBinding) -> Self {
    self.register(scope, binding);
    self
  }

  /// Ends the configuration phase.
  pub fn freeze(self) -> StageRegistry {
    let registry = StageRegistry { sets: self.sets };
    event!(Level::DEBUG, bindings = registry.binding_count(), "Stage registry frozen.");
    registry
  }
}

/// Immutable, frozen registry. Safe to share across concurrent dispatches.
#[derive(Default)]
pub struct StageRegistry {
  sets: ScopedSets,
}

impl StageRegistry {
  pub fn builder() -> StageRegistryBuilder {
    StageRegistryBuilder::new()
  }

  /// A registry with no bindings at all.
  pub fn empty() -> Self {
    Self::default()
  }

  pub fn binding_count(&self) -> usize {
    self.sets.global.len()
      + self.sets.modules.values().map(StageSet::len).sum::<usize>()
      + self.sets.controllers.values().map(StageSet::len).sum::<usize>()
      + self.sets.routes.values().map(StageSet::len).sum::<usize>()
  }

  /// Sets along `path`, broad to narrow: global, module, controller, route.
  fn sets_for<'a>(&'a self, path: &ScopePath) -> impl DoubleEndedIterator<Item = &'a StageSet> + 'a {
    let module = path.module.as_ref().and_then(|name| self.sets.modules.get(name));
    let controller = path.controller.as_ref().and_then(|name| self.sets.controllers.get(name));
    let route = self.sets.routes.get(&path.route);
    [Some(&self.sets.global), module, controller, route].into_iter().flatten()
  }

  /// All bindings of `kind` visible from `path`, in execution order:
  /// global, then module, then controller, then route, each in registration order.
  pub fn resolve<'a>(&'a self, path: &ScopePath, kind: StageKind) -> impl Iterator<Item = BindingRef<'a>> + 'a {
    self.sets_for(path).flat_map(move |set| set.bindings(kind))
  }

  pub fn resolve_pre_filters<'a>(&'a self, path: &ScopePath) -> impl Iterator<Item = &'a Arc<dyn PreFilter>> + 'a {
    self.sets_for(path).flat_map(|set| set.pre_filters.iter())
  }

  pub fn resolve_guards<'a>(&'a self, path: &ScopePath) -> impl Iterator<Item = &'a Arc<dyn Guard>> + 'a {
    self.sets_for(path).flat_map(|set| set.guards.iter())
  }

  pub fn resolve_interceptors<'a>(&'a self, path: &ScopePath) -> impl Iterator<Item = &'a Arc<dyn Interceptor>> + 'a {
    self.sets_for(path).flat_map(|set| set.interceptors.iter())
  }

  pub fn resolve_pipes<'a>(&'a self, path: &ScopePath) -> impl Iterator<Item = &'a PipeBinding> + 'a {
    self.sets_for(path).flat_map(|set| set.pipes.iter())
  }

  /// Exception filters grouped per scope level, narrowest level first.
  pub fn resolve_filters_narrowest_first<'a>(
    &'a self,
    path: &ScopePath,
  ) -> impl Iterator<Item = &'a [FilterBinding]> + 'a {
    self.sets_for(path).rev().map(|set| set.filters.as_slice())
  }
}
