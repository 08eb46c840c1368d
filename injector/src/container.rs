//! The main `Container` struct and its associated methods.

use crate::core::{missing_provider, take_trail, InitGuard, ResolutionGuard, WaitGuard};
use crate::error::{Error, Result};
use crate::instance::Instance;
use crate::invocation::{Arguments, Factory, Type};
use crate::module::{Declaration, IntoModules, Module};
use crate::provider::{Payload, Provider};
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use std::any::{type_name, Any};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, trace, warn};

/// Names under which a container hands out itself.
const SELF_NAMES: [&str; 2] = ["container", "$container"];

// Providers in declaration order. A redeclared name keeps its first position.
#[derive(Default)]
struct ProviderTable {
  order: Vec<String>,
  entries: HashMap<String, Provider>,
}

impl ProviderTable {
  fn insert(&mut self, provider: Provider) {
    let name = provider.name().to_owned();
    if self.entries.insert(name.clone(), provider).is_none() {
      self.order.push(name);
    }
  }

  fn get(&self, name: &str) -> Option<&Provider> {
    self.entries.get(name)
  }

  fn iter(&self) -> impl Iterator<Item = &Provider> + '_ {
    self.order.iter().filter_map(|name| self.entries.get(name))
  }
}

struct Inner {
  // Set once, at the end of construction.
  providers: OnceCell<ProviderTable>,
  // One cell per name: the first resolver initializes it, concurrent ones wait for it.
  instances: DashMap<String, Arc<OnceCell<Instance>>>,
  parent: Option<Weak<Inner>>,
  started: AtomicBool,
}

/// A hierarchical dependency-injection container.
///
/// A container owns a provider table built from modules at construction and an instance
/// cache that fills lazily as names are resolved. Each name yields at most one instance per
/// container. Names without a local provider are delegated to the parent container, whose
/// own cache then holds the instance.
///
/// `Container` is a cheap handle: clones share the same provider table and cache. Children
/// only keep a weak link to their parent, so the parent must outlive them; a child whose
/// parent is gone behaves like a root container.
#[derive(Clone)]
pub struct Container {
  inner: Arc<Inner>,
}

impl Container {
  /// Creates a root container from one or more modules.
  pub fn new(modules: impl IntoModules) -> Result<Self> {
    Self::build(modules.into_modules(), None)
  }

  /// Creates a container that falls back to `parent` for names it does not provide.
  pub fn with_parent(modules: impl IntoModules, parent: &Container) -> Result<Self> {
    Self::build(modules.into_modules(), Some(Arc::downgrade(&parent.inner)))
  }

  fn build(modules: Vec<Module>, parent: Option<Weak<Inner>>) -> Result<Self> {
    let container = Self {
      inner: Arc::new(Inner {
        providers: OnceCell::new(),
        instances: DashMap::new(),
        parent,
        started: AtomicBool::new(false),
      }),
    };

    let mut table = ProviderTable::default();
    for module in modules {
      container.process_module(module, &mut table)?;
    }
    debug!(
      providers = table.order.len(),
      child = container.inner.parent.is_some(),
      "container created"
    );
    // The cell was created above, so it cannot be set already.
    let _ = container.inner.providers.set(table);
    Ok(container)
  }

  fn process_module(&self, module: Module, table: &mut ProviderTable) -> Result<()> {
    let module = match module.split_private() {
      Ok((exports, modules)) => return self.process_private(exports, modules, table),
      Err(module) => module,
    };

    let (included, declarations) = module.into_parts();
    for module in included {
      self.process_module(module, table)?;
    }
    for declaration in declarations {
      let provider = match declaration {
        Declaration::Definition {
          name,
          kind,
          payload,
        } => Provider::create(&kind, name, payload)?,
        Declaration::Provider(provider) => provider,
      };
      table.insert(provider);
    }
    Ok(())
  }

  fn process_private(
    &self,
    exports: Vec<String>,
    modules: Vec<Module>,
    table: &mut ProviderTable,
  ) -> Result<()> {
    let private = Self::build(modules, Some(Arc::downgrade(&self.inner)))?;
    for name in exports {
      if private.local_provider(&name).is_none() {
        return Err(Error::UndeclaredExport(name));
      }
      table.insert(Provider::private(name, private.clone()));
    }
    Ok(())
  }

  // --- PRIVATE HELPERS ---

  // Identifies this container's resolution stack.
  pub(crate) fn scope(&self) -> usize {
    Arc::as_ptr(&self.inner) as usize
  }

  fn local_provider(&self, name: &str) -> Option<&Provider> {
    self.inner.providers.get()?.get(name)
  }

  fn is_visible(&self, name: &str) -> bool {
    self.local_provider(name).is_some() || self.parent().is_some_and(|p| p.is_visible(name))
  }

  // Every provider reachable from here, nearest first; shadowed ancestors are skipped.
  fn visible_providers(&self) -> Vec<Provider> {
    let mut seen = HashSet::new();
    let mut visible = Vec::new();
    let mut current = Some(self.clone());
    while let Some(container) = current {
      for provider in container.providers() {
        if seen.insert(provider.name().to_owned()) {
          visible.push(provider.clone());
        }
      }
      current = container.parent();
    }
    visible
  }

  fn arguments<'a>(
    &self,
    names: &'a [String],
    context: Option<&'a Instance>,
  ) -> Result<Arguments<'a>> {
    let values = names
      .iter()
      .map(|name| self.get(name))
      .collect::<Result<Vec<_>>>()?;
    Ok(Arguments::new(names, values, context))
  }

  fn get_property(&self, path: &str) -> Result<Instance> {
    let mut segments = path.split('.');
    let head = segments.next().unwrap_or(path);
    let mut pivot = self.get(head)?;
    for segment in segments {
      pivot = pivot
        .property(segment)
        .ok_or_else(|| Error::MissingProperty {
          path: path.to_owned(),
          property: segment.to_owned(),
        })?;
    }
    Ok(pivot)
  }

  fn run_hook(&self, name: &str, hook: &Factory, instance: &Instance) -> Result<()> {
    let args = self.arguments(hook.dependencies(), Some(instance))?;
    hook
      .call(&args)
      .map(|_| ())
      .map_err(|source| Error::Hook {
        name: name.to_owned(),
        source,
      })
  }

  // --- Resolution ---

  /// Resolves `name` to its instance, creating and caching it on first use.
  ///
  /// Lookup order: the container itself (`"container"`), dotted property paths when no
  /// provider has the full dotted name, this container's cache, its own providers, and
  /// finally the parent. Local providers always shadow ancestors.
  ///
  /// # Errors
  ///
  /// [`Error::MissingProvider`] when no container up the chain provides a name,
  /// [`Error::CircularDependency`] when a name is requested while it is being resolved,
  /// and any error raised while resolving transitive dependencies.
  pub fn get(&self, name: &str) -> Result<Instance> {
    if SELF_NAMES.contains(&name) {
      return Ok(Instance::new(self.clone()));
    }

    if name.contains('.') && !self.is_visible(name) {
      return self.get_property(name);
    }

    if let Some(instance) = self.instance(name) {
      return Ok(instance);
    }

    if let Some(provider) = self.local_provider(name) {
      let _guard = ResolutionGuard::enter(self.scope(), name)?;
      let cell = self
        .inner
        .instances
        .entry(name.to_owned())
        .or_default()
        .value()
        .clone();
      if let Some(instance) = cell.get() {
        return Ok(instance.clone());
      }
      // Another thread may be initializing the cell; blocking on it must not close a cycle.
      let key = Arc::as_ptr(&cell) as usize;
      let _wait = WaitGuard::enter(key).ok_or_else(|| Error::CircularDependency {
        trail: take_trail(self.scope()),
      })?;
      let instance = cell.get_or_try_init(|| {
        let _owner = InitGuard::enter(key);
        trace!(provider = name, kind = %provider.kind(), "instantiating provider");
        provider.get(self)
      })?;
      return Ok(instance.clone());
    }

    match &self.inner.parent {
      None => Err(missing_provider(self.scope(), name)),
      Some(parent) => match parent.upgrade() {
        Some(inner) => Container { inner }.get(name),
        None => {
          warn!(provider = name, "parent container was dropped, resolving as root");
          Err(missing_provider(self.scope(), name))
        }
      },
    }
  }

  /// Resolves `name` and downcasts the instance to `T`.
  pub fn resolve<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>> {
    let instance = self.get(name)?;
    instance.downcast::<T>().ok_or_else(|| Error::TypeMismatch {
      name: name.to_owned(),
      expected: type_name::<T>(),
      found: instance.type_name(),
    })
  }

  /// Calls `factory` with its dependencies resolved from this container.
  ///
  /// `context` is exposed to the body as `this`. Dependency failures propagate, but a
  /// failure raised by the body itself is swallowed: the factory is handed back (wrapped
  /// in an [`Instance`]) in place of a result.
  pub fn invoke(&self, factory: &Factory, context: Option<&Instance>) -> Result<Instance> {
    let args = self.arguments(factory.dependencies(), context)?;
    match factory.call(&args) {
      Ok(instance) => Ok(instance),
      Err(error) => {
        warn!(%error, "invoked body failed, handing back the callable");
        Ok(Instance::new(factory.clone()))
      }
    }
  }

  /// Invokes an untyped payload, which must be a factory.
  pub fn invoke_payload(&self, payload: &Payload, context: Option<&Instance>) -> Result<Instance> {
    match payload {
      Payload::Factory(factory) => self.invoke(factory, context),
      other => Err(Error::NotCallable {
        repr: other.describe(),
        trail: take_trail(self.scope()),
      }),
    }
  }

  /// Constructs a new instance of `ty` with its dependencies injected.
  ///
  /// The result is the freshly allocated value unless the constructor body returns an
  /// object, which then replaces it. A failing body leaves the allocated value as is.
  pub fn instantiate(&self, ty: &Type) -> Result<Instance> {
    let args = self.arguments(ty.dependencies(), None)?;
    let (this, returned) = ty.construct(&args);
    match returned {
      Ok(Some(object)) => Ok(object),
      Ok(None) => Ok(this),
      Err(error) => {
        warn!(%error, ty = ty.type_name(), "constructor body failed");
        Ok(this)
      }
    }
  }

  // --- Scoping ---

  /// Creates a child container without forcing any new instances.
  pub fn child(&self, modules: impl IntoModules) -> Result<Container> {
    self.create_child::<&str>(modules, &[])
  }

  /// Creates a child container seeded with `modules`.
  ///
  /// Every name in `force_new`, and every factory or type tagged with one of those scopes,
  /// gets its own fresh instance in the child instead of the one cached up the chain.
  /// Forced names exported by the same private module share one re-created private
  /// container, in which only that module's own forced providers are renewed. Anything
  /// not forced is still resolved through this container.
  ///
  /// # Errors
  ///
  /// [`Error::UnmatchedScope`] if a forced name matches no visible provider and no scope.
  pub fn create_child<S: AsRef<str>>(
    &self,
    modules: impl IntoModules,
    force_new: &[S],
  ) -> Result<Container> {
    let mut modules = modules.into_modules();

    if !force_new.is_empty() {
      let forced: Vec<&str> = force_new.iter().map(AsRef::as_ref).collect();
      debug!(forced = ?forced, "forcing new instances in child container");
      modules.insert(0, self.republish(&forced, true)?);
    }

    Container::with_parent(modules, self)
  }

  // Collects the forced providers into a module for a child of this container. With
  // `inherited` the search covers every visible provider and each forced name must match;
  // otherwise only this container's own providers are considered.
  fn republish(&self, forced: &[&str], inherited: bool) -> Result<Module> {
    let providers: Vec<Provider> = if inherited {
      self.visible_providers()
    } else {
      self.providers().cloned().collect()
    };

    let mut from_parent = Module::new();
    let mut matched = HashSet::new();
    // Private containers already re-created for this child, keyed by the original.
    let mut private_children: HashMap<usize, Container> = HashMap::new();

    for provider in &providers {
      let name = provider.name();

      if forced.contains(&name) {
        match provider.private_container() {
          Some(private) => {
            let child = match private_children.get(&private.scope()) {
              Some(child) => child.clone(),
              None => {
                let child = Container::with_parent(private.republish(forced, false)?, private)?;
                private_children.insert(private.scope(), child.clone());
                child
              }
            };
            from_parent = from_parent.provider(Provider::private(name, child));
          }
          None => from_parent = from_parent.provider(provider.clone()),
        }
        matched.insert(name.to_owned());
      }

      for scope in forced {
        if provider.scopes().iter().any(|tag| tag == scope) {
          from_parent = from_parent.provider(provider.clone());
          matched.insert((*scope).to_owned());
        }
      }
    }

    if inherited {
      if let Some(unmatched) = forced.iter().find(|scope| !matched.contains(**scope)) {
        return Err(Error::UnmatchedScope((*unmatched).to_owned()));
      }
    }
    Ok(from_parent)
  }

  // --- Lifecycle ---

  /// Resolves every local provider and runs the `start` hook of each instance that has one.
  ///
  /// Does nothing if the container is already started. A failing hook stops the sequence
  /// and leaves the container unstarted, so a later [`Container::stop`] skips it as well:
  /// the hooks that did run before the failure are not undone.
  pub fn start(&self) -> Result<&Self> {
    if self.is_started() {
      return Ok(self);
    }
    debug!("starting container");
    for provider in self.providers() {
      let instance = self.get(provider.name())?;
      if let Some(hook) = instance.start_hook() {
        self.run_hook(provider.name(), &hook, &instance)?;
      }
    }
    self.inner.started.store(true, Ordering::SeqCst);
    Ok(self)
  }

  /// Runs the `stop` hook of every already created instance, in provider order.
  ///
  /// Does nothing if the container is not started, including after a failed `start`.
  /// A failing hook stops the sequence and the container stays started.
  pub fn stop(&self) -> Result<&Self> {
    if !self.is_started() {
      return Ok(self);
    }
    debug!("stopping container");
    for provider in self.providers() {
      let Some(instance) = self.instance(provider.name()) else {
        continue;
      };
      if let Some(hook) = instance.stop_hook() {
        self.run_hook(provider.name(), &hook, &instance)?;
      }
    }
    self.inner.started.store(false, Ordering::SeqCst);
    Ok(self)
  }

  pub fn is_started(&self) -> bool {
    self.inner.started.load(Ordering::SeqCst)
  }

  // --- Views ---

  /// This container's own providers, in declaration order.
  pub fn providers(&self) -> impl Iterator<Item = &Provider> + '_ {
    self
      .inner
      .providers
      .get()
      .into_iter()
      .flat_map(|table| table.iter())
  }

  pub fn provider(&self, name: &str) -> Option<&Provider> {
    self.local_provider(name)
  }

  /// The cached instance for `name`, if this container created one.
  pub fn instance(&self, name: &str) -> Option<Instance> {
    self
      .inner
      .instances
      .get(name)
      .and_then(|cell| cell.value().get().cloned())
  }

  /// A snapshot of this container's instance cache.
  pub fn instances(&self) -> HashMap<String, Instance> {
    self
      .inner
      .instances
      .iter()
      .filter_map(|entry| {
        let instance = entry.value().get()?.clone();
        Some((entry.key().clone(), instance))
      })
      .collect()
  }

  pub fn parent(&self) -> Option<Container> {
    let inner = self.inner.parent.as_ref()?.upgrade()?;
    Some(Container { inner })
  }

  /// Returns `true` if both handles refer to the same container.
  pub fn ptr_eq(&self, other: &Container) -> bool {
    Arc::ptr_eq(&self.inner, &other.inner)
  }
}

impl fmt::Debug for Container {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let names: Vec<&str> = self.providers().map(Provider::name).collect();
    f.debug_struct("Container")
      .field("providers", &names)
      .field("started", &self.is_started())
      .finish_non_exhaustive()
  }
}
