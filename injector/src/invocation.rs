//! Injectable callables: factories, constructible types and their resolved arguments.

use crate::error::{BoxError, Error, Result};
use crate::instance::{Component, Instance};
use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

type Body = dyn Fn(&Arguments<'_>) -> std::result::Result<Instance, BoxError> + Send + Sync;

// The allocated `this` plus whatever the constructor body returned.
type Constructor =
  dyn Fn(&Arguments<'_>) -> (Instance, std::result::Result<Option<Instance>, BoxError>) + Send + Sync;

/// Resolved dependencies handed to a factory, constructor or hook body.
///
/// Values are positional, in the order of the callable's declared dependency names.
pub struct Arguments<'a> {
  names: &'a [String],
  values: Vec<Instance>,
  context: Option<&'a Instance>,
}

impl<'a> Arguments<'a> {
  pub(crate) fn new(names: &'a [String], values: Vec<Instance>, context: Option<&'a Instance>) -> Self {
    Self {
      names,
      values,
      context,
    }
  }

  pub fn len(&self) -> usize {
    self.values.len()
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }

  /// The dependency names the values were resolved from.
  pub fn names(&self) -> &[String] {
    self.names
  }

  pub fn instance(&self, index: usize) -> Option<&Instance> {
    self.values.get(index)
  }

  /// Returns the argument at `index` as a `T`.
  pub fn get<T: Any + Send + Sync>(&self, index: usize) -> Result<Arc<T>> {
    let instance = self
      .values
      .get(index)
      .ok_or(Error::MissingArgument { index })?;
    instance.downcast::<T>().ok_or_else(|| Error::TypeMismatch {
      name: self.names.get(index).cloned().unwrap_or_default(),
      expected: type_name::<T>(),
      found: instance.type_name(),
    })
  }

  /// The `this` context the callable was invoked on.
  pub fn context(&self) -> Option<&Instance> {
    self.context
  }

  /// Returns the `this` context as a `T`.
  pub fn this<T: Any + Send + Sync>(&self) -> Result<Arc<T>> {
    let context = self.context.ok_or(Error::MissingContext)?;
    context.downcast::<T>().ok_or_else(|| Error::TypeMismatch {
      name: "this".to_owned(),
      expected: type_name::<T>(),
      found: context.type_name(),
    })
  }
}

/// An injectable callable.
///
/// The dependency names are resolved through the container and passed positionally to the
/// body. Names are either given explicitly with [`Factory::inject`] or derived from the
/// closure parameters by the [`injectable!`](crate::injectable) macro.
#[derive(Clone)]
pub struct Factory {
  inject: Vec<String>,
  scope: Vec<String>,
  body: Arc<Body>,
}

impl Factory {
  pub fn new<F>(body: F) -> Self
  where
    F: Fn(&Arguments<'_>) -> std::result::Result<Instance, BoxError> + Send + Sync + 'static,
  {
    Self {
      inject: Vec::new(),
      scope: Vec::new(),
      body: Arc::new(body),
    }
  }

  /// Sets the ordered dependency names, replacing any inferred ones.
  pub fn inject<I, S>(mut self, names: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.inject = names.into_iter().map(Into::into).collect();
    self
  }

  /// Tags this factory with scopes that force a fresh instance in child containers.
  pub fn scope<I, S>(mut self, scopes: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.scope = scopes.into_iter().map(Into::into).collect();
    self
  }

  pub fn dependencies(&self) -> &[String] {
    &self.inject
  }

  pub fn scopes(&self) -> &[String] {
    &self.scope
  }

  pub(crate) fn call(&self, args: &Arguments<'_>) -> std::result::Result<Instance, BoxError> {
    (self.body)(args)
  }
}

impl fmt::Debug for Factory {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Factory")
      .field("inject", &self.inject)
      .field("scope", &self.scope)
      .finish_non_exhaustive()
  }
}

/// A constructible type.
///
/// Instantiation allocates a `T::default()` as `this`, runs the constructor body on it with
/// the resolved dependencies, and yields `this`. If the body hands back an object instead,
/// that object is the result.
#[derive(Clone)]
pub struct Type {
  inject: Vec<String>,
  scope: Vec<String>,
  type_name: &'static str,
  construct: Arc<Constructor>,
}

impl Type {
  /// A type whose instances are plain values.
  pub fn new<T, F>(constructor: F) -> Self
  where
    T: Default + Any + Send + Sync,
    F: Fn(&mut T, &Arguments<'_>) -> std::result::Result<Option<Instance>, BoxError>
      + Send
      + Sync
      + 'static,
  {
    Self::with_wrapper(Instance::new::<T>, constructor)
  }

  /// A type whose instances expose [`Component`] capabilities.
  pub fn component<T, F>(constructor: F) -> Self
  where
    T: Default + Component,
    F: Fn(&mut T, &Arguments<'_>) -> std::result::Result<Option<Instance>, BoxError>
      + Send
      + Sync
      + 'static,
  {
    Self::with_wrapper(Instance::component::<T>, constructor)
  }

  /// A type with an empty constructor body.
  pub fn of<T: Default + Any + Send + Sync>() -> Self {
    Self::new(|_: &mut T, _| Ok(None))
  }

  fn with_wrapper<T, F>(wrap: fn(T) -> Instance, constructor: F) -> Self
  where
    T: Default + Any + Send + Sync,
    F: Fn(&mut T, &Arguments<'_>) -> std::result::Result<Option<Instance>, BoxError>
      + Send
      + Sync
      + 'static,
  {
    Self {
      inject: Vec::new(),
      scope: Vec::new(),
      type_name: type_name::<T>(),
      construct: Arc::new(move |args: &Arguments<'_>| {
        let mut this = T::default();
        let returned = constructor(&mut this, args);
        (wrap(this), returned)
      }),
    }
  }

  /// Sets the ordered constructor dependency names.
  pub fn inject<I, S>(mut self, names: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.inject = names.into_iter().map(Into::into).collect();
    self
  }

  pub fn scope<I, S>(mut self, scopes: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.scope = scopes.into_iter().map(Into::into).collect();
    self
  }

  pub fn dependencies(&self) -> &[String] {
    &self.inject
  }

  pub fn scopes(&self) -> &[String] {
    &self.scope
  }

  pub fn type_name(&self) -> &'static str {
    self.type_name
  }

  pub(crate) fn construct(
    &self,
    args: &Arguments<'_>,
  ) -> (Instance, std::result::Result<Option<Instance>, BoxError>) {
    (self.construct)(args)
  }
}

impl fmt::Debug for Type {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Type")
      .field("type", &self.type_name)
      .field("inject", &self.inject)
      .field("scope", &self.scope)
      .finish_non_exhaustive()
  }
}
