//! Modules: ordered lists of provider declarations.

use crate::instance::Instance;
use crate::invocation::{Factory, Type};
use crate::provider::{Payload, Provider};
use std::any::Any;

#[derive(Debug, Clone)]
pub(crate) enum Declaration {
  /// Validated into a provider when the container is built.
  Definition {
    name: String,
    kind: String,
    payload: Payload,
  },
  /// Taken verbatim.
  Provider(Provider),
}

/// An ordered, append-only list of provider declarations.
///
/// Later declarations shadow earlier ones of the same name. A module with an export list
/// (see [`Module::export`]) is private: the container builds it into its own sub-container
/// and only the exported names are visible from outside.
///
/// ```
/// use fibre_injector::{injectable, Container, Instance, Module};
///
/// let module = Module::new()
///   .value("greeting", String::from("hello"))
///   .factory("shout", injectable!(|greeting: String| Instance::new(greeting.to_uppercase())));
///
/// let container = Container::new(module).unwrap();
/// assert_eq!(*container.resolve::<String>("shout").unwrap(), "HELLO");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Module {
  declarations: Vec<Declaration>,
  exports: Option<Vec<String>>,
  modules: Vec<Module>,
}

impl Module {
  pub fn new() -> Self {
    Self::default()
  }

  /// Declares a constant value.
  pub fn value<T: Any + Send + Sync>(self, name: impl Into<String>, value: T) -> Self {
    self.instance(name, Instance::new(value))
  }

  /// Declares a constant that is already an [`Instance`].
  pub fn instance(self, name: impl Into<String>, instance: Instance) -> Self {
    self.register("value", name, Payload::Value(instance))
  }

  pub fn factory(self, name: impl Into<String>, factory: Factory) -> Self {
    self.register("factory", name, Payload::Factory(factory))
  }

  pub fn ty(self, name: impl Into<String>, ty: Type) -> Self {
    self.register("type", name, Payload::Type(ty))
  }

  /// Declares a provider by kind name.
  ///
  /// The kind and payload are only checked when a container consumes the module, which
  /// then fails with [`Error::UnknownProviderKind`](crate::Error::UnknownProviderKind) or
  /// [`Error::NotCallable`](crate::Error::NotCallable).
  pub fn register(mut self, kind: &str, name: impl Into<String>, payload: Payload) -> Self {
    self.declarations.push(Declaration::Definition {
      name: name.into(),
      kind: kind.to_owned(),
      payload,
    });
    self
  }

  /// Adds a ready-made provider as is.
  pub fn provider(mut self, provider: Provider) -> Self {
    self.declarations.push(Declaration::Provider(provider));
    self
  }

  /// Makes this module private, exposing only `names` to the enclosing container.
  pub fn export<I, S>(mut self, names: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self
      .exports
      .get_or_insert_with(Vec::new)
      .extend(names.into_iter().map(Into::into));
    self
  }

  /// Loads another module alongside this one, ahead of its own declarations.
  ///
  /// For a private module the included module lands in the private container too.
  pub fn include(mut self, module: Module) -> Self {
    self.modules.push(module);
    self
  }

  pub fn is_private(&self) -> bool {
    self.exports.is_some()
  }

  pub fn len(&self) -> usize {
    self.declarations.len()
  }

  pub fn is_empty(&self) -> bool {
    self.declarations.is_empty()
  }

  /// The included modules and this module's own declarations.
  pub(crate) fn into_parts(self) -> (Vec<Module>, Vec<Declaration>) {
    (self.modules, self.declarations)
  }

  /// Splits a private module into its export list and the modules its private container
  /// is built from: the included modules first, then its own declarations.
  /// A public module is handed back unchanged.
  pub(crate) fn split_private(self) -> Result<(Vec<String>, Vec<Module>), Module> {
    if self.exports.is_none() {
      return Err(self);
    }
    let exports = self.exports.unwrap_or_default();
    let own = Module {
      declarations: self.declarations,
      exports: None,
      modules: Vec::new(),
    };
    let mut modules = self.modules;
    modules.push(own);
    Ok((exports, modules))
  }
}

/// Anything a container can be built from: one module or several.
pub trait IntoModules {
  fn into_modules(self) -> Vec<Module>;
}

impl IntoModules for Module {
  fn into_modules(self) -> Vec<Module> {
    vec![self]
  }
}

impl IntoModules for Vec<Module> {
  fn into_modules(self) -> Vec<Module> {
    self
  }
}

impl<const N: usize> IntoModules for [Module; N] {
  fn into_modules(self) -> Vec<Module> {
    self.into()
  }
}

impl IntoModules for () {
  fn into_modules(self) -> Vec<Module> {
    Vec::new()
  }
}
