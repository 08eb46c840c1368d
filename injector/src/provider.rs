//! Providers: named rules describing how to produce one value.

use crate::container::Container;
use crate::error::{Error, Result};
use crate::instance::Instance;
use crate::invocation::{Factory, Type};
use std::fmt;
use std::str::FromStr;

/// The four ways a provider can produce its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
  Value,
  Factory,
  Type,
  Private,
}

impl Kind {
  pub fn as_str(&self) -> &'static str {
    match self {
      Kind::Value => "value",
      Kind::Factory => "factory",
      Kind::Type => "type",
      Kind::Private => "private",
    }
  }
}

impl fmt::Display for Kind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Error returned when parsing an unknown provider kind name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownKind(pub String);

impl FromStr for Kind {
  type Err = UnknownKind;

  fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
    match s {
      "value" => Ok(Kind::Value),
      "factory" => Ok(Kind::Factory),
      "type" => Ok(Kind::Type),
      "private" => Ok(Kind::Private),
      other => Err(UnknownKind(other.to_owned())),
    }
  }
}

/// What a declaration hands over to become a provider.
#[derive(Debug, Clone)]
pub enum Payload {
  Value(Instance),
  Factory(Factory),
  Type(Type),
  /// The private container that owns the real provider.
  Private(Container),
}

impl Payload {
  // Printable form used by invocation errors.
  pub(crate) fn describe(&self) -> String {
    match self {
      Payload::Value(instance) => format!("{:?}", instance),
      Payload::Factory(_) => "factory".to_owned(),
      Payload::Type(ty) => ty.type_name().to_owned(),
      Payload::Private(_) => "[private container]".to_owned(),
    }
  }
}

#[derive(Debug, Clone)]
pub(crate) enum Source {
  Value(Instance),
  Factory(Factory),
  Type(Type),
  Private(Container),
}

/// A named production rule.
#[derive(Debug, Clone)]
pub struct Provider {
  name: String,
  source: Source,
}

impl Provider {
  /// Builds a provider of the given kind, checking that the payload fits it.
  ///
  /// A `"value"` provider accepts any payload and hands it back unchanged. `"factory"` and
  /// `"type"` need a callable of the matching shape and `"private"` needs a container.
  pub fn create(kind: &str, name: impl Into<String>, payload: Payload) -> Result<Self> {
    let name = name.into();
    let kind = kind
      .parse::<Kind>()
      .map_err(|UnknownKind(kind)| Error::UnknownProviderKind {
        kind,
        name: name.clone(),
      })?;

    let source = match (kind, payload) {
      (Kind::Value, Payload::Value(instance)) => Source::Value(instance),
      (Kind::Value, Payload::Factory(factory)) => Source::Value(Instance::new(factory)),
      (Kind::Value, Payload::Type(ty)) => Source::Value(Instance::new(ty)),
      (Kind::Value, Payload::Private(container)) => Source::Value(Instance::new(container)),
      (Kind::Factory, Payload::Factory(factory)) => Source::Factory(factory),
      (Kind::Type, Payload::Type(ty)) => Source::Type(ty),
      (Kind::Private, Payload::Private(container)) => Source::Private(container),
      (_, other) => {
        return Err(Error::NotCallable {
          repr: other.describe(),
          trail: Vec::new(),
        })
      }
    };
    Ok(Self { name, source })
  }

  pub fn value(name: impl Into<String>, instance: Instance) -> Self {
    Self {
      name: name.into(),
      source: Source::Value(instance),
    }
  }

  pub fn factory(name: impl Into<String>, factory: Factory) -> Self {
    Self {
      name: name.into(),
      source: Source::Factory(factory),
    }
  }

  pub fn ty(name: impl Into<String>, ty: Type) -> Self {
    Self {
      name: name.into(),
      source: Source::Type(ty),
    }
  }

  pub(crate) fn private(name: impl Into<String>, container: Container) -> Self {
    Self {
      name: name.into(),
      source: Source::Private(container),
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn kind(&self) -> Kind {
    match self.source {
      Source::Value(_) => Kind::Value,
      Source::Factory(_) => Kind::Factory,
      Source::Type(_) => Kind::Type,
      Source::Private(_) => Kind::Private,
    }
  }

  /// Scope tags declared on a factory or type payload.
  pub fn scopes(&self) -> &[String] {
    match &self.source {
      Source::Factory(factory) => factory.scopes(),
      Source::Type(ty) => ty.scopes(),
      Source::Value(_) | Source::Private(_) => &[],
    }
  }

  /// The private container behind a private provider.
  pub(crate) fn private_container(&self) -> Option<&Container> {
    match &self.source {
      Source::Private(container) => Some(container),
      _ => None,
    }
  }

  /// Produces the value, resolving dependencies through `container`.
  pub(crate) fn get(&self, container: &Container) -> Result<Instance> {
    match &self.source {
      Source::Value(instance) => Ok(instance.clone()),
      Source::Factory(factory) => container.invoke(factory, None),
      Source::Type(ty) => container.instantiate(ty),
      Source::Private(private) => private.get(&self.name),
    }
  }
}
