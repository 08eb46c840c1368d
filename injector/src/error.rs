use thiserror::Error;

/// Boxed error returned by factory, constructor and hook bodies.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The main error type for the `fibre_injector` library.
#[derive(Debug, Error)]
pub enum Error {
  /// No provider was found anywhere up the parent chain.
  /// `trail` holds every name being resolved, ending with `name`.
  #[error("No provider for \"{name}\"! (Resolving: {})", .trail.join(" -> "))]
  MissingProvider { name: String, trail: Vec<String> },

  /// A name was requested again while it was still being resolved.
  #[error("Can not resolve circular dependency! (Resolving: {})", .trail.join(" -> "))]
  CircularDependency { trail: Vec<String> },

  /// A callable was required but something else was given.
  #[error("Can not invoke \"{repr}\". Expected a function!{}", resolving(.trail))]
  NotCallable { repr: String, trail: Vec<String> },

  /// `create_child` was asked to force a name matching no provider and no scope tag.
  #[error("No provider for \"{0}\". Can not use provider from the parent!")]
  UnmatchedScope(String),

  #[error("Unknown provider kind \"{kind}\" for \"{name}\"")]
  UnknownProviderKind { kind: String, name: String },

  /// A dotted lookup walked into a value without the requested property.
  #[error("No property \"{property}\" while resolving \"{path}\"")]
  MissingProperty { path: String, property: String },

  #[error("Dependency \"{name}\" is a {found}, expected {expected}")]
  TypeMismatch {
    name: String,
    expected: &'static str,
    found: &'static str,
  },

  #[error("No argument at position {index}")]
  MissingArgument { index: usize },

  #[error("Invocation has no `this` context")]
  MissingContext,

  /// A private module exports a name it never declares.
  #[error("Private module exports \"{0}\" but does not provide it")]
  UndeclaredExport(String),

  /// A lifecycle hook body failed.
  #[error("Hook on \"{name}\" failed: {source}")]
  Hook {
    name: String,
    #[source]
    source: BoxError,
  },

  #[error("Failed to read configuration file: {0}")]
  ConfigRead(#[from] std::io::Error),

  #[error("Failed to parse configuration: {0}")]
  ConfigParse(String),
}

// The " (Resolving: a -> b)" suffix, empty outside of a resolution.
fn resolving(trail: &[String]) -> String {
  if trail.is_empty() {
    String::new()
  } else {
    format!(" (Resolving: {})", trail.join(" -> "))
  }
}

/// A specialized `Result` type for `fibre_injector` operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
