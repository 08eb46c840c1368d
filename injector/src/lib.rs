//! # Fibre Injector
//!
//! A hierarchical, name-based dependency-injection container for Rust.
//!
//! Services are declared in [`Module`]s as named providers (constant values, factories,
//! constructible types) and resolved lazily by name from a [`Container`]. Each provider's
//! dependencies are resolved by name first and injected positionally.
//!
//! ## Core Concepts
//!
//! - **Module**: an ordered list of provider declarations, built by chaining.
//! - **Container**: owns a provider table and an instance cache. Every name yields at most
//!   one instance per container. Names it does not provide are delegated to its parent.
//! - **Child containers**: created with [`Container::create_child`]. Names (or scope tags)
//!   listed as "force new" get fresh instances in the child instead of the parent's.
//! - **Private modules**: modules with an export list get their own sub-container; only the
//!   exported names are visible outside.
//! - **Dotted names**: `"config.database.url"` walks into a registered configuration object.
//!
//! Resolution failures are reported with the full trail of names being resolved, e.g.
//! `No provider for "c"! (Resolving: a -> b -> c)`.
//!
//! ## Quick Start
//!
//! ```
//! use fibre_injector::{injectable, Container, Instance, Module};
//! use serde_json::json;
//!
//! struct Database {
//!   url: String,
//! }
//!
//! let module = Module::new()
//!   .value("config", json!({ "database": { "url": "postgres://localhost/app" } }))
//!   .factory("db", injectable!(|url @ "config.database.url": serde_json::Value| {
//!     Instance::new(Database { url: url.as_str().unwrap_or_default().to_owned() })
//!   }));
//!
//! let container = Container::new(module).unwrap();
//! let db = container.resolve::<Database>("db").unwrap();
//! assert_eq!(db.url, "postgres://localhost/app");
//!
//! // Resolving again yields the very same instance.
//! assert!(std::sync::Arc::ptr_eq(&db, &container.resolve::<Database>("db").unwrap()));
//! ```

pub mod config;
mod container;
mod core;
mod error;
mod instance;
mod invocation;
mod macros;
mod module;
mod provider;

pub use config::ModuleConfig;
pub use container::Container;
pub use error::{BoxError, Error, Result};
pub use instance::{Component, Instance};
pub use invocation::{Arguments, Factory, Type};
pub use module::{IntoModules, Module};
pub use provider::{Kind, Payload, Provider, UnknownKind};
