//! Type-erased instances produced by providers.

use crate::invocation::Factory;
use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

/// Optional capabilities of an instance.
///
/// Values registered through [`Instance::component`] expose these to the container:
/// `property` is consulted by dotted lookups such as `"server.port"`, and the hooks are
/// invoked (with dependency injection) by [`Container::start`](crate::Container::start)
/// and [`Container::stop`](crate::Container::stop). Every method defaults to "absent".
pub trait Component: Any + Send + Sync {
  /// Returns the named property, if this component has one.
  fn property(&self, _name: &str) -> Option<Instance> {
    None
  }

  /// The hook run when the owning container starts.
  fn start(&self) -> Option<Factory> {
    None
  }

  /// The hook run when the owning container stops.
  fn stop(&self) -> Option<Factory> {
    None
  }
}

/// A shared, type-erased value held in a container's instance cache.
///
/// Cloning an `Instance` is cheap and keeps pointing at the same value, so identity can be
/// checked with [`Instance::ptr_eq`].
#[derive(Clone)]
pub struct Instance {
  value: Arc<dyn Any + Send + Sync>,
  component: Option<Arc<dyn Component>>,
  type_name: &'static str,
}

impl Instance {
  /// Wraps a plain value.
  pub fn new<T: Any + Send + Sync>(value: T) -> Self {
    Self::from_arc(Arc::new(value))
  }

  /// Wraps an already shared value without reallocating it.
  pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
    Self {
      value,
      component: None,
      type_name: type_name::<T>(),
    }
  }

  /// Wraps a value that exposes [`Component`] capabilities.
  pub fn component<T: Component>(value: T) -> Self {
    let value = Arc::new(value);
    Self {
      value: value.clone(),
      component: Some(value),
      type_name: type_name::<T>(),
    }
  }

  /// The Rust type name of the wrapped value.
  pub fn type_name(&self) -> &'static str {
    self.type_name
  }

  pub fn is<T: Any>(&self) -> bool {
    self.value.is::<T>()
  }

  pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
    self.value.downcast_ref::<T>()
  }

  /// Returns a shared handle to the value if it is a `T`.
  pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
    self.value.clone().downcast::<T>().ok()
  }

  /// Returns `true` if both instances point at the same value.
  pub fn ptr_eq(&self, other: &Instance) -> bool {
    std::ptr::eq(
      Arc::as_ptr(&self.value) as *const (),
      Arc::as_ptr(&other.value) as *const (),
    )
  }

  /// Plain attribute access used by dotted lookups.
  pub(crate) fn property(&self, name: &str) -> Option<Instance> {
    if let Some(component) = &self.component {
      return component.property(name);
    }
    let value = self.downcast_ref::<serde_json::Value>()?;
    let nested = match value {
      serde_json::Value::Object(map) => map.get(name),
      serde_json::Value::Array(items) => name.parse::<usize>().ok().and_then(|i| items.get(i)),
      _ => None,
    }?;
    Some(Instance::new(nested.clone()))
  }

  pub(crate) fn start_hook(&self) -> Option<Factory> {
    self.component.as_ref().and_then(|c| c.start())
  }

  pub(crate) fn stop_hook(&self) -> Option<Factory> {
    self.component.as_ref().and_then(|c| c.stop())
  }
}

impl fmt::Debug for Instance {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if let Some(value) = self.downcast_ref::<serde_json::Value>() {
      return write!(f, "Instance({})", value);
    }
    write!(f, "Instance({})", self.type_name)
  }
}
