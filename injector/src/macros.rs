//! Public macros for declaring injectables and resolving services.

/// Builds a [`Factory`](crate::Factory) whose dependency names are taken from the closure
/// parameter names.
///
/// Each parameter `name: T` is bound to an `Arc<T>` resolved from the dependency `"name"`.
/// Write `param @ "other": T` to inject `"other"` into `param`. The body must evaluate to
/// an [`Instance`](crate::Instance); `?` may be used inside it.
///
/// # Examples
///
/// ```
/// use fibre_injector::{injectable, Container, Instance, Module};
///
/// let module = Module::new()
///   .value("host", String::from("localhost"))
///   .value("port", 8080_u16)
///   .factory("address", injectable!(|host: String, port: u16| {
///     Instance::new(format!("{}:{}", host, port))
///   }))
///   .factory("banner", injectable!(|addr @ "address": String| {
///     Instance::new(format!("listening on {}", addr))
///   }));
///
/// let container = Container::new(module).unwrap();
/// assert_eq!(*container.resolve::<String>("banner").unwrap(), "listening on localhost:8080");
/// ```
#[macro_export]
macro_rules! injectable {
  (@name $param:ident @ $alias:literal) => {
    $alias
  };

  (@name $param:ident) => {
    stringify!($param)
  };

  (|| $body:expr) => {
    $crate::Factory::new(move |_: &$crate::Arguments<'_>| ::std::result::Result::Ok($body))
  };

  (| $( $param:ident $(@ $alias:literal)? : $ty:ty ),* $(,)? | $body:expr) => {{
    let names: ::std::vec::Vec<&'static str> =
      ::std::vec![ $( $crate::injectable!(@name $param $(@ $alias)?) ),* ];
    $crate::Factory::new(move |args: &$crate::Arguments<'_>| {
      let mut index = 0_usize;
      $(
        let $param: ::std::sync::Arc<$ty> = args.get::<$ty>(index)?;
        index += 1;
      )*
      let _ = index;
      ::std::result::Result::Ok($body)
    })
    .inject(names)
  }};
}

/// Resolves a service from a container, downcast to the given type.
///
/// This is the panicking counterpart of [`Container::resolve`](crate::Container::resolve),
/// meant for wiring code where a missing service is a programming error.
///
/// # Panics
///
/// Panics if the service cannot be resolved or has a different type.
///
/// # Examples
///
/// ```
/// use fibre_injector::{resolve, Container, Module};
///
/// let container = Container::new(Module::new().value("answer", 42_u32)).unwrap();
/// let answer = resolve!(container, u32, "answer");
/// assert_eq!(*answer, 42);
/// ```
#[macro_export]
macro_rules! resolve {
  ($container:expr, $type:ty, $name:expr) => {{
    let name: &str = $name;
    $container
      .resolve::<$type>(name)
      .unwrap_or_else(|error| {
        panic!(
          "Failed to resolve required service '{}' as {}: {}",
          name,
          std::any::type_name::<$type>(),
          error
        )
      })
  }};
}
