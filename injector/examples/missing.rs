use fibre_injector::{injectable, resolve, Container, Error, Instance, Module};
use std::panic;

fn main() {
  let module = Module::new()
    .factory("a", injectable!(|b: String| Instance::from_arc(b)))
    .factory("b", injectable!(|c: String| Instance::from_arc(c)));
  let container = Container::new(module).expect("module is valid");

  // --- Using the fallible `get()` method ---
  println!("Resolving \"a\", whose dependency chain ends in a missing \"c\"...");
  match container.get("a") {
    Err(error @ Error::MissingProvider { .. }) => println!("Got the expected error: {}", error),
    other => panic!("Should not have resolved: {:?}", other),
  }

  // --- Using the panicking `resolve!` macro ---
  println!("\nNow resolving with resolve!, which panics...");
  let result = panic::catch_unwind(panic::AssertUnwindSafe(|| {
    let _service = resolve!(container, String, "a");
  }));
  assert!(result.is_err(), "resolve! should have panicked.");
  println!("Successfully caught the expected panic from resolve!.");
}
