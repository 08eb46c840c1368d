use fibre_injector::{injectable, Container, Instance, Module, Type};
use std::sync::atomic::{AtomicUsize, Ordering};

static NEXT_ID: AtomicUsize = AtomicUsize::new(1);

#[derive(Default)]
struct Request {
  id: usize,
}

struct Handler {
  request: std::sync::Arc<Request>,
  app_name: std::sync::Arc<String>,
}

fn main() {
  // The root container holds application-wide services.
  let module = Module::new()
    .value("app_name", "demo".to_string())
    .ty(
      "request",
      Type::new(|this: &mut Request, _| {
        this.id = NEXT_ID.fetch_add(1, Ordering::SeqCst);
        Ok(None)
      })
      .scope(["request"]),
    )
    .factory(
      "handler",
      injectable!(|request: Request, app_name: String| Instance::new(Handler { request, app_name }))
        .scope(["request"]),
    );
  let root = Container::new(module).expect("module is valid");

  // Every "request" child gets its own request-scoped instances,
  // while the application name is still shared with the root.
  for _ in 0..3 {
    let scope = root.create_child((), &["request"]).expect("scope matches");
    let handler = scope.resolve::<Handler>("handler").expect("handler resolves");
    println!(
      "[{}] handling request #{}",
      handler.app_name, handler.request.id
    );
    assert!(std::sync::Arc::ptr_eq(
      &handler.app_name,
      &root.resolve::<String>("app_name").expect("shared")
    ));
  }

  // A child can also shadow providers for a narrower context.
  let test_scope = root
    .child(Module::new().value("app_name", "demo-under-test".to_string()))
    .expect("module is valid");
  println!(
    "\nShadowed name in child: {}",
    test_scope.resolve::<String>("app_name").expect("resolves")
  );
}
