use fibre_injector::{injectable, Container, Instance, Module};

struct Repository {
  connection: std::sync::Arc<String>,
}

fn main() {
  // Only "repository" escapes this module; the connection string stays internal.
  let storage = Module::new()
    .value("connection", "sqlite::memory:".to_string())
    .factory(
      "repository",
      injectable!(|connection: String| Instance::new(Repository { connection })),
    )
    .export(["repository"]);

  let container = Container::new(storage).expect("module is valid");

  let repository = container.resolve::<Repository>("repository").expect("exported");
  println!("Repository connected to {}", repository.connection);

  match container.get("connection") {
    Ok(_) => panic!("private binding leaked"),
    Err(error) => println!("Private binding is hidden: {}", error),
  }
}
