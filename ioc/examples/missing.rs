use fibre_autowire::{resolve, Arguments, Container, ContainerError, Parameter, Reflect, Result, TypeRegistry};
use std::panic;

// A service that needs a port nobody provides.
struct HttpServer {
  port: u16,
}

impl Reflect for HttpServer {
  const TYPE_NAME: &'static str = "HttpServer";

  fn parameters() -> Vec<Parameter> {
    vec![Parameter::builtin::<u16>("port")]
  }

  fn construct(arguments: &mut Arguments) -> Result<Self> {
    Ok(HttpServer {
      port: arguments.take_value()?,
    })
  }
}

fn main() {
  let mut registry = TypeRegistry::new();
  registry.register::<HttpServer>();
  let container = Container::with_registry(registry);

  // --- Using the panicking `resolve!` macro ---
  println!("Attempting to resolve a service that was never registered...");

  let result = panic::catch_unwind(|| {
    // This line will panic!
    let _service = resolve!(Container::new(), String, "unregistered");
  });

  assert!(result.is_err(), "resolve! should have panicked.");
  println!("Successfully caught the expected panic from resolve!.");

  // --- Using the fallible `get()` method ---
  println!("\nNow, attempting to resolve using the fallible `get()` method...");

  match container.get("unregistered") {
    Err(ContainerError::NotBuildable { abstract_id }) => {
      println!("Correctly received NotBuildable for '{}'.", abstract_id)
    }
    other => panic!("Should not have found the service! {:?}", other),
  }

  // --- A registered type with an unresolvable parameter ---
  match container.get("HttpServer") {
    Err(error @ ContainerError::UnresolvableParameter { .. }) => println!("{}", error),
    other => panic!("Expected an unresolvable parameter! {:?}", other),
  }

  // Supplying the parameter explicitly fixes it.
  let server = container
    .make_as::<HttpServer>("HttpServer", &fibre_autowire::params! { "port" => 8080_u16 })
    .unwrap_or_else(|error| panic!("{}", error));
  println!("Built HttpServer on port {}.", server.port);
}
