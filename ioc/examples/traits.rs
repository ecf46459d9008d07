use fibre_autowire::{resolve, Arguments, Container, Parameter, Reflect, Result, TypeRegistry};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

// 1. Define the abstraction (the trait)
trait Logger: Send + Sync {
  fn log(&self, message: &str);
}

// 2. Define a concrete implementation and describe its constructor
struct ConsoleLogger {
  prefix: String,
}

impl Logger for ConsoleLogger {
  fn log(&self, message: &str) {
    println!("[{}]: {}", self.prefix, message);
  }
}

impl Reflect for ConsoleLogger {
  const TYPE_NAME: &'static str = "ConsoleLogger";

  fn parameters() -> Vec<Parameter> {
    vec![Parameter::builtin::<String>("prefix").with_default(String::from("CONSOLE LOG"))]
  }

  fn construct(arguments: &mut Arguments) -> Result<Self> {
    Ok(ConsoleLogger {
      prefix: arguments.take_value()?,
    })
  }
}

// 3. Define a service that depends on the abstraction
struct ReportService {
  logger: Arc<dyn Logger>,
}

impl ReportService {
  fn generate_report(&self) {
    self.logger.log("Starting report generation.");
    // ... logic to generate report ...
    self.logger.log("Finished report generation.");
  }
}

impl Reflect for ReportService {
  const TYPE_NAME: &'static str = "ReportService";

  fn parameters() -> Vec<Parameter> {
    vec![Parameter::class("logger", "Logger")]
  }

  fn construct(arguments: &mut Arguments) -> Result<Self> {
    Ok(ReportService {
      logger: arguments.take()?,
    })
  }
}

fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .init();

  // --- Registration ---

  // Teach the registry how to build both types, and that a ConsoleLogger can
  // be served wherever a `Logger` is asked for.
  let mut registry = TypeRegistry::new();
  registry
    .register::<ConsoleLogger>()
    .implements::<dyn Logger>("Logger", |logger| logger as Arc<dyn Logger>);
  registry.register::<ReportService>();

  let container = Container::with_registry(registry);

  // Bind the interface to its implementation. ReportService itself is never
  // registered; the container wires it from its constructor parameters.
  container.singleton_with("Logger", "ConsoleLogger");

  // --- Resolution and Usage ---
  println!("Resolving the high-level service...");
  let report_service = resolve!(container, ReportService, "ReportService");

  println!("Using the service...");
  report_service.generate_report();
}
