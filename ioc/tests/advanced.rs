use fibre_autowire::{
  params, Arguments, Concrete, Container, ContainerError, Object, Parameter, Reflect, Result, TypeInfo,
  TypeRegistry,
};
use pretty_assertions::assert_eq;
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc, Barrier,
};
use std::thread;

// --- Advanced Test Fixtures ---

// The interface must be Send + Sync for the container to hand it out.
trait Logger: Send + Sync {
  fn prefix(&self) -> String;
}

struct FileLogger {
  path: String,
}

impl Logger for FileLogger {
  fn prefix(&self) -> String {
    format!("file:{}", self.path)
  }
}

impl Reflect for FileLogger {
  const TYPE_NAME: &'static str = "FileLogger";

  fn parameters() -> Vec<Parameter> {
    vec![Parameter::untyped("path").with_default(String::from("/var/log/app.log"))]
  }

  fn construct(arguments: &mut Arguments) -> Result<Self> {
    Ok(FileLogger {
      path: arguments.take_value()?,
    })
  }
}

struct AppConfig {
  database_url: String,
}

impl Reflect for AppConfig {
  const TYPE_NAME: &'static str = "AppConfig";

  fn parameters() -> Vec<Parameter> {
    vec![Parameter::builtin::<String>("database_url")
      .with_default(String::from("postgres://localhost/app"))]
  }

  fn construct(arguments: &mut Arguments) -> Result<Self> {
    Ok(AppConfig {
      database_url: arguments.take_value()?,
    })
  }
}

// Depends on AppConfig.
struct DatabaseConnection {
  config: Arc<AppConfig>,
}

impl Reflect for DatabaseConnection {
  const TYPE_NAME: &'static str = "DatabaseConnection";

  fn parameters() -> Vec<Parameter> {
    vec![Parameter::class("config", "AppConfig")]
  }

  fn construct(arguments: &mut Arguments) -> Result<Self> {
    Ok(DatabaseConnection {
      config: arguments.take()?,
    })
  }
}

// Depends on DatabaseConnection and the Logger interface.
struct UserService {
  db: Arc<DatabaseConnection>,
  logger: Arc<dyn Logger>,
}

impl UserService {
  fn describe(&self) -> String {
    format!("{} via {}", self.logger.prefix(), self.db.config.database_url)
  }
}

impl Reflect for UserService {
  const TYPE_NAME: &'static str = "UserService";

  fn parameters() -> Vec<Parameter> {
    vec![
      Parameter::class("db", "DatabaseConnection"),
      Parameter::class("logger", "Logger"),
    ]
  }

  fn construct(arguments: &mut Arguments) -> Result<Self> {
    Ok(UserService {
      db: arguments.take()?,
      logger: arguments.take()?,
    })
  }
}

// Depends on a class nobody registered.
struct MetricsReporter {
  sink: Option<Arc<String>>,
}

impl Reflect for MetricsReporter {
  const TYPE_NAME: &'static str = "MetricsReporter";

  fn parameters() -> Vec<Parameter> {
    vec![Parameter::class("sink", "StatsdSink")]
  }

  fn construct(arguments: &mut Arguments) -> Result<Self> {
    Ok(MetricsReporter {
      sink: Some(arguments.take()?),
    })
  }
}

// Same, but the dependency is optional.
struct OptionalReporter {
  enabled: bool,
}

impl Reflect for OptionalReporter {
  const TYPE_NAME: &'static str = "OptionalReporter";

  fn parameters() -> Vec<Parameter> {
    vec![Parameter::class("sink", "StatsdSink").with_default(Option::<Arc<String>>::None)]
  }

  fn construct(arguments: &mut Arguments) -> Result<Self> {
    let sink: Option<Arc<String>> = arguments.take_value()?;
    Ok(OptionalReporter {
      enabled: sink.is_some(),
    })
  }
}

// A -> B -> A, both auto-wired.
struct ServiceA {
  _b: Arc<ServiceB>,
}

struct ServiceB {
  _a: Arc<ServiceA>,
}

impl Reflect for ServiceA {
  const TYPE_NAME: &'static str = "ServiceA";

  fn parameters() -> Vec<Parameter> {
    vec![Parameter::class("b", "ServiceB")]
  }

  fn construct(arguments: &mut Arguments) -> Result<Self> {
    Ok(ServiceA { _b: arguments.take()? })
  }
}

impl Reflect for ServiceB {
  const TYPE_NAME: &'static str = "ServiceB";

  fn parameters() -> Vec<Parameter> {
    vec![Parameter::class("a", "ServiceA")]
  }

  fn construct(arguments: &mut Arguments) -> Result<Self> {
    Ok(ServiceB { _a: arguments.take()? })
  }
}

fn registry() -> TypeRegistry {
  let mut registry = TypeRegistry::new();
  registry
    .register::<FileLogger>()
    .implements::<dyn Logger>("Logger", |logger| logger as Arc<dyn Logger>);
  registry.register::<AppConfig>();
  registry.register::<DatabaseConnection>();
  registry.register::<UserService>();
  registry.register::<MetricsReporter>();
  registry.register::<OptionalReporter>();
  registry.register::<ServiceA>();
  registry.register::<ServiceB>();
  registry
}

// --- Advanced Tests ---

#[test]
fn test_recursive_autowiring_of_unregistered_types() {
  let container = Container::with_registry(registry());

  let db = container
    .get_as::<DatabaseConnection>("DatabaseConnection")
    .unwrap();

  assert_eq!(db.config.database_url, "postgres://localhost/app");
  // Nothing got bound along the way.
  assert!(!container.has("AppConfig"));
  assert!(!container.has("DatabaseConnection"));

  // Each resolution wires in a freshly built dependency.
  let again = container
    .get_as::<DatabaseConnection>("DatabaseConnection")
    .unwrap();
  assert!(!Arc::ptr_eq(&db, &again));
  assert!(!Arc::ptr_eq(&db.config, &again.config));
}

#[test]
fn test_interface_binding_resolves_to_bound_implementation() {
  let container = Container::with_registry(registry());
  container.singleton_with("Logger", "FileLogger");

  let service = container.get_as::<UserService>("UserService").unwrap();

  assert_eq!(
    service.describe(),
    "file:/var/log/app.log via postgres://localhost/app"
  );

  // The singleton logger is shared with anyone else asking for it.
  let logger = container.get_as::<dyn Logger>("Logger").unwrap();
  assert!(Arc::ptr_eq(&logger, &service.logger));
}

#[test]
fn test_unbound_interface_parameter_fails() {
  let container = Container::with_registry(registry());

  match container.get("UserService") {
    Err(ContainerError::UnresolvableParameter {
      type_name,
      parameter,
    }) => {
      assert_eq!(type_name, "UserService");
      assert_eq!(parameter, "logger");
    }
    other => panic!("expected UnresolvableParameter, got {:?}", other),
  }
}

#[test]
fn test_interface_bound_to_factory() {
  let container = Container::with_registry(registry());
  container.transient_with(
    "Logger",
    Concrete::factory(|_, _| {
      let logger: Arc<dyn Logger> = Arc::new(FileLogger {
        path: String::from("/tmp/factory.log"),
      });
      Ok(Object::from_arc(logger))
    }),
  );

  let service = container.get_as::<UserService>("UserService").unwrap();
  assert_eq!(service.logger.prefix(), "file:/tmp/factory.log");
}

#[test]
fn test_bound_dependency_is_reused_by_dependents() {
  let container = Container::with_registry(registry());
  container.singleton("AppConfig");
  container.singleton_with("Logger", "FileLogger");

  let first = container.get_as::<UserService>("UserService").unwrap();
  let second = container.get_as::<UserService>("UserService").unwrap();

  // UserService and DatabaseConnection are transient...
  assert!(!Arc::ptr_eq(&first, &second));
  assert!(!Arc::ptr_eq(&first.db, &second.db));
  // ...but they share the singleton configuration.
  assert!(Arc::ptr_eq(&first.db.config, &second.db.config));
}

#[test]
fn test_instance_satisfies_typed_parameter() {
  let container = Container::with_registry(registry());
  container.instance(
    "AppConfig",
    Object::new(AppConfig {
      database_url: String::from("mysql://replica"),
    }),
  );

  let db = container
    .get_as::<DatabaseConnection>("DatabaseConnection")
    .unwrap();
  assert_eq!(db.config.database_url, "mysql://replica");
}

#[test]
fn test_class_override_is_used_verbatim() {
  let container = Container::with_registry(registry());
  let config = Arc::new(AppConfig {
    database_url: String::from("sqlite::memory:"),
  });

  let db = container
    .make_as::<DatabaseConnection>(
      "DatabaseConnection",
      &fibre_autowire::Parameters::new().with_object("config", Object::from_arc(Arc::clone(&config))),
    )
    .unwrap();

  assert!(Arc::ptr_eq(&db.config, &config));
}

#[test]
fn test_unknown_class_parameter_without_default_fails() {
  let container = Container::with_registry(registry());

  match container.get("MetricsReporter") {
    Err(ContainerError::UnresolvableParameter {
      type_name,
      parameter,
    }) => {
      assert_eq!(type_name, "MetricsReporter");
      assert_eq!(parameter, "sink");
    }
    other => panic!("expected UnresolvableParameter, got {:?}", other),
  }

  // Binding the class makes it resolvable.
  container.instance("StatsdSink", Object::new(String::from("udp://127.0.0.1:8125")));
  let reporter = container
    .get_as::<MetricsReporter>("MetricsReporter")
    .unwrap();
  assert_eq!(reporter.sink.as_deref().map(String::as_str), Some("udp://127.0.0.1:8125"));
}

#[test]
fn test_unknown_class_parameter_falls_back_to_default() {
  let container = Container::with_registry(registry());

  let reporter = container
    .get_as::<OptionalReporter>("OptionalReporter")
    .unwrap();
  assert!(!reporter.enabled);
}

#[test]
fn test_circular_dependency_is_reported() {
  let container = Container::with_registry(registry());

  match container.get("ServiceA") {
    Err(ContainerError::CircularDependency { abstract_id, chain }) => {
      assert_eq!(abstract_id, "ServiceA");
      assert_eq!(chain, vec!["ServiceA", "ServiceB", "ServiceA"]);
    }
    other => panic!("expected CircularDependency, got {:?}", other.map(|_| ())),
  }

  // The failed resolution leaves the container usable.
  assert!(container.get("AppConfig").is_ok());
}

#[test]
fn test_circular_dependency_through_factories() {
  let container = Container::new();
  container.singleton_with("a", Concrete::factory(|c, _| c.get("b")));
  container.singleton_with("b", Concrete::factory(|c, _| c.get("a")));

  let error = container.get("a").unwrap_err();
  assert_eq!(
    error.to_string(),
    "Circular dependency detected while resolving [a]: a -> b -> a"
  );
}

#[test]
fn test_factory_may_reenter_itself_with_overrides() {
  let container = Container::new();
  container.transient_with(
    "dsn",
    Concrete::factory(|c, parameters| match parameters.get("host") {
      Some(host) => {
        let host = host.downcast::<String>().ok_or_else(|| ContainerError::factory("host"))?;
        Ok(Object::new(format!("postgres://{}", host)))
      }
      None => c.make_with("dsn", &params! { "host" => String::from("localhost") }),
    }),
  );

  assert_eq!(*container.get_as::<String>("dsn").unwrap(), "postgres://localhost");
}

#[test]
fn test_overridden_self_reentry_is_still_a_cycle() {
  let container = Container::new();
  container.transient_with(
    "loop",
    Concrete::factory(|c, parameters| c.make_with("loop", parameters)),
  );

  assert!(container.get("loop").is_err());
  match container.make_with("loop", &params! { "n" => 1_u8 }) {
    Err(ContainerError::CircularDependency { chain, .. }) => {
      assert_eq!(chain, vec!["loop", "loop"]);
    }
    other => panic!("expected CircularDependency, got {:?}", other.map(|_| ())),
  }
}

#[test]
fn test_nested_containers_do_not_trip_cycle_detection() {
  let inner = Arc::new(Container::new());
  inner.transient_with(
    "name",
    Concrete::factory(|_, _| Ok(Object::new(String::from("inner")))),
  );

  let outer = Container::new();
  let delegate = Arc::clone(&inner);
  outer.transient_with("name", Concrete::factory(move |_, _| delegate.get("name")));

  assert_eq!(*outer.get_as::<String>("name").unwrap(), "inner");
}

#[test]
fn test_singleton_is_built_once_under_concurrency() {
  static BUILDS: AtomicUsize = AtomicUsize::new(0);

  let container = Container::new();
  container.singleton_with(
    "slow",
    Concrete::factory(|_, _| {
      BUILDS.fetch_add(1, Ordering::SeqCst);
      thread::sleep(std::time::Duration::from_millis(50));
      Ok(Object::new(String::from("slow")))
    }),
  );

  let results: Vec<Object> = thread::scope(|s| {
    let handles: Vec<_> = (0..16)
      .map(|_| s.spawn(|| container.get("slow").unwrap()))
      .collect();
    handles
      .into_iter()
      .map(|handle| handle.join().unwrap())
      .collect()
  });

  assert_eq!(BUILDS.load(Ordering::SeqCst), 1);
  assert!(results.iter().all(|object| object.ptr_eq(&results[0])));
}

#[test]
fn test_rebind_during_singleton_construction_is_not_overwritten() {
  let started = Arc::new(Barrier::new(2));
  let rebound = Arc::new(Barrier::new(2));

  let container = Container::new();
  let (factory_started, factory_rebound) = (Arc::clone(&started), Arc::clone(&rebound));
  container.singleton_with(
    "svc",
    Concrete::factory(move |_, _| {
      factory_started.wait();
      factory_rebound.wait();
      Ok(Object::new(String::from("old")))
    }),
  );

  let in_flight = thread::scope(|s| {
    let handle = s.spawn(|| container.get_as::<String>("svc").unwrap());

    started.wait();
    container.singleton_with(
      "svc",
      Concrete::factory(|_, _| Ok(Object::new(String::from("new")))),
    );
    rebound.wait();

    handle.join().unwrap()
  });

  // The caller that started before the rebind still gets its own build...
  assert_eq!(*in_flight, "old");
  // ...but it never lands in the cache over the new binding.
  let first = container.get_as::<String>("svc").unwrap();
  let second = container.get_as::<String>("svc").unwrap();
  assert_eq!(*first, "new");
  assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_concurrent_registration_and_resolution() {
  let container = Container::with_registry(registry());
  container.singleton("AppConfig");

  thread::scope(|s| {
    for i in 0..10_usize {
      let container = &container;
      s.spawn(move || {
        container.instance(format!("thread_service_{}", i), Object::new(i));

        for _ in 0..100 {
          let config = container.get_as::<AppConfig>("AppConfig").unwrap();
          assert_eq!(config.database_url, "postgres://localhost/app");
        }

        let mine = container
          .get_as::<usize>(&format!("thread_service_{}", i))
          .unwrap();
        assert_eq!(*mine, i);
      });
    }
  });

  assert_eq!(*container.get_as::<usize>("thread_service_5").unwrap(), 5);
}

#[test]
fn test_containers_sharing_a_registry_are_isolated() {
  let registry = Arc::new(registry());
  let first = Container::with_registry(Arc::clone(&registry));
  let second = Container::with_registry(registry);

  first.singleton("AppConfig");
  let from_first = first.get("AppConfig").unwrap();

  assert!(second.registry().contains("AppConfig"));
  assert!(!second.has("AppConfig"));
  assert!(!from_first.ptr_eq(&second.get("AppConfig").unwrap()));
}

#[test]
fn test_hand_built_type_info() {
  let mut registry = registry();
  registry.insert(TypeInfo::new(
    "ConnectionString",
    vec![
      Parameter::class("config", "AppConfig"),
      Parameter::untyped("suffix"),
    ],
    |arguments| {
      let config = arguments.take::<AppConfig>()?;
      let suffix: String = arguments.take_value()?;
      Ok(Object::new(format!("{}{}", config.database_url, suffix)))
    },
  ));
  let container = Container::with_registry(registry);

  let value = container
    .make_as::<String>(
      "ConnectionString",
      &fibre_autowire::params! { "suffix" => String::from("?sslmode=require") },
    )
    .unwrap();
  assert_eq!(*value, "postgres://localhost/app?sslmode=require");
}

#[test]
fn test_drop_behavior_of_singletons() {
  static DROP_COUNTER: AtomicUsize = AtomicUsize::new(0);

  struct ConnectionPool;
  impl Drop for ConnectionPool {
    fn drop(&mut self) {
      DROP_COUNTER.fetch_add(1, Ordering::SeqCst);
    }
  }

  let container = Container::new();
  container.singleton_with(
    "pool",
    Concrete::factory(|_, _| Ok(Object::new(ConnectionPool))),
  );

  let pool = container.get("pool").unwrap();
  drop(pool);
  assert_eq!(DROP_COUNTER.load(Ordering::SeqCst), 0);

  drop(container);
  assert_eq!(DROP_COUNTER.load(Ordering::SeqCst), 1);
}
