//! # Fibre Autowire
//!
//! An auto-wiring dependency injection container for Rust.
//!
//! Services are bound to string identifiers (an interface name, a type name or
//! any symbolic key) and resolved on demand. Types described in a
//! [`TypeRegistry`] are built by constructor injection: each declared
//! parameter is resolved through the container, recursively, so whole object
//! graphs come out of a single `get`.
//!
//! ## Core Concepts
//!
//! - **Container**: holds bindings and the cache of shared instances.
//! - **Bindings**: `transient` builds on every resolution, `singleton` builds
//!   once and caches, `instance` stores a pre-built object.
//! - **Concrete**: a binding's construction strategy, either a factory closure
//!   or the name of a registered type.
//! - **Type registry**: constructor metadata per type, supplied through the
//!   [`Reflect`] trait or a hand-built [`TypeInfo`].
//! - **Parameters**: per-call constructor overrides that bypass the cache.
//!
//! ## Quick Start
//!
//! ```
//! use fibre_autowire::{params, Arguments, Container, Parameter, Reflect, Result, TypeRegistry};
//! use std::sync::Arc;
//!
//! trait Logger: Send + Sync {
//!   fn log(&self, message: &str) -> String;
//! }
//!
//! struct ConsoleLogger;
//! impl Logger for ConsoleLogger {
//!   fn log(&self, message: &str) -> String {
//!     format!("[console] {}", message)
//!   }
//! }
//! impl Reflect for ConsoleLogger {
//!   const TYPE_NAME: &'static str = "ConsoleLogger";
//!   fn construct(_: &mut Arguments) -> Result<Self> {
//!     Ok(ConsoleLogger)
//!   }
//! }
//!
//! struct ReportService {
//!   logger: Arc<dyn Logger>,
//!   title: String,
//! }
//! impl Reflect for ReportService {
//!   const TYPE_NAME: &'static str = "ReportService";
//!   fn parameters() -> Vec<Parameter> {
//!     vec![
//!       Parameter::class("logger", "Logger"),
//!       Parameter::builtin::<String>("title"),
//!     ]
//!   }
//!   fn construct(arguments: &mut Arguments) -> Result<Self> {
//!     Ok(ReportService {
//!       logger: arguments.take()?,
//!       title: arguments.take_value()?,
//!     })
//!   }
//! }
//!
//! let mut registry = TypeRegistry::new();
//! registry
//!   .register::<ConsoleLogger>()
//!   .implements::<dyn Logger>("Logger", |logger| logger as Arc<dyn Logger>);
//! registry.register::<ReportService>();
//!
//! let container = Container::with_registry(registry);
//! container.singleton_with("Logger", "ConsoleLogger");
//!
//! let report = container
//!   .make_as::<ReportService>("ReportService", &params! { "title" => String::from("Q3") })
//!   .unwrap();
//! assert_eq!(report.logger.log(&report.title), "[console] Q3");
//! ```

mod container;
mod core;
mod error;
mod macros;
#[cfg(feature = "manifest")]
mod manifest;
mod reflection;

pub use crate::core::{Concrete, Factory, Object, Parameters};
pub use container::Container;
pub use error::{ContainerError, ManifestError, Result};
#[cfg(feature = "manifest")]
pub use manifest::BindingManifest;
pub use reflection::{Arguments, ParamType, Parameter, Reflect, Registration, TypeInfo, TypeRegistry};
