//! Error types for container resolution and manifest loading.

use std::path::PathBuf;
use thiserror::Error;

/// Failures raised while resolving a service.
///
/// None of these are retried or recovered inside the container. A failed
/// resolution caches nothing and returns the error to the caller.
#[derive(Debug, Error)]
pub enum ContainerError {
  #[error("Target [{abstract_id}] is not buildable: no factory is bound and no type with that name is registered")]
  NotBuildable { abstract_id: String },

  #[error("Unresolvable dependency resolving parameter [{parameter}] of [{type_name}]")]
  UnresolvableParameter { type_name: String, parameter: String },

  #[error("Circular dependency detected while resolving [{abstract_id}]: {}", .chain.join(" -> "))]
  CircularDependency {
    abstract_id: String,
    chain: Vec<String>,
  },

  #[error("Argument [{parameter}] of [{type_name}] is not a `{expected}`")]
  ArgumentType {
    type_name: String,
    parameter: String,
    expected: &'static str,
  },

  #[error("Constructor of [{type_name}] requested argument #{position}, which was never declared")]
  MissingArgument { type_name: String, position: usize },

  #[error("Service [{abstract_id}] resolved to a value that is not a `{expected}`")]
  TypeMismatch {
    abstract_id: String,
    expected: &'static str,
  },

  #[error("Factory failed: {0}")]
  Factory(String),
}

impl ContainerError {
  /// Wraps a failure raised by user factory code.
  pub fn factory(message: impl Into<String>) -> Self {
    ContainerError::Factory(message.into())
  }
}

/// Failures raised while loading or validating a binding manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
  #[error("Failed to read manifest file: {0}")]
  Read(#[from] std::io::Error),

  #[error("Failed to parse manifest: {0}")]
  Parse(String),

  #[error("Unsupported manifest version {0}, expected 1")]
  UnsupportedVersion(u32),

  #[error("Cannot infer manifest format from path {0:?}; use .yaml, .yml or .json")]
  UnknownFormat(PathBuf),

  #[error("Identifier '{0}' is declared as both transient and singleton")]
  DuplicateBinding(String),
}

/// A specialized `Result` type for container operations.
pub type Result<T, E = ContainerError> = std::result::Result<T, E>;
