//! The main `Container` struct and its associated methods.

use crate::core::{Binding, Concrete, Object, Parameters, ResolutionGuard};
use crate::error::{ContainerError, Result};
use crate::reflection::{ParamType, Parameter, TypeInfo, TypeRegistry};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::any::{type_name, Any};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// Distinguishes containers on the thread-local resolution stack.
static NEXT_CONTAINER_ID: AtomicUsize = AtomicUsize::new(0);

/// The auto-wiring dependency injection container.
///
/// Holds string-keyed bindings and a cache of shared instances. Anything not
/// bound explicitly is built from the [`TypeRegistry`] by name, with its
/// constructor parameters resolved recursively through the container.
///
/// The container is thread-safe; registration and resolution only need `&self`.
pub struct Container {
  id: usize,
  registry: Arc<TypeRegistry>,
  bindings: DashMap<String, Arc<Binding>>,
  instances: DashMap<String, Object>,
}

impl Container {
  /// Creates an empty container with an empty type registry. Only factory
  /// bindings and explicit instances can be resolved from it.
  pub fn new() -> Self {
    Self::with_registry(TypeRegistry::new())
  }

  /// Creates an empty container that builds types from `registry`.
  pub fn with_registry(registry: impl Into<Arc<TypeRegistry>>) -> Self {
    Self {
      id: NEXT_CONTAINER_ID.fetch_add(1, Ordering::Relaxed),
      registry: registry.into(),
      bindings: DashMap::new(),
      instances: DashMap::new(),
    }
  }

  pub fn registry(&self) -> &TypeRegistry {
    &self.registry
  }

  // --- PRIVATE HELPERS ---

  fn bind_internal(&self, abstract_id: String, concrete: Concrete, shared: bool) {
    tracing::debug!(
      target: "fibre_autowire",
      abstract_id = %abstract_id,
      concrete = ?concrete,
      shared,
      "registering binding"
    );
    // Install first, then evict: a build racing with this call either stores
    // before the eviction or sees the new binding and skips the cache.
    self
      .bindings
      .insert(abstract_id.clone(), Arc::new(Binding::new(concrete, shared)));
    if self.instances.remove(&abstract_id).is_some() {
      tracing::trace!(target: "fibre_autowire", abstract_id = %abstract_id, "dropped cached instance");
    }
  }

  // Whether `binding` is still what `abstract_id` is bound to.
  fn is_current(&self, abstract_id: &str, binding: Option<&Arc<Binding>>) -> bool {
    match (binding, self.bindings.get(abstract_id)) {
      (Some(binding), Some(current)) => Arc::ptr_eq(binding, current.value()),
      (None, None) => true,
      _ => false,
    }
  }

  fn resolve(&self, abstract_id: &str, parameters: &Parameters) -> Result<Object> {
    let overridden = !parameters.is_empty();

    if !overridden {
      if let Some(instance) = self.instances.get(abstract_id) {
        tracing::trace!(target: "fibre_autowire", abstract_id, "resolved from instance cache");
        return Ok(instance.value().clone());
      }
    }

    let _guard = ResolutionGuard::enter(self.id, abstract_id, overridden)?;

    // Clone the binding out so no map guard is held while user code runs.
    let binding = self
      .bindings
      .get(abstract_id)
      .map(|entry| Arc::clone(entry.value()));
    let concrete = match &binding {
      Some(binding) => binding.concrete.clone(),
      None => Concrete::TypeName(abstract_id.to_owned()),
    };
    let shared_binding = binding.as_ref().is_some_and(|binding| binding.shared);

    let object = match &binding {
      Some(binding) if shared_binding && !overridden => binding
        .slot
        .get_or_try_init(|| self.build(abstract_id, &concrete, parameters))?
        .clone(),
      _ => self.build(abstract_id, &concrete, parameters)?,
    };

    if !overridden && (shared_binding || self.instances.contains_key(abstract_id)) {
      match self.instances.entry(abstract_id.to_owned()) {
        Entry::Occupied(stored) => return Ok(stored.get().clone()),
        Entry::Vacant(slot) => {
          if self.is_current(abstract_id, binding.as_ref()) {
            slot.insert(object.clone());
          } else {
            tracing::trace!(
              target: "fibre_autowire",
              abstract_id,
              "rebound during construction, result not cached"
            );
          }
        }
      }
    }

    Ok(object)
  }

  fn build(&self, abstract_id: &str, concrete: &Concrete, parameters: &Parameters) -> Result<Object> {
    match concrete {
      Concrete::Factory(factory) => {
        tracing::debug!(target: "fibre_autowire", abstract_id, "invoking factory");
        factory(self, parameters)
      }
      Concrete::TypeName(name) => {
        let Some(info) = self.registry.get(name) else {
          tracing::debug!(
            target: "fibre_autowire",
            abstract_id,
            type_name = %name,
            "target is not buildable"
          );
          return Err(ContainerError::NotBuildable {
            abstract_id: abstract_id.to_owned(),
          });
        };

        tracing::debug!(
          target: "fibre_autowire",
          abstract_id,
          type_name = %name,
          parameters = info.parameters().len(),
          "building type"
        );
        let arguments = self.resolve_dependencies(info, parameters)?;
        let object = info.instantiate(arguments)?;

        if name != abstract_id {
          return Ok(info.view_as(abstract_id, object));
        }
        Ok(object)
      }
    }
  }

  fn resolve_dependencies(
    &self,
    info: &TypeInfo,
    parameters: &Parameters,
  ) -> Result<Vec<(String, Object)>> {
    let mut arguments = Vec::with_capacity(info.parameters().len());

    for parameter in info.parameters() {
      let value = match parameters.get(parameter.name()) {
        Some(value) => value.clone(),
        None => match parameter.kind() {
          ParamType::Untyped | ParamType::Builtin(_) => Self::resolve_untyped(info, parameter)?,
          ParamType::Class(class) => self.resolve_class(info, parameter, class)?,
        },
      };
      arguments.push((parameter.name().to_owned(), value));
    }

    Ok(arguments)
  }

  fn resolve_class(&self, info: &TypeInfo, parameter: &Parameter, class: &str) -> Result<Object> {
    if self.has(class) {
      return self.get(class);
    }
    if self.registry.contains(class) {
      return self.make(class);
    }
    // Neither bound nor buildable: fall back to the declared default.
    Self::resolve_untyped(info, parameter)
  }

  fn resolve_untyped(info: &TypeInfo, parameter: &Parameter) -> Result<Object> {
    match parameter.default_value() {
      Some(default) => Ok(default.clone()),
      None => Err(ContainerError::UnresolvableParameter {
        type_name: info.name().to_owned(),
        parameter: parameter.name().to_owned(),
      }),
    }
  }

  // --- PUBLIC API ---

  // --- Transient Registration ---

  /// Binds `abstract_id` to itself; every resolution builds a new instance.
  pub fn transient(&self, abstract_id: impl Into<String>) {
    let abstract_id = abstract_id.into();
    let concrete = Concrete::TypeName(abstract_id.clone());
    self.bind_internal(abstract_id, concrete, false);
  }

  /// Binds `abstract_id` to a factory or type name; every resolution builds a
  /// new instance.
  pub fn transient_with(&self, abstract_id: impl Into<String>, concrete: impl Into<Concrete>) {
    self.bind_internal(abstract_id.into(), concrete.into(), false);
  }

  // --- Singleton Registration ---

  /// Binds `abstract_id` to itself; the first resolution is cached and reused.
  pub fn singleton(&self, abstract_id: impl Into<String>) {
    let abstract_id = abstract_id.into();
    let concrete = Concrete::TypeName(abstract_id.clone());
    self.bind_internal(abstract_id, concrete, true);
  }

  /// Binds `abstract_id` to a factory or type name; the first resolution is
  /// cached and reused.
  pub fn singleton_with(&self, abstract_id: impl Into<String>, concrete: impl Into<Concrete>) {
    self.bind_internal(abstract_id.into(), concrete.into(), true);
  }

  // --- Instance Registration ---

  /// Stores a pre-built object under `abstract_id`. The binding table is left
  /// alone; the instance is served until `abstract_id` is rebound.
  pub fn instance(&self, abstract_id: impl Into<String>, instance: impl Into<Object>) {
    let abstract_id = abstract_id.into();
    tracing::debug!(target: "fibre_autowire", abstract_id = %abstract_id, "registering instance");
    self.instances.insert(abstract_id, instance.into());
  }

  // --- Queries ---

  /// Returns `true` if `abstract_id` is bound or has a cached instance.
  pub fn has(&self, abstract_id: &str) -> bool {
    self.bound(abstract_id) || self.instances.contains_key(abstract_id)
  }

  /// Returns `true` if `abstract_id` has a binding. Cached instances are not
  /// considered.
  pub fn bound(&self, abstract_id: &str) -> bool {
    self.bindings.contains_key(abstract_id)
  }

  // --- Resolution ---

  /// Resolves `abstract_id`.
  pub fn get(&self, abstract_id: &str) -> Result<Object> {
    self.resolve(abstract_id, &Parameters::default())
  }

  /// Resolves `abstract_id`. Same as [`Container::get`].
  pub fn make(&self, abstract_id: &str) -> Result<Object> {
    self.resolve(abstract_id, &Parameters::default())
  }

  /// Builds `abstract_id` with constructor overrides.
  ///
  /// Non-empty overrides always force a fresh construction: the instance cache
  /// is neither read nor written.
  pub fn make_with(&self, abstract_id: &str, parameters: &Parameters) -> Result<Object> {
    self.resolve(abstract_id, parameters)
  }

  /// Resolves `abstract_id` and downcasts it to `T`.
  pub fn get_as<T: ?Sized + Any + Send + Sync>(&self, abstract_id: &str) -> Result<Arc<T>> {
    let object = self.get(abstract_id)?;
    Self::downcast_resolved(abstract_id, object)
  }

  /// Builds `abstract_id` with overrides and downcasts it to `T`.
  pub fn make_as<T: ?Sized + Any + Send + Sync>(
    &self,
    abstract_id: &str,
    parameters: &Parameters,
  ) -> Result<Arc<T>> {
    let object = self.make_with(abstract_id, parameters)?;
    Self::downcast_resolved(abstract_id, object)
  }

  fn downcast_resolved<T: ?Sized + Any + Send + Sync>(
    abstract_id: &str,
    object: Object,
  ) -> Result<Arc<T>> {
    object
      .downcast::<T>()
      .ok_or_else(|| ContainerError::TypeMismatch {
        abstract_id: abstract_id.to_owned(),
        expected: type_name::<T>(),
      })
  }
}

impl Default for Container {
  fn default() -> Self {
    Self::new()
  }
}

impl fmt::Debug for Container {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Container")
      .field("id", &self.id)
      .field("bindings", &self.bindings.len())
      .field("instances", &self.instances.len())
      .field("registered_types", &self.registry.len())
      .finish()
  }
}
