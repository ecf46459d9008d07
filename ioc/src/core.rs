//! Core data structures shared by the container and the type registry.

use crate::container::Container;
use crate::error::{ContainerError, Result};
use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

thread_local! {
  // Identifiers currently being resolved on this thread, tagged with the id of
  // the container doing the resolving and whether overrides were supplied.
  // Re-entering the same frame means a cycle.
  static RESOLVING_STACK: RefCell<Vec<Frame>> = const { RefCell::new(Vec::new()) };
}

#[derive(Clone, PartialEq, Eq)]
struct Frame {
  container_id: usize,
  abstract_id: String,
  overridden: bool,
}

/// An RAII guard that detects circular dependencies.
///
/// Entering pushes `(container, identifier, overridden)` onto the thread-local
/// resolution stack and fails if that frame is already on it. A plain
/// resolution that re-enters its own identifier with overrides (or the other
/// way round) is a different frame and goes through. Dropping the guard pops
/// the entry again, so a failed resolution leaves the stack clean.
pub(crate) struct ResolutionGuard {
  frame: Frame,
}

impl ResolutionGuard {
  pub(crate) fn enter(container_id: usize, abstract_id: &str, overridden: bool) -> Result<Self> {
    let frame = Frame {
      container_id,
      abstract_id: abstract_id.to_owned(),
      overridden,
    };

    RESOLVING_STACK.with(|stack| {
      let mut stack = stack.borrow_mut();

      if let Some(start) = stack.iter().position(|entry| *entry == frame) {
        let mut chain: Vec<String> = stack[start..]
          .iter()
          .filter(|entry| entry.container_id == container_id)
          .map(|entry| entry.abstract_id.clone())
          .collect();
        chain.push(abstract_id.to_owned());
        return Err(ContainerError::CircularDependency {
          abstract_id: abstract_id.to_owned(),
          chain,
        });
      }

      stack.push(frame.clone());
      Ok(Self { frame })
    })
  }
}

impl Drop for ResolutionGuard {
  fn drop(&mut self) {
    RESOLVING_STACK.with(|stack| {
      let mut stack = stack.borrow_mut();
      if let Some(index) = stack.iter().rposition(|entry| *entry == self.frame) {
        stack.remove(index);
      }
    });
  }
}

/// A type-erased, cheaply clonable handle to a resolved service.
///
/// The payload is always an `Arc<T>` (with `T` possibly unsized), which lets the
/// container hold concrete structs and trait objects such as `Arc<dyn Logger>`
/// side by side and hand them back with [`Object::downcast`].
#[derive(Clone)]
pub struct Object(Arc<dyn Any + Send + Sync>);

impl Object {
  /// Wraps an owned value.
  pub fn new<T: Any + Send + Sync>(value: T) -> Self {
    Self::from_arc(Arc::new(value))
  }

  /// Wraps an existing `Arc`, including trait objects.
  pub fn from_arc<T: ?Sized + Any + Send + Sync>(value: Arc<T>) -> Self {
    Object(Arc::new(value))
  }

  /// Returns the wrapped `Arc<T>` if this object holds a `T`.
  pub fn downcast<T: ?Sized + Any + Send + Sync>(&self) -> Option<Arc<T>> {
    self.0.downcast_ref::<Arc<T>>().cloned()
  }

  pub fn is<T: ?Sized + Any + Send + Sync>(&self) -> bool {
    self.0.is::<Arc<T>>()
  }

  /// Returns `true` if both handles refer to the same stored object.
  pub fn ptr_eq(&self, other: &Object) -> bool {
    Arc::ptr_eq(&self.0, &other.0)
  }
}

impl<T: ?Sized + Any + Send + Sync> From<Arc<T>> for Object {
  fn from(value: Arc<T>) -> Self {
    Object::from_arc(value)
  }
}

impl fmt::Debug for Object {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Object").finish_non_exhaustive()
  }
}

/// Caller-supplied constructor arguments, keyed by parameter name.
///
/// Values are used verbatim for the matching constructor parameter. An empty
/// map behaves exactly like passing no overrides at all.
#[derive(Clone, Default)]
pub struct Parameters {
  values: HashMap<String, Object>,
}

impl Parameters {
  pub fn new() -> Self {
    Self::default()
  }

  /// Adds an override, builder style.
  pub fn with<T: Any + Send + Sync>(mut self, name: impl Into<String>, value: T) -> Self {
    self.insert(name, value);
    self
  }

  pub fn with_object(mut self, name: impl Into<String>, object: Object) -> Self {
    self.insert_object(name, object);
    self
  }

  pub fn insert<T: Any + Send + Sync>(&mut self, name: impl Into<String>, value: T) {
    self.insert_object(name, Object::new(value));
  }

  pub fn insert_object(&mut self, name: impl Into<String>, object: Object) {
    self.values.insert(name.into(), object);
  }

  pub fn get(&self, name: &str) -> Option<&Object> {
    self.values.get(name)
  }

  pub fn contains(&self, name: &str) -> bool {
    self.values.contains_key(name)
  }

  pub fn len(&self) -> usize {
    self.values.len()
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }
}

impl fmt::Debug for Parameters {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut names: Vec<&str> = self.values.keys().map(String::as_str).collect();
    names.sort_unstable();
    f.debug_struct("Parameters").field("names", &names).finish()
  }
}

/// A factory closure bound to an identifier.
pub type Factory = Arc<dyn Fn(&Container, &Parameters) -> Result<Object> + Send + Sync>;

/// How a bound identifier gets built.
#[derive(Clone)]
pub enum Concrete {
  /// Invoked with the container and the override parameters; its return value
  /// is used as-is.
  Factory(Factory),
  /// The name of a type in the container's registry, built by constructor
  /// injection.
  TypeName(String),
}

impl Concrete {
  pub fn factory<F>(factory: F) -> Self
  where
    F: Fn(&Container, &Parameters) -> Result<Object> + Send + Sync + 'static,
  {
    Concrete::Factory(Arc::new(factory))
  }

  pub fn type_name(name: impl Into<String>) -> Self {
    Concrete::TypeName(name.into())
  }
}

impl From<&str> for Concrete {
  fn from(name: &str) -> Self {
    Concrete::TypeName(name.to_owned())
  }
}

impl From<String> for Concrete {
  fn from(name: String) -> Self {
    Concrete::TypeName(name)
  }
}

impl fmt::Debug for Concrete {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Concrete::Factory(_) => f.write_str("Factory(..)"),
      Concrete::TypeName(name) => f.debug_tuple("TypeName").field(name).finish(),
    }
  }
}

/// A registered binding. Replaced wholesale on re-registration, never mutated.
pub(crate) struct Binding {
  pub(crate) concrete: Concrete,
  pub(crate) shared: bool,
  // Gates the first construction of a shared binding so concurrent callers
  // build it once. A rebind creates a fresh binding and therefore a fresh cell.
  pub(crate) slot: once_cell::sync::OnceCell<Object>,
}

impl Binding {
  pub(crate) fn new(concrete: Concrete, shared: bool) -> Self {
    Self {
      concrete,
      shared,
      slot: once_cell::sync::OnceCell::new(),
    }
  }
}
