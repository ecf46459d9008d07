//! The type registry the container consults in place of runtime reflection.
//!
//! Each registered type describes its constructor: the ordered parameter list
//! (name, declared type, optional default) and a closure that instantiates the
//! type from a positional [`Arguments`] list. Types opt in through [`Reflect`]
//! or through a hand-built [`TypeInfo`].

use crate::core::Object;
use crate::error::{ContainerError, Result};
use std::any::{type_name, Any};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Constructor metadata for a type the container may build on its own.
///
/// # Examples
///
/// ```
/// use fibre_autowire::{Arguments, Container, Parameter, Reflect, Result, TypeRegistry};
/// use std::sync::Arc;
///
/// struct Clock;
/// impl Reflect for Clock {
///   const TYPE_NAME: &'static str = "Clock";
///   fn construct(_: &mut Arguments) -> Result<Self> {
///     Ok(Clock)
///   }
/// }
///
/// struct Scheduler {
///   clock: Arc<Clock>,
///   workers: usize,
/// }
/// impl Reflect for Scheduler {
///   const TYPE_NAME: &'static str = "Scheduler";
///   fn parameters() -> Vec<Parameter> {
///     vec![
///       Parameter::class("clock", "Clock"),
///       Parameter::builtin::<usize>("workers").with_default(4_usize),
///     ]
///   }
///   fn construct(arguments: &mut Arguments) -> Result<Self> {
///     Ok(Scheduler {
///       clock: arguments.take()?,
///       workers: arguments.take_value()?,
///     })
///   }
/// }
///
/// let mut registry = TypeRegistry::new();
/// registry.register::<Clock>();
/// registry.register::<Scheduler>();
///
/// let container = Container::with_registry(registry);
/// let scheduler = container.get_as::<Scheduler>("Scheduler").unwrap();
/// assert_eq!(scheduler.workers, 4);
/// ```
pub trait Reflect: Any + Send + Sync + Sized {
  /// The identifier this type is registered and resolved under.
  const TYPE_NAME: &'static str;

  /// Constructor parameters in declaration order. Types without a constructor
  /// keep the default, empty list.
  fn parameters() -> Vec<Parameter> {
    Vec::new()
  }

  /// Builds the value from arguments laid out in the order of [`Reflect::parameters`].
  fn construct(arguments: &mut Arguments) -> Result<Self>;
}

/// The declared type of a constructor parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamType {
  /// No declared type.
  Untyped,
  /// A built-in scalar such as `u16` or `String`. The container never builds these.
  Builtin(&'static str),
  /// A named class or interface, resolved through the container.
  Class(String),
}

/// One constructor parameter.
#[derive(Clone)]
pub struct Parameter {
  name: String,
  kind: ParamType,
  default: Option<Object>,
}

impl Parameter {
  pub fn untyped(name: impl Into<String>) -> Self {
    Self::new(name, ParamType::Untyped)
  }

  pub fn builtin<T: ?Sized>(name: impl Into<String>) -> Self {
    Self::new(name, ParamType::Builtin(type_name::<T>()))
  }

  pub fn class(name: impl Into<String>, class: impl Into<String>) -> Self {
    Self::new(name, ParamType::Class(class.into()))
  }

  fn new(name: impl Into<String>, kind: ParamType) -> Self {
    Self {
      name: name.into(),
      kind,
      default: None,
    }
  }

  pub fn with_default<T: Any + Send + Sync>(self, value: T) -> Self {
    self.with_default_object(Object::new(value))
  }

  pub fn with_default_object(mut self, value: Object) -> Self {
    self.default = Some(value);
    self
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn kind(&self) -> &ParamType {
    &self.kind
  }

  pub fn default_value(&self) -> Option<&Object> {
    self.default.as_ref()
  }

  pub fn has_default(&self) -> bool {
    self.default.is_some()
  }
}

impl fmt::Debug for Parameter {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Parameter")
      .field("name", &self.name)
      .field("kind", &self.kind)
      .field("has_default", &self.default.is_some())
      .finish()
  }
}

/// Positional constructor arguments, consumed front to back.
pub struct Arguments {
  type_name: String,
  values: std::vec::IntoIter<(String, Object)>,
  position: usize,
}

impl Arguments {
  pub(crate) fn new(type_name: &str, values: Vec<(String, Object)>) -> Self {
    Self {
      type_name: type_name.to_owned(),
      values: values.into_iter(),
      position: 0,
    }
  }

  /// Number of arguments not yet taken.
  pub fn len(&self) -> usize {
    self.values.len()
  }

  pub fn is_empty(&self) -> bool {
    self.values.len() == 0
  }

  /// Takes the next argument without checking its type.
  pub fn take_object(&mut self) -> Result<Object> {
    self.next_entry().map(|(_, object)| object)
  }

  /// Takes the next argument as a shared `Arc<T>`. Works for trait objects.
  pub fn take<T: ?Sized + Any + Send + Sync>(&mut self) -> Result<Arc<T>> {
    let (parameter, object) = self.next_entry()?;
    object
      .downcast::<T>()
      .ok_or_else(|| ContainerError::ArgumentType {
        type_name: self.type_name.clone(),
        parameter,
        expected: type_name::<T>(),
      })
  }

  /// Takes the next argument by value, cloning it out of its shared handle.
  pub fn take_value<T: Any + Send + Sync + Clone>(&mut self) -> Result<T> {
    self.take::<T>().map(|value| (*value).clone())
  }

  fn next_entry(&mut self) -> Result<(String, Object)> {
    let position = self.position;
    self.position += 1;
    self
      .values
      .next()
      .ok_or_else(|| ContainerError::MissingArgument {
        type_name: self.type_name.clone(),
        position,
      })
  }
}

type Constructor = Arc<dyn Fn(&mut Arguments) -> Result<Object> + Send + Sync>;
type View = Arc<dyn Fn(&Object) -> Option<Object> + Send + Sync>;

/// Everything the container knows about one buildable type.
#[derive(Clone)]
pub struct TypeInfo {
  name: String,
  parameters: Vec<Parameter>,
  constructor: Constructor,
  views: HashMap<String, View>,
}

impl TypeInfo {
  /// Describes a type by hand. `constructor` receives arguments in the order of
  /// `parameters`.
  pub fn new<F>(name: impl Into<String>, parameters: Vec<Parameter>, constructor: F) -> Self
  where
    F: Fn(&mut Arguments) -> Result<Object> + Send + Sync + 'static,
  {
    Self {
      name: name.into(),
      parameters,
      constructor: Arc::new(constructor),
      views: HashMap::new(),
    }
  }

  pub fn of<T: Reflect>() -> Self {
    Self::new(T::TYPE_NAME, T::parameters(), |arguments| {
      T::construct(arguments).map(Object::new)
    })
  }

  /// Declares that values of this type can be served as `interface` by
  /// converting them with `view`.
  pub fn with_view<F>(mut self, interface: impl Into<String>, view: F) -> Self
  where
    F: Fn(&Object) -> Option<Object> + Send + Sync + 'static,
  {
    self.views.insert(interface.into(), Arc::new(view));
    self
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn parameters(&self) -> &[Parameter] {
    &self.parameters
  }

  pub fn implements(&self, interface: &str) -> bool {
    self.views.contains_key(interface)
  }

  /// Runs the constructor over an already-resolved argument list.
  pub fn instantiate(&self, values: Vec<(String, Object)>) -> Result<Object> {
    let mut arguments = Arguments::new(&self.name, values);
    (self.constructor)(&mut arguments)
  }

  /// Converts `object` to the `interface` view when one is declared; otherwise
  /// hands it back untouched.
  pub(crate) fn view_as(&self, interface: &str, object: Object) -> Object {
    match self.views.get(interface) {
      Some(view) => view(&object).unwrap_or(object),
      None => object,
    }
  }
}

impl fmt::Debug for TypeInfo {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut views: Vec<&str> = self.views.keys().map(String::as_str).collect();
    views.sort_unstable();
    f.debug_struct("TypeInfo")
      .field("name", &self.name)
      .field("parameters", &self.parameters)
      .field("views", &views)
      .finish()
  }
}

/// The set of types a container may instantiate by name.
///
/// Built up front with `&mut self`, then handed to one or more containers,
/// which only ever read it.
#[derive(Default, Clone, Debug)]
pub struct TypeRegistry {
  types: HashMap<String, TypeInfo>,
}

impl TypeRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Registers `T` under [`Reflect::TYPE_NAME`], replacing any earlier entry.
  pub fn register<T: Reflect>(&mut self) -> Registration<'_, T> {
    let info = self.insert(TypeInfo::of::<T>());
    Registration {
      info,
      _marker: PhantomData,
    }
  }

  /// Adds a hand-built entry, replacing any earlier entry with the same name.
  pub fn insert(&mut self, info: TypeInfo) -> &mut TypeInfo {
    match self.types.entry(info.name.clone()) {
      Entry::Occupied(mut entry) => {
        entry.insert(info);
        entry.into_mut()
      }
      Entry::Vacant(entry) => entry.insert(info),
    }
  }

  pub fn contains(&self, name: &str) -> bool {
    self.types.contains_key(name)
  }

  pub fn get(&self, name: &str) -> Option<&TypeInfo> {
    self.types.get(name)
  }

  pub fn len(&self) -> usize {
    self.types.len()
  }

  pub fn is_empty(&self) -> bool {
    self.types.is_empty()
  }

  /// Registered type names, sorted.
  pub fn type_names(&self) -> Vec<&str> {
    let mut names: Vec<&str> = self.types.keys().map(String::as_str).collect();
    names.sort_unstable();
    names
  }
}

/// Handle returned by [`TypeRegistry::register`] for declaring interfaces.
pub struct Registration<'a, T> {
  info: &'a mut TypeInfo,
  _marker: PhantomData<fn() -> T>,
}

impl<T: Reflect> Registration<'_, T> {
  /// Declares that `T` implements the interface registered as `interface`.
  ///
  /// When the container builds `T` for a binding whose abstract is
  /// `interface`, it hands out `upcast(value)` so consumers can take an
  /// `Arc<I>` (typically `Arc<dyn Trait>`).
  pub fn implements<I: ?Sized + Any + Send + Sync>(
    self,
    interface: impl Into<String>,
    upcast: impl Fn(Arc<T>) -> Arc<I> + Send + Sync + 'static,
  ) -> Self {
    let view: View = Arc::new(move |object: &Object| {
      object
        .downcast::<T>()
        .map(|value| Object::from_arc(upcast(value)))
    });
    self.info.views.insert(interface.into(), view);
    self
  }
}
