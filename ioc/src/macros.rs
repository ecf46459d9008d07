//! Public macros for building override parameters and resolving services.

/// Builds a [`Parameters`](crate::Parameters) map from `name => value` pairs.
///
/// # Examples
///
/// ```
/// use fibre_autowire::params;
///
/// let parameters = params! {
///   "host" => String::from("localhost"),
///   "port" => 5432_u16,
/// };
/// assert_eq!(parameters.len(), 2);
/// ```
#[macro_export]
macro_rules! params {
    () => {
        $crate::Parameters::new()
    };

    ($($name:expr => $value:expr),+ $(,)?) => {
        $crate::Parameters::new()
            $(.with($name, $value))+
    };
}

/// Resolves a service from a container and downcasts it.
///
/// # Panics
///
/// Panics with the container error if the service cannot be resolved or is not
/// of the requested type. For a non-panicking version, use
/// [`maybe_resolve!`] or `Container::get_as`.
///
/// # Examples
///
/// ```
/// use fibre_autowire::{resolve, Concrete, Container, Object};
///
/// trait Greeter: Send + Sync { fn greet(&self) -> String; }
/// struct EnglishGreeter;
/// impl Greeter for EnglishGreeter { fn greet(&self) -> String { "Hello!".to_string() } }
///
/// let container = Container::new();
/// container.instance("app.name", Object::new(String::from("demo")));
/// container.singleton_with(
///   "greeter",
///   Concrete::factory(|_, _| {
///     let greeter: std::sync::Arc<dyn Greeter> = std::sync::Arc::new(EnglishGreeter);
///     Ok(Object::from_arc(greeter))
///   }),
/// );
///
/// let name = resolve!(container, String, "app.name");
/// assert_eq!(*name, "demo");
///
/// let greeter = resolve!(container, trait Greeter, "greeter");
/// assert_eq!(greeter.greet(), "Hello!");
/// ```
#[macro_export]
macro_rules! resolve {
    // Arm for resolving a trait object: resolve!(container, trait MyTrait, "id")
    ($container:expr, trait $trait_ident:ident, $id:expr) => {
        $container
            .get_as::<dyn $trait_ident>($id)
            .unwrap_or_else(|error| {
                panic!(
                    "Failed to resolve required trait service '{}': {}",
                    $id,
                    error
                )
            })
    };

    // Arm for resolving a concrete type: resolve!(container, MyService, "id")
    ($container:expr, $type:ty, $id:expr) => {
        $container
            .get_as::<$type>($id)
            .unwrap_or_else(|error| {
                panic!(
                    "Failed to resolve required service '{}': {}",
                    $id,
                    error
                )
            })
    };
}

/// Like [`resolve!`], but returns `None` instead of panicking.
#[macro_export]
macro_rules! maybe_resolve {
    ($container:expr, trait $trait_ident:ident, $id:expr) => {
        $container.get_as::<dyn $trait_ident>($id).ok()
    };

    ($container:expr, $type:ty, $id:expr) => {
        $container.get_as::<$type>($id).ok()
    };
}
