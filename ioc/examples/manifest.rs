use fibre_autowire::{resolve, Arguments, BindingManifest, Container, Reflect, Result, TypeRegistry};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

trait Notifier: Send + Sync {
  fn notify(&self, message: &str) -> String;
}

struct EmailNotifier;

impl Notifier for EmailNotifier {
  fn notify(&self, message: &str) -> String {
    format!("Sending email: '{}'", message)
  }
}

impl Reflect for EmailNotifier {
  const TYPE_NAME: &'static str = "EmailNotifier";

  fn construct(_: &mut Arguments) -> Result<Self> {
    Ok(EmailNotifier)
  }
}

struct SmsNotifier;

impl Notifier for SmsNotifier {
  fn notify(&self, message: &str) -> String {
    format!("Sending SMS: '{}'", message)
  }
}

impl Reflect for SmsNotifier {
  const TYPE_NAME: &'static str = "SmsNotifier";

  fn construct(_: &mut Arguments) -> Result<Self> {
    Ok(SmsNotifier)
  }
}

const BINDINGS: &str = r#"
version: 1
singleton:
  notifier.primary: EmailNotifier
transient:
  notifier.fallback: SmsNotifier
"#;

fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::new("fibre_autowire=debug"))
    .init();

  let mut registry = TypeRegistry::new();
  registry
    .register::<EmailNotifier>()
    .implements::<dyn Notifier>("notifier.primary", |n| n as Arc<dyn Notifier>);
  registry
    .register::<SmsNotifier>()
    .implements::<dyn Notifier>("notifier.fallback", |n| n as Arc<dyn Notifier>);
  let container = Container::with_registry(registry);

  // Bindings come from configuration rather than code.
  let manifest = match BindingManifest::from_yaml_str(BINDINGS) {
    Ok(manifest) => manifest,
    Err(error) => {
      eprintln!("invalid manifest: {}", error);
      return;
    }
  };
  manifest.apply(&container);

  let primary = resolve!(container, trait Notifier, "notifier.primary");
  let fallback = resolve!(container, trait Notifier, "notifier.fallback");

  println!("{}", primary.notify("Hello from Fibre!"));
  println!("{}", fallback.notify("Hello from Fibre!"));
}
