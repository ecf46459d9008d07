//! Declarative binding manifests loaded from YAML or JSON.
//!
//! A manifest lists the transient and singleton bindings of an application so
//! they can live in configuration instead of code:
//!
//! ```yaml
//! version: 1
//! singleton:
//!   Logger: FileLogger   # interface -> registered type
//!   Clock: ~             # self-binding
//! transient:
//!   Mailer: ~
//! ```
//!
//! Only type-name bindings can be expressed; factories are still registered in
//! code.

use crate::container::Container;
use crate::core::Concrete;
use crate::error::ManifestError;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

const SUPPORTED_VERSION: u32 = 1;

fn default_version() -> u32 {
  SUPPORTED_VERSION
}

/// Bindings read from a manifest document.
///
/// Keys are abstract identifiers. A `null` value binds the identifier to
/// itself; a string binds it to that registered type name.
#[derive(Debug, Deserialize, PartialEq, Eq, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct BindingManifest {
  #[serde(default = "default_version")]
  pub version: u32,
  #[serde(default)]
  pub transient: BTreeMap<String, Option<String>>,
  #[serde(default)]
  pub singleton: BTreeMap<String, Option<String>>,
}

impl BindingManifest {
  pub fn from_yaml_str(source: &str) -> Result<Self, ManifestError> {
    let manifest: Self =
      serde_yaml::from_str(source).map_err(|e| ManifestError::Parse(e.to_string()))?;
    manifest.validate()?;
    Ok(manifest)
  }

  pub fn from_json_str(source: &str) -> Result<Self, ManifestError> {
    let manifest: Self =
      serde_json::from_str(source).map_err(|e| ManifestError::Parse(e.to_string()))?;
    manifest.validate()?;
    Ok(manifest)
  }

  /// Loads a manifest, picking the format from the file extension
  /// (`.yaml`, `.yml` or `.json`).
  pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
    let path = path.as_ref();
    let extension = path
      .extension()
      .and_then(|extension| extension.to_str())
      .map(str::to_ascii_lowercase);

    match extension.as_deref() {
      Some("yaml") | Some("yml") => Self::from_yaml_str(&fs::read_to_string(path)?),
      Some("json") => Self::from_json_str(&fs::read_to_string(path)?),
      _ => Err(ManifestError::UnknownFormat(path.to_path_buf())),
    }
  }

  fn validate(&self) -> Result<(), ManifestError> {
    if self.version != SUPPORTED_VERSION {
      return Err(ManifestError::UnsupportedVersion(self.version));
    }
    if let Some(duplicate) = self
      .transient
      .keys()
      .find(|abstract_id| self.singleton.contains_key(*abstract_id))
    {
      return Err(ManifestError::DuplicateBinding(duplicate.clone()));
    }
    Ok(())
  }

  /// Number of bindings the manifest declares.
  pub fn len(&self) -> usize {
    self.transient.len() + self.singleton.len()
  }

  pub fn is_empty(&self) -> bool {
    self.transient.is_empty() && self.singleton.is_empty()
  }

  /// Registers every binding on `container`, transients first.
  pub fn apply(&self, container: &Container) {
    tracing::debug!(
      target: "fibre_autowire",
      transient = self.transient.len(),
      singleton = self.singleton.len(),
      "applying binding manifest"
    );
    for (abstract_id, concrete) in &self.transient {
      match concrete {
        Some(concrete) => {
          container.transient_with(abstract_id.as_str(), Concrete::type_name(concrete.as_str()))
        }
        None => container.transient(abstract_id.as_str()),
      }
    }
    for (abstract_id, concrete) in &self.singleton {
      match concrete {
        Some(concrete) => {
          container.singleton_with(abstract_id.as_str(), Concrete::type_name(concrete.as_str()))
        }
        None => container.singleton(abstract_id.as_str()),
      }
    }
  }
}
