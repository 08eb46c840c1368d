//! Value modules loaded from configuration documents.
//!
//! A configuration document declares constant values and, optionally, an export list:
//!
//! ```yaml
//! values:
//!   database:
//!     url: postgres://localhost/app
//!     pool: 8
//!   log_level: info
//! exports: [database]
//! ```
//!
//! Every entry of `values` becomes a value provider holding a [`serde_json::Value`], so
//! nested settings are reachable with dotted names such as `"database.pool"`.

use crate::error::{Error, Result};
use crate::instance::Instance;
use crate::module::Module;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ModuleConfig {
  #[serde(default)]
  pub values: serde_json::Map<String, serde_json::Value>,
  /// Makes the resulting module private, exposing only these names.
  #[serde(default)]
  pub exports: Option<Vec<String>>,
}

impl ModuleConfig {
  pub fn from_yaml_str(text: &str) -> Result<Self> {
    serde_yaml::from_str(text).map_err(|e| Error::ConfigParse(e.to_string()))
  }

  pub fn from_json_str(text: &str) -> Result<Self> {
    serde_json::from_str(text).map_err(|e| Error::ConfigParse(e.to_string()))
  }

  /// Reads a configuration file, picking the format from its extension.
  /// Anything other than `.json` is read as YAML.
  pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    match path.extension().and_then(|ext| ext.to_str()) {
      Some("json") => Self::from_json_str(&text),
      _ => Self::from_yaml_str(&text),
    }
  }

  pub fn into_module(self) -> Module {
    let module = self
      .values
      .into_iter()
      .fold(Module::new(), |module, (name, value)| {
        module.instance(name, Instance::new(value))
      });
    match self.exports {
      Some(exports) => module.export(exports),
      None => module,
    }
  }
}

impl From<ModuleConfig> for Module {
  fn from(config: ModuleConfig) -> Self {
    config.into_module()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;
  use serde_json::json;

  #[test]
  fn yaml_and_json_agree() {
    let yaml = ModuleConfig::from_yaml_str("values:\n  a: 1\n  b:\n    c: [1, 2]\n").unwrap();
    let json = ModuleConfig::from_json_str(r#"{"values": {"a": 1, "b": {"c": [1, 2]}}}"#).unwrap();
    assert_eq!(yaml, json);
    assert_eq!(yaml.values.get("b"), Some(&json!({"c": [1, 2]})));
  }

  #[test]
  fn unknown_fields_are_rejected() {
    let err = ModuleConfig::from_yaml_str("providers: {}\n").unwrap_err();
    assert!(matches!(err, Error::ConfigParse(_)));
  }

  #[test]
  fn exports_make_the_module_private() {
    let config = ModuleConfig::from_yaml_str("values:\n  a: 1\nexports: [a]\n").unwrap();
    let module = config.into_module();
    assert!(module.is_private());
    assert_eq!(module.len(), 1);
  }
}
