//! Declarative system manifests.
//!
//! A manifest lists component names, their parameters, and aliases without
//! any constructor code. It is used to validate and plan a system layout
//! ahead of linking the real constructors.

use std::collections::BTreeMap;
use std::path::Path;

use keel_common::config::ExternalKeyPolicy;
use keel_common::constants::YAML_EXTENSIONS;
use keel_common::error::{BoxError, KeelError, Result};
use keel_common::types::ComponentName;
use serde::{Deserialize, Serialize};

use crate::graph::{ExternalKeys, SystemGraph};
use crate::spec::{DependencySpec, Inputs};

/// One component entry in a manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestComponent {
    /// Component name.
    pub name: String,
    /// Constructor parameters, in order.
    #[serde(default)]
    pub params: Vec<String>,
    /// Parameter name to source key.
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
}

/// Root of a manifest file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Declared external input keys. When absent, any key that is not a
    /// component name is treated as external.
    #[serde(default)]
    pub externals: Option<Vec<String>>,
    /// Component declarations, in declaration order.
    #[serde(default)]
    pub components: Vec<ManifestComponent>,
}

impl Manifest {
    /// Parses a manifest from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not a valid manifest.
    pub fn from_json_str(input: &str) -> Result<Self> {
        Ok(serde_json::from_str(input)?)
    }

    /// Parses a manifest from YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not a valid manifest.
    pub fn from_yaml_str(input: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(input)?)
    }

    /// Loads a manifest, picking the format from the file extension.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        tracing::info!(path = %path.display(), "loading manifest");
        let content = std::fs::read_to_string(path).map_err(|e| KeelError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| YAML_EXTENSIONS.contains(&ext));
        if is_yaml {
            Self::from_yaml_str(&content)
        } else {
            Self::from_json_str(&content)
        }
    }

    /// Returns the external-key policy implied by the manifest.
    #[must_use]
    pub const fn external_key_policy(&self) -> ExternalKeyPolicy {
        if self.externals.is_some() {
            ExternalKeyPolicy::Declared
        } else {
            ExternalKeyPolicy::Inferred
        }
    }

    /// Builds a dry graph whose constructors produce the component's own
    /// name.
    ///
    /// # Errors
    ///
    /// Returns any graph-shape error the declaration contains.
    pub fn to_graph(&self) -> Result<SystemGraph<ComponentName>> {
        let externals = ExternalKeys::from_policy(
            self.external_key_policy(),
            self.externals.iter().flatten().cloned(),
        );
        let specs = self.components.iter().map(|component| {
            let name = ComponentName::new(component.name.clone());
            let placeholder = name.clone();
            let spec = DependencySpec::new(name, move |_: &Inputs<'_, ComponentName>| {
                Ok::<_, BoxError>(placeholder.clone())
            })
            .params(component.params.iter().cloned());
            component
                .aliases
                .iter()
                .fold(spec, |spec, (param, key)| spec.alias(param.clone(), key.clone()))
        });
        SystemGraph::build(specs, &externals)
    }
}
