//! Unified error types for the keel workspace.
//!
//! Graph-shape errors (`UnresolvedDependency`, `CyclicDependency`,
//! `DuplicateComponent`, `InvalidAlias`) are raised before any constructor
//! runs and always indicate a mistake in the system declaration. The
//! remaining runtime variants wrap failures reported by the components
//! themselves.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::types::{ComponentName, ParamName};

/// Error type produced by component constructors and lifecycle hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A single component's failure, as collected during a lifecycle pass.
#[derive(Debug)]
pub struct ComponentFailure {
    /// Component whose hook failed.
    pub name: ComponentName,
    /// Error returned by the hook.
    pub source: BoxError,
}

impl ComponentFailure {
    /// Pairs a component name with the error its hook returned.
    #[must_use]
    pub fn new(name: ComponentName, source: BoxError) -> Self {
        Self { name, source }
    }
}

impl fmt::Display for ComponentFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.source)
    }
}

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum KeelError {
    /// A parameter resolves to a key that is neither a component nor a
    /// permitted external input.
    #[error("component \"{component}\" parameter \"{param}\" resolves to \"{key}\", which is neither a component nor an external input")]
    UnresolvedDependency {
        /// Component declaring the parameter.
        component: ComponentName,
        /// Offending parameter.
        param: ParamName,
        /// Alias-resolved source key that could not be satisfied.
        key: String,
    },

    /// The dependency graph contains a cycle.
    #[error("cyclic dependency detected: {}", join_names(.cycle))]
    CyclicDependency {
        /// Nodes along the cycle; the first node is repeated at the end.
        cycle: Vec<ComponentName>,
    },

    /// Two specs share the same component name.
    #[error("duplicate component name: \"{name}\"")]
    DuplicateComponent {
        /// The repeated name.
        name: ComponentName,
    },

    /// An alias refers to a parameter the component never declared.
    #[error("component \"{component}\" aliases undeclared parameter \"{param}\"")]
    InvalidAlias {
        /// Component declaring the alias.
        component: ComponentName,
        /// Aliased parameter missing from the component's params.
        param: ParamName,
    },

    /// A required external input was not supplied at initialization.
    #[error("missing external input \"{key}\" required by component \"{component}\" parameter \"{param}\"")]
    MissingInput {
        /// Component that needs the input.
        component: ComponentName,
        /// Parameter bound to the input.
        param: ParamName,
        /// External key that was absent.
        key: String,
    },

    /// A component name was not found in the system.
    #[error("unknown component: \"{name}\"")]
    UnknownComponent {
        /// The name that was looked up.
        name: String,
    },

    /// A constructor failed while initializing the system.
    #[error("failed to construct component \"{name}\": {source}")]
    ConstructionFailed {
        /// Component whose constructor failed.
        name: ComponentName,
        /// Error returned by the constructor.
        source: BoxError,
    },

    /// A component failed to start. Components started before it have
    /// been stopped again in reverse order.
    #[error("failed to start component \"{name}\": {source}")]
    StartupFailed {
        /// Component whose start failed.
        name: ComponentName,
        /// Error returned by the start hook.
        source: BoxError,
        /// Stop failures encountered while rolling back.
        rollback: Vec<ComponentFailure>,
    },

    /// One or more components failed to stop.
    #[error("failed to stop {} component(s): {}", .failures.len(), join_failures(.failures))]
    ShutdownFailed {
        /// Every stop failure, in the order the stops were attempted.
        failures: Vec<ComponentFailure>,
    },

    /// A configuration or manifest value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// JSON serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },

    /// YAML deserialization failed.
    #[error("YAML error: {source}")]
    Yaml {
        /// Underlying YAML error.
        #[from]
        source: serde_yaml::Error,
    },
}

impl KeelError {
    /// Returns `true` for errors detected from the declaration alone,
    /// before any constructor is invoked.
    #[must_use]
    pub const fn is_graph_error(&self) -> bool {
        matches!(
            self,
            Self::UnresolvedDependency { .. }
                | Self::CyclicDependency { .. }
                | Self::DuplicateComponent { .. }
                | Self::InvalidAlias { .. }
        )
    }
}

fn join_names(names: &[ComponentName]) -> String {
    names
        .iter()
        .map(ComponentName::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}

fn join_failures(failures: &[ComponentFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, KeelError>;
