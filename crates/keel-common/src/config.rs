//! Configuration model for graph building and lifecycle coordination.

use serde::{Deserialize, Serialize};

/// How the graph builder decides which non-component keys are satisfiable
/// by external inputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExternalKeyPolicy {
    /// Only explicitly declared external keys are accepted.
    #[default]
    Declared,
    /// Any key that does not name a component is assumed external.
    Inferred,
}

/// Behavior of the stop pass when a component's stop hook fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopPolicy {
    /// Attempt every stop and report all failures together.
    #[default]
    Continue,
    /// Halt at the first failing stop.
    Abort,
}

/// Root configuration for a keel system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeelConfig {
    /// Which keys the graph builder treats as external inputs.
    pub external_keys: ExternalKeyPolicy,
    /// Stop-pass failure handling.
    pub stop_policy: StopPolicy,
    /// Whether a failed start stops every already-started component.
    pub rollback_on_start_failure: bool,
}

impl Default for KeelConfig {
    fn default() -> Self {
        Self {
            external_keys: ExternalKeyPolicy::default(),
            stop_policy: StopPolicy::default(),
            rollback_on_start_failure: true,
        }
    }
}
