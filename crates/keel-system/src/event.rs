//! Lifecycle events emitted by the coordinator.

use std::fmt;

use keel_common::types::{ComponentName, ComponentState};

/// Which pass a failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Forward start pass.
    Start,
    /// Reverse stop pass.
    Stop,
    /// Reverse stop performed after a start failure.
    Rollback,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "start"),
            Self::Stop => write!(f, "stop"),
            Self::Rollback => write!(f, "rollback"),
        }
    }
}

/// A component lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// A component changed state.
    Transition {
        /// Component that changed.
        component: ComponentName,
        /// Previous state.
        from: ComponentState,
        /// New state.
        to: ComponentState,
    },
    /// A component's hook returned an error.
    Failed {
        /// Component whose hook failed.
        component: ComponentName,
        /// Pass the failure happened in.
        phase: Phase,
        /// Rendered error.
        message: String,
    },
}

impl LifecycleEvent {
    /// Returns the component the event concerns.
    #[must_use]
    pub const fn component(&self) -> &ComponentName {
        match self {
            Self::Transition { component, .. } | Self::Failed { component, .. } => component,
        }
    }
}
