//! # keel-sdk
//!
//! Public SDK for composing systems out of named components.
//!
//! Provides two main entry points:
//! - [`SystemBuilder`](builder::SystemBuilder): declares components and
//!   external inputs, then compiles them into a [`Composition`](builder::Composition).
//! - [`GraphResolver`](graph_resolver::GraphResolver): validates a JSON/YAML
//!   manifest and reports its start and stop order.
//!
//! # Example
//!
//! ```rust
//! use keel_sdk::prelude::*;
//!
//! #[derive(Debug, Clone)]
//! struct Port(u16);
//!
//! impl Lifecycle for Port {}
//!
//! let composition = SystemBuilder::new()
//!     .external("port")
//!     .component(DependencySpec::new("listener", |inputs: &Inputs<'_, Port>| {
//!         Ok(inputs.require("port")?.clone())
//!     }).param("port"))
//!     .build()?;
//!
//! let mut inputs = ExternalInputs::new();
//! let _ = inputs.insert("port".to_owned(), Port(8080));
//! let mut system = composition.launch(&inputs)?;
//! composition.coordinator().stop(&mut system)?;
//! # Ok::<(), keel_sdk::prelude::KeelError>(())
//! ```

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used, clippy::panic))]

pub mod builder;
pub mod graph_resolver;

/// Everything needed to declare, build, and run a system.
pub mod prelude {
    pub use keel_common::config::{ExternalKeyPolicy, KeelConfig, StopPolicy};
    pub use keel_common::error::{BoxError, KeelError};
    pub use keel_common::types::{ComponentName, ComponentState, ParamName};
    pub use keel_graph::{DependencySpec, Inputs, TopologicalOrder};
    pub use keel_system::{
        Coordinator, ExternalInputs, Lifecycle, LifecycleEvent, Phase, System,
    };

    pub use crate::builder::{Composition, SystemBuilder};
    pub use crate::graph_resolver::GraphResolver;
}
