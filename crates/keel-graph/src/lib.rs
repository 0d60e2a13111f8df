//! # keel-graph
//!
//! Static half of the composition engine: turns component declarations into
//! a validated dependency graph and a deterministic instantiation order.
//!
//! Handles:
//! - **Spec**: per-component declarations (constructor, params, aliases).
//! - **Graph**: dependency graph construction and reference validation.
//! - **Resolver**: cycle detection and topological ordering.
//! - **Manifest**: JSON/YAML declarations for dry-run planning.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used, clippy::panic))]

pub mod graph;
pub mod manifest;
pub mod resolver;
pub mod spec;

pub use graph::{Binding, ExternalKeys, Source, SystemGraph};
pub use resolver::{TopologicalOrder, resolve_order};
pub use spec::{Constructor, DependencySpec, Inputs};
