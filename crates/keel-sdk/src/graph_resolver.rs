//! Validates and resolves component manifests.
//!
//! Wraps `keel-graph`'s manifest, graph, and resolver modules into a
//! high-level API for planning a system before its constructors exist.

use std::collections::BTreeSet;
use std::path::Path;

use keel_common::error::Result;
use keel_common::types::ComponentName;
use keel_graph::manifest::Manifest;
use keel_graph::{SystemGraph, TopologicalOrder, resolve_order};

/// High-level resolver for manifest-declared dependency graphs.
#[derive(Debug)]
pub struct GraphResolver {
    graph: SystemGraph<ComponentName>,
    order: TopologicalOrder,
}

impl GraphResolver {
    /// Loads and resolves a JSON or YAML manifest file.
    ///
    /// # Errors
    ///
    /// Returns an error if reading, parsing, validation, or resolution
    /// fails.
    pub fn load(path: &Path) -> Result<Self> {
        Self::from_manifest(&Manifest::load(path)?)
    }

    /// Resolves an in-memory manifest.
    ///
    /// # Errors
    ///
    /// Returns any graph-shape error the manifest contains.
    pub fn from_manifest(manifest: &Manifest) -> Result<Self> {
        let graph = manifest.to_graph()?;
        let order = resolve_order(&graph)?;
        Ok(Self { graph, order })
    }

    /// Returns the order components start in.
    #[must_use]
    pub const fn start_order(&self) -> &TopologicalOrder {
        &self.order
    }

    /// Returns the order components stop in.
    #[must_use]
    pub fn stop_order(&self) -> Vec<&ComponentName> {
        self.order.reversed().collect()
    }

    /// Returns the direct dependencies of a component.
    ///
    /// # Errors
    ///
    /// Returns `UnknownComponent` if the name is not declared.
    pub fn dependencies_of(&self, name: &str) -> Result<Vec<&ComponentName>> {
        self.graph.dependencies_of(name)
    }

    /// Returns the external keys the manifest's components consume.
    #[must_use]
    pub const fn external_keys(&self) -> &BTreeSet<String> {
        self.graph.external_keys()
    }

    /// Renders the dependency graph in Graphviz DOT format.
    #[must_use]
    pub fn to_dot(&self) -> String {
        self.graph.to_dot()
    }
}
