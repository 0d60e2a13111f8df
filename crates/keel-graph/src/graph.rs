//! Dependency graph management using `petgraph`.
//!
//! Builds a directed graph from component declarations. Each component has
//! one outbound edge per parameter that resolves to another component; the
//! edge points from the dependent to its dependency and carries the
//! parameter name. Parameters that resolve to external inputs are recorded
//! as bindings but add no edge.

use std::collections::{BTreeSet, HashMap, HashSet};

use keel_common::config::ExternalKeyPolicy;
use keel_common::error::{KeelError, Result};
use keel_common::types::{ComponentName, ParamName};
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;

use crate::spec::DependencySpec;

/// Keys the builder accepts as satisfiable by external inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExternalKeys {
    /// Only these keys are external.
    Declared(BTreeSet<String>),
    /// Any key that does not name a component is external.
    Inferred,
}

impl ExternalKeys {
    /// No external inputs at all.
    #[must_use]
    pub const fn none() -> Self {
        Self::Declared(BTreeSet::new())
    }

    /// Accepts exactly the given keys.
    pub fn declared<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Self::Declared(keys.into_iter().map(Into::into).collect())
    }

    /// Builds the key set from a configured policy.
    ///
    /// `declared` is ignored under [`ExternalKeyPolicy::Inferred`].
    pub fn from_policy<I, K>(policy: ExternalKeyPolicy, declared: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        match policy {
            ExternalKeyPolicy::Declared => Self::declared(declared),
            ExternalKeyPolicy::Inferred => Self::Inferred,
        }
    }

    fn permits(&self, key: &str) -> bool {
        match self {
            Self::Declared(keys) => keys.contains(key),
            Self::Inferred => true,
        }
    }
}

impl Default for ExternalKeys {
    fn default() -> Self {
        Self::none()
    }
}

/// Where a parameter's value comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Another component, by node position.
    Component(usize),
    /// An external input key.
    External(String),
}

/// A resolved parameter of one component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    /// Parameter name as the constructor sees it.
    pub param: ParamName,
    /// Alias-resolved source.
    pub source: Source,
}

/// A validated dependency graph of components.
///
/// Nodes keep the declaration order of the specs: node position `i` is the
/// `i`-th declared spec.
#[derive(Debug)]
pub struct SystemGraph<C> {
    graph: DiGraph<ComponentName, ParamName>,
    specs: Vec<DependencySpec<C>>,
    bindings: Vec<Vec<Binding>>,
    index: HashMap<ComponentName, usize>,
    externals: BTreeSet<String>,
}

impl<C> SystemGraph<C> {
    /// Builds the graph from component declarations.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateComponent` if two specs share a name,
    /// `InvalidAlias` if an alias targets an undeclared parameter, and
    /// `UnresolvedDependency` if a parameter resolves to a key that is
    /// neither a component nor a permitted external input.
    pub fn build<I>(specs: I, externals: &ExternalKeys) -> Result<Self>
    where
        I: IntoIterator<Item = DependencySpec<C>>,
    {
        let specs: Vec<DependencySpec<C>> = specs.into_iter().collect();
        let mut graph = DiGraph::with_capacity(specs.len(), specs.len());
        let mut index = HashMap::with_capacity(specs.len());

        for (position, spec) in specs.iter().enumerate() {
            if index.insert(spec.name().clone(), position).is_some() {
                return Err(KeelError::DuplicateComponent {
                    name: spec.name().clone(),
                });
            }
            let _ = graph.add_node(spec.name().clone());
        }

        let mut bindings = Vec::with_capacity(specs.len());
        let mut used_externals = BTreeSet::new();
        for (position, spec) in specs.iter().enumerate() {
            check_aliases(spec)?;
            let mut resolved = Vec::with_capacity(spec.declared_params().len());
            for param in spec.declared_params() {
                let key = spec.source_key(param);
                let source = if let Some(&dependency) = index.get(key) {
                    let _ = graph.add_edge(
                        NodeIndex::new(position),
                        NodeIndex::new(dependency),
                        param.clone(),
                    );
                    Source::Component(dependency)
                } else if externals.permits(key) {
                    let _ = used_externals.insert(key.to_owned());
                    Source::External(key.to_owned())
                } else {
                    return Err(KeelError::UnresolvedDependency {
                        component: spec.name().clone(),
                        param: param.clone(),
                        key: key.to_owned(),
                    });
                };
                resolved.push(Binding {
                    param: param.clone(),
                    source,
                });
            }
            bindings.push(resolved);
        }

        tracing::debug!(
            components = specs.len(),
            edges = graph.edge_count(),
            externals = used_externals.len(),
            "dependency graph built"
        );

        Ok(Self {
            graph,
            specs,
            bindings,
            index,
            externals: used_externals,
        })
    }

    /// Returns the number of components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// Returns `true` if the graph has no components.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Returns the node position of a component.
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Returns the spec at a node position.
    #[must_use]
    pub fn spec(&self, position: usize) -> Option<&DependencySpec<C>> {
        self.specs.get(position)
    }

    /// Returns the resolved bindings at a node position, in parameter order.
    #[must_use]
    pub fn bindings(&self, position: usize) -> &[Binding] {
        self.bindings
            .get(position)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Returns component names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &ComponentName> {
        self.specs.iter().map(DependencySpec::name)
    }

    /// Returns every external key some parameter resolves to.
    #[must_use]
    pub const fn external_keys(&self) -> &BTreeSet<String> {
        &self.externals
    }

    /// Returns the node positions a component depends on, in parameter
    /// order. A dependency bound through several parameters appears once
    /// per parameter.
    #[must_use]
    pub fn dependency_positions(&self, position: usize) -> Vec<usize> {
        let mut edges: Vec<_> = self
            .graph
            .edges_directed(NodeIndex::new(position), Direction::Outgoing)
            .map(|edge| (edge.id(), edge.target().index()))
            .collect();
        edges.sort_unstable_by_key(|&(id, _)| id);
        edges.into_iter().map(|(_, target)| target).collect()
    }

    /// Returns the direct dependencies of a component.
    ///
    /// # Errors
    ///
    /// Returns `UnknownComponent` if the name is not in the graph.
    pub fn dependencies_of(&self, name: &str) -> Result<Vec<&ComponentName>> {
        let position = self.require(name)?;
        let mut seen = HashSet::new();
        Ok(self
            .dependency_positions(position)
            .into_iter()
            .filter(|p| seen.insert(*p))
            .map(|p| self.specs[p].name())
            .collect())
    }

    /// Returns the components that directly depend on `name`, in
    /// declaration order.
    ///
    /// # Errors
    ///
    /// Returns `UnknownComponent` if the name is not in the graph.
    pub fn dependents_of(&self, name: &str) -> Result<Vec<&ComponentName>> {
        let position = self.require(name)?;
        let dependents: BTreeSet<usize> = self
            .graph
            .neighbors_directed(NodeIndex::new(position), Direction::Incoming)
            .map(NodeIndex::index)
            .collect();
        Ok(dependents
            .into_iter()
            .map(|p| self.specs[p].name())
            .collect())
    }

    /// Renders the graph in Graphviz DOT format, edges labelled with
    /// parameter names.
    #[must_use]
    pub fn to_dot(&self) -> String {
        petgraph::dot::Dot::new(&self.graph).to_string()
    }

    fn require(&self, name: &str) -> Result<usize> {
        self.position(name)
            .ok_or_else(|| KeelError::UnknownComponent {
                name: name.to_owned(),
            })
    }
}

fn check_aliases<C>(spec: &DependencySpec<C>) -> Result<()> {
    for param in spec.aliases().keys() {
        if !spec.declared_params().contains(param) {
            return Err(KeelError::InvalidAlias {
                component: spec.name().clone(),
                param: param.clone(),
            });
        }
    }
    Ok(())
}
