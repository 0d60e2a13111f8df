//! Topological resolution of a [`SystemGraph`].
//!
//! Depth-first traversal with per-run visiting/visited marks. Roots are
//! visited in declaration order and each node's dependencies in parameter
//! order, so the resulting order is stable for a given declaration and
//! keeps independent components in the order they were written.

use std::ops::Index;

use keel_common::error::{KeelError, Result};
use keel_common::types::ComponentName;

use crate::graph::SystemGraph;

/// Instantiation order covering every component exactly once, dependencies
/// first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopologicalOrder {
    names: Vec<ComponentName>,
    positions: Vec<usize>,
}

impl TopologicalOrder {
    /// Returns the component names in order.
    #[must_use]
    pub fn as_slice(&self) -> &[ComponentName] {
        &self.names
    }

    /// Returns the graph node positions in order.
    #[must_use]
    pub fn node_positions(&self) -> &[usize] {
        &self.positions
    }

    /// Iterates over the names in start order.
    pub fn iter(&self) -> std::slice::Iter<'_, ComponentName> {
        self.names.iter()
    }

    /// Iterates over the names in stop order.
    pub fn reversed(&self) -> std::iter::Rev<std::slice::Iter<'_, ComponentName>> {
        self.names.iter().rev()
    }

    /// Returns where `name` falls in the order.
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n.as_str() == name)
    }

    /// Returns the number of components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` if the order is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Index<usize> for TopologicalOrder {
    type Output = ComponentName;

    fn index(&self, index: usize) -> &Self::Output {
        &self.names[index]
    }
}

impl<'a> IntoIterator for &'a TopologicalOrder {
    type Item = &'a ComponentName;
    type IntoIter = std::slice::Iter<'a, ComponentName>;

    fn into_iter(self) -> Self::IntoIter {
        self.names.iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    Visiting,
    Visited,
}

/// Computes the topological order of a graph.
///
/// The order is the post-order of a depth-first walk. Roots are visited in
/// declaration order and each component's dependencies in parameter order,
/// so a dependency is placed as soon as its first dependent is walked. This
/// is not "earliest declared ready node first": for `web(auth, cache)`,
/// `auth(db)`, `cache`, `db` the order is `db, auth, cache, web` even though
/// `cache` is declared before `db`.
///
/// # Errors
///
/// Returns `CyclicDependency` with the cycle path if the graph is not
/// acyclic.
pub fn resolve_order<C>(graph: &SystemGraph<C>) -> Result<TopologicalOrder> {
    let mut marks = vec![Mark::Unvisited; graph.len()];
    let mut positions = Vec::with_capacity(graph.len());

    for root in 0..graph.len() {
        if marks[root] == Mark::Unvisited {
            visit(graph, root, &mut marks, &mut positions)?;
        }
    }

    let names: Vec<ComponentName> = positions
        .iter()
        .filter_map(|&p| graph.spec(p).map(|spec| spec.name().clone()))
        .collect();
    tracing::info!(order = ?names, "component order resolved");
    Ok(TopologicalOrder { names, positions })
}

struct Frame {
    node: usize,
    dependencies: Vec<usize>,
    next: usize,
}

fn visit<C>(
    graph: &SystemGraph<C>,
    root: usize,
    marks: &mut [Mark],
    order: &mut Vec<usize>,
) -> Result<()> {
    marks[root] = Mark::Visiting;
    let mut stack = vec![Frame {
        node: root,
        dependencies: graph.dependency_positions(root),
        next: 0,
    }];

    while let Some(frame) = stack.last_mut() {
        let Some(&dependency) = frame.dependencies.get(frame.next) else {
            marks[frame.node] = Mark::Visited;
            order.push(frame.node);
            let _ = stack.pop();
            continue;
        };
        frame.next += 1;

        match marks[dependency] {
            Mark::Unvisited => {
                marks[dependency] = Mark::Visiting;
                stack.push(Frame {
                    node: dependency,
                    dependencies: graph.dependency_positions(dependency),
                    next: 0,
                });
            }
            Mark::Visiting => return Err(cycle_error(graph, &stack, dependency)),
            Mark::Visited => {}
        }
    }
    Ok(())
}

/// The back edge closes a cycle running from `dependency` up the stack.
fn cycle_error<C>(graph: &SystemGraph<C>, stack: &[Frame], dependency: usize) -> KeelError {
    let start = stack
        .iter()
        .position(|frame| frame.node == dependency)
        .unwrap_or_default();
    let name = |p: usize| {
        graph
            .spec(p)
            .map_or_else(|| ComponentName::new("?"), |spec| spec.name().clone())
    };
    let mut cycle: Vec<ComponentName> = stack[start..].iter().map(|f| name(f.node)).collect();
    cycle.push(name(dependency));
    tracing::warn!(?cycle, "cyclic dependency detected");
    KeelError::CyclicDependency { cycle }
}

#[cfg(test)]
mod tests {
    use keel_common::error::BoxError;

    use super::*;
    use crate::graph::ExternalKeys;
    use crate::spec::{DependencySpec, Inputs};

    fn spec(name: &str) -> DependencySpec<()> {
        DependencySpec::new(name, |_: &Inputs<'_, ()>| Ok::<(), BoxError>(()))
    }

    fn order_of(specs: Vec<DependencySpec<()>>) -> Result<Vec<String>> {
        let graph = SystemGraph::build(specs, &ExternalKeys::Inferred)?;
        let order = resolve_order(&graph)?;
        Ok(order.iter().map(ToString::to_string).collect())
    }

    #[test]
    fn empty_graph_resolves_to_empty() {
        let order = order_of(Vec::new()).expect("should resolve");
        assert!(order.is_empty());
    }

    #[test]
    fn single_node_resolves() {
        let order = order_of(vec![spec("api")]).expect("should resolve");
        assert_eq!(order, vec!["api"]);
    }

    #[test]
    fn linear_dependency_chain() {
        let order = order_of(vec![
            spec("c").param("b"),
            spec("b").param("a"),
            spec("a"),
        ])
        .expect("should resolve");
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[test]
    fn diamond_dependency() {
        let order = order_of(vec![
            spec("a").params(["b", "c"]),
            spec("b").param("d"),
            spec("c").param("d"),
            spec("d"),
        ])
        .expect("should resolve");
        assert_eq!(order.len(), 4);
        let pos = |name: &str| order.iter().position(|n| n == name).expect(name);
        assert!(pos("d") < pos("b"));
        assert!(pos("d") < pos("c"));
        assert!(pos("b") < pos("a"));
        assert!(pos("c") < pos("a"));
    }

    #[test]
    fn independent_nodes_keep_declaration_order() {
        let order = order_of(vec![spec("zeta"), spec("alpha"), spec("mid")])
            .expect("should resolve");
        assert_eq!(order, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn dependencies_follow_parameter_order() {
        let order = order_of(vec![
            spec("api").params(["queue", "db"]),
            spec("db"),
            spec("queue"),
        ])
        .expect("should resolve");
        assert_eq!(order, vec!["queue", "db", "api"]);
    }

    #[test]
    fn external_params_add_no_ordering() {
        let order = order_of(vec![spec("b").param("url"), spec("a")]).expect("should resolve");
        assert_eq!(order, vec!["b", "a"]);
    }

    #[test]
    fn dependencies_are_placed_before_later_declared_roots() {
        let order = order_of(vec![
            spec("web").params(["auth", "cache"]),
            spec("auth").param("db"),
            spec("cache"),
            spec("db"),
            spec("metrics"),
        ])
        .expect("resolve");
        assert_eq!(order, vec!["db", "auth", "cache", "web", "metrics"]);
    }

    #[test]
    fn resolution_is_deterministic() {
        let build = || {
            vec![
                spec("web").params(["auth", "cache"]),
                spec("auth").param("db"),
                spec("cache"),
                spec("db"),
                spec("metrics"),
            ]
        };
        let first = order_of(build()).expect("first");
        let second = order_of(build()).expect("second");
        assert_eq!(first, second);
        assert_eq!(first, vec!["db", "auth", "cache", "web", "metrics"]);
    }

    #[test]
    fn cycle_detection() {
        let err = order_of(vec![spec("a").param("b"), spec("b").param("a")]).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("cyclic"), "got: {msg}");
        match err {
            KeelError::CyclicDependency { cycle } => {
                assert_eq!(cycle, vec!["a", "b", "a"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn three_node_cycle_names_every_member() {
        let err = order_of(vec![
            spec("entry").param("a"),
            spec("a").param("b"),
            spec("b").param("c"),
            spec("c").param("a"),
        ])
        .unwrap_err();
        match err {
            KeelError::CyclicDependency { cycle } => {
                assert_eq!(cycle, vec!["a", "b", "c", "a"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn self_dependency_is_a_cycle() {
        let err = order_of(vec![spec("loop").param("loop")]).unwrap_err();
        assert!(matches!(err, KeelError::CyclicDependency { .. }), "got: {err}");
    }

    #[test]
    fn order_accessors() {
        let graph = SystemGraph::build(
            vec![spec("b").param("a"), spec("a")],
            &ExternalKeys::none(),
        )
        .expect("build");
        let order = resolve_order(&graph).expect("order");
        assert_eq!(order.position("a"), Some(0));
        assert_eq!(order.node_positions(), &[1, 0]);
        assert_eq!(order[1], "b");
        let reversed: Vec<&str> = order.reversed().map(ComponentName::as_str).collect();
        assert_eq!(reversed, vec!["b", "a"]);
    }
}
