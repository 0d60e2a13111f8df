//! Compiles a validated graph into a reusable system initializer.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use keel_common::error::{KeelError, Result};
use keel_common::types::{ComponentState, ParamName};
use keel_graph::{Inputs, Source, SystemGraph, TopologicalOrder, resolve_order};

use crate::system::{Slot, System};

/// Values supplied for external keys, once per initialization.
pub type ExternalInputs<C> = HashMap<String, C>;

/// A compiled system: the graph plus the order it is instantiated in.
///
/// [`init`](Self::init) can be called any number of times; every call
/// produces an independent [`System`].
pub struct Initializer<C> {
    graph: SystemGraph<C>,
    order: TopologicalOrder,
}

/// Resolves the graph's order and returns an initializer for it.
///
/// # Errors
///
/// Returns `CyclicDependency` if the graph is not acyclic.
pub fn compile<C>(graph: SystemGraph<C>) -> Result<Initializer<C>> {
    let order = resolve_order(&graph)?;
    Ok(Initializer { graph, order })
}

impl<C> Initializer<C> {
    /// Returns the construction order.
    #[must_use]
    pub const fn order(&self) -> &TopologicalOrder {
        &self.order
    }

    /// Returns the compiled graph.
    #[must_use]
    pub const fn graph(&self) -> &SystemGraph<C> {
        &self.graph
    }

    /// Returns the external keys `init` needs values for.
    #[must_use]
    pub const fn required_inputs(&self) -> &BTreeSet<String> {
        self.graph.external_keys()
    }

    /// Constructs every component in topological order.
    ///
    /// Each constructor runs exactly once and sees its dependencies in their
    /// freshly constructed form. Nothing is started.
    ///
    /// # Errors
    ///
    /// Returns `MissingInput` before any constructor runs if `inputs` lacks a
    /// required key, and `ConstructionFailed` as soon as a constructor
    /// fails; already constructed components are dropped.
    pub fn init(&self, inputs: &ExternalInputs<C>) -> Result<System<C>> {
        self.check_inputs(inputs)?;

        let mut slot_of: Vec<Option<usize>> = vec![None; self.graph.len()];
        let mut slots: Vec<Slot<C>> = Vec::with_capacity(self.order.len());

        for &position in self.order.node_positions() {
            let Some(spec) = self.graph.spec(position) else {
                continue;
            };
            let bindings = self.graph.bindings(position);

            let mut arguments: Vec<(&ParamName, &C)> = Vec::with_capacity(bindings.len());
            let mut wiring = Vec::new();
            for binding in bindings {
                let value = match &binding.source {
                    Source::Component(dependency) => {
                        let slot = slot_of[*dependency].ok_or_else(|| KeelError::Config {
                            message: format!(
                                "component \"{}\" was ordered before its dependency",
                                spec.name()
                            ),
                        })?;
                        wiring.push((binding.param.clone(), slot));
                        &slots[slot].value
                    }
                    Source::External(key) => {
                        inputs.get(key).ok_or_else(|| KeelError::MissingInput {
                            component: spec.name().clone(),
                            param: binding.param.clone(),
                            key: key.clone(),
                        })?
                    }
                };
                arguments.push((&binding.param, value));
            }

            let value = spec.construct(&Inputs::new(arguments)).map_err(|source| {
                tracing::warn!(component = %spec.name(), error = %source, "construction failed");
                KeelError::ConstructionFailed {
                    name: spec.name().clone(),
                    source,
                }
            })?;
            tracing::debug!(component = %spec.name(), "component constructed");

            slot_of[position] = Some(slots.len());
            slots.push(Slot {
                name: spec.name().clone(),
                value,
                state: ComponentState::Constructed,
                wiring,
            });
        }

        tracing::info!(components = slots.len(), "system constructed");
        Ok(System::new(self.order.clone(), slots))
    }

    fn check_inputs(&self, inputs: &ExternalInputs<C>) -> Result<()> {
        for &position in self.order.node_positions() {
            let Some(spec) = self.graph.spec(position) else {
                continue;
            };
            for binding in self.graph.bindings(position) {
                let Source::External(key) = &binding.source else {
                    continue;
                };
                if !inputs.contains_key(key) {
                    return Err(KeelError::MissingInput {
                        component: spec.name().clone(),
                        param: binding.param.clone(),
                        key: key.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

impl<C> fmt::Debug for Initializer<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Initializer")
            .field("order", &self.order)
            .field("required_inputs", self.required_inputs())
            .finish_non_exhaustive()
    }
}
