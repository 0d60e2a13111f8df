//! The container of instantiated components.

use std::collections::HashMap;
use std::fmt;

use keel_common::error::{KeelError, Result};
use keel_common::types::{ComponentName, ComponentState, ParamName};
use keel_graph::TopologicalOrder;

use crate::component::Lifecycle;

/// One instantiated component and its wiring.
pub(crate) struct Slot<C> {
    pub(crate) name: ComponentName,
    pub(crate) value: C,
    pub(crate) state: ComponentState,
    /// Component-bound parameters and the slot each resolves to. Every
    /// target slot precedes this one.
    pub(crate) wiring: Vec<(ParamName, usize)>,
}

/// Components produced by one initialization, stored in the topological
/// order used to build them.
///
/// Only the lifecycle coordinator changes stored values; between lifecycle
/// calls the system is read through [`get`](Self::get) and
/// [`iter`](Self::iter).
pub struct System<C> {
    order: TopologicalOrder,
    slots: Vec<Slot<C>>,
    index: HashMap<ComponentName, usize>,
}

impl<C> System<C> {
    pub(crate) fn new(order: TopologicalOrder, slots: Vec<Slot<C>>) -> Self {
        let index = slots
            .iter()
            .enumerate()
            .map(|(i, slot)| (slot.name.clone(), i))
            .collect();
        Self {
            order,
            slots,
            index,
        }
    }

    /// Returns the order components were constructed in; start follows it
    /// and stop follows its reverse.
    #[must_use]
    pub const fn order(&self) -> &TopologicalOrder {
        &self.order
    }

    /// Returns the current value of a component.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&C> {
        self.index.get(name).map(|&i| &self.slots[i].value)
    }

    /// Returns the lifecycle state of a component.
    #[must_use]
    pub fn state(&self, name: &str) -> Option<ComponentState> {
        self.index.get(name).map(|&i| self.slots[i].state)
    }

    /// Returns `true` if the system holds a component called `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Iterates over components in topological order.
    pub fn iter(&self) -> impl Iterator<Item = (&ComponentName, &C)> {
        self.slots.iter().map(|slot| (&slot.name, &slot.value))
    }

    /// Returns the number of components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if the system is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Consumes the system, returning components in topological order.
    #[must_use]
    pub fn into_components(self) -> Vec<(ComponentName, C)> {
        self.slots
            .into_iter()
            .map(|slot| (slot.name, slot.value))
            .collect()
    }

    pub(crate) fn slot_of(&self, name: &str) -> Result<usize> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| KeelError::UnknownComponent {
                name: name.to_owned(),
            })
    }

    pub(crate) fn slots(&self) -> &[Slot<C>] {
        &self.slots
    }

    pub(crate) fn slot_mut(&mut self, i: usize) -> &mut Slot<C> {
        &mut self.slots[i]
    }
}

impl<C: Lifecycle> System<C> {
    /// Hands slot `i` the current values of its dependencies.
    pub(crate) fn rewire(&mut self, i: usize) {
        let (before, rest) = self.slots.split_at_mut(i);
        let Some(slot) = rest.first_mut() else {
            return;
        };
        for (param, dependency) in &slot.wiring {
            if let Some(source) = before.get(*dependency) {
                slot.value.provide(param, &source.value);
            }
        }
    }

    /// Re-wires every component in topological order.
    pub(crate) fn rewire_all(&mut self) {
        for i in 0..self.slots.len() {
            self.rewire(i);
        }
    }
}

impl<C: fmt::Debug> fmt::Debug for System<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.slots.iter().map(|slot| (&slot.name, &slot.value)))
            .finish()
    }
}
