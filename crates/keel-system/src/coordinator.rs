//! Lifecycle coordinator that starts and stops a [`System`].
//!
//! Start walks the topological order forward and aborts on the first
//! failure, rolling back what it already started. Stop walks the order in
//! reverse and, under the default [`StopPolicy::Continue`], attempts every
//! component before reporting all failures together.

use std::fmt;

use keel_common::config::{KeelConfig, StopPolicy};
use keel_common::error::{ComponentFailure, KeelError, Result};
use keel_common::types::ComponentState;

use crate::component::Lifecycle;
use crate::event::{LifecycleEvent, Phase};
use crate::system::System;

type Listener = Box<dyn FnMut(&LifecycleEvent)>;

/// Drives start/stop passes over a system.
pub struct Coordinator {
    stop_policy: StopPolicy,
    rollback_on_start_failure: bool,
    listener: Option<Listener>,
}

impl Coordinator {
    /// Creates a coordinator with the default policies.
    #[must_use]
    pub fn new() -> Self {
        Self::from_config(&KeelConfig::default())
    }

    /// Creates a coordinator from configuration.
    #[must_use]
    pub const fn from_config(config: &KeelConfig) -> Self {
        Self {
            stop_policy: config.stop_policy,
            rollback_on_start_failure: config.rollback_on_start_failure,
            listener: None,
        }
    }

    /// Registers a callback that receives every lifecycle event.
    #[must_use]
    pub fn with_listener(mut self, listener: impl FnMut(&LifecycleEvent) + 'static) -> Self {
        self.listener = Some(Box::new(listener));
        self
    }

    /// Starts every component in topological order.
    ///
    /// Before a component starts, it is handed the current (already
    /// started) values of its dependencies. Components already in the
    /// `Started` state are left alone.
    ///
    /// # Errors
    ///
    /// Returns `StartupFailed` for the first component whose start fails,
    /// after stopping every started component in reverse order, including
    /// ones started by an earlier call.
    pub fn start<C: Lifecycle>(&mut self, system: &mut System<C>) -> Result<()> {
        let targets: Vec<usize> = (0..system.len()).collect();
        self.start_slots(system, &targets)
    }

    /// Starts the named components and their transitive dependencies.
    ///
    /// # Errors
    ///
    /// Returns `UnknownComponent` before anything starts if a name is not
    /// in the system, otherwise fails like [`start`](Self::start).
    pub fn start_only<C, I, S>(&mut self, system: &mut System<C>, names: I) -> Result<()>
    where
        C: Lifecycle,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut pending = names
            .into_iter()
            .map(|name| system.slot_of(name.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        let mut wanted = vec![false; system.len()];
        while let Some(i) = pending.pop() {
            if wanted[i] {
                continue;
            }
            wanted[i] = true;
            pending.extend(system.slots()[i].wiring.iter().map(|&(_, dependency)| dependency));
        }
        let targets: Vec<usize> = wanted
            .iter()
            .enumerate()
            .filter_map(|(i, &wanted)| wanted.then_some(i))
            .collect();
        self.start_slots(system, &targets)
    }

    /// Stops every component in reverse topological order.
    ///
    /// After the pass, dependents are handed the final values of their
    /// dependencies.
    ///
    /// # Errors
    ///
    /// Returns `ShutdownFailed` listing every component whose stop failed.
    /// Under [`StopPolicy::Abort`] the pass ends at the first failure.
    pub fn stop<C: Lifecycle>(&mut self, system: &mut System<C>) -> Result<()> {
        tracing::info!(components = system.len(), "stopping system");
        let mut failures = Vec::new();
        for i in (0..system.len()).rev() {
            if let Err(failure) = self.stop_slot(system, i, Phase::Stop) {
                failures.push(failure);
                if self.stop_policy == StopPolicy::Abort {
                    tracing::warn!("stop pass aborted on first failure");
                    break;
                }
            }
        }
        system.rewire_all();

        if failures.is_empty() {
            tracing::info!("system stopped");
            Ok(())
        } else {
            Err(KeelError::ShutdownFailed { failures })
        }
    }

    fn start_slots<C: Lifecycle>(
        &mut self,
        system: &mut System<C>,
        targets: &[usize],
    ) -> Result<()> {
        tracing::info!(components = targets.len(), "starting system");

        for &i in targets {
            if system.slots()[i].state.is_started() {
                continue;
            }
            system.rewire(i);

            let slot = system.slot_mut(i);
            let from = slot.state;
            let outcome = slot.value.start();
            let name = slot.name.clone();

            match outcome {
                Ok(()) => {
                    slot.state = ComponentState::Started;
                    tracing::debug!(component = %name, "component started");
                    self.emit(LifecycleEvent::Transition {
                        component: name,
                        from,
                        to: ComponentState::Started,
                    });
                }
                Err(source) => {
                    slot.state = ComponentState::Failed;
                    tracing::warn!(
                        component = %name,
                        error = %source,
                        "component failed to start"
                    );
                    self.emit(LifecycleEvent::Failed {
                        component: name.clone(),
                        phase: Phase::Start,
                        message: source.to_string(),
                    });
                    self.emit(LifecycleEvent::Transition {
                        component: name.clone(),
                        from,
                        to: ComponentState::Failed,
                    });
                    let rollback = if self.rollback_on_start_failure {
                        self.roll_back(system)
                    } else {
                        Vec::new()
                    };
                    return Err(KeelError::StartupFailed {
                        name,
                        source,
                        rollback,
                    });
                }
            }
        }

        tracing::info!("system started");
        Ok(())
    }

    /// Stops every `Started` component in reverse topological order.
    fn roll_back<C: Lifecycle>(&mut self, system: &mut System<C>) -> Vec<ComponentFailure> {
        let started: Vec<usize> = (0..system.len())
            .filter(|&i| system.slots()[i].state.is_started())
            .collect();
        tracing::warn!(components = started.len(), "rolling back started components");
        let failures: Vec<ComponentFailure> = started
            .into_iter()
            .rev()
            .filter_map(|i| self.stop_slot(system, i, Phase::Rollback).err())
            .collect();
        system.rewire_all();
        failures
    }

    /// A failed stop still leaves the component `Stopped`.
    fn stop_slot<C: Lifecycle>(
        &mut self,
        system: &mut System<C>,
        i: usize,
        phase: Phase,
    ) -> std::result::Result<(), ComponentFailure> {
        let slot = system.slot_mut(i);
        let from = slot.state;
        let outcome = slot.value.stop();
        slot.state = ComponentState::Stopped;
        let name = slot.name.clone();

        self.emit(LifecycleEvent::Transition {
            component: name.clone(),
            from,
            to: ComponentState::Stopped,
        });
        match outcome {
            Ok(()) => {
                tracing::debug!(component = %name, %phase, "component stopped");
                Ok(())
            }
            Err(source) => {
                tracing::warn!(
                    component = %name,
                    %phase,
                    error = %source,
                    "component failed to stop"
                );
                self.emit(LifecycleEvent::Failed {
                    component: name.clone(),
                    phase,
                    message: source.to_string(),
                });
                Err(ComponentFailure::new(name, source))
            }
        }
    }

    fn emit(&mut self, event: LifecycleEvent) {
        if let Some(listener) = self.listener.as_mut() {
            listener(&event);
        }
    }
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coordinator")
            .field("stop_policy", &self.stop_policy)
            .field("rollback_on_start_failure", &self.rollback_on_start_failure)
            .field("listener", &self.listener.is_some())
            .finish()
    }
}

/// Starts a system with the default coordinator.
///
/// # Errors
///
/// See [`Coordinator::start`].
pub fn start<C: Lifecycle>(system: &mut System<C>) -> Result<()> {
    Coordinator::new().start(system)
}

/// Stops a system with the default coordinator.
///
/// # Errors
///
/// See [`Coordinator::stop`].
pub fn stop<C: Lifecycle>(system: &mut System<C>) -> Result<()> {
    Coordinator::new().stop(system)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use keel_common::error::BoxError;
    use keel_graph::{DependencySpec, ExternalKeys, Inputs, SystemGraph};

    use super::*;
    use crate::compiler::{ExternalInputs, compile};

    type Journal = Rc<RefCell<Vec<String>>>;

    #[derive(Debug, Clone)]
    struct Probe {
        name: &'static str,
        journal: Journal,
        fail_start: bool,
        fail_stop: bool,
    }

    impl Lifecycle for Probe {
        fn start(&mut self) -> std::result::Result<(), BoxError> {
            self.journal.borrow_mut().push(format!("start {}", self.name));
            if self.fail_start {
                return Err(format!("{} refused to start", self.name).into());
            }
            Ok(())
        }

        fn stop(&mut self) -> std::result::Result<(), BoxError> {
            self.journal.borrow_mut().push(format!("stop {}", self.name));
            if self.fail_stop {
                return Err(format!("{} refused to stop", self.name).into());
            }
            Ok(())
        }
    }

    fn probe(journal: &Journal, name: &'static str, deps: &[&str]) -> DependencySpec<Probe> {
        probe_with(journal, name, deps, false, false)
    }

    fn probe_with(
        journal: &Journal,
        name: &'static str,
        deps: &[&str],
        fail_start: bool,
        fail_stop: bool,
    ) -> DependencySpec<Probe> {
        let journal = Rc::clone(journal);
        DependencySpec::new(name, move |_: &Inputs<'_, Probe>| {
            Ok::<_, BoxError>(Probe {
                name,
                journal: Rc::clone(&journal),
                fail_start,
                fail_stop,
            })
        })
        .params(deps.iter().copied())
    }

    fn system_of(specs: Vec<DependencySpec<Probe>>) -> System<Probe> {
        let graph = SystemGraph::build(specs, &ExternalKeys::none()).expect("build");
        compile(graph)
            .expect("compile")
            .init(&ExternalInputs::new())
            .expect("init")
    }

    #[test]
    fn start_then_stop_follow_order() {
        let journal = Journal::default();
        let mut system = system_of(vec![
            probe(&journal, "c", &["b"]),
            probe(&journal, "b", &["a"]),
            probe(&journal, "a", &[]),
        ]);
        start(&mut system).expect("start");
        assert_eq!(system.state("c"), Some(ComponentState::Started));
        stop(&mut system).expect("stop");
        assert_eq!(
            *journal.borrow(),
            vec!["start a", "start b", "start c", "stop c", "stop b", "stop a"]
        );
        assert_eq!(system.state("a"), Some(ComponentState::Stopped));
    }

    #[test]
    fn start_only_starts_transitive_dependencies() {
        let journal = Journal::default();
        let mut system = system_of(vec![
            probe(&journal, "db", &[]),
            probe(&journal, "cache", &[]),
            probe(&journal, "repo", &["db"]),
            probe(&journal, "api", &["repo"]),
        ]);
        Coordinator::new()
            .start_only(&mut system, ["api"])
            .expect("start");
        assert_eq!(*journal.borrow(), vec!["start db", "start repo", "start api"]);
        assert_eq!(system.state("cache"), Some(ComponentState::Constructed));

        start(&mut system).expect("start rest");
        assert_eq!(journal.borrow().last().map(String::as_str), Some("start cache"));
        assert_eq!(journal.borrow().len(), 4);
    }

    #[test]
    fn start_only_rejects_unknown_names_before_starting() {
        let journal = Journal::default();
        let mut system = system_of(vec![probe(&journal, "db", &[])]);
        let err = Coordinator::new()
            .start_only(&mut system, ["db", "ghost"])
            .unwrap_err();
        assert!(matches!(err, KeelError::UnknownComponent { .. }), "got: {err}");
        assert!(journal.borrow().is_empty());
    }

    #[test]
    fn failed_start_without_rollback_leaves_components_running() {
        let journal = Journal::default();
        let mut system = system_of(vec![
            probe(&journal, "a", &[]),
            probe_with(&journal, "b", &["a"], true, false),
        ]);
        let config = KeelConfig {
            rollback_on_start_failure: false,
            ..KeelConfig::default()
        };
        let err = Coordinator::from_config(&config)
            .start(&mut system)
            .unwrap_err();
        assert!(matches!(err, KeelError::StartupFailed { .. }), "got: {err}");
        assert_eq!(*journal.borrow(), vec!["start a", "start b"]);
        assert_eq!(system.state("a"), Some(ComponentState::Started));
        assert_eq!(system.state("b"), Some(ComponentState::Failed));
    }

    #[test]
    fn rollback_failures_are_reported() {
        let journal = Journal::default();
        let mut system = system_of(vec![
            probe_with(&journal, "a", &[], false, true),
            probe_with(&journal, "b", &["a"], true, false),
        ]);
        let err = start(&mut system).unwrap_err();
        match err {
            KeelError::StartupFailed {
                name,
                source,
                rollback,
            } => {
                assert_eq!(name, "b");
                assert_eq!(source.to_string(), "b refused to start");
                assert_eq!(rollback.len(), 1);
                assert_eq!(rollback[0].name, "a");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(system.state("a"), Some(ComponentState::Stopped));
    }

    #[test]
    fn abort_policy_stops_at_first_failure() {
        let journal = Journal::default();
        let mut system = system_of(vec![
            probe(&journal, "a", &[]),
            probe_with(&journal, "b", &[], false, true),
            probe(&journal, "c", &[]),
        ]);
        let config = KeelConfig {
            stop_policy: StopPolicy::Abort,
            ..KeelConfig::default()
        };
        let mut coordinator = Coordinator::from_config(&config);
        coordinator.start(&mut system).expect("start");
        let err = coordinator.stop(&mut system).unwrap_err();
        assert!(err.to_string().contains("b refused to stop"), "got: {err}");
        assert_eq!(
            *journal.borrow(),
            vec!["start a", "start b", "start c", "stop c", "stop b"]
        );
        assert_eq!(system.state("a"), Some(ComponentState::Started));
    }

    #[test]
    fn listener_receives_transitions_and_failures() {
        let journal = Journal::default();
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        let mut system = system_of(vec![
            probe(&journal, "a", &[]),
            probe_with(&journal, "b", &["a"], true, false),
        ]);
        let mut coordinator = Coordinator::new()
            .with_listener(move |event| sink.borrow_mut().push(event.clone()));
        let _ = coordinator.start(&mut system).unwrap_err();

        let events = events.borrow();
        assert_eq!(
            events[0],
            LifecycleEvent::Transition {
                component: "a".into(),
                from: ComponentState::Constructed,
                to: ComponentState::Started,
            }
        );
        assert!(matches!(
            &events[1],
            LifecycleEvent::Failed { phase: Phase::Start, .. }
        ));
        assert_eq!(events[1].component(), "b");
        assert!(events.iter().any(|event| matches!(
            event,
            LifecycleEvent::Transition {
                component,
                to: ComponentState::Stopped,
                ..
            } if component == "a"
        )));
    }

    #[test]
    fn already_started_components_are_not_restarted() {
        let journal = Journal::default();
        let mut system = system_of(vec![probe(&journal, "a", &[])]);
        start(&mut system).expect("first");
        start(&mut system).expect("second");
        assert_eq!(*journal.borrow(), vec!["start a"]);
    }
}
