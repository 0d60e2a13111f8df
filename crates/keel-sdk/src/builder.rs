//! Fluent API for declaring and compiling a system.

use std::collections::BTreeSet;

use keel_common::config::KeelConfig;
use keel_common::error::Result;
use keel_graph::{DependencySpec, ExternalKeys, SystemGraph, TopologicalOrder};
use keel_system::{Coordinator, ExternalInputs, Initializer, Lifecycle, System, compile};

/// Builder collecting component declarations before compilation.
#[derive(Debug)]
pub struct SystemBuilder<C> {
    config: KeelConfig,
    specs: Vec<DependencySpec<C>>,
    externals: BTreeSet<String>,
}

impl<C> SystemBuilder<C> {
    /// Creates a builder with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(KeelConfig::default())
    }

    /// Creates a builder with the given configuration.
    #[must_use]
    pub const fn with_config(config: KeelConfig) -> Self {
        Self {
            config,
            specs: Vec::new(),
            externals: BTreeSet::new(),
        }
    }

    /// Adds a component declaration. Declaration order is the tie-break
    /// for independent components.
    #[must_use]
    pub fn component(mut self, spec: DependencySpec<C>) -> Self {
        self.specs.push(spec);
        self
    }

    /// Declares an external input key.
    #[must_use]
    pub fn external(mut self, key: impl Into<String>) -> Self {
        let _ = self.externals.insert(key.into());
        self
    }

    /// Declares several external input keys.
    #[must_use]
    pub fn externals<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.externals.extend(keys.into_iter().map(Into::into));
        self
    }

    /// Validates the declarations and compiles them.
    ///
    /// # Errors
    ///
    /// Returns any graph-shape error: `DuplicateComponent`, `InvalidAlias`,
    /// `UnresolvedDependency`, or `CyclicDependency`.
    pub fn build(self) -> Result<Composition<C>> {
        let externals = ExternalKeys::from_policy(self.config.external_keys, self.externals);
        let graph = SystemGraph::build(self.specs, &externals)?;
        let initializer = compile(graph)?;
        tracing::info!(
            components = initializer.order().len(),
            inputs = initializer.required_inputs().len(),
            "system compiled"
        );
        Ok(Composition {
            initializer,
            config: self.config,
        })
    }
}

impl<C> Default for SystemBuilder<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// A compiled system together with the configuration it was built with.
#[derive(Debug)]
pub struct Composition<C> {
    initializer: Initializer<C>,
    config: KeelConfig,
}

impl<C> Composition<C> {
    /// Returns the underlying initializer.
    #[must_use]
    pub const fn initializer(&self) -> &Initializer<C> {
        &self.initializer
    }

    /// Returns the start order.
    #[must_use]
    pub const fn order(&self) -> &TopologicalOrder {
        self.initializer.order()
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &KeelConfig {
        &self.config
    }

    /// Returns a coordinator configured with this composition's policies.
    #[must_use]
    pub const fn coordinator(&self) -> Coordinator {
        Coordinator::from_config(&self.config)
    }

    /// Constructs a fresh, unstarted system.
    ///
    /// # Errors
    ///
    /// Returns `MissingInput` or `ConstructionFailed`.
    pub fn init(&self, inputs: &ExternalInputs<C>) -> Result<System<C>> {
        self.initializer.init(inputs)
    }
}

impl<C: Lifecycle> Composition<C> {
    /// Constructs a fresh system and starts it.
    ///
    /// # Errors
    ///
    /// Returns `MissingInput`, `ConstructionFailed`, or `StartupFailed`.
    pub fn launch(&self, inputs: &ExternalInputs<C>) -> Result<System<C>> {
        let mut system = self.init(inputs)?;
        self.coordinator().start(&mut system)?;
        Ok(system)
    }
}

#[cfg(test)]
mod tests {
    use keel_common::config::{ExternalKeyPolicy, StopPolicy};
    use keel_common::error::{BoxError, KeelError};
    use keel_common::types::ComponentState;
    use keel_graph::Inputs;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Flag {
        name: String,
        on: bool,
    }

    impl Lifecycle for Flag {
        fn start(&mut self) -> std::result::Result<(), BoxError> {
            self.on = true;
            Ok(())
        }

        fn stop(&mut self) -> std::result::Result<(), BoxError> {
            self.on = false;
            Ok(())
        }
    }

    fn flag(name: &'static str) -> DependencySpec<Flag> {
        DependencySpec::new(name, move |_: &Inputs<'_, Flag>| {
            Ok::<_, BoxError>(Flag {
                name: name.to_owned(),
                on: false,
            })
        })
    }

    #[test]
    fn build_and_launch() {
        let composition = SystemBuilder::new()
            .component(flag("api").param("db"))
            .component(flag("db"))
            .build()
            .expect("build");
        let order: Vec<String> = composition.order().iter().map(ToString::to_string).collect();
        assert_eq!(order, vec!["db", "api"]);

        let mut system = composition.launch(&ExternalInputs::new()).expect("launch");
        assert_eq!(system.state("api"), Some(ComponentState::Started));
        composition.coordinator().stop(&mut system).expect("stop");
        assert!(system.iter().all(|(_, value)| !value.on));
    }

    #[test]
    fn undeclared_external_fails_under_declared_policy() {
        let err = SystemBuilder::new()
            .component(flag("db").param("url"))
            .build()
            .unwrap_err();
        assert!(matches!(err, KeelError::UnresolvedDependency { .. }), "got: {err}");
    }

    #[test]
    fn inferred_policy_accepts_any_external() {
        let config = KeelConfig {
            external_keys: ExternalKeyPolicy::Inferred,
            ..KeelConfig::default()
        };
        let composition = SystemBuilder::with_config(config)
            .component(flag("db").param("url"))
            .build()
            .expect("build");
        assert!(composition.initializer().required_inputs().contains("url"));

        let err = composition.init(&ExternalInputs::new()).unwrap_err();
        assert!(matches!(err, KeelError::MissingInput { .. }), "got: {err}");
    }

    #[test]
    fn declared_externals_are_bound() {
        let composition = SystemBuilder::new()
            .externals(["url", "unused"])
            .component(flag("db").param("url"))
            .build()
            .expect("build");
        let mut inputs = ExternalInputs::new();
        let _ = inputs.insert(
            "url".to_owned(),
            Flag {
                name: "url".into(),
                on: false,
            },
        );
        let system = composition.init(&inputs).expect("init");
        assert_eq!(system.len(), 1);
    }

    #[test]
    fn coordinator_inherits_config() {
        let config = KeelConfig {
            stop_policy: StopPolicy::Abort,
            ..KeelConfig::default()
        };
        let composition = SystemBuilder::<Flag>::with_config(config)
            .build()
            .expect("build");
        assert_eq!(composition.config().stop_policy, StopPolicy::Abort);
        let rendered = format!("{:?}", composition.coordinator());
        assert!(rendered.contains("Abort"), "got: {rendered}");
    }
}
