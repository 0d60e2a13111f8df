//! Per-component declarations.
//!
//! A [`DependencySpec`] names a component, the constructor that builds it,
//! the ordered parameters the constructor needs, and optional aliases that
//! resolve a parameter against a differently named component or external
//! input.

use std::collections::BTreeMap;
use std::fmt;

use keel_common::error::BoxError;
use keel_common::types::{ComponentName, ParamName};

/// Boxed constructor invoked once per initialization.
pub type Constructor<C> = Box<dyn Fn(&Inputs<'_, C>) -> Result<C, BoxError>>;

/// Static declaration of a single component.
pub struct DependencySpec<C> {
    name: ComponentName,
    construct: Constructor<C>,
    params: Vec<ParamName>,
    aliases: BTreeMap<ParamName, String>,
}

impl<C> DependencySpec<C> {
    /// Creates a spec with no parameters.
    pub fn new<F>(name: impl Into<ComponentName>, construct: F) -> Self
    where
        F: Fn(&Inputs<'_, C>) -> Result<C, BoxError> + 'static,
    {
        Self {
            name: name.into(),
            construct: Box::new(construct),
            params: Vec::new(),
            aliases: BTreeMap::new(),
        }
    }

    /// Declares a parameter resolved against the key of the same name.
    ///
    /// Declaring the same parameter twice has no effect.
    #[must_use]
    pub fn param(mut self, param: impl Into<ParamName>) -> Self {
        let param = param.into();
        if !self.params.contains(&param) {
            self.params.push(param);
        }
        self
    }

    /// Declares several parameters in order.
    #[must_use]
    pub fn params<I, P>(self, params: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<ParamName>,
    {
        params.into_iter().fold(self, |spec, param| spec.param(param))
    }

    /// Resolves an already declared parameter against `key` instead of its
    /// own name.
    ///
    /// Aliasing a parameter that is never declared is reported as
    /// `InvalidAlias` when the graph is built.
    #[must_use]
    pub fn alias(mut self, param: impl Into<ParamName>, key: impl Into<String>) -> Self {
        let _ = self.aliases.insert(param.into(), key.into());
        self
    }

    /// Declares a parameter and aliases it to `key` in one step.
    #[must_use]
    pub fn param_from(self, param: impl Into<ParamName>, key: impl Into<String>) -> Self {
        let param = param.into();
        self.param(param.clone()).alias(param, key)
    }

    /// Returns the component name.
    #[must_use]
    pub const fn name(&self) -> &ComponentName {
        &self.name
    }

    /// Returns the declared parameters in declaration order.
    #[must_use]
    pub fn declared_params(&self) -> &[ParamName] {
        &self.params
    }

    /// Returns the alias map.
    #[must_use]
    pub const fn aliases(&self) -> &BTreeMap<ParamName, String> {
        &self.aliases
    }

    /// Returns the key a parameter is resolved against.
    #[must_use]
    pub fn source_key<'a>(&'a self, param: &'a ParamName) -> &'a str {
        self.aliases
            .get(param)
            .map_or_else(|| param.as_str(), String::as_str)
    }

    /// Invokes the constructor.
    ///
    /// # Errors
    ///
    /// Returns whatever error the constructor reports.
    pub fn construct(&self, inputs: &Inputs<'_, C>) -> Result<C, BoxError> {
        (self.construct)(inputs)
    }
}

impl<C> fmt::Debug for DependencySpec<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependencySpec")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("aliases", &self.aliases)
            .finish_non_exhaustive()
    }
}

/// Named arguments handed to a constructor.
///
/// Every declared parameter is bound, in declaration order, to either an
/// already constructed component or an external input value.
pub struct Inputs<'a, C> {
    bindings: Vec<(&'a ParamName, &'a C)>,
}

impl<'a, C> Inputs<'a, C> {
    /// Creates the argument mapping from ordered parameter bindings.
    #[must_use]
    pub const fn new(bindings: Vec<(&'a ParamName, &'a C)>) -> Self {
        Self { bindings }
    }

    /// Returns the value bound to `param`, if declared.
    #[must_use]
    pub fn get(&self, param: &str) -> Option<&'a C> {
        self.bindings
            .iter()
            .find(|(name, _)| name.as_str() == param)
            .map(|&(_, value)| value)
    }

    /// Returns the value bound to `param`.
    ///
    /// # Errors
    ///
    /// Returns an error if the constructor asks for a parameter its spec
    /// never declared.
    pub fn require(&self, param: &str) -> Result<&'a C, BoxError> {
        self.get(param)
            .ok_or_else(|| format!("parameter \"{param}\" is not declared").into())
    }

    /// Iterates over the bindings in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&'a ParamName, &'a C)> + '_ {
        self.bindings.iter().copied()
    }

    /// Returns the number of bound parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Returns `true` if the constructor takes no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl<C: fmt::Debug> fmt::Debug for Inputs<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.bindings.iter().copied()).finish()
    }
}
