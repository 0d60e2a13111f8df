//! The lifecycle capability components may implement.

use keel_common::error::BoxError;
use keel_common::types::ParamName;

/// Start/stop capability of a component.
///
/// Every hook has a no-op default, so a plain value only needs an empty
/// `impl Lifecycle for T {}` to take part in a system: it is treated as
/// always started and ignores stop.
///
/// Hooks update the component in place. A hook that fails leaves the
/// component in whatever state it reached; cleaning up partial side effects
/// is the hook's own responsibility.
pub trait Lifecycle {
    /// Starts the component. Called after all of its dependencies started.
    ///
    /// # Errors
    ///
    /// Returns an error if the component cannot start.
    fn start(&mut self) -> Result<(), BoxError> {
        Ok(())
    }

    /// Stops the component. Called before any of its dependencies stop.
    ///
    /// # Errors
    ///
    /// Returns an error if the component cannot stop cleanly.
    fn stop(&mut self) -> Result<(), BoxError> {
        Ok(())
    }

    /// Replaces the value this component holds for `param` with the
    /// dependency's current value.
    ///
    /// Called for every component-bound parameter before the component
    /// starts, and again after each pass that changed dependency values.
    /// Components that hold no copies of their dependencies can ignore it.
    fn provide(&mut self, param: &ParamName, dependency: &Self)
    where
        Self: Sized,
    {
        let _ = (param, dependency);
    }
}
