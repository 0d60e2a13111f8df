//! Domain primitive types used across the keel workspace.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! name_type {
    ($(#[$meta:meta])* $ty:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $ty(String);

        impl $ty {
            /// Creates a name from a string value.
            #[must_use]
            pub fn new(name: impl Into<String>) -> Self {
                Self(name.into())
            }

            /// Returns the inner string representation.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl Borrow<str> for $ty {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $ty {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $ty {
            fn from(name: &str) -> Self {
                Self(name.to_owned())
            }
        }

        impl From<String> for $ty {
            fn from(name: String) -> Self {
                Self(name)
            }
        }

        impl PartialEq<str> for $ty {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $ty {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }
    };
}

name_type!(
    /// Unique name of a component within one system.
    ComponentName
);

name_type!(
    /// Name of a constructor parameter, as the constructor sees it.
    ParamName
);

/// Lifecycle state of a single component inside a system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentState {
    /// Constructed by the initializer, never started.
    Constructed,
    /// Start hook completed successfully.
    Started,
    /// Stop hook was invoked (successfully or not).
    Stopped,
    /// Start hook failed; the component is treated as not started.
    Failed,
}

impl ComponentState {
    /// Returns whether a stop pass should consider this component running.
    #[must_use]
    pub const fn is_started(self) -> bool {
        matches!(self, Self::Started)
    }
}

impl fmt::Display for ComponentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constructed => write!(f, "constructed"),
            Self::Started => write!(f, "started"),
            Self::Stopped => write!(f, "stopped"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn component_name_looks_up_by_str() {
        let mut map = HashMap::new();
        let _ = map.insert(ComponentName::new("db"), 1);
        assert_eq!(map.get("db"), Some(&1));
    }

    #[test]
    fn component_name_serializes_as_plain_string() {
        let json = serde_json::to_string(&ComponentName::new("api")).expect("serialize");
        assert_eq!(json, "\"api\"");
    }

    #[test]
    fn state_display() {
        assert_eq!(ComponentState::Started.to_string(), "started");
        assert!(ComponentState::Started.is_started());
        assert!(!ComponentState::Failed.is_started());
    }
}
