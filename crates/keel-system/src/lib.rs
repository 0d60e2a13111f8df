//! Component construction and lifecycle coordination for keel systems.
//!
//! [`compile`](compiler::compile) turns a validated graph into a reusable
//! [`Initializer`](compiler::Initializer); each `init` call builds a fresh
//! [`System`](system::System), which a [`Coordinator`](coordinator::Coordinator)
//! then starts in topological order and stops in reverse.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used, clippy::panic))]

pub mod compiler;
pub mod component;
pub mod coordinator;
pub mod event;
pub mod system;

pub use compiler::{ExternalInputs, Initializer, compile};
pub use component::Lifecycle;
pub use coordinator::{Coordinator, start, stop};
pub use event::{LifecycleEvent, Phase};
pub use system::System;
