//! Composing and running a small web stack with the keel SDK.
//!
//! Declares a database, a repository that depends on it through an alias,
//! and a server that depends on both the repository and external settings,
//! then starts and stops the whole system.
//!
//! Run with:
//! ```bash
//! RUST_LOG=debug cargo run -p keel-sdk --example web_stack
//! ```

use keel_sdk::prelude::*;

#[derive(Debug, Clone)]
enum Part {
    Settings { dsn: String, port: u16 },
    Database { dsn: String, connected: bool },
    Repository { store: Box<Part>, ready: bool },
    Server { repo: Box<Part>, port: u16, listening: bool },
}

impl Lifecycle for Part {
    fn start(&mut self) -> Result<(), BoxError> {
        match self {
            Self::Settings { .. } => {}
            Self::Database { dsn, connected } => {
                tracing::info!(%dsn, "opening database connection");
                *connected = true;
            }
            Self::Repository { store, ready } => {
                if !matches!(**store, Self::Database { connected: true, .. }) {
                    return Err("repository started before its database".into());
                }
                *ready = true;
            }
            Self::Server {
                repo,
                port,
                listening,
            } => {
                if !matches!(**repo, Self::Repository { ready: true, .. }) {
                    return Err("server started before its repository".into());
                }
                tracing::info!(port = *port, "server listening");
                *listening = true;
            }
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<(), BoxError> {
        match self {
            Self::Settings { .. } => {}
            Self::Database { connected, .. } => *connected = false,
            Self::Repository { ready, .. } => *ready = false,
            Self::Server { listening, .. } => *listening = false,
        }
        Ok(())
    }

    fn provide(&mut self, param: &ParamName, dependency: &Self) {
        match (self, param.as_str()) {
            (Self::Repository { store, .. }, "store")
            | (Self::Server { repo: store, .. }, "repo") => {
                **store = dependency.clone();
            }
            _ => {}
        }
    }
}

fn settings(inputs: &Inputs<'_, Part>) -> Result<(String, u16), BoxError> {
    match inputs.require("settings")? {
        Part::Settings { dsn, port } => Ok((dsn.clone(), *port)),
        other => Err(format!("expected settings, got {other:?}").into()),
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let composition = SystemBuilder::new()
        .external("settings")
        .component(
            DependencySpec::new("server", |inputs: &Inputs<'_, Part>| {
                let (_, port) = settings(inputs)?;
                Ok(Part::Server {
                    repo: Box::new(inputs.require("repo")?.clone()),
                    port,
                    listening: false,
                })
            })
            .params(["repo", "settings"]),
        )
        .component(
            DependencySpec::new("repo", |inputs: &Inputs<'_, Part>| {
                Ok(Part::Repository {
                    store: Box::new(inputs.require("store")?.clone()),
                    ready: false,
                })
            })
            .param_from("store", "database"),
        )
        .component(
            DependencySpec::new("database", |inputs: &Inputs<'_, Part>| {
                let (dsn, _) = settings(inputs)?;
                Ok(Part::Database {
                    dsn,
                    connected: false,
                })
            })
            .param("settings"),
        )
        .build()?;

    tracing::info!(order = ?composition.order().as_slice(), "start order");

    let mut inputs = ExternalInputs::new();
    let _ = inputs.insert(
        "settings".to_owned(),
        Part::Settings {
            dsn: "postgres://localhost/app".into(),
            port: 8080,
        },
    );

    let mut coordinator = composition.coordinator().with_listener(|event| {
        if let LifecycleEvent::Transition { component, from, to } = event {
            tracing::info!(%component, %from, %to, "transition");
        }
    });

    let mut system = composition.init(&inputs)?;
    coordinator.start(&mut system)?;
    tracing::info!(server = ?system.get("server"), "system running");
    coordinator.stop(&mut system)?;

    tracing::info!("=== web stack demo complete ===");
    Ok(())
}
