//! `keel plan` — Display the start and stop order of a manifest.

use std::path::Path;

use clap::{Args, ValueEnum};
use keel_sdk::graph_resolver::GraphResolver;

use crate::output;

/// Output format for the plan.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// Human-readable listing.
    #[default]
    Text,
    /// Graphviz DOT of the dependency graph.
    Dot,
    /// Machine-readable JSON.
    Json,
}

/// Arguments for the `plan` command.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Path to the JSON or YAML manifest.
    #[arg(default_value = keel_common::constants::DEFAULT_MANIFEST)]
    pub file: String,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Text)]
    pub format: Format,
}

/// Executes the `plan` command.
///
/// Loads the manifest, builds the dependency graph, resolves the
/// topological order, and prints the plan.
///
/// # Errors
///
/// Returns an error if loading, validation, or resolution fails.
pub fn execute(args: &PlanArgs) -> anyhow::Result<()> {
    let resolver = GraphResolver::load(Path::new(&args.file))?;
    let rendered = render(&args.file, &resolver, args.format)?;
    println!("{rendered}");
    Ok(())
}

/// Renders a resolved plan in the requested format.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render(file: &str, resolver: &GraphResolver, format: Format) -> anyhow::Result<String> {
    Ok(match format {
        Format::Text => output::plan_text(file, resolver),
        Format::Dot => resolver.to_dot(),
        Format::Json => serde_json::to_string_pretty(&output::plan_json(resolver))?,
    })
}

#[cfg(test)]
mod tests {
    use keel_graph::manifest::Manifest;

    use super::*;

    fn resolver() -> GraphResolver {
        let manifest = Manifest::from_json_str(
            r#"{"components": [
                {"name": "api", "params": ["store"], "aliases": {"store": "db"}},
                {"name": "db", "params": ["dsn"]}
            ]}"#,
        )
        .expect("parse");
        GraphResolver::from_manifest(&manifest).expect("resolve")
    }

    #[test]
    fn text_plan_lists_order_and_wiring() {
        let text = render("keel.json", &resolver(), Format::Text).expect("render");
        assert!(text.contains("Plan for: keel.json"), "got: {text}");
        assert!(text.contains("1. db"), "got: {text}");
        assert!(text.contains("2. api"), "got: {text}");
        assert!(text.contains("external inputs: dsn"), "got: {text}");
    }

    #[test]
    fn json_plan_has_both_orders() {
        let json = render("keel.json", &resolver(), Format::Json).expect("render");
        let value: serde_json::Value = serde_json::from_str(&json).expect("json");
        assert_eq!(value["start"], serde_json::json!(["db", "api"]));
        assert_eq!(value["stop"], serde_json::json!(["api", "db"]));
        assert_eq!(value["externals"], serde_json::json!(["dsn"]));
    }

    #[test]
    fn dot_plan_is_graphviz() {
        let dot = render("keel.json", &resolver(), Format::Dot).expect("render");
        assert!(dot.starts_with("digraph"), "got: {dot}");
    }
}
