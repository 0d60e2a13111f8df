//! Formatted output helpers for CLI commands.

use std::fmt::Write;

use keel_sdk::graph_resolver::GraphResolver;

const RULE_WIDTH: usize = 35;

/// Returns a horizontal rule of box-drawing characters.
#[must_use]
pub fn rule() -> String {
    "\u{2550}".repeat(RULE_WIDTH)
}

/// Renders a human-readable plan: start order with each component's
/// dependencies, then stop order and external inputs.
#[must_use]
pub fn plan_text(file: &str, resolver: &GraphResolver) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Plan for: {file}");
    let _ = writeln!(out, "{}", rule());
    let _ = writeln!(out, "\n  Start order:");
    for (step, name) in resolver.start_order().iter().enumerate() {
        let _ = writeln!(out, "    {}. {name}", step + 1);
        let deps = resolver.dependencies_of(name.as_str()).unwrap_or_default();
        if !deps.is_empty() {
            let deps: Vec<&str> = deps.iter().map(|d| d.as_str()).collect();
            let _ = writeln!(out, "         after: {}", deps.join(", "));
        }
    }

    let stop: Vec<&str> = resolver
        .stop_order()
        .into_iter()
        .map(|name| name.as_str())
        .collect();
    let _ = writeln!(out, "\n  Stop order: {}", stop.join(" -> "));

    if !resolver.external_keys().is_empty() {
        let keys: Vec<&str> = resolver.external_keys().iter().map(String::as_str).collect();
        let _ = writeln!(out, "\n  external inputs: {}", keys.join(", "));
    }

    let _ = write!(
        out,
        "\n  {} component(s) will be started.",
        resolver.start_order().len()
    );
    out
}

/// Builds the JSON document for `keel plan --format json`.
#[must_use]
pub fn plan_json(resolver: &GraphResolver) -> serde_json::Value {
    serde_json::json!({
        "start": resolver.start_order().as_slice(),
        "stop": resolver.stop_order(),
        "externals": resolver.external_keys(),
    })
}
