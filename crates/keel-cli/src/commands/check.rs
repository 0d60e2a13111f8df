//! `keel check` — Validate a manifest.

use std::path::Path;

use clap::Args;
use keel_sdk::graph_resolver::GraphResolver;

/// Arguments for the `check` command.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Path to the JSON or YAML manifest.
    #[arg(default_value = keel_common::constants::DEFAULT_MANIFEST)]
    pub file: String,
}

/// Executes the `check` command.
///
/// # Errors
///
/// Returns an error describing the first problem found: an unresolved
/// dependency, a cycle, a duplicate name, or an invalid alias.
pub fn execute(args: &CheckArgs) -> anyhow::Result<()> {
    let summary = check(Path::new(&args.file))?;
    println!("{summary}");
    Ok(())
}

fn check(path: &Path) -> anyhow::Result<String> {
    let resolver = GraphResolver::load(path).map_err(|e| {
        tracing::error!(path = %path.display(), error = %e, "manifest rejected");
        anyhow::anyhow!("{}: {e}", path.display())
    })?;
    Ok(format!(
        "ok: {} component(s), {} external input(s)",
        resolver.start_order().len(),
        resolver.external_keys().len()
    ))
}
