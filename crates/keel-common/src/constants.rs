//! System-wide constants.

/// Binary name for the CLI.
pub const BIN_NAME: &str = "keel";

/// Default manifest file looked up by the CLI.
pub const DEFAULT_MANIFEST: &str = "keel.json";

/// File extensions recognized as YAML manifests.
pub const YAML_EXTENSIONS: &[&str] = &["yaml", "yml"];
