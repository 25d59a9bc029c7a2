//! Test utilities for runner types
//!
//! Provides `sh -c` stand-ins for real scripts.

use super::{LaunchSpec, ScriptResolver};

/// Creates a launch spec running `script` through `sh -c`.
pub fn shell_spec(script: &str) -> LaunchSpec {
    LaunchSpec::new("sh", vec!["-c".to_string(), script.to_string()])
}

/// Creates a resolver whose commands are shell snippets.
///
/// # Arguments
/// * `entries` - `(command name, shell script)` pairs
pub fn shell_resolver(entries: &[(&str, &str)]) -> ScriptResolver {
    entries
        .iter()
        .fold(ScriptResolver::new(), |resolver, (name, script)| {
            resolver.with(*name, shell_spec(script))
        })
}
