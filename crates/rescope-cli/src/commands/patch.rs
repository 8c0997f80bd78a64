//! `rescope patch` command implementation.
//!
//! Renames the selected packages under a new scope and rewrites the
//! references between them, leaving the changes in the working tree.

use super::report::TracingReporter;
use super::{codes, finish, Failure};
use crate::git;
use miette::Result;
use rescope_core::pkg::RegistryClient;
use rescope_core::{fork_packages, Config, ForkOptions, PatchedEntry, Scope};

const UNSTAGED_MESSAGE: &str = "Please commit or stage changes before patching.";

/// Run the patch command.
pub fn run(config: &Config, scope: &str, patterns: &[String]) -> Result<()> {
    let outcome = fork(config, scope, patterns, UNSTAGED_MESSAGE);
    finish("patched", outcome, config.json_logs)
}

/// Validate input, check the working tree and run the fork.
pub(crate) fn fork(
    config: &Config,
    scope: &str,
    patterns: &[String],
    unstaged_message: &str,
) -> std::result::Result<Vec<PatchedEntry>, Failure> {
    let scope = Scope::parse(scope)?;

    if git::has_unstaged_changes(&config.cwd) {
        return Err(Failure::new(codes::GIT_UNSTAGED_CHANGES, unstaged_message));
    }

    let registry = RegistryClient::for_project(&config.cwd, config.registry.as_deref())
        .map_err(rescope_core::Error::from)?;
    tracing::debug!(registry = %registry.base_url(), "using registry");

    let options = ForkOptions::new(&config.cwd, scope).with_patterns(patterns.to_vec());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| Failure::new(codes::RUNTIME_FAILED, format!("Failed to start runtime: {e}")))?;

    let entries = runtime.block_on(fork_packages(&options, &registry, &TracingReporter))?;
    Ok(entries)
}
