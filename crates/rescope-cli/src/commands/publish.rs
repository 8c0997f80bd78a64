//! `rescope publish` command implementation.
//!
//! Patches the selected packages, runs `npm publish` in each one, then
//! reverts the patch with git.

use super::{codes, finish, patch, Failure};
use crate::git;
use miette::Result;
use rescope_core::{Config, PatchedEntry};
use std::path::Path;
use std::process::{Command, Stdio};

const UNSTAGED_MESSAGE: &str = "Please commit or stage changes before patching, \
     rescope resets the patches using git after publishing.";

/// Run the publish command.
pub fn run(config: &Config, scope: &str, patterns: &[String], public: bool) -> Result<()> {
    let outcome = publish(config, scope, patterns, public);
    finish("published", outcome, config.json_logs)
}

fn publish(
    config: &Config,
    scope: &str,
    patterns: &[String],
    public: bool,
) -> std::result::Result<Vec<PatchedEntry>, Failure> {
    // Resolve npm before touching any file
    let npm = which::which("npm").map_err(|e| {
        Failure::new(codes::PUBLISH_NPM_MISSING, format!("npm not found on PATH: {e}"))
    })?;

    let entries = patch::fork(config, scope, patterns, UNSTAGED_MESSAGE)?;

    for entry in &entries {
        publish_entry(&npm, entry, public)?;
    }

    git::reset_worktree(&config.cwd)?;
    Ok(entries)
}

/// `npm publish` arguments.
fn publish_args(public: bool) -> Vec<&'static str> {
    let mut args = vec!["publish"];
    if public {
        args.extend(["--access", "public"]);
    }
    args
}

fn publish_entry(npm: &Path, entry: &PatchedEntry, public: bool) -> std::result::Result<(), Failure> {
    tracing::info!(
        package = %entry.patched_name,
        version = %entry.patched_version,
        original = %entry.original_name,
        "publishing"
    );

    // npm output goes to stderr so stdout stays a single result
    let status = Command::new(npm)
        .args(publish_args(public))
        .current_dir(&entry.package_dir)
        .stdin(Stdio::null())
        .stdout(std::io::stderr())
        .stderr(Stdio::inherit())
        .status()
        .map_err(|e| Failure::new(codes::PUBLISH_FAILED, format!("Failed to run npm: {e}")))?;

    if !status.success() {
        let code = status
            .code()
            .map_or_else(|| "signal".to_string(), |c| c.to_string());
        return Err(Failure::new(
            codes::PUBLISH_FAILED,
            format!(
                "npm publish failed for {}@{} (exit code {code})",
                entry.patched_name, entry.patched_version
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_args() {
        assert_eq!(publish_args(false), vec!["publish"]);
        assert_eq!(publish_args(true), vec!["publish", "--access", "public"]);
    }
}
