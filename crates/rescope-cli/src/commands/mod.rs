//! Subcommand implementations and their shared output handling.

pub mod patch;
pub mod publish;
pub mod report;
pub mod version;

use miette::{miette, Result};
use rescope_core::PatchedEntry;
use serde::Serialize;

/// Error codes raised by the CLI itself.
pub mod codes {
    pub const GIT_UNSTAGED_CHANGES: &str = "GIT_UNSTAGED_CHANGES";
    pub const GIT_RESET_FAILED: &str = "GIT_RESET_FAILED";
    pub const PUBLISH_NPM_MISSING: &str = "PUBLISH_NPM_MISSING";
    pub const PUBLISH_FAILED: &str = "PUBLISH_FAILED";
    pub const RUNTIME_FAILED: &str = "RUNTIME_FAILED";
}

/// A failed command, reported as one code and one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub code: &'static str,
    pub message: String,
}

impl Failure {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<rescope_core::Error> for Failure {
    fn from(e: rescope_core::Error) -> Self {
        Self::new(e.code(), e.to_string())
    }
}

/// One forked package as printed in JSON output.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PackageReport<'a> {
    original_name: &'a str,
    original_version: &'a str,
    patched_name: &'a str,
    patched_version: &'a str,
    package_dir: String,
    file_count: usize,
}

impl<'a> From<&'a PatchedEntry> for PackageReport<'a> {
    fn from(entry: &'a PatchedEntry) -> Self {
        Self {
            original_name: &entry.original_name,
            original_version: &entry.original_version,
            patched_name: &entry.patched_name,
            patched_version: &entry.patched_version,
            package_dir: entry.package_dir.to_string_lossy().into_owned(),
            file_count: entry.files.len(),
        }
    }
}

/// Print the outcome of a fork command.
///
/// Failures in JSON mode print `{"ok":false,...}` and exit with status 1;
/// otherwise they are returned as a diagnostic.
pub fn finish(
    verb: &str,
    outcome: std::result::Result<Vec<PatchedEntry>, Failure>,
    json: bool,
) -> Result<()> {
    match outcome {
        Ok(entries) => {
            if json {
                let packages: Vec<PackageReport<'_>> =
                    entries.iter().map(PackageReport::from).collect();
                println!(
                    "{}",
                    serde_json::json!({
                        "ok": true,
                        "packages": packages,
                    })
                );
            } else {
                for entry in &entries {
                    println!(
                        "{verb} {}@{} (originally {})",
                        entry.patched_name, entry.patched_version, entry.original_name
                    );
                }
            }
            Ok(())
        }
        Err(failure) => {
            if json {
                println!(
                    "{}",
                    serde_json::json!({
                        "ok": false,
                        "error": {
                            "code": failure.code,
                            "message": failure.message,
                        }
                    })
                );
                std::process::exit(1);
            }
            Err(miette!(code = failure.code, "{}", failure.message))
        }
    }
}
