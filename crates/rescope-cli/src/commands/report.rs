//! Fork progress as tracing events.

use rescope_core::{ForkReporter, PatchedEntry};
use std::path::Path;
use tracing::{debug, info};

/// Reporter that logs fork progress through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl ForkReporter for TracingReporter {
    fn package_skipped(&self, dir: &Path) {
        debug!(dir = %dir.display(), "skipping private package");
    }

    fn package_planned(&self, entry: &PatchedEntry) {
        info!(
            original = %entry.original_name,
            patched = %entry.patched_name,
            version = %entry.patched_version,
            files = entry.files.len(),
            "planned fork"
        );
    }

    fn manifest_patched(&self, entry: &PatchedEntry, path: &Path) {
        debug!(package = %entry.patched_name, path = %path.display(), "patched manifest");
    }

    fn script_patched(&self, path: &Path, rewrites: usize) {
        debug!(path = %path.display(), rewrites, "patched script");
    }
}
