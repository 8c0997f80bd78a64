//! Progress reporting for fork runs.

use super::entries::PatchedEntry;
use std::path::Path;

/// Receives progress events from a fork run.
///
/// Every method defaults to doing nothing, so implementors override only
/// the events they care about.
pub trait ForkReporter {
    /// A selected package was skipped because it is private.
    fn package_skipped(&self, _dir: &Path) {}

    /// A package was planned and added to the entry map.
    fn package_planned(&self, _entry: &PatchedEntry) {}

    /// A package.json was rewritten.
    fn manifest_patched(&self, _entry: &PatchedEntry, _path: &Path) {}

    /// A script was rewritten with `_rewrites` changed specifiers.
    fn script_patched(&self, _path: &Path, _rewrites: usize) {}
}

/// Reporter that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentReporter;

impl ForkReporter for SilentReporter {}
