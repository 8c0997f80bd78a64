//! Fork run orchestration: select, plan, then rewrite.

use super::entries::{build_entry_map, EntryMap, PatchedEntry};
use super::manifest::patch_manifest;
use super::report::ForkReporter;
use super::scope::Scope;
use super::script::{is_script_file, patch_script};
use super::select::resolve_candidates;
use crate::error::Error;
use crate::pkg::{ManifestSource, PackageManifest, MANIFEST_FILE};
use std::path::PathBuf;

/// Options for a fork run.
#[derive(Debug, Clone)]
pub struct ForkOptions {
    /// Project root holding the root package.json.
    pub root: PathBuf,
    /// Scope the packages are forked under.
    pub scope: Scope,
    /// Package name or directory patterns; empty selects the root package.
    pub patterns: Vec<String>,
}

impl ForkOptions {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, scope: Scope) -> Self {
        Self {
            root: root.into(),
            scope,
            patterns: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_patterns(mut self, patterns: Vec<String>) -> Self {
        self.patterns = patterns;
        self
    }
}

/// Select and plan every package of a run. Touches no file.
pub async fn plan_fork<S, R>(
    options: &ForkOptions,
    source: &S,
    reporter: &R,
) -> Result<EntryMap, Error>
where
    S: ManifestSource,
    R: ForkReporter + ?Sized,
{
    let root = PackageManifest::load(&options.root)?;
    let groups = resolve_candidates(&root, &options.patterns)?;
    build_entry_map(&groups, &options.scope, source, reporter).await
}

/// Rewrite the manifest and scripts of every planned package.
///
/// Packages are processed in planning order and files in list order. The
/// first failure stops the run; files already written stay written.
pub fn apply_fork<R>(entries: &EntryMap, reporter: &R) -> Result<(), Error>
where
    R: ForkReporter + ?Sized,
{
    for entry in entries.iter() {
        for file in &entry.files {
            if file == MANIFEST_FILE {
                let path = patch_manifest(&entry.package_dir, entries)?;
                reporter.manifest_patched(entry, &path);
            } else if is_script_file(file) {
                let path = entry.package_dir.join(file);
                let rewrites = patch_script(&path, entries)?;
                if rewrites > 0 {
                    reporter.script_patched(&path, rewrites);
                }
            }
        }
    }

    Ok(())
}

/// Fork the selected packages and return their entries in planning order.
pub async fn fork_packages<S, R>(
    options: &ForkOptions,
    source: &S,
    reporter: &R,
) -> Result<Vec<PatchedEntry>, Error>
where
    S: ManifestSource,
    R: ForkReporter + ?Sized,
{
    let entries = plan_fork(options, source, reporter).await?;
    apply_fork(&entries, reporter)?;
    Ok(entries.into_entries())
}
