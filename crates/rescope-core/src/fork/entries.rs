//! Entry map construction.
//!
//! Every selected package is planned before any file is rewritten, so the
//! finished [`EntryMap`] is the single table both rewriters read from.

use super::plan::plan_identity;
use super::report::ForkReporter;
use super::scope::Scope;
use super::select::SelectorGroup;
use crate::error::Error;
use crate::pkg::{list_package_files, ManifestSource, PackageManifest};
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;

/// Planned fork of one package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchedEntry {
    pub original_name: String,
    pub original_version: String,
    pub patched_name: String,
    pub patched_version: String,
    /// Package root directory.
    pub package_dir: PathBuf,
    /// Published files, relative to `package_dir`.
    pub files: Vec<String>,
}

/// Original package name -> planned fork, in planning order.
#[derive(Debug, Clone, Default)]
pub struct EntryMap {
    entries: Vec<PatchedEntry>,
    by_name: HashMap<String, usize>,
}

impl EntryMap {
    /// Build a map from entries, rejecting names that appear twice.
    pub fn from_entries(entries: impl IntoIterator<Item = PatchedEntry>) -> Result<Self, Error> {
        let mut map = Self::default();
        for entry in entries {
            map.insert(entry)?;
        }
        Ok(map)
    }

    fn insert(&mut self, entry: PatchedEntry) -> Result<(), Error> {
        if let Some(&i) = self.by_name.get(&entry.original_name) {
            return Err(Error::DuplicatePackage {
                name: entry.original_name,
                first: self.entries[i].package_dir.clone(),
                second: entry.package_dir,
            });
        }

        if let Some(other) = self
            .entries
            .iter()
            .find(|e| e.patched_name == entry.patched_name)
        {
            return Err(Error::NameCollision {
                patched: entry.patched_name,
                first: other.original_name.clone(),
                second: entry.original_name,
            });
        }

        self.by_name
            .insert(entry.original_name.clone(), self.entries.len());
        self.entries.push(entry);
        Ok(())
    }

    /// Look up the fork of an original package name.
    #[must_use]
    pub fn get(&self, original_name: &str) -> Option<&PatchedEntry> {
        self.by_name.get(original_name).map(|&i| &self.entries[i])
    }

    #[must_use]
    pub fn contains(&self, original_name: &str) -> bool {
        self.by_name.contains_key(original_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PatchedEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn into_entries(self) -> Vec<PatchedEntry> {
        self.entries
    }
}

/// Plan every candidate and assemble the entry map.
///
/// A directory reached through several patterns is planned once. A pattern
/// none of whose directories yields a non-private package is reported the
/// same way as a pattern that matched nothing.
pub async fn build_entry_map<S, R>(
    groups: &[SelectorGroup],
    scope: &Scope,
    source: &S,
    reporter: &R,
) -> Result<EntryMap, Error>
where
    S: ManifestSource,
    R: ForkReporter + ?Sized,
{
    let mut map = EntryMap::default();
    // canonical dir -> whether it produced an entry
    let mut visited: HashMap<PathBuf, bool> = HashMap::new();

    for group in groups {
        let mut satisfied = false;

        for dir in &group.paths {
            let key = dunce::canonicalize(dir).unwrap_or_else(|_| dir.clone());
            if let Some(&produced) = visited.get(&key) {
                satisfied |= produced;
                continue;
            }

            let manifest = PackageManifest::load(dir)?;
            let produced = match plan_identity(&manifest, scope, source).await? {
                Some(planned) => {
                    let entry = PatchedEntry {
                        original_name: planned.original_name,
                        original_version: planned.original_version,
                        patched_name: planned.patched_name,
                        patched_version: planned.patched_version,
                        package_dir: dir.clone(),
                        files: list_package_files(&manifest)?,
                    };
                    reporter.package_planned(&entry);
                    map.insert(entry)?;
                    true
                }
                None => {
                    reporter.package_skipped(dir);
                    false
                }
            };

            visited.insert(key, produced);
            satisfied |= produced;
        }

        if !satisfied {
            return Err(group.unsatisfied());
        }
    }

    if map.is_empty() {
        return Err(Error::NothingToPatch);
    }

    Ok(map)
}
