//! Package selection.
//!
//! Turns `--package` patterns into the package directories a run plans.
//! Without patterns the root package is the only candidate. With patterns,
//! a project that declares workspaces matches them against member names;
//! any other project matches them as directory globs under the root.

use crate::error::Error;
use crate::pkg::{detect_workspaces, PackageManifest, MANIFEST_FILE};
use glob::{MatchOptions, Pattern};
use std::path::{Path, PathBuf};

/// How a group of candidates was selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorKind {
    /// No patterns: the root package itself.
    Root,
    /// Pattern matched against workspace member names.
    Workspace,
    /// Pattern matched as a directory glob relative to the root.
    Directory,
}

/// Candidate directories produced by one selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorGroup {
    pub kind: SelectorKind,
    /// The pattern, absent for [`SelectorKind::Root`].
    pub pattern: Option<String>,
    pub paths: Vec<PathBuf>,
}

impl SelectorGroup {
    /// Error for a pattern none of whose candidates produced an entry.
    #[must_use]
    pub fn unsatisfied(&self) -> Error {
        let pattern = self.pattern.clone().unwrap_or_default();
        match self.kind {
            SelectorKind::Root => Error::NothingToPatch,
            SelectorKind::Workspace => Error::NoWorkspaceMatch { pattern },
            SelectorKind::Directory => Error::NoDirectoryMatch { pattern },
        }
    }
}

const NAME_MATCH: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Resolve selector patterns into candidate groups, one per pattern.
///
/// A pattern that matches nothing is a usage error, as is a workspace
/// package name declared by two members.
pub fn resolve_candidates(
    root: &PackageManifest,
    patterns: &[String],
) -> Result<Vec<SelectorGroup>, Error> {
    if patterns.is_empty() {
        return Ok(vec![SelectorGroup {
            kind: SelectorKind::Root,
            pattern: None,
            paths: vec![root.dir().to_path_buf()],
        }]);
    }

    match detect_workspaces(root)? {
        Some(workspaces) => patterns
            .iter()
            .map(|pattern| {
                let glob = Pattern::new(pattern).ok();
                let paths: Vec<PathBuf> = workspaces
                    .members
                    .values()
                    .filter(|m| {
                        m.name == *pattern
                            || glob
                                .as_ref()
                                .is_some_and(|g| g.matches_with(&m.name, NAME_MATCH))
                    })
                    .map(|m| m.path.clone())
                    .collect();

                if paths.is_empty() {
                    return Err(Error::NoWorkspaceMatch {
                        pattern: pattern.clone(),
                    });
                }

                Ok(SelectorGroup {
                    kind: SelectorKind::Workspace,
                    pattern: Some(pattern.clone()),
                    paths,
                })
            })
            .collect(),
        None => patterns
            .iter()
            .map(|pattern| {
                let paths = match_directories(root, pattern);
                if paths.is_empty() {
                    return Err(Error::NoDirectoryMatch {
                        pattern: pattern.clone(),
                    });
                }

                Ok(SelectorGroup {
                    kind: SelectorKind::Directory,
                    pattern: Some(pattern.clone()),
                    paths,
                })
            })
            .collect(),
    }
}

/// Package directories under the root matching a directory glob.
fn match_directories(root: &PackageManifest, pattern: &str) -> Vec<PathBuf> {
    let relative = pattern.trim_start_matches("./").trim_end_matches('/');
    let full = Path::new(&Pattern::escape(&root.dir().to_string_lossy())).join(relative);

    let Ok(entries) = glob::glob(&full.to_string_lossy()) else {
        return Vec::new();
    };

    entries
        .flatten()
        .filter(|path| path.is_dir() && path.join(MANIFEST_FILE).is_file())
        .collect()
}
