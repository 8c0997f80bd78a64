//! Published file list for a package.
//!
//! Follows npm's packing rules closely enough to decide which files a forked
//! package ships:
//! - `package.json`, README, LICENSE/LICENCE, COPYING, CHANGELOG and the
//!   `main` file are always included
//! - a `files` array is an allow-list (`!pattern` entries exclude)
//! - without `files`, everything is included except the always-ignored set and
//!   the patterns in `.npmignore` (or `.gitignore` when there is no `.npmignore`)
//!
//! Paths are relative to the package root, `/`-separated and sorted.

use super::manifest::{PackageManifest, MANIFEST_FILE};
use crate::error::Error;
use glob::{MatchOptions, Pattern};
use std::path::Path;
use walkdir::WalkDir;

/// Directories never descended into.
const IGNORED_DIRS: &[&str] = &["node_modules", ".git", ".svn", ".hg", "CVS"];

/// File names never packed.
const IGNORED_FILES: &[&str] = &[
    ".npmrc",
    ".npmignore",
    ".gitignore",
    ".DS_Store",
    "npm-debug.log",
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    ".lock-wscript",
    "config.gypi",
];

/// Top-level name stems that are always packed.
const ALWAYS_INCLUDED_STEMS: &[&str] = &["readme", "license", "licence", "copying", "changelog"];

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// List the files a package publishes.
pub fn list_package_files(manifest: &PackageManifest) -> Result<Vec<String>, Error> {
    let root = manifest.dir();
    let main = manifest.main().map(normalize_entry);
    let selector = match manifest.files() {
        Some(entries) => Selector::AllowList(FileRules::from_files_field(&entries)),
        None => Selector::IgnoreList(FileRules::from_ignore_file(root)),
    };

    let mut files = Vec::new();
    for rel in walk_files(root)? {
        if is_ignored_file(&rel) {
            continue;
        }

        let keep = is_always_included(&rel)
            || main.as_deref() == Some(rel.as_str())
            || match &selector {
                Selector::AllowList(rules) => rules.matches(&rel) == Some(true),
                Selector::IgnoreList(rules) => rules.matches(&rel) != Some(true),
            };

        if keep {
            files.push(rel);
        }
    }

    files.sort();
    Ok(files)
}

enum Selector {
    AllowList(FileRules),
    IgnoreList(FileRules),
}

/// Walk every regular file under `root`, skipping ignored directories.
fn walk_files(root: &Path) -> Result<Vec<String>, Error> {
    let mut files = Vec::new();

    let walker = WalkDir::new(root).follow_links(false).into_iter().filter_entry(|e| {
        e.depth() == 0
            || !(e.file_type().is_dir()
                && IGNORED_DIRS.contains(&e.file_name().to_string_lossy().as_ref()))
    });

    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            Error::io(path, e.into())
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        if let Ok(rel) = entry.path().strip_prefix(root) {
            let rel = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            files.push(rel);
        }
    }

    Ok(files)
}

fn is_ignored_file(rel: &str) -> bool {
    let base = rel.rsplit('/').next().unwrap_or(rel);
    IGNORED_FILES.contains(&base)
        || base.ends_with(".orig")
        || base.starts_with("._")
        || (base.starts_with('.') && base.ends_with(".swp"))
        || base.starts_with(".wafpickle-")
}

fn is_always_included(rel: &str) -> bool {
    if rel == MANIFEST_FILE {
        return true;
    }
    if rel.contains('/') {
        return false;
    }
    let stem = rel.split('.').next().unwrap_or(rel).to_ascii_lowercase();
    ALWAYS_INCLUDED_STEMS.contains(&stem.as_str())
}

fn normalize_entry(entry: &str) -> String {
    entry.trim().trim_start_matches("./").trim_end_matches('/').to_string()
}

/// One glob rule from `files` or an ignore file.
#[derive(Debug)]
struct FileRule {
    pattern: Pattern,
    /// Prefix test for literal entries (`lib` matches `lib/x.js`).
    literal: String,
    negated: bool,
    /// Pattern contains a `/` and only matches from the package root.
    anchored: bool,
    /// Pattern ended with `/` and only matches directories.
    dir_only: bool,
}

impl FileRule {
    fn parse(line: &str, anchor_all: bool) -> Option<Self> {
        let mut line = line.trim();
        let negated = line.starts_with('!');
        if negated {
            line = &line[1..];
        }

        let dir_only = line.ends_with('/');
        let anchored = anchor_all || line.trim_end_matches('/').contains('/');
        let literal = normalize_entry(line.trim_start_matches('/'));
        if literal.is_empty() {
            return None;
        }
        let pattern = Pattern::new(&literal).ok()?;

        Some(Self {
            pattern,
            literal,
            negated,
            anchored,
            dir_only,
        })
    }

    fn matches(&self, rel: &str) -> bool {
        let parts: Vec<&str> = rel.split('/').collect();

        if self.anchored {
            if !self.dir_only && (rel == self.literal || self.pattern.matches_with(rel, MATCH_OPTIONS))
            {
                return true;
            }
            // Any ancestor directory matching pulls in everything beneath it
            (1..parts.len()).any(|n| {
                let prefix = parts[..n].join("/");
                prefix == self.literal || self.pattern.matches_with(&prefix, MATCH_OPTIONS)
            })
        } else {
            let dirs = &parts[..parts.len() - 1];
            let base = parts[parts.len() - 1];
            dirs.iter()
                .any(|d| self.pattern.matches_with(d, MATCH_OPTIONS))
                || (!self.dir_only && self.pattern.matches_with(base, MATCH_OPTIONS))
        }
    }
}

/// Ordered rules where the last matching rule decides.
#[derive(Debug, Default)]
struct FileRules {
    rules: Vec<FileRule>,
}

impl FileRules {
    /// `files` entries are anchored to the package root.
    fn from_files_field(entries: &[&str]) -> Self {
        Self {
            rules: entries
                .iter()
                .filter_map(|e| FileRule::parse(e, true))
                .collect(),
        }
    }

    fn from_ignore_file(root: &Path) -> Self {
        let content = std::fs::read_to_string(root.join(".npmignore"))
            .or_else(|_| std::fs::read_to_string(root.join(".gitignore")))
            .unwrap_or_default();

        Self {
            rules: content
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty() && !l.starts_with('#'))
                .filter_map(|l| FileRule::parse(l, false))
                .collect(),
        }
    }

    /// `Some(true)` if the last matching rule is positive, `Some(false)` if it
    /// is a negation, `None` if no rule matches.
    fn matches(&self, rel: &str) -> Option<bool> {
        self.rules
            .iter()
            .rev()
            .find(|r| r.matches(rel))
            .map(|r| !r.negated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    fn list(root: &Path, manifest: &str) -> Vec<String> {
        fs::write(root.join("package.json"), manifest).unwrap();
        let manifest = PackageManifest::load(root).unwrap();
        list_package_files(&manifest).unwrap()
    }

    #[test]
    fn test_files_allow_list() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "lib/index.js");
        touch(dir.path(), "lib/util/merge.mjs");
        touch(dir.path(), "src/index.ts");
        touch(dir.path(), "README.md");
        touch(dir.path(), "LICENSE");
        touch(dir.path(), "test/index.test.js");

        let files = list(dir.path(), r#"{"name": "x", "version": "1.0.0", "files": ["lib/"]}"#);
        assert_eq!(
            files,
            vec![
                "LICENSE",
                "README.md",
                "lib/index.js",
                "lib/util/merge.mjs",
                "package.json"
            ]
        );
    }

    #[test]
    fn test_files_globs_and_negation() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "index.js");
        touch(dir.path(), "cli.cjs");
        touch(dir.path(), "dist/a.js");
        touch(dir.path(), "dist/a.test.js");

        let files = list(
            dir.path(),
            r#"{"name": "x", "version": "1.0.0", "files": ["*.js", "dist", "!dist/*.test.js"]}"#,
        );
        assert_eq!(files, vec!["dist/a.js", "index.js", "package.json"]);
    }

    #[test]
    fn test_main_always_included() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "main.js");
        touch(dir.path(), "other.js");

        let files = list(
            dir.path(),
            r#"{"name": "x", "version": "1.0.0", "main": "./main.js", "files": []}"#,
        );
        assert_eq!(files, vec!["main.js", "package.json"]);
    }

    #[test]
    fn test_default_excludes_node_modules_and_junk() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "index.js");
        touch(dir.path(), "node_modules/dep/index.js");
        touch(dir.path(), ".git/HEAD");
        touch(dir.path(), ".npmrc");
        touch(dir.path(), "package-lock.json");

        let files = list(dir.path(), r#"{"name": "x", "version": "1.0.0"}"#);
        assert_eq!(files, vec!["index.js", "package.json"]);
    }

    #[test]
    fn test_npmignore_rules() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "index.js");
        touch(dir.path(), "test/a.js");
        touch(dir.path(), "src/test/b.js");
        touch(dir.path(), "docs/guide.md");
        touch(dir.path(), "docs/keep.md");
        fs::write(
            dir.path().join(".npmignore"),
            "# dev only\ntest/\n/docs/*\n!docs/keep.md\n",
        )
        .unwrap();

        let files = list(dir.path(), r#"{"name": "x", "version": "1.0.0"}"#);
        assert_eq!(files, vec!["docs/keep.md", "index.js", "package.json"]);
    }

    #[test]
    fn test_gitignore_used_without_npmignore() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "index.js");
        touch(dir.path(), "coverage/lcov.info");
        fs::write(dir.path().join(".gitignore"), "coverage\n").unwrap();

        let files = list(dir.path(), r#"{"name": "x", "version": "1.0.0"}"#);
        assert_eq!(files, vec!["index.js", "package.json"]);
    }
}
