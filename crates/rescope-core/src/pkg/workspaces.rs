//! Workspace support for monorepos.
//!
//! Expands the `workspaces` globs of a root package.json into the member
//! packages they name. Members are addressed by their package name.

use super::manifest::PackageManifest;
use crate::error::Error;
use glob::Pattern;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A discovered workspace member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceMember {
    /// Package name from the member's package.json
    pub name: String,
    /// Absolute path to the member directory
    pub path: PathBuf,
}

/// Workspace members of a root project.
#[derive(Debug, Clone, Default)]
pub struct WorkspaceConfig {
    /// Map of package name -> member, ordered by name
    pub members: BTreeMap<String, WorkspaceMember>,
}

impl WorkspaceConfig {
    /// Member names, in map order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.members.keys().map(String::as_str)
    }

    /// Get a member by package name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&WorkspaceMember> {
        self.members.get(name)
    }
}

/// Discover the workspace members declared by a root manifest.
///
/// Returns `None` if the project declares no workspaces. Declared globs that
/// match nothing give an empty member set.
///
/// # Errors
/// Two member directories declaring the same package name.
pub fn detect_workspaces(root: &PackageManifest) -> Result<Option<WorkspaceConfig>, Error> {
    let patterns = root.workspace_patterns();
    if patterns.is_empty() {
        return Ok(None);
    }

    let members = discover_members(root.dir(), &patterns)?;
    Ok(Some(WorkspaceConfig { members }))
}

/// Expand glob patterns and read each matched member.
fn discover_members(
    root: &Path,
    patterns: &[String],
) -> Result<BTreeMap<String, WorkspaceMember>, Error> {
    let mut members: BTreeMap<String, WorkspaceMember> = BTreeMap::new();
    let root_pattern = Pattern::escape(&root.to_string_lossy());

    for pattern in patterns {
        let full_pattern = Path::new(&root_pattern).join(pattern.trim_start_matches("./"));

        let Ok(entries) = glob::glob(&full_pattern.to_string_lossy()) else {
            continue;
        };
        for entry in entries.flatten() {
            let Some(member) = read_member(&entry) else {
                continue;
            };
            match members.entry(member.name.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(member);
                }
                // Overlapping globs reach the same directory twice
                Entry::Occupied(existing) if existing.get().path == member.path => {}
                Entry::Occupied(existing) => {
                    return Err(Error::DuplicatePackage {
                        name: member.name,
                        first: existing.get().path.clone(),
                        second: member.path,
                    });
                }
            }
        }
    }

    Ok(members)
}

/// Read a member directory's package name.
fn read_member(dir: &Path) -> Option<WorkspaceMember> {
    if !dir.is_dir() {
        return None;
    }

    let manifest = PackageManifest::load(dir).ok()?;
    let name = manifest.name()?.to_string();

    Some(WorkspaceMember {
        name,
        path: dir.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write_member(root: &Path, rel: &str, manifest: &str) {
        let dir = root.join(rel);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("package.json"), manifest).unwrap();
    }

    #[test]
    fn test_detect_workspaces_array_format() {
        let root = tempdir().unwrap();
        fs::write(
            root.path().join("package.json"),
            r#"{"name": "monorepo", "private": true, "workspaces": ["packages/*"]}"#,
        )
        .unwrap();
        write_member(
            root.path(),
            "packages/core",
            r#"{"name": "@origin/core", "version": "1.0.0"}"#,
        );
        write_member(
            root.path(),
            "packages/utils",
            r#"{"name": "@origin/utils", "version": "1.0.0"}"#,
        );

        let manifest = PackageManifest::load(root.path()).unwrap();
        let config = detect_workspaces(&manifest).unwrap().unwrap();
        assert_eq!(
            config.names().collect::<Vec<_>>(),
            vec!["@origin/core", "@origin/utils"]
        );
        assert_eq!(
            config.get("@origin/core").unwrap().path,
            root.path().join("packages/core")
        );
    }

    #[test]
    fn test_detect_workspaces_object_format() {
        let root = tempdir().unwrap();
        fs::write(
            root.path().join("package.json"),
            r#"{"name": "monorepo", "workspaces": {"packages": ["./libs/*"]}}"#,
        )
        .unwrap();
        write_member(root.path(), "libs/utils", r#"{"name": "utils"}"#);

        let manifest = PackageManifest::load(root.path()).unwrap();
        let config = detect_workspaces(&manifest).unwrap().unwrap();
        assert!(config.get("utils").is_some());
    }

    #[test]
    fn test_skips_unnamed_and_plain_files() {
        let root = tempdir().unwrap();
        fs::write(
            root.path().join("package.json"),
            r#"{"name": "monorepo", "workspaces": ["packages/*"]}"#,
        )
        .unwrap();
        write_member(root.path(), "packages/anonymous", r#"{"version": "1.0.0"}"#);
        fs::write(root.path().join("packages/README.md"), "# packages").unwrap();

        let manifest = PackageManifest::load(root.path()).unwrap();
        let config = detect_workspaces(&manifest).unwrap().unwrap();
        assert!(config.members.is_empty());
    }

    #[test]
    fn test_duplicate_member_names() {
        let root = tempdir().unwrap();
        fs::write(
            root.path().join("package.json"),
            r#"{"name": "monorepo", "workspaces": ["packages/*", "packages/a"]}"#,
        )
        .unwrap();
        write_member(root.path(), "packages/a", r#"{"name": "@origin/core"}"#);
        write_member(root.path(), "packages/b", r#"{"name": "@origin/core"}"#);

        let manifest = PackageManifest::load(root.path()).unwrap();
        let err = detect_workspaces(&manifest).unwrap_err();
        assert_eq!(err.code(), crate::error::codes::FORK_DUPLICATE_PACKAGE);
        assert!(err.to_string().contains("packages/b"));
    }

    #[test]
    fn test_root_with_glob_characters() {
        let parent = tempdir().unwrap();
        let root = parent.path().join("origin [fork]");
        write_member(
            &root,
            "",
            r#"{"name": "monorepo", "workspaces": ["packages/*"]}"#,
        );
        write_member(&root, "packages/core", r#"{"name": "@origin/core"}"#);

        let manifest = PackageManifest::load(&root).unwrap();
        let config = detect_workspaces(&manifest).unwrap().unwrap();
        assert_eq!(config.names().collect::<Vec<_>>(), vec!["@origin/core"]);
    }

    #[test]
    fn test_no_workspaces() {
        let root = tempdir().unwrap();
        fs::write(root.path().join("package.json"), r#"{"name": "regular-project"}"#).unwrap();

        let manifest = PackageManifest::load(root.path()).unwrap();
        assert!(detect_workspaces(&manifest).unwrap().is_none());
    }
}
