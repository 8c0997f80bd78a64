//! Git working-tree checks.
//!
//! Outside a repository, or without git installed, the tree counts as clean.

use crate::commands::{codes, Failure};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

fn git_binary() -> Option<PathBuf> {
    which::which("git").ok()
}

/// Whether the working tree under `cwd` has unstaged modifications to
/// tracked files.
pub fn has_unstaged_changes(cwd: &Path) -> bool {
    let Some(git) = git_binary() else {
        tracing::debug!("git not found, skipping working tree check");
        return false;
    };

    let output = Command::new(git)
        .args(["status", "--untracked-files=no", "--porcelain"])
        .current_dir(cwd)
        .stdin(Stdio::null())
        .output();

    match output {
        Ok(output) if output.status.success() => {
            porcelain_has_unstaged(&String::from_utf8_lossy(&output.stdout))
        }
        _ => false,
    }
}

/// Porcelain v1 status: the second column marks worktree changes.
fn porcelain_has_unstaged(status: &str) -> bool {
    status.lines().any(|line| line.as_bytes().get(1) == Some(&b'M'))
}

/// Discard unstaged changes to tracked files (`git checkout -- .`).
pub fn reset_worktree(cwd: &Path) -> Result<(), Failure> {
    let Some(git) = git_binary() else {
        return Err(Failure::new(
            codes::GIT_RESET_FAILED,
            "git not found on PATH, patched files were left in place",
        ));
    };

    let status = Command::new(git)
        .args(["checkout", "--", "."])
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .status()
        .map_err(|e| Failure::new(codes::GIT_RESET_FAILED, format!("Failed to run git: {e}")))?;

    if status.success() {
        Ok(())
    } else {
        Err(Failure::new(
            codes::GIT_RESET_FAILED,
            "git checkout failed, patched files were left in place",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_porcelain_unstaged() {
        assert!(porcelain_has_unstaged(" M packages/core/package.json\n"));
        assert!(porcelain_has_unstaged("M  a.js\nMM b.js\n"));
    }

    #[test]
    fn test_porcelain_clean_or_staged() {
        assert!(!porcelain_has_unstaged(""));
        assert!(!porcelain_has_unstaged("M  staged.js\nA  added.js\n"));
        assert!(!porcelain_has_unstaged(" D removed.js\n"));
    }

    #[test]
    fn test_outside_repository_is_clean() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!has_unstaged_changes(dir.path()));
    }
}
