use crate::pkg::PkgError;
use std::path::PathBuf;
use thiserror::Error;

/// Stable error codes, one per [`Error`] variant.
pub mod codes {
    pub const FORK_SCOPE_INVALID: &str = "FORK_SCOPE_INVALID";
    pub const FORK_PATTERN_NO_MATCH: &str = "FORK_PATTERN_NO_MATCH";
    pub const FORK_NOTHING_TO_PATCH: &str = "FORK_NOTHING_TO_PATCH";
    pub const FORK_MANIFEST_INVALID: &str = "FORK_MANIFEST_INVALID";
    pub const FORK_DUPLICATE_PACKAGE: &str = "FORK_DUPLICATE_PACKAGE";
    pub const FORK_NAME_COLLISION: &str = "FORK_NAME_COLLISION";
    pub const FORK_NOT_PLANNED: &str = "FORK_NOT_PLANNED";
    pub const FORK_SCRIPT_PARSE_FAILED: &str = "FORK_SCRIPT_PARSE_FAILED";
    pub const FORK_IO_FAILED: &str = "FORK_IO_FAILED";
}

/// Core error type for fork runs.
///
/// Usage errors are raised before any file is mutated. Everything else aborts
/// the run where it happens.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Scope must start with \"@\" and name a single scope segment (got \"{scope}\").")]
    InvalidScope { scope: String },

    #[error("No workspace matches \"{pattern}\".")]
    NoWorkspaceMatch { pattern: String },

    #[error("No package directory matches \"{pattern}\".")]
    NoDirectoryMatch { pattern: String },

    #[error("No package to patch.")]
    NothingToPatch,

    #[error("Invalid package.json at {}: {message}", path.display())]
    ManifestInvalid { path: PathBuf, message: String },

    #[error(
        "Package \"{name}\" is declared by both {} and {}",
        first.display(),
        second.display()
    )]
    DuplicatePackage {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("\"{first}\" and \"{second}\" would both be forked as \"{patched}\"")]
    NameCollision {
        patched: String,
        first: String,
        second: String,
    },

    #[error("Package \"{name}\" at {} was not planned for this run", path.display())]
    NotPlanned { name: String, path: PathBuf },

    #[error("Failed to parse {}: {message}", path.display())]
    ScriptParse { path: PathBuf, message: String },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Registry(#[from] PkgError),
}

impl Error {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a manifest integrity error.
    pub fn manifest_invalid(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ManifestInvalid {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Get the stable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidScope { .. } => codes::FORK_SCOPE_INVALID,
            Self::NoWorkspaceMatch { .. } | Self::NoDirectoryMatch { .. } => {
                codes::FORK_PATTERN_NO_MATCH
            }
            Self::NothingToPatch => codes::FORK_NOTHING_TO_PATCH,
            Self::ManifestInvalid { .. } => codes::FORK_MANIFEST_INVALID,
            Self::DuplicatePackage { .. } => codes::FORK_DUPLICATE_PACKAGE,
            Self::NameCollision { .. } => codes::FORK_NAME_COLLISION,
            Self::NotPlanned { .. } => codes::FORK_NOT_PLANNED,
            Self::ScriptParse { .. } => codes::FORK_SCRIPT_PARSE_FAILED,
            Self::Io { .. } => codes::FORK_IO_FAILED,
            Self::Registry(e) => e.code(),
        }
    }

    /// Whether this is a usage error (bad input, nothing selected).
    #[must_use]
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            Self::InvalidScope { .. }
                | Self::NoWorkspaceMatch { .. }
                | Self::NoDirectoryMatch { .. }
                | Self::NothingToPatch
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = Error::NoWorkspaceMatch {
            pattern: "pkgs/*".to_string(),
        };
        assert_eq!(err.to_string(), "No workspace matches \"pkgs/*\".");
        assert_eq!(Error::NothingToPatch.to_string(), "No package to patch.");
    }

    #[test]
    fn test_codes() {
        assert_eq!(Error::NothingToPatch.code(), codes::FORK_NOTHING_TO_PATCH);
        assert_eq!(
            Error::NoDirectoryMatch {
                pattern: "x".to_string()
            }
            .code(),
            codes::FORK_PATTERN_NO_MATCH
        );

        let registry = Error::from(PkgError::registry("boom"));
        assert_eq!(registry.code(), crate::pkg::pkg_codes::PKG_REGISTRY_ERROR);
    }

    #[test]
    fn test_usage_classification() {
        assert!(Error::NothingToPatch.is_usage());
        assert!(Error::InvalidScope {
            scope: "fork".to_string()
        }
        .is_usage());
        assert!(!Error::manifest_invalid("/p/package.json", "missing name").is_usage());
    }

    #[test]
    fn test_error_codes_uppercase() {
        let all_codes = [
            codes::FORK_SCOPE_INVALID,
            codes::FORK_PATTERN_NO_MATCH,
            codes::FORK_NOTHING_TO_PATCH,
            codes::FORK_MANIFEST_INVALID,
            codes::FORK_DUPLICATE_PACKAGE,
            codes::FORK_NAME_COLLISION,
            codes::FORK_NOT_PLANNED,
            codes::FORK_SCRIPT_PARSE_FAILED,
            codes::FORK_IO_FAILED,
        ];

        for code in all_codes {
            assert!(
                code.chars().all(|c| c.is_uppercase() || c == '_'),
                "Error code '{code}' should be SCREAMING_SNAKE_CASE"
            );
        }
    }
}
