//! Package forking.
//!
//! A fork run renames the selected packages under a new scope and rewrites
//! every reference between them:
//! - `select` turns patterns into package directories
//! - `plan` derives each package's patched name and version
//! - `entries` builds the run's [`EntryMap`] before anything is written
//! - `manifest` and `script` rewrite package.json files and specifiers
//! - `batch` drives the whole run

pub mod batch;
pub mod entries;
pub mod manifest;
pub mod plan;
pub mod report;
pub mod scope;
pub mod script;
pub mod select;
pub mod specifier;

pub use batch::{apply_fork, fork_packages, plan_fork, ForkOptions};
pub use entries::{build_entry_map, EntryMap, PatchedEntry};
pub use manifest::{patch_manifest, rewrite_manifest, DEPENDENCY_SECTIONS};
pub use plan::{cmp_precedence, increment_prerelease, plan_identity, PlannedIdentity};
pub use report::{ForkReporter, SilentReporter};
pub use scope::Scope;
pub use script::{
    collect_references, is_script_file, patch_script, rewrite_script_source, ModuleReference,
    ScriptKind, SpecifierLiteral,
};
pub use select::{resolve_candidates, SelectorGroup, SelectorKind};
pub use specifier::split_package_specifier;
