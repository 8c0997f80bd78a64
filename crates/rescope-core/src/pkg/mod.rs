//! Package layer.
//!
//! Provides utilities for:
//! - Loading package.json with its text formatting
//! - Expanding workspace globs into member packages
//! - Listing the files a package publishes
//! - Reading `.npmrc` registry routing and auth
//! - Fetching published manifests from the npm registry

pub mod error;
pub mod manifest;
pub mod npmrc;
pub mod packlist;
pub mod registry;
pub mod workspaces;

pub use error::{codes as pkg_codes, PkgError};
pub use manifest::{ManifestFormat, PackageManifest, MANIFEST_FILE};
pub use npmrc::{load_npmrc_files, NpmrcConfig};
pub use packlist::list_package_files;
pub use registry::{
    highest_published_version, ManifestSource, PublishedManifest, RegistryClient,
    DEFAULT_REGISTRY,
};
pub use workspaces::{detect_workspaces, WorkspaceConfig, WorkspaceMember};
