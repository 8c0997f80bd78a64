//! Name and version planning for a single package.

use super::scope::Scope;
use crate::error::Error;
use crate::pkg::{ManifestSource, PackageManifest, PkgError};
use semver::{Prerelease, Version};
use std::cmp::Ordering;

/// Planned identity of one package, before it is tied to a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedIdentity {
    pub original_name: String,
    pub original_version: String,
    pub patched_name: String,
    pub patched_version: String,
}

/// Compare two versions by semver precedence.
///
/// Build metadata is ignored and a release ranks above its prereleases.
#[must_use]
pub fn cmp_precedence(a: &Version, b: &Version) -> Ordering {
    (a.major, a.minor, a.patch)
        .cmp(&(b.major, b.minor, b.patch))
        .then_with(|| match (a.pre.is_empty(), b.pre.is_empty()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => a.pre.cmp(&b.pre),
        })
}

/// Next prerelease of a version.
///
/// A release moves to the first prerelease of the next patch
/// (`1.2.0` -> `1.2.1-0`). A prerelease increments its last numeric
/// identifier (`1.2.1-beta.3` -> `1.2.1-beta.4`), or gains a `.0` when it
/// has none (`1.2.1-beta` -> `1.2.1-beta.0`). Build metadata is dropped.
///
/// Returns `None` when the version has no successor, i.e. the patch number or
/// the numeric identifier is already `u64::MAX`.
#[must_use]
pub fn increment_prerelease(version: &Version) -> Option<Version> {
    let mut next = Version::new(version.major, version.minor, version.patch);

    if version.pre.is_empty() {
        next.patch = next.patch.checked_add(1)?;
        next.pre = Prerelease::new("0").ok()?;
        return Some(next);
    }

    let mut idents: Vec<String> = version.pre.as_str().split('.').map(String::from).collect();
    let last_numeric = idents
        .iter()
        .rposition(|id| id.bytes().all(|b| b.is_ascii_digit()) && id.parse::<u64>().is_ok());

    match last_numeric {
        Some(i) => {
            let n: u64 = idents[i].parse().ok()?;
            idents[i] = n.checked_add(1)?.to_string();
        }
        None => idents.push("0".to_string()),
    }

    next.pre = Prerelease::new(&idents.join(".")).ok()?;
    Some(next)
}

/// Plan the forked identity of a package.
///
/// Private packages are skipped with `Ok(None)`. The patched version is the
/// next prerelease after whichever is greater of the original version and
/// the version already published under the patched name. A never-published
/// patched name counts as the original version; any other lookup failure
/// is returned.
pub async fn plan_identity<S: ManifestSource>(
    manifest: &PackageManifest,
    scope: &Scope,
    source: &S,
) -> Result<Option<PlannedIdentity>, Error> {
    if manifest.is_private() {
        return Ok(None);
    }

    let (name, version) = manifest.identity()?;
    let original = Version::parse(version)
        .map_err(|e| PkgError::version_invalid(name, version, &e.to_string()))?;

    let patched_name = scope.patched_name(name);

    let base = match source.published_manifest(&patched_name).await {
        Ok(published) => {
            let published_version = Version::parse(&published.version).map_err(|e| {
                PkgError::version_invalid(&patched_name, &published.version, &e.to_string())
            })?;
            if cmp_precedence(&published_version, &original) == Ordering::Greater {
                published_version
            } else {
                original
            }
        }
        Err(e) if e.is_not_found() => original,
        Err(e) => return Err(e.into()),
    };

    let patched_version = increment_prerelease(&base).ok_or_else(|| {
        PkgError::version_invalid(name, &base.to_string(), "no next prerelease version")
    })?;

    Ok(Some(PlannedIdentity {
        original_name: name.to_string(),
        original_version: version.to_string(),
        patched_name,
        patched_version: patched_version.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::codes;
    use crate::pkg::{pkg_codes, PublishedManifest};
    use std::collections::HashMap;
    use std::path::Path;

    /// Registry answering from a fixed name -> version table.
    #[derive(Default)]
    struct FixedRegistry {
        published: HashMap<String, String>,
        fail_with: Option<PkgError>,
    }

    impl FixedRegistry {
        fn with(name: &str, version: &str) -> Self {
            let mut registry = Self::default();
            registry
                .published
                .insert(name.to_string(), version.to_string());
            registry
        }
    }

    impl ManifestSource for FixedRegistry {
        async fn published_manifest(&self, name: &str) -> Result<PublishedManifest, PkgError> {
            if let Some(err) = &self.fail_with {
                return Err(err.clone());
            }
            self.published
                .get(name)
                .map(|version| PublishedManifest {
                    name: name.to_string(),
                    version: version.clone(),
                })
                .ok_or_else(|| PkgError::not_found(name))
        }
    }

    fn manifest(text: &str) -> PackageManifest {
        PackageManifest::parse(Path::new("/repo/packages/core"), text).unwrap()
    }

    fn fork() -> Scope {
        Scope::parse("@fork").unwrap()
    }

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn test_increment_release() {
        assert_eq!(increment_prerelease(&v("1.2.0")).unwrap(), v("1.2.1-0"));
        assert_eq!(increment_prerelease(&v("1.2.0+build.7")).unwrap(), v("1.2.1-0"));
    }

    #[test]
    fn test_increment_prerelease_numeric_tail() {
        assert_eq!(increment_prerelease(&v("1.2.0-3")).unwrap(), v("1.2.0-4"));
        assert_eq!(
            increment_prerelease(&v("1.2.0-beta.9")).unwrap(),
            v("1.2.0-beta.10")
        );
        assert_eq!(
            increment_prerelease(&v("1.2.0-2.beta")).unwrap(),
            v("1.2.0-3.beta")
        );
    }

    #[test]
    fn test_increment_prerelease_without_number() {
        assert_eq!(
            increment_prerelease(&v("1.2.0-beta")).unwrap(),
            v("1.2.0-beta.0")
        );
    }

    #[test]
    fn test_increment_at_numeric_limit() {
        assert_eq!(increment_prerelease(&v("1.0.0-18446744073709551615")), None);
        assert_eq!(increment_prerelease(&v("1.0.18446744073709551615")), None);
        assert_eq!(
            increment_prerelease(&v("1.0.0-18446744073709551614")).unwrap(),
            v("1.0.0-18446744073709551615")
        );
    }

    #[tokio::test]
    async fn test_published_version_at_limit() {
        let registry = FixedRegistry::with("@fork/origin__core", "1.2.0-18446744073709551615");
        let err = plan_identity(
            &manifest(r#"{"name": "@origin/core", "version": "1.2.0-1"}"#),
            &fork(),
            &registry,
        )
        .await
        .unwrap_err();

        assert_eq!(err.code(), crate::pkg::pkg_codes::PKG_VERSION_INVALID);
    }

    #[test]
    fn test_increment_is_strictly_greater() {
        for s in ["0.0.0", "1.2.0", "1.2.0-0", "1.2.0-rc.1", "1.2.0-alpha"] {
            let before = v(s);
            let after = increment_prerelease(&before).unwrap();
            assert_eq!(cmp_precedence(&after, &before), Ordering::Greater, "{s}");
        }
    }

    #[test]
    fn test_cmp_precedence() {
        assert_eq!(cmp_precedence(&v("1.2.0"), &v("1.2.0-3")), Ordering::Greater);
        assert_eq!(cmp_precedence(&v("1.2.0-3"), &v("1.2.0-10")), Ordering::Less);
        assert_eq!(
            cmp_precedence(&v("1.2.0+a"), &v("1.2.0+b")),
            Ordering::Equal
        );
        assert_eq!(cmp_precedence(&v("1.10.0"), &v("1.9.9")), Ordering::Greater);
    }

    #[tokio::test]
    async fn test_first_fork() {
        let planned = plan_identity(
            &manifest(r#"{"name": "@origin/core", "version": "1.2.0"}"#),
            &fork(),
            &FixedRegistry::default(),
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(planned.original_name, "@origin/core");
        assert_eq!(planned.original_version, "1.2.0");
        assert_eq!(planned.patched_name, "@fork/origin__core");
        assert_eq!(planned.patched_version, "1.2.1-0");
    }

    #[tokio::test]
    async fn test_published_fork_is_newer() {
        let registry = FixedRegistry::with("@fork/origin__core", "1.2.1-4");
        let planned = plan_identity(
            &manifest(r#"{"name": "@origin/core", "version": "1.2.0"}"#),
            &fork(),
            &registry,
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(planned.patched_version, "1.2.1-5");
    }

    #[tokio::test]
    async fn test_published_prerelease_below_release() {
        // 1.2.0-3 ranks below 1.2.0, so the original is the base
        let registry = FixedRegistry::with("@fork/origin__core", "1.2.0-3");
        let planned = plan_identity(
            &manifest(r#"{"name": "@origin/core", "version": "1.2.0"}"#),
            &fork(),
            &registry,
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(planned.patched_version, "1.2.1-0");
    }

    #[tokio::test]
    async fn test_prerelease_original_ahead_of_published() {
        let registry = FixedRegistry::with("@fork/origin__core", "1.2.0-3");
        let planned = plan_identity(
            &manifest(r#"{"name": "@origin/core", "version": "1.3.0-beta.1"}"#),
            &fork(),
            &registry,
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(planned.patched_version, "1.3.0-beta.2");
    }

    #[tokio::test]
    async fn test_planning_is_deterministic() {
        let registry = FixedRegistry::with("@fork/left-pad", "1.3.0-0");
        let m = manifest(r#"{"name": "left-pad", "version": "1.3.0"}"#);

        let first = plan_identity(&m, &fork(), &registry).await.unwrap();
        let second = plan_identity(&m, &fork(), &registry).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_private_skipped_before_identity_check() {
        let planned = plan_identity(
            &manifest(r#"{"private": true}"#),
            &fork(),
            &FixedRegistry::default(),
        )
        .await
        .unwrap();
        assert!(planned.is_none());
    }

    #[tokio::test]
    async fn test_version_must_be_string() {
        let err = plan_identity(
            &manifest(r#"{"name": "@origin/core"}"#),
            &fork(),
            &FixedRegistry::default(),
        )
        .await
        .unwrap_err();

        assert_eq!(err.code(), codes::FORK_MANIFEST_INVALID);
        assert!(err
            .to_string()
            .contains("Package version must be a string (@origin/core)."));
    }

    #[tokio::test]
    async fn test_invalid_original_version() {
        let err = plan_identity(
            &manifest(r#"{"name": "x", "version": "latest"}"#),
            &fork(),
            &FixedRegistry::default(),
        )
        .await
        .unwrap_err();

        assert_eq!(err.code(), pkg_codes::PKG_VERSION_INVALID);
    }

    #[tokio::test]
    async fn test_registry_failure_propagates() {
        let registry = FixedRegistry {
            fail_with: Some(PkgError::registry("Registry returned status 503")),
            ..FixedRegistry::default()
        };

        let err = plan_identity(
            &manifest(r#"{"name": "x", "version": "1.0.0"}"#),
            &fork(),
            &registry,
        )
        .await
        .unwrap_err();

        assert_eq!(err.code(), pkg_codes::PKG_REGISTRY_ERROR);
    }
}
