//! npm registry client.

use super::error::PkgError;
use super::npmrc::{load_npmrc_files, parse_registry_url, NpmrcConfig};
use crate::version::user_agent;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::Client;
use semver::Version;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Default npm registry URL.
pub const DEFAULT_REGISTRY: &str = "https://registry.npmjs.org/";

/// Abbreviated packument media type, with full JSON as fallback.
const PACKUMENT_ACCEPT: &str =
    "application/vnd.npm.install-v1+json; q=1.0, application/json; q=0.8, */*";

/// The published identity of a package, as the planner needs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedManifest {
    pub name: String,
    pub version: String,
}

/// Lookup of the currently published manifest for a package name.
///
/// Implementations must report a never-published name as a
/// [`PkgError::not_found`] error; any other error is fatal to a fork run.
#[allow(async_fn_in_trait)]
pub trait ManifestSource {
    async fn published_manifest(&self, name: &str) -> Result<PublishedManifest, PkgError>;
}

/// Registry client for fetching package metadata.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    base_url: Url,
    npmrc: NpmrcConfig,
    http: Client,
}

impl RegistryClient {
    /// Create a new registry client with the given base URL.
    ///
    /// # Errors
    /// Returns an error if the URL is invalid or the HTTP client cannot be created.
    pub fn new(base_url: &str) -> Result<Self, PkgError> {
        let base_url = parse_registry_url(base_url)
            .ok_or_else(|| PkgError::registry(format!("Invalid registry URL '{base_url}'")))?;

        let http = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(15))
            .user_agent(user_agent())
            .build()
            .map_err(|e| PkgError::registry(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            base_url,
            npmrc: NpmrcConfig::default(),
            http,
        })
    }

    /// Create a client for a project.
    ///
    /// The default registry is `registry_override` if given, else `registry=`
    /// from the project's `.npmrc` files, else the public npm registry. Scoped
    /// registries and auth tokens always come from `.npmrc`.
    ///
    /// # Errors
    /// Returns an error if the client cannot be created.
    pub fn for_project(project_dir: &Path, registry_override: Option<&str>) -> Result<Self, PkgError> {
        let npmrc = load_npmrc_files(project_dir);
        let base = match (registry_override, npmrc.registry.as_ref()) {
            (Some(url), _) => url.to_string(),
            (None, Some(url)) => url.to_string(),
            (None, None) => DEFAULT_REGISTRY.to_string(),
        };

        Ok(Self::new(&base)?.with_npmrc(npmrc))
    }

    /// Use the given `.npmrc` configuration for scope routing and auth.
    #[must_use]
    pub fn with_npmrc(mut self, npmrc: NpmrcConfig) -> Self {
        self.npmrc = npmrc;
        self
    }

    /// Get the default registry URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Registry a package name is fetched from.
    #[must_use]
    pub fn registry_for(&self, name: &str) -> &Url {
        self.npmrc.scoped_registry(name).unwrap_or(&self.base_url)
    }

    /// Fetch the packument (package metadata) for a package.
    ///
    /// # Errors
    /// Returns a not-found error on HTTP 404, a registry error otherwise.
    pub async fn fetch_packument(&self, name: &str) -> Result<serde_json::Value, PkgError> {
        // Scoped names travel as a single path segment
        let encoded_name = if name.starts_with('@') {
            name.replace('/', "%2F")
        } else {
            name.to_string()
        };

        let registry = self.registry_for(name);
        let url = registry
            .join(&encoded_name)
            .map_err(|e| PkgError::registry(format!("Failed to build URL for '{name}': {e}")))?;

        let mut request = self.http.get(url.as_str()).header(ACCEPT, PACKUMENT_ACCEPT);
        if let Some(token) = self.npmrc.auth_token_for(registry) {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        let response = request.send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(PkgError::not_found(name));
        }

        if !response.status().is_success() {
            return Err(PkgError::registry(format!(
                "Registry returned status {} for '{name}'",
                response.status()
            )));
        }

        let json: serde_json::Value = response.json().await?;
        Ok(json)
    }
}

impl ManifestSource for RegistryClient {
    async fn published_manifest(&self, name: &str) -> Result<PublishedManifest, PkgError> {
        let packument = self.fetch_packument(name).await?;
        let version = highest_published_version(&packument)
            .ok_or_else(|| PkgError::registry(format!("Registry lists no versions for '{name}'")))?;

        Ok(PublishedManifest {
            name: name.to_string(),
            version,
        })
    }
}

/// Extract the latest version from a packument.
#[must_use]
pub fn get_latest_version(packument: &serde_json::Value) -> Option<&str> {
    packument.get("dist-tags")?.get("latest")?.as_str()
}

/// Get all available version strings from a packument.
#[must_use]
pub fn get_versions(packument: &serde_json::Value) -> Vec<&str> {
    packument
        .get("versions")
        .and_then(|v| v.as_object())
        .map(|obj| obj.keys().map(String::as_str).collect())
        .unwrap_or_default()
}

/// Highest published version by semver precedence, falling back to
/// `dist-tags.latest` when no version key parses.
#[must_use]
pub fn highest_published_version(packument: &serde_json::Value) -> Option<String> {
    get_versions(packument)
        .into_iter()
        .filter_map(|v| Version::parse(v).ok())
        .max_by(|a, b| crate::fork::plan::cmp_precedence(a, b))
        .map(|v| v.to_string())
        .or_else(|| get_latest_version(packument).map(String::from))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pkg::npmrc::parse_npmrc;

    #[test]
    fn test_get_latest_version() {
        let packument = serde_json::json!({
            "name": "@fork/origin__core",
            "dist-tags": { "latest": "1.2.1-0" }
        });

        assert_eq!(get_latest_version(&packument), Some("1.2.1-0"));
    }

    #[test]
    fn test_highest_published_version_ignores_tag_order() {
        let packument = serde_json::json!({
            "name": "@fork/origin__core",
            "dist-tags": { "latest": "1.2.1-0" },
            "versions": {
                "1.2.1-0": {},
                "1.2.1-3": {},
                "1.2.1-1": {}
            }
        });

        assert_eq!(
            highest_published_version(&packument).as_deref(),
            Some("1.2.1-3")
        );
    }

    #[test]
    fn test_highest_published_version_release_beats_prerelease() {
        let packument = serde_json::json!({
            "versions": { "2.0.0-rc.1": {}, "2.0.0": {}, "1.9.9": {} }
        });

        assert_eq!(highest_published_version(&packument).as_deref(), Some("2.0.0"));
    }

    #[test]
    fn test_highest_published_version_falls_back_to_latest() {
        let packument = serde_json::json!({ "dist-tags": { "latest": "0.1.0" } });
        assert_eq!(highest_published_version(&packument).as_deref(), Some("0.1.0"));
        assert_eq!(highest_published_version(&serde_json::json!({})), None);
    }

    #[test]
    fn test_client_creation() {
        let client = RegistryClient::new("http://localhost:4873").unwrap();
        assert_eq!(client.base_url().as_str(), "http://localhost:4873/");
    }

    #[test]
    fn test_client_invalid_url() {
        assert!(RegistryClient::new("not-a-url").is_err());
    }

    #[test]
    fn test_registry_for_scoped_route() {
        let client = RegistryClient::new(DEFAULT_REGISTRY)
            .unwrap()
            .with_npmrc(parse_npmrc("@fork:registry=https://forks.example.com/\n"));

        assert_eq!(
            client.registry_for("@fork/origin__core").as_str(),
            "https://forks.example.com/"
        );
        assert_eq!(client.registry_for("@forked/x").as_str(), DEFAULT_REGISTRY);
        assert_eq!(client.registry_for("left-pad").as_str(), DEFAULT_REGISTRY);
    }

    #[test]
    fn test_for_project_override_wins() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".npmrc"), "registry=https://mirror.example.com/\n").unwrap();

        let client = RegistryClient::for_project(dir.path(), Some("http://127.0.0.1:9/")).unwrap();
        assert_eq!(client.base_url().as_str(), "http://127.0.0.1:9/");

        let client = RegistryClient::for_project(dir.path(), None).unwrap();
        assert_eq!(client.base_url().as_str(), "https://mirror.example.com/");
    }
}
