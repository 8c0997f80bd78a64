use std::path::PathBuf;

/// Environment variable to override the registry URL.
pub const REGISTRY_ENV: &str = "RESCOPE_NPM_REGISTRY";

/// Runtime configuration for the rescope CLI.
#[derive(Debug, Clone)]
pub struct Config {
    /// Project root the fork runs against.
    pub cwd: PathBuf,

    /// Whether to emit JSON logs and output.
    pub json_logs: bool,

    /// Verbosity level (0 = WARN, 1 = INFO, 2 = DEBUG, 3+ = TRACE).
    pub verbosity: u8,

    /// Registry URL override. Takes precedence over `.npmrc`.
    pub registry: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cwd: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            json_logs: false,
            verbosity: 0,
            registry: None,
        }
    }
}

impl Config {
    /// Create a new config with the given working directory.
    #[must_use]
    pub fn new(cwd: PathBuf) -> Self {
        Self {
            cwd,
            ..Default::default()
        }
    }

    /// Set verbosity level.
    #[must_use]
    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set JSON log output.
    #[must_use]
    pub fn with_json_logs(mut self, json: bool) -> Self {
        self.json_logs = json;
        self
    }

    /// Set the registry override.
    #[must_use]
    pub fn with_registry(mut self, registry: Option<String>) -> Self {
        self.registry = registry.filter(|r| !r.trim().is_empty());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let config = Config::new(PathBuf::from("/repo"))
            .with_verbosity(2)
            .with_json_logs(true)
            .with_registry(Some("http://localhost:4873/".to_string()));

        assert_eq!(config.cwd, PathBuf::from("/repo"));
        assert_eq!(config.verbosity, 2);
        assert!(config.json_logs);
        assert_eq!(config.registry.as_deref(), Some("http://localhost:4873/"));
    }

    #[test]
    fn test_blank_registry_is_ignored() {
        let config = Config::new(PathBuf::from("/repo")).with_registry(Some("  ".to_string()));
        assert!(config.registry.is_none());
    }
}
