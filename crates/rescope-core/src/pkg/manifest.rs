//! package.json loading.
//!
//! A [`PackageManifest`] keeps the raw JSON document together with the text
//! formatting it was read with, so a rewritten manifest can be written back
//! with the same indentation and line endings.

use crate::error::Error;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Manifest file name.
pub const MANIFEST_FILE: &str = "package.json";

/// Text formatting detected on a loaded manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestFormat {
    /// One level of indentation.
    pub indent: String,
    /// Line ending used by the file.
    pub newline: &'static str,
    /// Whether the file ended with a line ending.
    pub trailing_newline: bool,
}

impl Default for ManifestFormat {
    fn default() -> Self {
        Self {
            indent: "  ".to_string(),
            newline: "\n",
            trailing_newline: true,
        }
    }
}

impl ManifestFormat {
    /// Detect formatting from manifest text.
    #[must_use]
    pub fn detect(text: &str) -> Self {
        let newline = if text.contains("\r\n") { "\r\n" } else { "\n" };
        let trailing_newline = text.ends_with('\n');

        let indent = text
            .lines()
            .skip(1)
            .map(|line| {
                let trimmed = line.trim_start_matches([' ', '\t']);
                &line[..line.len() - trimmed.len()]
            })
            .find(|ws| !ws.is_empty())
            .unwrap_or("  ")
            .to_string();

        Self {
            indent,
            newline,
            trailing_newline,
        }
    }
}

/// A loaded package.json.
#[derive(Debug, Clone)]
pub struct PackageManifest {
    dir: PathBuf,
    value: Value,
    format: ManifestFormat,
}

impl PackageManifest {
    /// Load `dir/package.json`.
    pub fn load(dir: &Path) -> Result<Self, Error> {
        let path = dir.join(MANIFEST_FILE);
        let text = std::fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
        Self::parse(dir, &text)
    }

    /// Parse manifest text that belongs to `dir`.
    pub fn parse(dir: &Path, text: &str) -> Result<Self, Error> {
        let path = dir.join(MANIFEST_FILE);
        let value: Value = serde_json::from_str(text)
            .map_err(|e| Error::manifest_invalid(&path, format!("invalid JSON: {e}")))?;

        if !value.is_object() {
            return Err(Error::manifest_invalid(&path, "must be a JSON object"));
        }

        Ok(Self {
            dir: dir.to_path_buf(),
            value,
            format: ManifestFormat::detect(text),
        })
    }

    /// Directory containing the manifest.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the manifest file.
    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.dir.join(MANIFEST_FILE)
    }

    /// The raw JSON document.
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Detected text formatting.
    #[must_use]
    pub fn format(&self) -> &ManifestFormat {
        &self.format
    }

    /// Declared name, if it is a string.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.value.get("name").and_then(Value::as_str)
    }

    /// Declared version, if it is a string.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.value.get("version").and_then(Value::as_str)
    }

    /// Whether the package is marked `"private": true`.
    #[must_use]
    pub fn is_private(&self) -> bool {
        self.value.get("private").and_then(Value::as_bool) == Some(true)
    }

    /// Declared `main` entry, if any.
    #[must_use]
    pub fn main(&self) -> Option<&str> {
        self.value.get("main").and_then(Value::as_str)
    }

    /// The `files` allow-list, if declared as an array.
    #[must_use]
    pub fn files(&self) -> Option<Vec<&str>> {
        self.value
            .get("files")
            .and_then(Value::as_array)
            .map(|arr| arr.iter().filter_map(Value::as_str).collect())
    }

    /// Workspace glob patterns, from either the array form or the
    /// yarn-style `{ "packages": [...] }` form.
    #[must_use]
    pub fn workspace_patterns(&self) -> Vec<String> {
        let strings = |arr: &Vec<Value>| -> Vec<String> {
            arr.iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect()
        };

        match self.value.get("workspaces") {
            Some(Value::Array(arr)) => strings(arr),
            Some(Value::Object(obj)) => obj
                .get("packages")
                .and_then(Value::as_array)
                .map(strings)
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }

    /// Name and version, both required to be strings.
    pub fn identity(&self) -> Result<(&str, &str), Error> {
        let name = self
            .name()
            .ok_or_else(|| Error::manifest_invalid(self.path(), "Package name must be a string."))?;
        let version = self.version().ok_or_else(|| {
            Error::manifest_invalid(
                self.path(),
                format!("Package version must be a string ({name})."),
            )
        })?;
        Ok((name, version))
    }

    /// Render a manifest value with this manifest's formatting.
    pub fn render(&self, value: &Value) -> Result<String, Error> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(self.format.indent.as_bytes());
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        serde::Serialize::serialize(value, &mut ser)
            .map_err(|e| Error::manifest_invalid(self.path(), e.to_string()))?;

        let mut text = String::from_utf8(buf)
            .map_err(|e| Error::manifest_invalid(self.path(), e.to_string()))?;
        if self.format.newline != "\n" {
            text = text.replace('\n', self.format.newline);
        }
        if self.format.trailing_newline {
            text.push_str(self.format.newline);
        }
        Ok(text)
    }
}
