//! package.json rewriting.

use super::entries::EntryMap;
use crate::error::Error;
use crate::pkg::PackageManifest;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Dependency sections whose keys and values are rewritten.
pub const DEPENDENCY_SECTIONS: &[&str] = &[
    "dependencies",
    "devDependencies",
    "optionalDependencies",
    "peerDependencies",
];

/// Section whose keys follow `peerDependencies`; values are kept.
const PEER_META_SECTION: &str = "peerDependenciesMeta";

/// Produce the rewritten manifest document.
///
/// The package's own name and version become its planned fork, and every
/// dependency on a planned package is renamed and pinned to the planned
/// version. Keys keep their positions and entries for packages outside the
/// map are left alone.
pub fn rewrite_manifest(manifest: &PackageManifest, entries: &EntryMap) -> Result<Value, Error> {
    let (name, _) = manifest.identity()?;
    let own = entries.get(name).ok_or_else(|| Error::NotPlanned {
        name: name.to_string(),
        path: manifest.dir().to_path_buf(),
    })?;

    let Some(original) = manifest.value().as_object() else {
        return Err(Error::manifest_invalid(manifest.path(), "must be a JSON object"));
    };

    let mut doc = Map::with_capacity(original.len());
    for (key, value) in original {
        let value = match key.as_str() {
            "name" => Value::String(own.patched_name.clone()),
            "version" => Value::String(own.patched_version.clone()),
            section if DEPENDENCY_SECTIONS.contains(&section) => {
                rewrite_section(value, entries, true)
            }
            PEER_META_SECTION => rewrite_section(value, entries, false),
            _ => value.clone(),
        };
        doc.insert(key.clone(), value);
    }

    Ok(Value::Object(doc))
}

/// Rename keys of a dependency-shaped object, optionally pinning values.
fn rewrite_section(section: &Value, entries: &EntryMap, pin_version: bool) -> Value {
    let Value::Object(deps) = section else {
        return section.clone();
    };

    let rewritten = deps
        .iter()
        .map(|(dep, spec)| match entries.get(dep) {
            Some(entry) => {
                let spec = if pin_version {
                    Value::String(entry.patched_version.clone())
                } else {
                    spec.clone()
                };
                (entry.patched_name.clone(), spec)
            }
            None => (dep.clone(), spec.clone()),
        })
        .collect();

    Value::Object(rewritten)
}

/// Rewrite `dir/package.json` in place, keeping its formatting.
///
/// Returns the manifest path.
pub fn patch_manifest(dir: &Path, entries: &EntryMap) -> Result<PathBuf, Error> {
    let manifest = PackageManifest::load(dir)?;
    let rewritten = rewrite_manifest(&manifest, entries)?;
    let text = manifest.render(&rewritten)?;

    let path = manifest.path();
    rescope_util::fs::atomic_write(&path, text.as_bytes()).map_err(|e| Error::io(&path, e))?;
    Ok(path)
}
