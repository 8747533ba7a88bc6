//! Reading and updating a repository's package.json.
//!
//! Only `version`, `phet.supportedBrands`, `phet.published` and
//! `phet.phetLibs` are interpreted. Every other key is carried through
//! untouched and in its original order.

use crate::error::{PreconditionError, Result};
use crate::version::VersionIdentifier;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// An in-memory package.json bound to its path
#[derive(Debug, Clone)]
pub struct PackageJson {
    path: PathBuf,
    document: Map<String, Value>,
}

impl PackageJson {
    /// Path of package.json inside `repo_dir`
    pub fn path_in(repo_dir: &Path) -> PathBuf {
        repo_dir.join("package.json")
    }

    /// Load package.json from a repository directory.
    pub async fn load(repo_dir: &Path) -> Result<Self> {
        let path = Self::path_in(repo_dir);
        let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
            PreconditionError::PackageJson {
                path: path.clone(),
                reason: format!("failed to read: {}", e),
            }
        })?;

        match serde_json::from_str::<Value>(&content)? {
            Value::Object(document) => Ok(Self { path, document }),
            _ => Err(PreconditionError::PackageJson {
                path,
                reason: "top level is not an object".to_string(),
            }
            .into()),
        }
    }

    /// Write the document back, two-space indented with a trailing newline.
    pub async fn save(&self) -> Result<()> {
        let mut content = serde_json::to_string_pretty(&self.document)?;
        content.push('\n');
        tokio::fs::write(&self.path, content).await?;
        log::debug!("Wrote {}", self.path.display());
        Ok(())
    }

    /// Location on disk
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Package name
    pub fn name(&self) -> Option<&str> {
        self.document.get("name").and_then(Value::as_str)
    }

    /// Parsed `version` field
    pub fn version(&self) -> Result<VersionIdentifier> {
        let text = self
            .document
            .get("version")
            .and_then(Value::as_str)
            .ok_or_else(|| self.missing("version"))?;
        Ok(VersionIdentifier::parse(text)?)
    }

    /// Replace the `version` field
    pub fn set_version(&mut self, version: &VersionIdentifier) {
        self.document
            .insert("version".to_string(), Value::String(version.to_string()));
    }

    /// Brands listed in `phet.supportedBrands`
    pub fn supported_brands(&self) -> Vec<String> {
        self.phet_strings("supportedBrands")
    }

    /// Replace `phet.supportedBrands`
    pub fn set_supported_brands(&mut self, brands: &[String]) {
        self.phet_mut().insert(
            "supportedBrands".to_string(),
            Value::Array(brands.iter().cloned().map(Value::String).collect()),
        );
    }

    /// `phet.published`, false when absent
    pub fn published(&self) -> bool {
        self.phet()
            .and_then(|phet| phet.get("published"))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Set `phet.published`
    pub fn set_published(&mut self, published: bool) {
        self.phet_mut()
            .insert("published".to_string(), Value::Bool(published));
    }

    /// Extra library repositories listed in `phet.phetLibs`
    pub fn phet_libs(&self) -> Vec<String> {
        self.phet_strings("phetLibs")
    }

    fn phet(&self) -> Option<&Map<String, Value>> {
        self.document.get("phet").and_then(Value::as_object)
    }

    fn phet_mut(&mut self) -> &mut Map<String, Value> {
        let phet = self
            .document
            .entry("phet")
            .or_insert_with(|| Value::Object(Map::new()));
        if !phet.is_object() {
            *phet = Value::Object(Map::new());
        }
        match phet {
            Value::Object(map) => map,
            _ => unreachable!("phet was just replaced with an object"),
        }
    }

    fn phet_strings(&self, key: &str) -> Vec<String> {
        self.phet()
            .and_then(|phet| phet.get(key))
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn missing(&self, field: &str) -> PreconditionError {
        PreconditionError::PackageJson {
            path: self.path.clone(),
            reason: format!("missing '{}' field", field),
        }
    }
}
