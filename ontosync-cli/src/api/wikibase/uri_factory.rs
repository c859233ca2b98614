//! URI to Wikibase entity id map
//!
//! Wikibase assigns its own ids (`Q..` for items, `P..` for properties), so
//! the mapping from ontology URIs has to be remembered between runs.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UriFactory {
    #[serde(skip)]
    path: Option<PathBuf>,
    entries: BTreeMap<String, String>,
}

impl UriFactory {
    /// In-memory map that is never persisted
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from `path`, starting empty if the file does not exist yet
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.exists() {
            log::debug!("No URI map at {}, starting empty", path.display());
            return Ok(Self {
                path: Some(path),
                entries: BTreeMap::new(),
            });
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read URI map: {}", path.display()))?;
        let mut factory: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse URI map: {}", path.display()))?;
        factory.path = Some(path);

        log::debug!("Loaded {} URI mappings", factory.len());
        Ok(factory)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn get(&self, uri: &str) -> Option<&str> {
        self.entries.get(uri).map(String::as_str)
    }

    /// Property id for `uri`, if it is mapped to a property
    pub fn property(&self, uri: &str) -> Option<&str> {
        self.get(uri).filter(|id| id.starts_with('P'))
    }

    pub fn insert(&mut self, uri: impl Into<String>, id: impl Into<String>) {
        self.entries.insert(uri.into(), id.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forget every mapping, e.g. after the knowledge base was wiped
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    /// Write the map back to its file; no-op for in-memory factories
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(self).context("Failed to serialize URI map")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write URI map: {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_lookup() {
        let mut factory = UriFactory::new();
        factory.insert("http://example.org/age", "P1");
        factory.insert("http://example.org/Cat", "Q1");

        assert_eq!(factory.get("http://example.org/Cat"), Some("Q1"));
        assert_eq!(factory.property("http://example.org/age"), Some("P1"));
        assert_eq!(factory.property("http://example.org/Cat"), None);
        assert!(factory.save().is_ok());
    }

    #[test]
    fn test_persist_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("uris.json");

        let mut factory = UriFactory::load(&path).unwrap();
        assert!(factory.is_empty());
        factory.insert("http://example.org/Cat", "Q7");
        factory.save().unwrap();

        let reloaded = UriFactory::load(&path).unwrap();
        assert_eq!(reloaded.get("http://example.org/Cat"), Some("Q7"));
        assert_eq!(reloaded.path(), Some(path.as_path()));
    }

    #[test]
    fn test_reset() {
        let mut factory = UriFactory::new();
        factory.insert("a", "Q1");
        factory.reset();
        assert!(factory.is_empty());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("uris.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(UriFactory::load(&path).is_err());
    }
}
