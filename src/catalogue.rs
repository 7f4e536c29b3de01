//! Read-only access to `data/index.json`, the book catalogue.
//!
//! The catalogue is maintained outside this crate. Extraction never needs
//! it; the CLI uses it to put titles next to book ids in its summary.

use crate::error::ExtractError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One catalogue entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: u32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
}

/// The parsed `data/index.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalogue {
    #[serde(default)]
    pub books: Vec<IndexEntry>,
}

impl Catalogue {
    /// Load the catalogue at `path`. A missing file yields `Ok(None)`.
    pub fn load(path: &Path) -> Result<Option<Self>, ExtractError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(ExtractError::CatalogueInvalid {
                    path: path.to_path_buf(),
                    detail: e.to_string(),
                })
            }
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| ExtractError::CatalogueInvalid {
                path: path.to_path_buf(),
                detail: e.to_string(),
            })
    }

    /// Title of book `id`, if listed with a non-empty title.
    pub fn title_for(&self, id: u32) -> Option<&str> {
        self.books
            .iter()
            .find(|b| b.id == id)
            .map(|b| b.title.trim())
            .filter(|t| !t.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_index_is_none() {
        let dir = TempDir::new().unwrap();
        assert_eq!(Catalogue::load(&dir.path().join("index.json")).unwrap(), None);
    }

    #[test]
    fn titles_by_id() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.json");
        std::fs::write(
            &path,
            r#"{"books":[{"id":1,"title":"Весна","url":"https://example.org/1"},{"id":2,"title":" "}]}"#,
        )
        .unwrap();

        let cat = Catalogue::load(&path).unwrap().unwrap();
        assert_eq!(cat.title_for(1), Some("Весна"));
        assert_eq!(cat.title_for(2), None);
        assert_eq!(cat.title_for(3), None);
    }

    #[test]
    fn malformed_index_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.json");
        std::fs::write(&path, "[1, 2").unwrap();
        assert!(Catalogue::load(&path).is_err());
    }
}
