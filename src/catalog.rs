//! Style catalog types
//!
//! The catalog is supplied externally (a static list of presets) and is
//! read-only for the scheduler: ids are treated as opaque keys, the prompt
//! text is handed verbatim to the image-generation call.

use std::collections::HashMap;

use eyre::{Result, bail};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Subject category passed through to the image-generation call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectGender {
    Female,
    Male,
}

/// A single style preset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleCatalogEntry {
    pub id: u32,
    pub name: String,
    pub category: String,
    #[serde(rename = "prompt")]
    pub prompt_text: String,
}

/// Ordered, id-indexed list of style presets
///
/// Loaded once per process; the scheduler never mutates it.
#[derive(Debug, Clone)]
pub struct StyleCatalog {
    entries: Vec<StyleCatalogEntry>,
    index: HashMap<u32, usize>,
}

impl StyleCatalog {
    /// Build a catalog from entries, rejecting duplicate ids
    pub fn from_entries(entries: Vec<StyleCatalogEntry>) -> Result<Self> {
        debug!(count = entries.len(), "StyleCatalog::from_entries: called");
        let mut index = HashMap::with_capacity(entries.len());
        for (pos, entry) in entries.iter().enumerate() {
            if index.insert(entry.id, pos).is_some() {
                bail!("Duplicate style id in catalog: {}", entry.id);
            }
        }
        Ok(Self { entries, index })
    }

    /// Parse a catalog from its JSON representation
    pub fn from_json(json: &str) -> Result<Self> {
        debug!(len = json.len(), "StyleCatalog::from_json: called");
        let entries: Vec<StyleCatalogEntry> = serde_json::from_str(json)?;
        Self::from_entries(entries)
    }

    /// Look up an entry by id
    pub fn get(&self, id: u32) -> Option<&StyleCatalogEntry> {
        self.index.get(&id).map(|pos| &self.entries[*pos])
    }

    /// Whether the catalog contains the given id
    pub fn contains(&self, id: u32) -> bool {
        self.index.contains_key(&id)
    }

    /// Entries in catalog order
    pub fn iter(&self) -> impl Iterator<Item = &StyleCatalogEntry> {
        self.entries.iter()
    }

    /// Ids in catalog order
    pub fn ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.entries.iter().map(|e| e.id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: u32, name: &str) -> StyleCatalogEntry {
        StyleCatalogEntry {
            id,
            name: name.to_string(),
            category: "classic".to_string(),
            prompt_text: format!("in the style of {name}"),
        }
    }

    #[test]
    fn test_catalog_lookup_and_order() {
        let catalog = StyleCatalog::from_entries(vec![entry(3, "noir"), entry(1, "pop-art"), entry(7, "sketch")])
            .expect("valid catalog");

        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.get(1).unwrap().name, "pop-art");
        assert!(catalog.get(99).is_none());

        // Catalog order is preserved, not id order
        let ids: Vec<u32> = catalog.ids().collect();
        assert_eq!(ids, vec![3, 1, 7]);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let result = StyleCatalog::from_entries(vec![entry(1, "noir"), entry(1, "noir-again")]);
        assert!(result.is_err());
    }

    #[test]
    fn test_from_json() {
        let json = r#"[
            {"id": 1, "name": "noir", "category": "classic", "prompt": "film noir portrait"},
            {"id": 2, "name": "anime", "category": "modern", "prompt": "anime portrait"}
        ]"#;

        let catalog = StyleCatalog::from_json(json).expect("valid json");
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get(2).unwrap().prompt_text, "anime portrait");
    }

    #[test]
    fn test_subject_gender_serialization() {
        let json = serde_json::to_string(&SubjectGender::Female).unwrap();
        assert_eq!(json, r#""female""#);

        let back: SubjectGender = serde_json::from_str(r#""male""#).unwrap();
        assert_eq!(back, SubjectGender::Male);
    }
}
