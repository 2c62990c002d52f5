//! Dance catalog loading and lookup.

use std::collections::HashMap;
use std::path::Path;

use dance_types::DanceItem;

use crate::error::CatalogError;

/// Immutable list of dances, indexed by id.
#[derive(Debug, Default, Clone)]
pub struct Catalog {
    items: Vec<DanceItem>,
    by_id: HashMap<String, usize>,
}

impl Catalog {
    /// Build a catalog, rejecting duplicate ids.
    pub fn from_items(items: Vec<DanceItem>) -> Result<Self, CatalogError> {
        let mut by_id = HashMap::with_capacity(items.len());
        for (idx, item) in items.iter().enumerate() {
            if by_id.insert(item.dance_id.clone(), idx).is_some() {
                return Err(CatalogError::DuplicateId(item.dance_id.clone()));
            }
        }
        Ok(Self { items, by_id })
    }

    /// Parse a JSON array of dances.
    pub fn from_json(raw: &str, path: &Path) -> Result<Self, CatalogError> {
        let items = serde_json::from_str::<Vec<DanceItem>>(raw).map_err(|source| {
            CatalogError::Parse {
                path: path.to_path_buf(),
                source,
            }
        })?;
        Self::from_items(items)
    }

    /// Load a JSON catalog from disk.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw, path)
    }

    pub fn get(&self, dance_id: &str) -> Option<&DanceItem> {
        self.by_id.get(dance_id).map(|&idx| &self.items[idx])
    }

    pub fn items(&self) -> &[DanceItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::dance;

    #[test]
    fn lookup_by_id_keeps_catalog_order() {
        let catalog = Catalog::from_items(vec![dance("b"), dance("a")]).unwrap();

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.items()[0].dance_id, "b");
        assert_eq!(catalog.get("a").unwrap().src, "a.vmd");
        assert!(catalog.get("missing").is_none());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let err = Catalog::from_items(vec![dance("a"), dance("a")]).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateId(id) if id == "a"));
    }

    #[test]
    fn from_json_reports_parse_errors_with_path() {
        let err = Catalog::from_json("{not json", Path::new("dances.json")).unwrap_err();
        assert!(matches!(err, CatalogError::Parse { .. }));
        assert!(err.to_string().contains("dances.json"));
    }

    #[test]
    fn from_json_reads_array() {
        let raw = r#"[{"danceId":"a","name":"A","src":"a.vmd","audio":"a.mp3"}]"#;
        let catalog = Catalog::from_json(raw, Path::new("dances.json")).unwrap();
        assert_eq!(catalog.get("a").unwrap().audio, "a.mp3");
    }
}
