use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Stable integer key of a catalog item (a MyAnimeList ID)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u32);

impl Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ItemId {
    /// Parses an identifier cell, accepting integral floats such as `5114.0`
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if let Ok(id) = raw.parse::<u32>() {
            return Some(ItemId(id));
        }

        let value = raw.parse::<f64>().ok()?;
        if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= u32::MAX as f64 {
            Some(ItemId(value as u32))
        } else {
            None
        }
    }
}

/// One title of the catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogEntry {
    pub id: ItemId,
    /// Display name used by the selection list
    pub primary_name: String,
    /// Secondary name (the native title)
    pub alternate_name: String,
}

impl CatalogEntry {
    pub fn new(id: u32, primary_name: impl Into<String>, alternate_name: impl Into<String>) -> Self {
        Self {
            id: ItemId(id),
            primary_name: primary_name.into(),
            alternate_name: alternate_name.into(),
        }
    }

    /// Case-insensitive substring match on either name
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.primary_name.to_lowercase().contains(&query)
            || self.alternate_name.to_lowercase().contains(&query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_id_display() {
        assert_eq!(format!("{}", ItemId(5114)), "5114");
    }

    #[test]
    fn test_item_id_serde_transparent() {
        let json = serde_json::to_string(&ItemId(5114)).unwrap();
        assert_eq!(json, "5114");

        let id: ItemId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, ItemId(5114));
    }

    #[test]
    fn test_item_id_parse() {
        assert_eq!(ItemId::parse("5114"), Some(ItemId(5114)));
        assert_eq!(ItemId::parse(" 5114.0 "), Some(ItemId(5114)));
        assert_eq!(ItemId::parse("5114.5"), None);
        assert_eq!(ItemId::parse("-1"), None);
        assert_eq!(ItemId::parse(""), None);
        assert_eq!(ItemId::parse("MAL_ID"), None);
    }

    #[test]
    fn test_entry_matches() {
        let entry = CatalogEntry::new(1, "Cowboy Bebop", "カウボーイビバップ");
        assert!(entry.matches("bebop"));
        assert!(entry.matches("COWBOY"));
        assert!(!entry.matches("trigun"));
    }
}
