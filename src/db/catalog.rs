use std::{collections::HashMap, fs::File, io::Read, path::Path};

use crate::{
    error::{AppError, AppResult},
    models::{CatalogEntry, ItemId},
};

/// Column holding the item identifier
pub const ID_COLUMN: &str = "MAL_ID";
/// Column holding the display name
pub const PRIMARY_NAME_COLUMN: &str = "English name";
/// Column holding the native name
pub const ALTERNATE_NAME_COLUMN: &str = "Name";
/// Value the source writes when a title has no English name
pub const UNKNOWN_NAME: &str = "Unknown";

/// Read-only index of the master title list
///
/// Loaded once at startup and shared by reference afterwards. Lookups by
/// identifier are unique; lookups by name fail when the name is ambiguous.
#[derive(Debug, Default)]
pub struct CatalogStore {
    entries: Vec<CatalogEntry>,
    by_id: HashMap<ItemId, usize>,
    by_primary: HashMap<String, Vec<usize>>,
    by_alternate: HashMap<String, Vec<usize>>,
}

impl CatalogStore {
    /// Builds the store from entries, rejecting duplicate identifiers
    pub fn from_entries(entries: Vec<CatalogEntry>) -> AppResult<Self> {
        let mut store = Self::default();

        for (position, entry) in entries.into_iter().enumerate() {
            if store.by_id.insert(entry.id, position).is_some() {
                return Err(AppError::InvalidData(format!(
                    "duplicate catalog identifier {}",
                    entry.id
                )));
            }
            store
                .by_primary
                .entry(entry.primary_name.clone())
                .or_default()
                .push(position);
            store
                .by_alternate
                .entry(entry.alternate_name.clone())
                .or_default()
                .push(position);
            store.entries.push(entry);
        }

        Ok(store)
    }

    /// Loads the catalog from CSV
    ///
    /// Titles whose English name is the `Unknown` placeholder fall back to
    /// their native name, so the placeholder never becomes a lookup key.
    pub fn load<R: Read>(reader: R) -> AppResult<Self> {
        let mut reader = csv::Reader::from_reader(reader);
        let headers = reader.headers()?.clone();

        let column = |name: &str| {
            headers.iter().position(|h| h.trim() == name).ok_or_else(|| {
                AppError::InvalidData(format!(
                    "catalog is missing column '{}' (found {:?})",
                    name,
                    headers.iter().collect::<Vec<_>>()
                ))
            })
        };
        let id_idx = column(ID_COLUMN)?;
        let primary_idx = column(PRIMARY_NAME_COLUMN)?;
        let alternate_idx = column(ALTERNATE_NAME_COLUMN)?;

        let mut entries = Vec::new();
        for (line, record) in reader.records().enumerate() {
            let record = record?;
            let raw_id = record.get(id_idx).unwrap_or_default();
            let id = ItemId::parse(raw_id).ok_or_else(|| {
                AppError::InvalidData(format!(
                    "catalog row {}: invalid identifier '{}'",
                    line + 2,
                    raw_id
                ))
            })?;

            let alternate_name = record.get(alternate_idx).unwrap_or_default().trim().to_string();
            let primary_name = match record.get(primary_idx).map(str::trim) {
                Some(name) if !name.is_empty() && name != UNKNOWN_NAME => name.to_string(),
                _ => alternate_name.clone(),
            };

            entries.push(CatalogEntry {
                id,
                primary_name,
                alternate_name,
            });
        }

        let store = Self::from_entries(entries)?;
        tracing::info!(entries = store.len(), "Loaded catalog");
        Ok(store)
    }

    /// Loads the catalog from a CSV file
    pub fn load_path(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "Opening catalog");
        Self::load(File::open(path)?)
    }

    pub fn by_identifier(&self, id: ItemId) -> AppResult<&CatalogEntry> {
        self.by_id
            .get(&id)
            .map(|&position| &self.entries[position])
            .ok_or_else(|| AppError::NotFound(format!("No catalog entry with identifier {}", id)))
    }

    /// Resolves a name, trying primary names before alternate names
    pub fn by_name(&self, name: &str) -> AppResult<&CatalogEntry> {
        let positions = self
            .by_primary
            .get(name)
            .or_else(|| self.by_alternate.get(name))
            .ok_or_else(|| AppError::NotFound(format!("No catalog entry named '{}'", name)))?;

        match positions.as_slice() {
            [position] => Ok(&self.entries[*position]),
            _ => Err(AppError::AmbiguousName {
                name: name.to_string(),
                matches: positions.len(),
            }),
        }
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.by_id.contains_key(&id)
    }

    /// All entries in file order
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn search(&self, query: &str) -> Vec<&CatalogEntry> {
        self.entries.iter().filter(|e| e.matches(query)).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
