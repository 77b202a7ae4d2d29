use std::{
    collections::{BTreeMap, BTreeSet, HashMap, HashSet},
    fs::File,
    io::Read,
    path::Path,
};

use crate::{
    db::CatalogStore,
    error::{AppError, AppResult},
    models::{Candidate, ItemId, SimilarityRow},
};

/// Column group holding candidate identifiers
pub const ID_GROUP: &str = "MAL_ID";
/// Column group holding candidate weights
pub const WEIGHT_GROUP: &str = "WEIGHT";
/// Allowed distance of a row's weight sum from 1.0 before it is renormalized
pub const WEIGHT_TOLERANCE: f64 = 1e-6;

/// Read-only table of precomputed similarity rows keyed by source identifier
#[derive(Debug, Default)]
pub struct SimilarityStore {
    rows: HashMap<ItemId, SimilarityRow>,
}

/// Column positions of one rank in the two-level header
#[derive(Debug, Default)]
struct RankColumns {
    id: Option<usize>,
    weight: Option<usize>,
}

impl SimilarityStore {
    /// Builds the store from (source, candidates) rows
    ///
    /// Each row is validated and normalized so its weights sum to 1.0.
    pub fn from_rows<I>(rows: I) -> AppResult<Self>
    where
        I: IntoIterator<Item = (ItemId, Vec<Candidate>)>,
    {
        let mut store = Self::default();
        for (source, candidates) in rows {
            let row = validate_row(source, candidates)?;
            if store.rows.insert(source, row).is_some() {
                return Err(AppError::InvalidData(format!(
                    "duplicate similarity row for {}",
                    source
                )));
            }
        }
        Ok(store)
    }

    /// Loads the table from a CSV with a two-row header
    ///
    /// The first header row names the column group (`MAL_ID` or `WEIGHT`),
    /// the second the rank position shared by both groups. The first column
    /// is the source identifier. A header row naming the index is skipped.
    pub fn load<R: Read>(reader: R) -> AppResult<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);
        let mut records = reader.records();

        let groups = records
            .next()
            .ok_or_else(|| AppError::InvalidData("similarity table is empty".to_string()))??;
        let ranks = records
            .next()
            .ok_or_else(|| AppError::InvalidData("similarity table lacks the rank header".to_string()))??;

        let mut columns: BTreeMap<usize, RankColumns> = BTreeMap::new();
        for (idx, (group, rank)) in groups.iter().zip(ranks.iter()).enumerate().skip(1) {
            let slot = match group.trim() {
                ID_GROUP => &mut columns.entry(parse_rank(rank, idx)?).or_default().id,
                WEIGHT_GROUP => &mut columns.entry(parse_rank(rank, idx)?).or_default().weight,
                _ => continue,
            };
            *slot = Some(idx);
        }

        let layout = columns
            .into_iter()
            .map(|(rank, cols)| match (cols.id, cols.weight) {
                (Some(id), Some(weight)) => Ok((id, weight)),
                _ => Err(AppError::InvalidData(format!(
                    "rank {} needs both a {} and a {} column",
                    rank, ID_GROUP, WEIGHT_GROUP
                ))),
            })
            .collect::<AppResult<Vec<_>>>()?;

        if layout.is_empty() {
            return Err(AppError::InvalidData(format!(
                "similarity table has no {}/{} columns",
                ID_GROUP, WEIGHT_GROUP
            )));
        }

        let mut rows = Vec::new();
        for (line, record) in records.enumerate() {
            let record = record?;
            let line = line + 3;
            let raw_source = record.get(0).unwrap_or_default();

            let Some(source) = ItemId::parse(raw_source) else {
                if record.iter().skip(1).all(|cell| cell.trim().is_empty()) {
                    // index name row
                    continue;
                }
                return Err(AppError::InvalidData(format!(
                    "similarity row {}: invalid source identifier '{}'",
                    line, raw_source
                )));
            };

            let mut candidates = Vec::with_capacity(layout.len());
            for &(id_idx, weight_idx) in &layout {
                let raw_id = record.get(id_idx).map(str::trim).unwrap_or_default();
                let raw_weight = record.get(weight_idx).map(str::trim).unwrap_or_default();
                if raw_id.is_empty() || raw_weight.is_empty() {
                    continue;
                }

                let id = ItemId::parse(raw_id).ok_or_else(|| {
                    AppError::InvalidData(format!(
                        "similarity row {}: invalid candidate identifier '{}'",
                        line, raw_id
                    ))
                })?;
                let weight = raw_weight.parse::<f64>().map_err(|_| {
                    AppError::InvalidData(format!(
                        "similarity row {}: invalid weight '{}'",
                        line, raw_weight
                    ))
                })?;
                candidates.push(Candidate { id, weight });
            }

            rows.push((source, candidates));
        }

        let store = Self::from_rows(rows)?;
        tracing::info!(rows = store.len(), ranks = layout.len(), "Loaded similarity table");
        Ok(store)
    }

    /// Loads the table from a CSV file
    pub fn load_path(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "Opening similarity table");
        Self::load(File::open(path)?)
    }

    pub fn row_for(&self, source: ItemId) -> AppResult<&SimilarityRow> {
        self.rows
            .get(&source)
            .ok_or_else(|| AppError::NotFound(format!("No similarity row for identifier {}", source)))
    }

    /// Identifiers referenced by this table that the catalog can't resolve
    pub fn orphans(&self, catalog: &CatalogStore) -> Vec<ItemId> {
        let orphans: BTreeSet<ItemId> = self
            .rows
            .values()
            .flat_map(|row| {
                std::iter::once(row.source).chain(row.candidates.iter().map(|c| c.id))
            })
            .filter(|id| !catalog.contains(*id))
            .collect();
        orphans.into_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn parse_rank(raw: &str, column: usize) -> AppResult<usize> {
    raw.trim().parse::<usize>().map_err(|_| {
        AppError::InvalidData(format!(
            "column {}: invalid rank position '{}'",
            column, raw
        ))
    })
}

fn validate_row(source: ItemId, mut candidates: Vec<Candidate>) -> AppResult<SimilarityRow> {
    let mut seen = HashSet::with_capacity(candidates.len());
    for candidate in &candidates {
        if !seen.insert(candidate.id) {
            return Err(AppError::InvalidData(format!(
                "row {} lists candidate {} twice",
                source, candidate.id
            )));
        }
        if !candidate.weight.is_finite() || candidate.weight < 0.0 {
            return Err(AppError::InvalidData(format!(
                "row {} has invalid weight {} for candidate {}",
                source, candidate.weight, candidate.id
            )));
        }
    }

    let total: f64 = candidates.iter().map(|c| c.weight).sum();
    if !total.is_finite() {
        return Err(AppError::InvalidData(format!(
            "row {} weights overflow to {}",
            source, total
        )));
    }
    if candidates.is_empty() || total <= 0.0 {
        return Err(AppError::InvalidData(format!(
            "row {} has no positive weight",
            source
        )));
    }

    if (total - 1.0).abs() > WEIGHT_TOLERANCE {
        tracing::debug!(source = %source, total, "Renormalizing similarity row");
        for candidate in &mut candidates {
            candidate.weight /= total;
        }
    }

    Ok(SimilarityRow { source, candidates })
}
