use serde::{Deserialize, Serialize};

use super::ItemId;

/// Candidate of a similarity row with its selection probability
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: ItemId,
    pub weight: f64,
}

/// Precomputed distribution over similar items for one source item
///
/// Candidates are kept in rank order and their weights sum to 1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityRow {
    pub source: ItemId,
    pub candidates: Vec<Candidate>,
}

impl SimilarityRow {
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn total_weight(&self) -> f64 {
        self.candidates.iter().map(|c| c.weight).sum()
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.candidates.iter().any(|c| c.id == id)
    }
}

/// Distinct candidate identifiers drawn from one row, in draw order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SampleResult(pub Vec<ItemId>);

impl SampleResult {
    pub fn ids(&self) -> &[ItemId] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl IntoIterator for SampleResult {
    type Item = ItemId;
    type IntoIter = std::vec::IntoIter<ItemId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
