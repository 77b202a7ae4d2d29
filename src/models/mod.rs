use serde::Serialize;

pub mod metadata;
pub mod similarity;
pub mod title;

pub use metadata::MetadataRecord;
pub use similarity::{Candidate, SampleResult, SimilarityRow};
pub use title::{CatalogEntry, ItemId};

/// A catalog entry paired with its freshly resolved metadata
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedTitle {
    pub entry: CatalogEntry,
    pub metadata: MetadataRecord,
}

/// Answer to "given a selected title, show it and titles similar to it"
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub selected: ResolvedTitle,
    /// Ordered as drawn by the sampler
    pub similar: Vec<ResolvedTitle>,
}
