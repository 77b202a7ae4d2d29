use std::sync::Arc;

use rand::Rng;
use tokio::task::JoinSet;

use crate::{
    db::{CatalogStore, SimilarityStore},
    error::{AppError, AppResult},
    models::{CatalogEntry, ItemId, MetadataRecord, Recommendation, ResolvedTitle},
    services::{providers::MetadataResolver, sampling::SamplingEngine},
};

/// Titles chosen for one recommendation, before any metadata is fetched
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationPlan {
    pub selected: CatalogEntry,
    pub similar: Vec<CatalogEntry>,
}

/// Answers "show this title and a few titles similar to it"
///
/// Holds the stores read-only and no per-request state, so one instance is
/// shared by every request.
pub struct RecommendationService {
    catalog: Arc<CatalogStore>,
    similarity: Arc<SimilarityStore>,
    resolver: Arc<dyn MetadataResolver>,
    concurrent_fetches: bool,
}

impl RecommendationService {
    pub fn new(
        catalog: Arc<CatalogStore>,
        similarity: Arc<SimilarityStore>,
        resolver: Arc<dyn MetadataResolver>,
    ) -> Self {
        Self {
            catalog,
            similarity,
            resolver,
            concurrent_fetches: true,
        }
    }

    /// Fetch metadata one title at a time instead of fanning out
    pub fn with_concurrent_fetches(mut self, concurrent: bool) -> Self {
        self.concurrent_fetches = concurrent;
        self
    }

    pub fn catalog(&self) -> &CatalogStore {
        &self.catalog
    }

    /// Recommends `k` titles similar to `selected_name`, freshly sampled
    pub async fn recommend(&self, selected_name: &str, k: usize) -> AppResult<Recommendation> {
        let plan = self.plan(selected_name, k, &mut rand::rng())?;
        self.resolve(plan).await
    }

    /// Same as [`recommend`](Self::recommend) with a caller-supplied random source
    pub async fn recommend_with_rng<R: Rng + ?Sized>(
        &self,
        selected_name: &str,
        k: usize,
        rng: &mut R,
    ) -> AppResult<Recommendation> {
        let plan = self.plan(selected_name, k, rng)?;
        self.resolve(plan).await
    }

    /// Resolves the selection and draws its similar titles from the stores
    pub fn plan<R: Rng + ?Sized>(
        &self,
        selected_name: &str,
        k: usize,
        rng: &mut R,
    ) -> AppResult<RecommendationPlan> {
        let selected = self.catalog.by_name(selected_name)?.clone();
        let row = self.similarity.row_for(selected.id)?;
        let sample = SamplingEngine::sample(row, k, rng)?;

        let similar = sample
            .into_iter()
            .map(|id| self.catalog.by_identifier(id).cloned())
            .collect::<AppResult<Vec<_>>>()?;

        tracing::info!(
            item_id = %selected.id,
            name = %selected.primary_name,
            candidates = row.len(),
            sampled = similar.len(),
            "Planned recommendation"
        );

        Ok(RecommendationPlan { selected, similar })
    }

    /// Fetches metadata for every title of the plan
    ///
    /// The first failed fetch aborts the whole recommendation.
    pub async fn resolve(&self, plan: RecommendationPlan) -> AppResult<Recommendation> {
        let RecommendationPlan { selected, similar } = plan;
        let ids: Vec<ItemId> = std::iter::once(selected.id)
            .chain(similar.iter().map(|e| e.id))
            .collect();

        let mut records = if self.concurrent_fetches {
            self.fetch_concurrently(ids).await?
        } else {
            self.fetch_sequentially(ids).await?
        }
        .into_iter();

        let selected_metadata = records
            .next()
            .ok_or_else(|| AppError::Internal("missing metadata for selected title".to_string()))?;

        let similar = similar
            .into_iter()
            .zip(records)
            .map(|(entry, metadata)| ResolvedTitle { entry, metadata })
            .collect();

        Ok(Recommendation {
            selected: ResolvedTitle {
                entry: selected,
                metadata: selected_metadata,
            },
            similar,
        })
    }

    async fn fetch_sequentially(&self, ids: Vec<ItemId>) -> AppResult<Vec<MetadataRecord>> {
        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            records.push(self.resolver.fetch(id).await?);
        }
        Ok(records)
    }

    /// Fans out one task per id; the first failure to arrive aborts the rest
    async fn fetch_concurrently(&self, ids: Vec<ItemId>) -> AppResult<Vec<MetadataRecord>> {
        let mut tasks = JoinSet::new();
        for (index, id) in ids.iter().copied().enumerate() {
            let resolver = Arc::clone(&self.resolver);
            tasks.spawn(async move { (index, resolver.fetch(id).await) });
        }

        let mut slots: Vec<Option<MetadataRecord>> = vec![None; ids.len()];
        while let Some(joined) = tasks.join_next().await {
            let outcome = match joined {
                Ok((index, Ok(record))) => {
                    slots[index] = Some(record);
                    continue;
                }
                Ok((_, Err(e))) => e,
                Err(e) => AppError::Internal(e.to_string()),
            };

            tracing::error!(
                error = %outcome,
                provider = self.resolver.name(),
                "Metadata fetch failed, aborting recommendation"
            );
            tasks.abort_all();
            return Err(outcome);
        }

        slots
            .into_iter()
            .zip(ids)
            .map(|(slot, id)| {
                slot.ok_or_else(|| AppError::Internal(format!("no metadata fetched for {}", id)))
            })
            .collect()
    }
}
