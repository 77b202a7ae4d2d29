use rand::{
    distr::{weighted::WeightedIndex, Distribution},
    Rng,
};

use crate::{
    error::{AppError, AppResult},
    models::{SampleResult, SimilarityRow},
};

/// Weighted sampling without replacement over a similarity row
///
/// Stateless. Each candidate's weight is its first-draw probability; drawn
/// candidates leave the pool and the remaining weights renormalize
/// implicitly. Only relative weights matter, so a row whose weights drift
/// from 1.0 is sampled as its normalized distribution. Candidates with zero
/// weight are never drawn.
pub struct SamplingEngine;

impl SamplingEngine {
    /// Draws `k` distinct candidate identifiers using `rng`
    pub fn sample<R: Rng + ?Sized>(
        row: &SimilarityRow,
        k: usize,
        rng: &mut R,
    ) -> AppResult<SampleResult> {
        if let Some(bad) = row
            .candidates
            .iter()
            .find(|c| !c.weight.is_finite() || c.weight < 0.0)
        {
            return Err(AppError::InvalidInput(format!(
                "candidate {} of row {} has invalid weight {}",
                bad.id, row.source, bad.weight
            )));
        }

        let available = row.candidates.iter().filter(|c| c.weight > 0.0).count();
        if k > available {
            return Err(AppError::InsufficientCandidates {
                requested: k,
                available,
            });
        }
        if k == 0 {
            return Ok(SampleResult(Vec::new()));
        }

        // One draw per position, so the i-th id is the i-th successive draw
        let mut remaining: Vec<f64> = row.candidates.iter().map(|c| c.weight).collect();
        let mut drawn = Vec::with_capacity(k);
        for _ in 0..k {
            let index = WeightedIndex::new(&remaining)
                .map_err(|e| AppError::Internal(format!("weighted sampling failed: {}", e)))?
                .sample(&mut *rng);
            remaining[index] = 0.0;
            drawn.push(row.candidates[index].id);
        }

        tracing::debug!(source = %row.source, k, "Sampled similar titles");
        Ok(SampleResult(drawn))
    }

    /// Draws from the thread-local generator, so every call is a fresh draw
    pub fn sample_fresh(row: &SimilarityRow, k: usize) -> AppResult<SampleResult> {
        Self::sample(row, k, &mut rand::rng())
    }
}
