#[cfg(test)]
mod tests;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use crate::dataset::RegulationClause;
use crate::embeddings::Embedder;
use crate::{ComplianceError, Result};

// Clauses per embed_batch call while building, so the progress bar moves
// even for large datasets.
const BUILD_BATCH_SIZE: usize = 32;

/// In-memory exact nearest-neighbor index over regulation clauses.
///
/// Clauses are stored in insertion order; the row id of a vector is the
/// position of its clause. Built once at startup and read-only afterwards,
/// so concurrent `search` calls need no locking.
#[derive(Debug, Clone)]
pub struct RegulationIndex {
    clauses: Vec<RegulationClause>,
    vectors: Vec<Vec<f32>>,
    dimension: usize,
}

/// A retrieved clause with its Euclidean distance to the query.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredClause<'a> {
    pub clause: &'a RegulationClause,
    pub distance: f32,
}

impl RegulationIndex {
    /// Embed every clause and build the flat L2 structure.
    ///
    /// The only constructor: an unbuilt index is unrepresentable. Fails
    /// with a `Dataset` error when the dataset is empty or a clause is
    /// missing required fields, and with an embedding fault when the
    /// provider returns vectors of inconsistent dimension.
    #[inline]
    pub fn build(clauses: Vec<RegulationClause>, embedder: &dyn Embedder) -> Result<Self> {
        if clauses.is_empty() {
            return Err(ComplianceError::Dataset(
                "cannot build an index over an empty dataset".to_string(),
            ));
        }

        for clause in &clauses {
            clause.validate()?;
        }

        let progress = if console::Term::stderr().is_term() {
            ProgressBar::new(clauses.len() as u64).with_style(
                ProgressStyle::with_template("{bar:40} [{pos}/{len}] Embedding regulation clauses")
                    .expect("valid progress template"),
            )
        } else {
            ProgressBar::hidden()
        };

        let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(clauses.len());
        for batch in clauses.chunks(BUILD_BATCH_SIZE) {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let embedded = embedder.embed_batch(&texts)?;
            progress.inc(embedded.len() as u64);
            vectors.extend(embedded);
        }
        progress.finish_and_clear();

        if vectors.len() != clauses.len() {
            return Err(ComplianceError::Other(anyhow::anyhow!(
                "embedding provider returned {} vectors for {} clauses",
                vectors.len(),
                clauses.len()
            )));
        }

        let dimension = vectors.first().map_or(0, Vec::len);
        if dimension == 0 {
            return Err(ComplianceError::Other(anyhow::anyhow!(
                "embedding provider returned an empty vector"
            )));
        }
        for (position, vector) in vectors.iter().enumerate() {
            if vector.len() != dimension {
                return Err(ComplianceError::Other(anyhow::anyhow!(
                    "embedding dimension mismatch at row {}: expected {}, got {}",
                    position,
                    dimension,
                    vector.len()
                )));
            }
        }

        info!(
            "Built regulation index: {} clauses, {} dimensions",
            clauses.len(),
            dimension
        );

        Ok(Self {
            clauses,
            vectors,
            dimension,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Embed the query and return the `k` nearest clauses by Euclidean
    /// distance, ascending, ties broken by insertion order. Returns all
    /// clauses when `k` exceeds the indexed count. Deterministic for a
    /// fixed index and embedding provider.
    #[inline]
    pub fn search(
        &self,
        embedder: &dyn Embedder,
        query_text: &str,
        k: usize,
    ) -> Result<Vec<ScoredClause<'_>>> {
        let query = embedder.embed(query_text)?;
        self.search_vector(&query, k)
    }

    /// Nearest-neighbor search over an already-embedded query vector.
    #[inline]
    pub fn search_vector(&self, query: &[f32], k: usize) -> Result<Vec<ScoredClause<'_>>> {
        if k == 0 {
            return Err(ComplianceError::Other(anyhow::anyhow!(
                "search requires k >= 1"
            )));
        }

        if query.len() != self.dimension {
            return Err(ComplianceError::Other(anyhow::anyhow!(
                "query dimension mismatch: expected {}, got {}",
                self.dimension,
                query.len()
            )));
        }

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .map(|vector| euclidean_distance(query, vector))
            .enumerate()
            .collect();

        // Ascending distance; insertion order settles ties.
        scored.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        scored.truncate(k);

        debug!(
            "Search returned {} of {} clauses",
            scored.len(),
            self.clauses.len()
        );

        Ok(scored
            .into_iter()
            .map(|(position, distance)| ScoredClause {
                clause: &self.clauses[position],
                distance,
            })
            .collect())
    }
}

fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .fold(0.0f32, |sum, (x, y)| {
            let diff = x - y;
            diff.mul_add(diff, sum)
        })
        .sqrt()
}
