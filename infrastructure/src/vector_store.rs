use async_trait::async_trait;
use domain::models::{IndexSpec, IndexStatus, ScoredMatch, VectorRecord};
use shared::types::Result;

/// A similarity index holding `(key, vector, metadata)` records.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create the index described by `spec` unless it already exists.
    async fn ensure_index(&self, spec: &IndexSpec) -> Result<IndexStatus>;

    /// Insert or overwrite records by id.
    async fn upsert(&self, records: &[VectorRecord]) -> Result<()>;

    /// Nearest `top_k` records, best first.
    async fn query(&self, vector: &[f32], top_k: usize, include_metadata: bool) -> Result<Vec<ScoredMatch>>;
}
