use async_trait::async_trait;
use shared::types::Result;
use std::sync::Arc;

/// Anything that can turn text into a vector.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Checks every vector against the index dimension before it reaches the store.
#[derive(Clone)]
pub struct Embedder {
    provider: Arc<dyn EmbeddingProvider>,
    dimension: usize,
}

impl Embedder {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, dimension: usize) -> Self {
        Self {
            provider,
            dimension,
        }
    }

    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let vector = self.provider.embed(text).await?;
        if vector.len() != self.dimension {
            anyhow::bail!(
                "Embedding has {} dimensions, index expects {}",
                vector.len(),
                self.dimension
            );
        }
        Ok(vector)
    }
}
