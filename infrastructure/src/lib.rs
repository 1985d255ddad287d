pub mod config;
pub mod embedder;
pub mod embedding_storage;
pub mod itinerary_loader;
pub mod openai_client;
pub mod pinecone;
pub mod search;
pub mod vector_store;

use config::{Config, VectorBackend};
use shared::types::Result;
use std::sync::Arc;
use vector_store::VectorStore;

/// Open the vector store selected by the configuration.
pub fn open_vector_store(config: &Config) -> Result<Arc<dyn VectorStore>> {
    let store: Arc<dyn VectorStore> = match &config.backend {
        VectorBackend::Pinecone(settings) => Arc::new(pinecone::PineconeStore::new(settings.clone())),
        VectorBackend::Local(settings) => Arc::new(embedding_storage::EmbeddingStorage::new(
            &settings.db_path,
            settings.index_name.clone(),
        )?),
    };
    Ok(store)
}
