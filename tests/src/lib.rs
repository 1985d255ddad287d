//! Deterministic stand-ins for the remote services, shared by the pipeline
//! tests.

use anyhow::bail;
use application::ingest_service::IngestService;
use application::rag_service::{AnswerSettings, RagService};
use async_trait::async_trait;
use domain::itinerary::ItineraryDocument;
use domain::models::{IndexSpec, Metric};
use domain::session::ChatMessage;
use infrastructure::embedder::{Embedder, EmbeddingProvider};
use infrastructure::embedding_storage::EmbeddingStorage;
use infrastructure::openai_client::ChatProvider;
use infrastructure::vector_store::VectorStore;
use shared::types::Result;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const DIMENSION: usize = 64;
pub const INDEX_NAME: &str = "itinerary";

/// Bag-of-words hashing embedder: texts sharing words land close together.
#[derive(Default)]
pub struct HashEmbedder {
    calls: AtomicUsize,
    fail_on_call: Option<usize>,
}

impl HashEmbedder {
    /// Fails the `n`-th call (1-based) with a simulated rate limit.
    pub fn failing_on(n: usize) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_on_call: Some(n),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn vector_for(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; DIMENSION];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let mut hasher = DefaultHasher::new();
            word.to_lowercase().hash(&mut hasher);
            vector[(hasher.finish() % DIMENSION as u64) as usize] += 1.0;
        }
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on_call == Some(call) {
            bail!("embedding service returned 429: rate limited");
        }
        Ok(Self::vector_for(text))
    }
}

/// Chat stand-in that records every exchange and replies with a fixed text.
pub struct ScriptedChat {
    reply: String,
    exchanges: Mutex<Vec<(Vec<ChatMessage>, u32)>>,
}

impl ScriptedChat {
    pub fn replying(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            exchanges: Mutex::new(Vec::new()),
        }
    }

    pub fn exchanges(&self) -> Vec<(Vec<ChatMessage>, u32)> {
        self.exchanges.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatProvider for ScriptedChat {
    async fn complete(&self, messages: &[ChatMessage], max_tokens: u32) -> Result<String> {
        self.exchanges
            .lock()
            .unwrap()
            .push((messages.to_vec(), max_tokens));
        Ok(self.reply.clone())
    }
}

pub fn index_spec() -> IndexSpec {
    IndexSpec {
        name: INDEX_NAME.to_string(),
        dimension: DIMENSION,
        metric: Metric::Cosine,
    }
}

/// Everything wired against an in-memory SQLite index.
pub struct Harness {
    pub store: Arc<EmbeddingStorage>,
    pub embedder: Arc<HashEmbedder>,
    pub chat: Arc<ScriptedChat>,
}

impl Harness {
    pub async fn new(embedder: HashEmbedder, reply: &str) -> Result<Self> {
        let store = Arc::new(EmbeddingStorage::in_memory(INDEX_NAME)?);
        store.ensure_index(&index_spec()).await?;
        Ok(Self {
            store,
            embedder: Arc::new(embedder),
            chat: Arc::new(ScriptedChat::replying(reply)),
        })
    }

    fn embedder(&self) -> Embedder {
        Embedder::new(self.embedder.clone(), DIMENSION)
    }

    pub fn ingest_service(&self) -> IngestService {
        IngestService::new(self.embedder(), self.store.clone())
    }

    pub fn rag_service(&self, settings: AnswerSettings) -> RagService {
        RagService::new(self.embedder(), self.store.clone(), self.chat.clone(), settings)
    }

    /// Every stored `(id, text)`, fetched through a query wide enough to
    /// return the whole index.
    pub async fn stored(&self) -> Result<Vec<(String, String)>> {
        let probe = vec![1.0; DIMENSION];
        let mut rows: Vec<(String, String)> = self
            .store
            .query(&probe, usize::MAX, true)
            .await?
            .into_iter()
            .map(|m| {
                let text = m.text().unwrap_or_default().to_string();
                (m.id, text)
            })
            .collect();
        rows.sort();
        Ok(rows)
    }
}

pub fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .join("Journey_Details.json")
}

pub fn single_flight(passengers: &str) -> ItineraryDocument {
    let raw = format!(
        r#"{{"user": {{"id": "U1", "flights": [{{
            "ticket_id": "T1", "source": "NYC", "destination": "LAX",
            "departure_date": "2024-05-01", "arrival_date": "2024-05-01", "layover_duration": "0h",
            "segments": [{{
                "flight_number": "AA100",
                "departure": {{"airport": "John F. Kennedy", "iata": "JFK", "date": "2024-05-01 08:00"}},
                "arrival": {{"airport": "Los Angeles Intl", "iata": "LAX", "date": "2024-05-01 11:30"}},
                "passengers": {}
            }}]
        }}]}}}}"#,
        passengers
    );
    ItineraryDocument::from_json_str(&raw).expect("valid test itinerary")
}

pub const ONE_PASSENGER: &str = r#"[{"first_name": "Ada", "last_name": "Lovelace", "seat_number": "12A", "cabin_baggage": "7kg", "check_in_baggage": "23kg"}]"#;
