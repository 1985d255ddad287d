use domain::models::{RagAnswer, ScoredMatch};
use domain::prompt::{assemble_context, build_messages, build_prompt};
use infrastructure::config::Config;
use infrastructure::embedder::Embedder;
use infrastructure::openai_client::ChatProvider;
use infrastructure::vector_store::VectorStore;
use shared::telemetry::Telemetry;
use shared::types::Result;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerSettings {
    pub top_k: usize,
    pub max_tokens: u32,
    pub context_char_budget: Option<usize>,
}

impl AnswerSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            top_k: config.top_k,
            max_tokens: config.openai.max_tokens,
            context_char_budget: config.context_char_budget,
        }
    }
}

impl Default for AnswerSettings {
    fn default() -> Self {
        Self {
            top_k: 5,
            max_tokens: 1024,
            context_char_budget: Some(4000),
        }
    }
}

pub struct RagService {
    embedder: Embedder,
    store: Arc<dyn VectorStore>,
    chat: Arc<dyn ChatProvider>,
    settings: AnswerSettings,
}

impl RagService {
    pub fn new(
        embedder: Embedder,
        store: Arc<dyn VectorStore>,
        chat: Arc<dyn ChatProvider>,
        settings: AnswerSettings,
    ) -> Self {
        Self {
            embedder,
            store,
            chat,
            settings,
        }
    }

    pub async fn answer(&self, query: &str) -> Result<String> {
        Ok(self.answer_detailed(query).await?.response)
    }

    pub async fn answer_detailed(&self, query: &str) -> Result<RagAnswer> {
        let telemetry = Telemetry::new("answer");
        let query_embedding = self.embedder.embed(query).await?;
        let matches = self
            .store
            .query(&query_embedding, self.settings.top_k, true)
            .await?;
        tracing::info!(matches = matches.len(), "retrieved context");
        warn_stale(&matches);

        let context = assemble_context(
            matches.iter().filter_map(ScoredMatch::text),
            self.settings.context_char_budget,
        );
        let prompt = build_prompt(query, &context);
        let reply = self
            .chat
            .complete(&build_messages(&prompt), self.settings.max_tokens)
            .await?;

        telemetry.finish();
        Ok(RagAnswer {
            query: query.to_string(),
            prompt,
            matches,
            response: reply.trim().to_string(),
        })
    }
}

fn warn_stale(matches: &[ScoredMatch]) {
    for m in matches {
        if let Some(metadata) = &m.metadata {
            if !metadata.is_current_format() {
                tracing::warn!(
                    key = %m.id,
                    stored_version = ?metadata.format_version,
                    "record text was written by another formatter version; re-ingest to refresh it"
                );
            }
        }
    }
}
