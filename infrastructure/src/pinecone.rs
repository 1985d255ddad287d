//! Pinecone serverless index over its REST API: the control plane for
//! describing and creating indexes, the per-index data plane for upserts
//! and queries.

use crate::config::PineconeSettings;
use crate::vector_store::VectorStore;
use anyhow::{anyhow, bail, Context};
use async_trait::async_trait;
use domain::models::{IndexSpec, IndexStatus, RecordKind, RecordMetadata, ScoredMatch, VectorRecord};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use shared::types::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;

#[derive(Debug, Deserialize)]
struct IndexModel {
    dimension: Option<usize>,
    metric: Option<String>,
    #[serde(default)]
    host: String,
    #[serde(default)]
    status: IndexState,
}

#[derive(Debug, Default, Deserialize)]
struct IndexState {
    #[serde(default)]
    ready: bool,
    #[serde(default)]
    state: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<WireMatch>,
}

#[derive(Deserialize)]
struct WireMatch {
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<WireMetadata>,
}

// Pinecone hands every metadata number back as a float.
#[derive(Deserialize)]
struct WireMetadata {
    text: String,
    #[serde(default)]
    kind: Option<RecordKind>,
    #[serde(default)]
    format_version: Option<f64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    #[serde(default)]
    upserted_count: usize,
}

pub struct PineconeStore {
    client: Arc<Client>,
    settings: PineconeSettings,
    host: OnceCell<String>,
}

impl PineconeStore {
    pub fn new(settings: PineconeSettings) -> Self {
        Self {
            client: Arc::new(Client::new()),
            settings,
            host: OnceCell::new(),
        }
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("Api-Key", self.settings.api_key.expose())
            .header("X-Pinecone-API-Version", &self.settings.api_version)
    }

    async fn describe_index(&self, name: &str) -> Result<Option<IndexModel>> {
        let url = format!("{}/indexes/{}", self.settings.control_url, name);
        let response = self
            .authorized(self.client.get(&url))
            .send()
            .await
            .context("Failed contacting the Pinecone control plane")?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        parse_json(response, "describe index").await.map(Some)
    }

    async fn create_index(&self, spec: &IndexSpec) -> Result<()> {
        let url = format!("{}/indexes", self.settings.control_url);
        let body = json!({
            "name": spec.name,
            "dimension": spec.dimension,
            "metric": spec.metric.as_str(),
            "spec": {
                "serverless": {
                    "cloud": self.settings.cloud,
                    "region": self.settings.region,
                }
            }
        });
        let response = self
            .authorized(self.client.post(&url))
            .json(&body)
            .send()
            .await
            .context("Failed contacting the Pinecone control plane")?;
        let _: serde_json::Value = parse_json(response, "create index").await?;
        Ok(())
    }

    async fn wait_until_ready(&self, name: &str) -> Result<IndexModel> {
        let interval = Duration::from_millis(self.settings.ready_poll_interval_ms);
        for attempt in 1..=self.settings.ready_poll_attempts {
            if let Some(model) = self.describe_index(name).await? {
                if model.status.ready {
                    return Ok(model);
                }
                tracing::debug!(index = name, attempt, state = %model.status.state, "waiting for index");
            }
            tokio::time::sleep(interval).await;
        }
        bail!(
            "Index {:?} was not ready after {} checks",
            name,
            self.settings.ready_poll_attempts
        )
    }

    async fn data_url(&self) -> Result<&str> {
        let host = self
            .host
            .get_or_try_init(|| async {
                let model = self
                    .describe_index(&self.settings.index_name)
                    .await?
                    .ok_or_else(|| anyhow!("Index {:?} does not exist", self.settings.index_name))?;
                Ok::<_, anyhow::Error>(normalize_host(&model.host))
            })
            .await?;
        Ok(host.as_str())
    }

    fn remember_host(&self, model: &IndexModel) {
        // Already set means a query raced ahead and resolved the same host.
        let _ = self.host.set(normalize_host(&model.host));
    }
}

#[async_trait]
impl VectorStore for PineconeStore {
    async fn ensure_index(&self, spec: &IndexSpec) -> Result<IndexStatus> {
        if spec.name != self.settings.index_name {
            bail!(
                "Pinecone store is bound to index {:?}, not {:?}",
                self.settings.index_name,
                spec.name
            );
        }

        if let Some(model) = self.describe_index(&spec.name).await? {
            if let Some(dimension) = model.dimension {
                if dimension != spec.dimension {
                    bail!(
                        "Index {:?} already exists with dimension {}",
                        spec.name,
                        dimension
                    );
                }
            }
            if let Some(metric) = &model.metric {
                if metric != spec.metric.as_str() {
                    bail!("Index {:?} already exists with metric {}", spec.name, metric);
                }
            }
            self.remember_host(&model);
            return Ok(IndexStatus::Existing);
        }

        tracing::info!(index = %spec.name, dimension = spec.dimension, "creating Pinecone index");
        self.create_index(spec).await?;
        let model = self.wait_until_ready(&spec.name).await?;
        self.remember_host(&model);
        Ok(IndexStatus::Created)
    }

    async fn upsert(&self, records: &[VectorRecord]) -> Result<()> {
        let url = format!("{}/vectors/upsert", self.data_url().await?);
        let body = json!({ "vectors": records });
        let response = self
            .authorized(self.client.post(&url))
            .json(&body)
            .send()
            .await
            .context("Failed contacting the Pinecone index")?;
        let result: UpsertResponse = parse_json(response, "upsert").await?;
        tracing::debug!(upserted = result.upserted_count, "pinecone upsert");
        Ok(())
    }

    async fn query(&self, vector: &[f32], top_k: usize, include_metadata: bool) -> Result<Vec<ScoredMatch>> {
        let url = format!("{}/query", self.data_url().await?);
        let request = QueryRequest {
            vector,
            top_k,
            include_metadata,
            include_values: false,
        };
        let response = self
            .authorized(self.client.post(&url))
            .json(&request)
            .send()
            .await
            .context("Failed contacting the Pinecone index")?;
        let result: QueryResponse = parse_json(response, "query").await?;
        Ok(result
            .matches
            .into_iter()
            .map(|m| ScoredMatch {
                id: m.id,
                score: m.score,
                metadata: m.metadata.map(|md| RecordMetadata {
                    text: md.text,
                    kind: md.kind,
                    format_version: md.format_version.map(|v| v as u32),
                }),
            })
            .collect())
    }
}

fn normalize_host(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

async fn parse_json<T: DeserializeOwned>(response: Response, what: &str) -> Result<T> {
    let status = response.status();
    let text = response.text().await?;
    if !status.is_success() {
        bail!("Pinecone {} request failed ({}): {}", what, status, text);
    }
    serde_json::from_str(&text).with_context(|| format!("Unexpected Pinecone {} response body", what))
}
