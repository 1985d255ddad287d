use crate::search::SearchEngine;
use crate::vector_store::VectorStore;
use anyhow::{anyhow, bail, Context};
use async_trait::async_trait;
use domain::models::{IndexSpec, IndexStatus, RecordKind, RecordMetadata, ScoredMatch, VectorRecord};
use rusqlite::{params, Connection, OptionalExtension, Result as SqlResult};
use shared::types::Result;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Vector store kept in a local SQLite file. Similarity search is a full
/// scan scored with cosine similarity, which is plenty for one itinerary.
pub struct EmbeddingStorage {
    conn: Mutex<Connection>,
    index_name: String,
}

struct StoredIndex {
    dimension: usize,
    metric: String,
}

impl EmbeddingStorage {
    pub fn new(db_path: impl AsRef<Path>, index_name: impl Into<String>) -> Result<Self> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open vector database at {:?}", db_path))?;
        Self::from_connection(conn, index_name)
    }

    pub fn in_memory(index_name: impl Into<String>) -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?, index_name)
    }

    fn from_connection(conn: Connection, index_name: impl Into<String>) -> Result<Self> {
        Self::setup_db(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            index_name: index_name.into(),
        })
    }

    fn setup_db(conn: &Connection) -> SqlResult<()> {
        conn.execute_batch(
            "
            PRAGMA synchronous=NORMAL;
            PRAGMA temp_store=MEMORY;
            CREATE TABLE IF NOT EXISTS indexes (
                name TEXT PRIMARY KEY,
                dimension INTEGER NOT NULL,
                metric TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS embeddings (
                index_name TEXT NOT NULL,
                id TEXT NOT NULL,
                vector BLOB NOT NULL,
                text TEXT NOT NULL,
                kind TEXT,
                format_version INTEGER,
                PRIMARY KEY (index_name, id)
            );
        ",
        )
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("Vector database connection lock poisoned"))
    }

    fn stored_index(conn: &Connection, name: &str) -> Result<Option<StoredIndex>> {
        let index = conn
            .query_row(
                "SELECT dimension, metric FROM indexes WHERE name = ?1",
                params![name],
                |row| {
                    let dimension: i64 = row.get(0)?;
                    Ok(StoredIndex {
                        dimension: dimension as usize,
                        metric: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(index)
    }

    fn require_index(conn: &Connection, name: &str) -> Result<StoredIndex> {
        Self::stored_index(conn, name)?.ok_or_else(|| anyhow!("Index {:?} does not exist", name))
    }

    fn ensure_index_sync(&self, spec: &IndexSpec) -> Result<IndexStatus> {
        if spec.name != self.index_name {
            bail!(
                "Vector database is bound to index {:?}, not {:?}",
                self.index_name,
                spec.name
            );
        }
        let conn = self.lock()?;
        match Self::stored_index(&conn, &spec.name)? {
            Some(existing) => {
                if existing.dimension != spec.dimension || existing.metric != spec.metric.as_str() {
                    bail!(
                        "Index {:?} already exists with dimension {} and metric {}",
                        spec.name,
                        existing.dimension,
                        existing.metric
                    );
                }
                Ok(IndexStatus::Existing)
            }
            None => {
                conn.execute(
                    "INSERT INTO indexes (name, dimension, metric) VALUES (?1, ?2, ?3)",
                    params![spec.name, spec.dimension as i64, spec.metric.as_str()],
                )?;
                Ok(IndexStatus::Created)
            }
        }
    }

    fn upsert_sync(&self, records: &[VectorRecord]) -> Result<()> {
        let conn = self.lock()?;
        let index = Self::require_index(&conn, &self.index_name)?;
        let tx = conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO embeddings (index_name, id, vector, text, kind, format_version)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for record in records {
                if record.values.len() != index.dimension {
                    bail!(
                        "Vector for {:?} has dimension {}, index expects {}",
                        record.id,
                        record.values.len(),
                        index.dimension
                    );
                }
                let vector_bytes = serde_json::to_vec(&record.values)?;
                stmt.execute(params![
                    self.index_name,
                    record.id,
                    vector_bytes,
                    record.metadata.text,
                    record.metadata.kind.map(|k| k.to_string()),
                    record.metadata.format_version,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn query_sync(&self, vector: &[f32], top_k: usize, include_metadata: bool) -> Result<Vec<ScoredMatch>> {
        let conn = self.lock()?;
        let index = Self::require_index(&conn, &self.index_name)?;
        if vector.len() != index.dimension {
            bail!(
                "Query vector has dimension {}, index expects {}",
                vector.len(),
                index.dimension
            );
        }

        let mut stmt = conn.prepare(
            "SELECT id, vector, text, kind, format_version FROM embeddings WHERE index_name = ?1",
        )?;
        let mut rows = stmt.query(params![self.index_name])?;
        let mut stored = Vec::new();
        while let Some(row) = rows.next()? {
            let id: String = row.get(0)?;
            let vector_bytes: Vec<u8> = row.get(1)?;
            let text: String = row.get(2)?;
            let kind: Option<String> = row.get(3)?;
            let format_version: Option<u32> = row.get(4)?;
            let values: Vec<f32> = serde_json::from_slice(&vector_bytes)?;
            stored.push((
                id,
                values,
                RecordMetadata {
                    text,
                    kind: kind.as_deref().and_then(parse_kind),
                    format_version,
                },
            ));
        }

        let ranked = SearchEngine::rank(
            vector,
            stored.iter().map(|(id, values, _)| (id.as_str(), values.as_slice())),
            top_k,
        );
        let matches = ranked
            .into_iter()
            .map(|(score, id)| ScoredMatch {
                id: id.to_string(),
                score,
                metadata: include_metadata
                    .then(|| stored.iter().find(|(sid, _, _)| sid == id).map(|(_, _, m)| m.clone()))
                    .flatten(),
            })
            .collect();
        Ok(matches)
    }

    pub fn count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM embeddings WHERE index_name = ?1",
            params![self.index_name],
            |row| row.get(0),
        )?;
        Ok(n as usize)
    }
}

fn parse_kind(raw: &str) -> Option<RecordKind> {
    match raw {
        "flight" => Some(RecordKind::Flight),
        "segment" => Some(RecordKind::Segment),
        "passenger" => Some(RecordKind::Passenger),
        _ => None,
    }
}

#[async_trait]
impl VectorStore for EmbeddingStorage {
    async fn ensure_index(&self, spec: &IndexSpec) -> Result<IndexStatus> {
        self.ensure_index_sync(spec)
    }

    async fn upsert(&self, records: &[VectorRecord]) -> Result<()> {
        self.upsert_sync(records)
    }

    async fn query(&self, vector: &[f32], top_k: usize, include_metadata: bool) -> Result<Vec<ScoredMatch>> {
        self.query_sync(vector, top_k, include_metadata)
    }
}
