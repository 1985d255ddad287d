use serde::{Deserialize, Serialize};
use std::fmt;

/// Which itinerary level a record was generated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Flight,
    Segment,
    Passenger,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecordKind::Flight => "flight",
            RecordKind::Segment => "segment",
            RecordKind::Passenger => "passenger",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordMetadata {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<RecordKind>,
    /// Absent on records written before versioning existed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format_version: Option<u32>,
}

impl RecordMetadata {
    pub fn new(text: String, kind: RecordKind) -> Self {
        Self {
            text,
            kind: Some(kind),
            format_version: Some(crate::formatter::FORMAT_VERSION),
        }
    }

    pub fn is_current_format(&self) -> bool {
        self.format_version == Some(crate::formatter::FORMAT_VERSION)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: RecordMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredMatch {
    pub id: String,
    pub score: f32,
    #[serde(default)]
    pub metadata: Option<RecordMetadata>,
}

impl ScoredMatch {
    pub fn text(&self) -> Option<&str> {
        self.metadata.as_ref().map(|m| m.text.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Cosine,
}

impl Metric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Cosine => "cosine",
        }
    }
}

/// Parameters an index must be created with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    pub name: String,
    pub dimension: usize,
    pub metric: Metric,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexStatus {
    Existing,
    Created,
}

/// Everything produced while answering one query.
#[derive(Debug, Clone)]
pub struct RagAnswer {
    pub query: String,
    pub prompt: String,
    pub matches: Vec<ScoredMatch>,
    pub response: String,
}
