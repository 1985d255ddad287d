use domain::models::{IndexSpec, Metric};
use dotenvy::dotenv;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";
const DEFAULT_CHAT_MODEL: &str = "gpt-4-0613";
const DEFAULT_PINECONE_CONTROL_URL: &str = "https://api.pinecone.io";
const DEFAULT_PINECONE_API_VERSION: &str = "2024-07";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting {0}: set it in the environment or in .env")]
    Missing(&'static str),
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// A credential that never shows up in logs or debug output.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OpenAiSettings {
    pub api_key: Secret,
    pub base_url: String,
    pub embedding_model: String,
    pub chat_model: String,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PineconeSettings {
    pub api_key: Secret,
    pub index_name: String,
    pub control_url: String,
    pub api_version: String,
    pub cloud: String,
    pub region: String,
    pub ready_poll_attempts: u32,
    pub ready_poll_interval_ms: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocalSettings {
    pub db_path: PathBuf,
    pub index_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum VectorBackend {
    Pinecone(PineconeSettings),
    Local(LocalSettings),
}

/// Process-wide settings, built once in `main` and passed by reference.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub openai: OpenAiSettings,
    pub embedding_dimension: usize,
    pub backend: VectorBackend,
    pub itinerary_path: PathBuf,
    pub top_k: usize,
    /// `None` disables the cap.
    pub context_char_budget: Option<usize>,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Lookup(lookup);

        let openai = OpenAiSettings {
            api_key: Secret::new(vars.required("OPENAI_API_KEY")?),
            base_url: trim_slash(vars.or("OPENAI_BASE_URL", DEFAULT_OPENAI_BASE_URL)),
            embedding_model: vars.or("EMBEDDING_MODEL", DEFAULT_EMBEDDING_MODEL),
            chat_model: vars.or("CHAT_MODEL", DEFAULT_CHAT_MODEL),
            max_tokens: vars.positive("CHAT_MAX_TOKENS", 1024)?,
        };

        let backend = match vars.or("VECTOR_BACKEND", "pinecone").to_lowercase().as_str() {
            "pinecone" => VectorBackend::Pinecone(PineconeSettings {
                api_key: Secret::new(vars.required("PINECONE_API_KEY")?),
                index_name: vars.required("PINECONE_INDEX")?,
                control_url: trim_slash(vars.or("PINECONE_CONTROL_URL", DEFAULT_PINECONE_CONTROL_URL)),
                api_version: vars.or("PINECONE_API_VERSION", DEFAULT_PINECONE_API_VERSION),
                cloud: vars.or("PINECONE_CLOUD", "aws"),
                region: vars.or("PINECONE_REGION", "us-east-1"),
                ready_poll_attempts: vars.positive("PINECONE_READY_POLL_ATTEMPTS", 60)?,
                ready_poll_interval_ms: vars.parsed("PINECONE_READY_POLL_INTERVAL_MS", 1000)?,
            }),
            "local" => VectorBackend::Local(LocalSettings {
                db_path: PathBuf::from(vars.or("VECTOR_DB_PATH", "itinerary_vectors.db")),
                index_name: vars.or("LOCAL_INDEX_NAME", "itinerary"),
            }),
            other => {
                return Err(ConfigError::Invalid {
                    key: "VECTOR_BACKEND",
                    value: other.to_string(),
                    reason: "expected `pinecone` or `local`".to_string(),
                })
            }
        };

        let budget: usize = vars.parsed("RAG_CONTEXT_CHAR_BUDGET", 4000)?;

        Ok(Self {
            openai,
            embedding_dimension: vars.positive("EMBEDDING_DIMENSION", 1536)?,
            backend,
            itinerary_path: PathBuf::from(vars.or("ITINERARY_PATH", "Journey_Details.json")),
            top_k: vars.positive("RAG_TOP_K", 5)?,
            context_char_budget: (budget > 0).then_some(budget),
        })
    }

    pub fn index_spec(&self) -> IndexSpec {
        let name = match &self.backend {
            VectorBackend::Pinecone(p) => p.index_name.clone(),
            VectorBackend::Local(l) => l.index_name.clone(),
        };
        IndexSpec {
            name,
            dimension: self.embedding_dimension,
            metric: Metric::Cosine,
        }
    }
}

struct Lookup<F>(F);

impl<F> Lookup<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required(&self, key: &'static str) -> Result<String, ConfigError> {
        self.get(key).ok_or(ConfigError::Missing(key))
    }

    fn or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    fn parsed<T>(&self, key: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        match self.get(key) {
            None => Ok(default),
            Some(raw) => raw.parse::<T>().map_err(|e| ConfigError::Invalid {
                key,
                value: raw.clone(),
                reason: e.to_string(),
            }),
        }
    }

    fn positive<T>(&self, key: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr + PartialOrd + Default + Copy,
        T::Err: fmt::Display,
    {
        let value = self.parsed(key, default)?;
        if value <= T::default() {
            return Err(ConfigError::Invalid {
                key,
                value: self.get(key).unwrap_or_default(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(value)
    }
}

fn trim_slash(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
