use application::ingest_service::IngestService;
use application::rag_service::{AnswerSettings, RagService};
use clap::{ArgAction, Parser};
use colored::Colorize;
use infrastructure::config::Config;
use infrastructure::embedder::Embedder;
use infrastructure::itinerary_loader::load_itinerary;
use infrastructure::open_vector_store;
use infrastructure::openai_client::OpenAiClient;
use shared::telemetry::init_logging;
use shared::types::Result;
use std::path::PathBuf;
use std::sync::Arc;

pub const DEFAULT_QUERY: &str = "What's my seat for the first flight?";

/// Ingest a flight itinerary into a vector index and answer a question about it.
#[derive(Parser, Debug)]
#[command(name = "itinerary_rag")]
#[command(about = "Answer questions about a flight itinerary with retrieval-augmented generation", long_about = None)]
pub struct Cli {
    /// Itinerary JSON file (overrides ITINERARY_PATH)
    #[arg(long)]
    pub data: Option<PathBuf>,

    /// Question to answer once the itinerary is indexed
    #[arg(long, default_value = DEFAULT_QUERY)]
    pub query: String,

    /// Answer from the existing index without ingesting first
    #[arg(long, action = ArgAction::SetTrue)]
    pub skip_ingest: bool,

    /// Verbose logging on stderr
    #[arg(short, long, action = ArgAction::SetTrue)]
    pub verbose: bool,
}

#[derive(Default)]
pub struct CliApp;

impl CliApp {
    pub fn new() -> Self {
        Self
    }

    pub async fn run(&self, cli: Cli) -> Result<()> {
        init_logging(cli.verbose);

        let mut config = Config::load()?;
        if let Some(path) = cli.data {
            config.itinerary_path = path;
        }

        let openai = Arc::new(OpenAiClient::new(&config.openai));
        let embedder = Embedder::new(openai.clone(), config.embedding_dimension);
        let store = open_vector_store(&config)?;

        let spec = config.index_spec();
        let status = store.ensure_index(&spec).await?;
        tracing::info!(index = %spec.name, ?status, "vector index ready");

        if !cli.skip_ingest {
            let document = load_itinerary(&config.itinerary_path)?;
            let report = IngestService::new(embedder.clone(), store.clone())
                .ingest(&document)
                .await?;
            tracing::info!(
                flights = report.flights,
                segments = report.segments,
                passengers = report.passengers,
                "ingestion finished"
            );
            println!("{}", "Data ingested successfully!".green());
        }

        let rag = RagService::new(embedder, store, openai, AnswerSettings::from_config(&config));
        let answer = rag.answer_detailed(&cli.query).await?;

        println!("{}", answer.prompt);
        println!("{} {}", "Bot Response:".green().bold(), answer.response);
        Ok(())
    }
}
