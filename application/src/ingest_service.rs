use domain::formatter::{flight_text, passenger_text, segment_text};
use domain::itinerary::ItineraryDocument;
use domain::keys::{flight_key, passenger_key, segment_key};
use domain::models::{RecordKind, RecordMetadata, VectorRecord};
use infrastructure::embedder::Embedder;
use infrastructure::vector_store::VectorStore;
use shared::telemetry::Telemetry;
use shared::types::Result;
use std::sync::Arc;

/// One record-to-be: its key, level and sentence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItineraryEntry {
    pub key: String,
    pub kind: RecordKind,
    pub text: String,
}

/// Flatten the document into entries in document order: each flight, then
/// each of its segments followed by that segment's passengers.
pub fn itinerary_entries(document: &ItineraryDocument) -> Vec<ItineraryEntry> {
    let mut entries = Vec::new();
    for flight in document.flights() {
        entries.push(ItineraryEntry {
            key: flight_key(&flight.ticket_id),
            kind: RecordKind::Flight,
            text: flight_text(flight),
        });
        for segment in &flight.segments {
            entries.push(ItineraryEntry {
                key: segment_key(&flight.ticket_id, &segment.flight_number),
                kind: RecordKind::Segment,
                text: segment_text(segment),
            });
            for passenger in &segment.passengers {
                entries.push(ItineraryEntry {
                    key: passenger_key(&flight.ticket_id, &segment.flight_number, &passenger.seat_number),
                    kind: RecordKind::Passenger,
                    text: passenger_text(passenger),
                });
            }
        }
    }
    entries
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub flights: usize,
    pub segments: usize,
    pub passengers: usize,
    pub keys: Vec<String>,
}

impl IngestReport {
    pub fn total(&self) -> usize {
        self.flights + self.segments + self.passengers
    }
}

pub struct IngestService {
    embedder: Embedder,
    store: Arc<dyn VectorStore>,
}

impl IngestService {
    pub fn new(embedder: Embedder, store: Arc<dyn VectorStore>) -> Self {
        Self { embedder, store }
    }

    /// Embed and upsert every entry, one at a time. A failure stops the run
    /// and leaves already-written records in place.
    pub async fn ingest(&self, document: &ItineraryDocument) -> Result<IngestReport> {
        let telemetry = Telemetry::new("ingest");
        let entries = itinerary_entries(document);
        tracing::info!(user = %document.user.id, records = entries.len(), "ingesting itinerary");

        let mut report = IngestReport::default();
        for entry in entries {
            let values = self.embedder.embed(&entry.text).await?;
            let record = VectorRecord {
                id: entry.key.clone(),
                values,
                metadata: RecordMetadata::new(entry.text, entry.kind),
            };
            self.store.upsert(std::slice::from_ref(&record)).await?;
            tracing::debug!(key = %entry.key, kind = %entry.kind, "upserted record");

            match entry.kind {
                RecordKind::Flight => report.flights += 1,
                RecordKind::Segment => report.segments += 1,
                RecordKind::Passenger => report.passengers += 1,
            }
            report.keys.push(entry.key);
        }

        telemetry.finish();
        Ok(report)
    }
}
