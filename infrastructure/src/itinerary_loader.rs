use anyhow::Context;
use domain::itinerary::ItineraryDocument;
use shared::types::Result;
use std::fs;
use std::path::Path;

pub fn load_itinerary(path: impl AsRef<Path>) -> Result<ItineraryDocument> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read itinerary file at {:?}", path))?;
    let document = ItineraryDocument::from_json_str(&raw)
        .with_context(|| format!("Failed to parse itinerary JSON in {:?}", path))?;
    tracing::info!(
        path = %path.display(),
        user = %document.user.id,
        flights = document.flights().len(),
        "loaded itinerary"
    );
    Ok(document)
}
