//! Itinerary document as read from the journey JSON file.
//!
//! Scalar fields are kept as text: the document mixes strings and numbers
//! (ticket ids, seat numbers, baggage weights) and every field ends up
//! interpolated into a sentence anyway.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ItineraryDocument {
    pub user: Traveller,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Traveller {
    #[serde(deserialize_with = "scalar_text")]
    pub id: String,
    pub flights: Vec<Flight>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Flight {
    #[serde(deserialize_with = "scalar_text")]
    pub ticket_id: String,
    #[serde(deserialize_with = "scalar_text")]
    pub source: String,
    #[serde(deserialize_with = "scalar_text")]
    pub destination: String,
    #[serde(deserialize_with = "scalar_text")]
    pub departure_date: String,
    #[serde(deserialize_with = "scalar_text")]
    pub arrival_date: String,
    #[serde(deserialize_with = "scalar_text")]
    pub layover_duration: String,
    pub segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Segment {
    #[serde(deserialize_with = "scalar_text")]
    pub flight_number: String,
    pub departure: Endpoint,
    pub arrival: Endpoint,
    pub passengers: Vec<Passenger>,
}

/// One end of a segment: where and when.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Endpoint {
    #[serde(deserialize_with = "scalar_text")]
    pub airport: String,
    #[serde(deserialize_with = "scalar_text")]
    pub iata: String,
    #[serde(deserialize_with = "scalar_text")]
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Passenger {
    #[serde(deserialize_with = "scalar_text")]
    pub first_name: String,
    #[serde(deserialize_with = "scalar_text")]
    pub last_name: String,
    #[serde(deserialize_with = "scalar_text")]
    pub seat_number: String,
    #[serde(deserialize_with = "scalar_text")]
    pub cabin_baggage: String,
    #[serde(deserialize_with = "scalar_text")]
    pub check_in_baggage: String,
}

impl ItineraryDocument {
    pub fn from_json_str(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    pub fn flights(&self) -> &[Flight] {
        &self.user.flights
    }
}

fn scalar_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or number, found {}",
            other
        ))),
    }
}
