//! Sentences stored alongside each vector. The same text is embedded at
//! ingestion time and handed to the chat model at query time, so any change
//! here must bump [`FORMAT_VERSION`].

use crate::itinerary::{Flight, Passenger, Segment};

pub const FORMAT_VERSION: u32 = 1;

pub fn flight_text(flight: &Flight) -> String {
    format!(
        "Flight from {} to {} departs on {} and arrives on {} with a layover of {}.",
        flight.source,
        flight.destination,
        flight.departure_date,
        flight.arrival_date,
        flight.layover_duration
    )
}

pub fn segment_text(segment: &Segment) -> String {
    format!(
        "{} from {} ({}) to {} ({}) departs on {} and arrives on {}.",
        segment.flight_number,
        segment.departure.airport,
        segment.departure.iata,
        segment.arrival.airport,
        segment.arrival.iata,
        segment.departure.date,
        segment.arrival.date
    )
}

pub fn passenger_text(passenger: &Passenger) -> String {
    format!(
        "{} {} is seated in {} with {} cabin baggage and {} checked baggage.",
        passenger.first_name,
        passenger.last_name,
        passenger.seat_number,
        passenger.cabin_baggage,
        passenger.check_in_baggage
    )
}
