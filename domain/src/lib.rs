pub mod formatter;
pub mod itinerary;
pub mod keys;
pub mod models;
pub mod prompt;
pub mod session;
