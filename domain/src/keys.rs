//! Vector record keys.
//!
//! Flight, segment and passenger records share one index. Keys are the
//! hyphen-joined components; `%` and `-` inside a component are
//! percent-escaped so that no two distinct component tuples share a key.
//!
//! Components containing `-` therefore get different keys from plain
//! hyphen joining (`T1-AA%2D100`, not `T1-AA-100`). An index filled with
//! unescaped keys gets new records for those entities on re-ingestion
//! instead of overwrites.

const SEPARATOR: &str = "-";

pub fn flight_key(ticket_id: &str) -> String {
    join(&[ticket_id])
}

pub fn segment_key(ticket_id: &str, flight_number: &str) -> String {
    join(&[ticket_id, flight_number])
}

pub fn passenger_key(ticket_id: &str, flight_number: &str, seat_number: &str) -> String {
    join(&[ticket_id, flight_number, seat_number])
}

fn join(components: &[&str]) -> String {
    components
        .iter()
        .map(|c| escape(c))
        .collect::<Vec<_>>()
        .join(SEPARATOR)
}

fn escape(component: &str) -> String {
    let mut out = String::with_capacity(component.len());
    for ch in component.chars() {
        match ch {
            '%' => out.push_str("%25"),
            '-' => out.push_str("%2D"),
            _ => out.push(ch),
        }
    }
    out
}
