//! Cache keys for every cached read, and the patterns each write invalidates.
//!
//! A key is a resource tag followed by its parameters, separated by `_`.
//! Parameters are escaped (`%` as `%25`, `_` as `%5F`) so a search text
//! can never shift into another parameter or resource tag.

use crate::models::ClientId;
use std::time::Duration;

/// Slow-moving aggregates and detail pages. Other reads use the cache's default TTL.
pub const LONG_TTL: Duration = Duration::from_secs(60);

pub const DASHBOARD_STATS: &str = "dashboard_stats";
pub const RESERVATIONS_TODAY: &str = "reservations_today";
pub const RECENT_CLIENTS: &str = "clients_recent";
pub const RESERVATIONS_IN_HOUSE: &str = "reservations_in_house";

const CLIENTS: &str = "clients_";
const OCCUPIED_ROOMS: &str = "occupied_rooms_";
const RESERVATIONS: &str = "reservations_";
const CLIENT: &str = "client_";
const CLIENT_RESERVATIONS: &str = "client_reservations_";
const RESERVATION: &str = "reservation_";
const RESERVATION_GUESTS: &str = "reservation_guests_";
const CALENDAR: &str = "calendar_";

pub fn escape(param: &str) -> String {
    param.replace('%', "%25").replace('_', "%5F")
}

pub fn clients_page(search: &str, page: u32) -> String {
    format!("{CLIENTS}{}_{page}", escape(search))
}

pub fn occupied_rooms_page(search: &str, page: u32) -> String {
    format!("{OCCUPIED_ROOMS}{}_{page}", escape(search))
}

pub fn reservations_page(search: &str, page: u32) -> String {
    format!("{RESERVATIONS}{}_{page}", escape(search))
}

pub fn client(id: ClientId) -> String {
    format!("{CLIENT}{id}")
}

pub fn client_reservations(id: ClientId) -> String {
    format!("{CLIENT_RESERVATIONS}{id}")
}

pub fn reservation(id: &str) -> String {
    format!("{RESERVATION}{}", escape(id))
}

pub fn reservation_guests(id: &str) -> String {
    format!("{RESERVATION_GUESTS}{}", escape(id))
}

pub fn calendar(year: i32, month: u32) -> String {
    format!("{CALENDAR}{year}_{month}")
}

/// Patterns to drop once a client row has been written.
///
/// Covers every cached read that embeds client fields: the client itself, all
/// client listings (recent clients included), the dashboard, and the joined
/// stay views that carry guest names or VIP codes.
pub fn client_update_patterns(id: ClientId) -> Vec<String> {
    vec![
        client(id),
        CLIENTS.to_string(),
        DASHBOARD_STATS.to_string(),
        OCCUPIED_ROOMS.to_string(),
        RESERVATIONS.to_string(),
        RESERVATION_GUESTS.to_string(),
        CALENDAR.to_string(),
    ]
}

/// Patterns to drop once a reservation row has been written
pub fn reservation_update_patterns(id: &str) -> Vec<String> {
    vec![
        reservation(id),
        reservation_guests(id),
        RESERVATIONS.to_string(),
        CLIENT_RESERVATIONS.to_string(),
        DASHBOARD_STATS.to_string(),
        OCCUPIED_ROOMS.to_string(),
        CALENDAR.to_string(),
    ]
}
