//! View models served to staff pages, and the joins that build them from
//! raw rows. Everything here is pure; fetching happens in `backoffice`.

use crate::models::{Client, ClientId, PageRequest, Reservation, ReservationStatus};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

pub const CLIENTS_PER_PAGE: u32 = 20;
pub const RESERVATIONS_PER_PAGE: u32 = 20;
pub const ROOMS_PER_PAGE: u32 = 12;
pub const RECENT_CLIENTS_LIMIT: u64 = 5;
/// Largest id set sent in one guest lookup
pub const GUEST_LOOKUP_CHUNK: usize = 100;

pub const DEFAULT_ROOM_CATEGORY: &str = "Standard";
pub const UNKNOWN_GUEST: &str = "Unknown guest";
pub const UNASSIGNED_ROOM: &str = "Unassigned";

/// Guests keyed by id, as returned by a batched lookup
pub type GuestIndex = HashMap<ClientId, Client>;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_clients: u64,
    pub arrivals_today: usize,
    pub in_house: usize,
    pub upcoming: usize,
    pub completed: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReservationWithGuests {
    pub reservation: Reservation,
    pub primary_guest: Option<Client>,
    pub secondary_guest: Option<Client>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub stats: DashboardStats,
    pub arrivals_today: Vec<ReservationWithGuests>,
    pub recent_clients: Vec<Client>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClientPage {
    pub clients: Vec<Client>,
    pub total: u64,
    pub total_pages: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReservationPage {
    pub reservations: Vec<ReservationWithGuests>,
    pub total: u64,
    pub total_pages: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuestRole {
    Primary,
    Secondary,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoomGuest {
    pub id: ClientId,
    pub guest_name: String,
    pub guest_title: Option<String>,
    pub vip: Option<String>,
    pub role: GuestRole,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OccupiedRoom {
    pub room_no: String,
    pub room_category_label: String,
    pub resv_name_id: String,
    pub arrival: Option<NaiveDate>,
    pub departure: Option<NaiveDate>,
    pub guests: Vec<RoomGuest>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OccupiedRoomsPage {
    pub rooms: Vec<OccupiedRoom>,
    pub total_vip: usize,
    pub total_pages: u64,
    pub total_rooms: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClientDetail {
    pub client: Client,
    pub reservations: Vec<Reservation>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ReservationGuests {
    pub primary: Option<Client>,
    pub secondary: Option<Client>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalendarStay {
    pub reservation_id: String,
    pub client_name: String,
    pub client_id: Option<ClientId>,
    pub room_no: String,
    pub arrival: NaiveDate,
    pub departure: NaiveDate,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalendarMovement {
    pub reservation_id: String,
    pub client_name: String,
    pub client_id: Option<ClientId>,
    pub room_no: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CalendarDay {
    pub arrivals: Vec<CalendarMovement>,
    pub departures: Vec<CalendarMovement>,
    pub guests: Vec<CalendarStay>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalendarMonth {
    pub year: i32,
    pub month: u32,
    pub days: BTreeMap<NaiveDate, CalendarDay>,
}

pub fn total_pages(total: u64, per_page: u32) -> u64 {
    total.div_ceil(u64::from(per_page.max(1)))
}

/// Distinct primary and secondary guest ids, in ascending order
pub fn guest_ids(reservations: &[Reservation]) -> Vec<ClientId> {
    reservations
        .iter()
        .flat_map(Reservation::guest_ids)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn index_guests(guests: impl IntoIterator<Item = Client>) -> GuestIndex {
    guests.into_iter().map(|c| (c.id, c)).collect()
}

pub fn attach_guests(
    reservations: Vec<Reservation>,
    guests: &GuestIndex,
) -> Vec<ReservationWithGuests> {
    reservations
        .into_iter()
        .map(|reservation| {
            let primary_guest = reservation
                .client_principal_id
                .and_then(|id| guests.get(&id).cloned());
            let secondary_guest = reservation
                .client_secondaire_id
                .and_then(|id| guests.get(&id).cloned());
            ReservationWithGuests {
                reservation,
                primary_guest,
                secondary_guest,
            }
        })
        .collect()
}

/// Union of status-flagged and date-spanning stays, one row per reservation.
///
/// Rows keep first-seen order; a date-based row replaces a status row with the
/// same id in place.
pub fn merge_in_house(by_status: Vec<Reservation>, by_date: Vec<Reservation>) -> Vec<Reservation> {
    let mut merged: Vec<Reservation> = Vec::with_capacity(by_status.len() + by_date.len());
    let mut positions: HashMap<String, usize> = HashMap::new();

    for reservation in by_status.into_iter().chain(by_date) {
        match positions.get(&reservation.resv_name_id) {
            Some(&at) => merged[at] = reservation,
            None => {
                positions.insert(reservation.resv_name_id.clone(), merged.len());
                merged.push(reservation);
            }
        }
    }

    merged
}

pub fn dashboard_stats(
    total_clients: u64,
    reservations: &[Reservation],
    in_house: usize,
    today: NaiveDate,
) -> DashboardStats {
    let arrivals_today = reservations
        .iter()
        .filter(|r| r.arrival == Some(today))
        .count();
    let upcoming = reservations
        .iter()
        .filter(|r| {
            r.has_status(&ReservationStatus::Upcoming) && r.arrival.is_some_and(|a| a > today)
        })
        .count();
    let completed = reservations
        .iter()
        .filter(|r| {
            r.has_status(&ReservationStatus::Completed) || r.departure.is_some_and(|d| d < today)
        })
        .count();

    DashboardStats {
        total_clients,
        arrivals_today,
        in_house,
        upcoming,
        completed,
    }
}

fn room_guest(client: &Client, vip: Option<String>, role: GuestRole) -> RoomGuest {
    RoomGuest {
        id: client.id,
        guest_name: client.guest_name.clone(),
        guest_title: client.guest_title.clone(),
        vip,
        role,
    }
}

/// Group in-house stays by room number.
///
/// The first stay seen for a room supplies its metadata. A secondary guest
/// inherits the primary guest's VIP code when the primary has one.
pub fn occupied_rooms(reservations: &[Reservation], guests: &GuestIndex) -> Vec<OccupiedRoom> {
    let mut rooms: Vec<OccupiedRoom> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for reservation in reservations {
        let Some(room_no) = reservation
            .room_no
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
        else {
            continue;
        };

        let at = *positions.entry(room_no.to_string()).or_insert_with(|| {
            rooms.push(OccupiedRoom {
                room_no: room_no.to_string(),
                room_category_label: reservation
                    .room_category_label
                    .clone()
                    .filter(|l| !l.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_ROOM_CATEGORY.to_string()),
                resv_name_id: reservation.resv_name_id.clone(),
                arrival: reservation.arrival,
                departure: reservation.departure,
                guests: Vec::new(),
            });
            rooms.len() - 1
        });

        let primary = reservation
            .client_principal_id
            .and_then(|id| guests.get(&id));
        let primary_vip = primary.and_then(|c| c.vip_code()).map(str::to_string);

        if let Some(client) = primary {
            rooms[at]
                .guests
                .push(room_guest(client, primary_vip.clone(), GuestRole::Primary));
        }

        if let Some(client) = reservation
            .client_secondaire_id
            .and_then(|id| guests.get(&id))
        {
            let vip = primary_vip
                .clone()
                .or_else(|| client.vip_code().map(str::to_string));
            rooms[at]
                .guests
                .push(room_guest(client, vip, GuestRole::Secondary));
        }
    }

    rooms
}

fn room_matches(room: &OccupiedRoom, needle: &str) -> bool {
    room.room_no.to_lowercase().contains(needle)
        || room
            .guests
            .iter()
            .any(|g| g.guest_name.to_lowercase().contains(needle))
}

/// Filter rooms by room number or guest name, then cut out the requested page
pub fn occupied_rooms_page(rooms: Vec<OccupiedRoom>, request: &PageRequest) -> OccupiedRoomsPage {
    let needle = request.search().to_lowercase();
    let filtered: Vec<OccupiedRoom> = rooms
        .into_iter()
        .filter(|room| needle.is_empty() || room_matches(room, &needle))
        .collect();

    let total_rooms = filtered.len();
    let total_vip = filtered
        .iter()
        .flat_map(|room| &room.guests)
        .filter(|g| g.vip.as_deref().is_some_and(|v| !v.is_empty()))
        .count();

    let rooms = filtered
        .into_iter()
        .skip(request.offset(ROOMS_PER_PAGE) as usize)
        .take(ROOMS_PER_PAGE as usize)
        .collect();

    OccupiedRoomsPage {
        rooms,
        total_vip,
        total_pages: total_pages(total_rooms as u64, ROOMS_PER_PAGE),
        total_rooms,
    }
}

/// First and last day of a month, or `None` when the month is out of range
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year.checked_add(1)?, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((first, next.pred_opt()?))
}

/// Per-day arrivals, departures and present guests for one month
pub fn calendar_month(
    year: i32,
    month: u32,
    reservations: &[Reservation],
    guests: &GuestIndex,
) -> Option<CalendarMonth> {
    let (first, last) = month_bounds(year, month)?;
    let mut days: BTreeMap<NaiveDate, CalendarDay> = BTreeMap::new();

    for reservation in reservations {
        let (Some(arrival), Some(departure)) = (reservation.arrival, reservation.departure) else {
            continue;
        };
        if departure < first || arrival > last {
            continue;
        }

        let primary = reservation
            .client_principal_id
            .and_then(|id| guests.get(&id));
        let client_name = primary
            .map(|c| c.guest_name.clone())
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_GUEST.to_string());
        let client_id = primary.map(|c| c.id);
        let room_no = reservation
            .room_no
            .clone()
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| UNASSIGNED_ROOM.to_string());

        let movement = || CalendarMovement {
            reservation_id: reservation.resv_name_id.clone(),
            client_name: client_name.clone(),
            client_id,
            room_no: room_no.clone(),
        };

        let start = arrival.max(first);
        let end = departure.min(last);

        for day in start.iter_days().take_while(|d| *d <= end) {
            let entry = days.entry(day).or_default();
            entry.guests.push(CalendarStay {
                reservation_id: reservation.resv_name_id.clone(),
                client_name: client_name.clone(),
                client_id,
                room_no: room_no.clone(),
                arrival,
                departure,
            });
            if day == arrival {
                entry.arrivals.push(movement());
            }
            if day == departure {
                entry.departures.push(movement());
            }
        }
    }

    Some(CalendarMonth { year, month, days })
}
