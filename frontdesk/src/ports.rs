use crate::models::{Client, ClientId, RecordPatch, Reservation};
use crate::store::StoreResult;
use async_trait::async_trait;
use chrono::NaiveDate;

/// Tables exposed by the record store
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Table {
    Clients,
    Reservations,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Clients => "clients",
            Table::Reservations => "reservations",
        }
    }

    /// Column holding the row key
    pub fn key_column(&self) -> &'static str {
        match self {
            Table::Clients => "id",
            Table::Reservations => "resv_name_id",
        }
    }
}

/// Reservation listing filter.
///
/// An empty `search` selects every row. Otherwise a row matches when its id or
/// room contains the text, or when either guest is one of `client_ids`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReservationFilter {
    pub search: String,
    pub client_ids: Vec<ClientId>,
}

impl ReservationFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.search.is_empty()
    }

    pub fn matches(&self, reservation: &Reservation) -> bool {
        if self.is_empty() {
            return true;
        }
        let needle = self.search.to_lowercase();
        reservation.resv_name_id.to_lowercase().contains(&needle)
            || reservation
                .room_no
                .as_deref()
                .is_some_and(|room| room.to_lowercase().contains(&needle))
            || self.client_ids.iter().any(|id| reservation.involves(*id))
    }
}

/// Row-level access to guest and stay records
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Number of clients matching `search` (all clients when empty)
    async fn count_clients(&self, search: &str) -> StoreResult<u64>;

    async fn list_clients(&self, search: &str, offset: u64, limit: u64) -> StoreResult<Vec<Client>>;

    /// Ids of every client matching `search`
    async fn client_ids_matching(&self, search: &str) -> StoreResult<Vec<ClientId>>;

    async fn clients_by_ids(&self, ids: &[ClientId]) -> StoreResult<Vec<Client>>;

    async fn client_by_id(&self, id: ClientId) -> StoreResult<Option<Client>>;

    /// Most recently created clients, newest first
    async fn recent_clients(&self, limit: u64) -> StoreResult<Vec<Client>>;

    async fn all_reservations(&self) -> StoreResult<Vec<Reservation>>;

    async fn reservations_arriving_on(&self, day: NaiveDate) -> StoreResult<Vec<Reservation>>;

    /// Stays flagged in-house whose departure is on or after `day`
    async fn reservations_in_house(&self, day: NaiveDate) -> StoreResult<Vec<Reservation>>;

    /// Stays with arrival <= `day` <= departure
    async fn reservations_spanning(&self, day: NaiveDate) -> StoreResult<Vec<Reservation>>;

    async fn search_reservations(
        &self,
        filter: &ReservationFilter,
        offset: u64,
        limit: u64,
    ) -> StoreResult<Vec<Reservation>>;

    async fn count_reservations(&self, filter: &ReservationFilter) -> StoreResult<u64>;

    async fn reservation_by_id(&self, id: &str) -> StoreResult<Option<Reservation>>;

    /// Stays where the client is the primary or secondary guest
    async fn reservations_for_client(&self, id: ClientId) -> StoreResult<Vec<Reservation>>;

    /// Apply `patch` to the client and return the updated rows
    async fn update_client(&self, id: ClientId, patch: &RecordPatch) -> StoreResult<Vec<Client>>;

    async fn update_reservation(
        &self,
        id: &str,
        patch: &RecordPatch,
    ) -> StoreResult<Vec<Reservation>>;

    /// Cheapest possible read against `table`
    async fn ping(&self, table: Table) -> StoreResult<()>;
}
