//! Cached read paths behind every staff page, and the writes that invalidate them.

use crate::keys;
use crate::models::{Client, ClientId, PageRequest, RecordPatch, Reservation};
use crate::ports::{RecordStore, ReservationFilter, Table};
use crate::store::StoreError;
use crate::views::{
    self, CalendarMonth, ClientDetail, ClientPage, Dashboard, DashboardStats, GuestIndex,
    OccupiedRoomsPage, ReservationGuests, ReservationPage, ReservationWithGuests,
};
use chrono::{Local, NaiveDate};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use storage_engine::{CacheStats, TtlCache};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum BackofficeError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Cached payload could not be converted: {0}")]
    Codec(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0} was not updated")]
    NotUpdated(String),

    #[error("Invalid update: {0}")]
    InvalidPatch(String),

    #[error("Invalid month {month} for year {year}")]
    InvalidMonth { year: i32, month: u32 },
}

impl From<serde_json::Error> for BackofficeError {
    fn from(err: serde_json::Error) -> Self {
        BackofficeError::Codec(err.to_string())
    }
}

pub type BackofficeResult<T> = Result<T, BackofficeError>;

/// Source of the current calendar day
pub trait Today: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Today's date in the server's local time zone
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalToday;

impl Today for LocalToday {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A pinned date, for tests and replays
#[derive(Debug, Clone, Copy)]
pub struct FixedToday(pub NaiveDate);

impl Today for FixedToday {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceState {
    Online,
    Offline,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub status: ServiceState,
    pub response_time_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SystemStatus {
    pub clients_table: ServiceStatus,
    pub reservations_table: ServiceStatus,
    pub api: ServiceStatus,
    pub timestamp: String,
}

/// Figures handed to the assistant as context
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HotelSnapshot {
    pub date: NaiveDate,
    pub stats: DashboardStats,
    pub arrivals_today: Vec<ArrivalSummary>,
    pub occupied_rooms: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArrivalSummary {
    pub reservation_id: String,
    pub room_no: Option<String>,
    pub guest_name: Option<String>,
    pub departure: Option<NaiveDate>,
}

/// Back-office service: every cached read and every write of the application.
///
/// Cached values are stored as JSON so one cache instance serves every view model.
pub struct Backoffice {
    store: Arc<dyn RecordStore>,
    cache: Arc<TtlCache<Value>>,
    today: Arc<dyn Today>,
}

impl Backoffice {
    pub fn new(store: Arc<dyn RecordStore>, cache: Arc<TtlCache<Value>>) -> Self {
        Self::with_today(store, cache, Arc::new(LocalToday))
    }

    pub fn with_today(
        store: Arc<dyn RecordStore>,
        cache: Arc<TtlCache<Value>>,
        today: Arc<dyn Today>,
    ) -> Self {
        Self {
            store,
            cache,
            today,
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.today.today()
    }

    /// Listings and API reads live for the cache's configured default TTL
    fn short_ttl(&self) -> Duration {
        self.cache.default_ttl()
    }

    /// Aggregates and detail pages, never shorter than the default
    fn long_ttl(&self) -> Duration {
        keys::LONG_TTL.max(self.short_ttl())
    }

    /// Read `key` through the cache, converting the view model to and from JSON
    async fn cached<T, F, Fut>(&self, key: &str, ttl: Duration, fetch: F) -> BackofficeResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = BackofficeResult<T>>,
    {
        let value = self
            .cache
            .get_or_fetch(
                key,
                || async {
                    let fresh = fetch().await?;
                    Ok::<_, BackofficeError>(serde_json::to_value(&fresh)?)
                },
                ttl,
            )
            .await?;

        Ok(serde_json::from_value(value)?)
    }

    /// Look up guests by id, at most `GUEST_LOOKUP_CHUNK` ids per request
    async fn fetch_guests(&self, ids: &[ClientId]) -> BackofficeResult<GuestIndex> {
        let mut guests = GuestIndex::new();
        for chunk in ids.chunks(views::GUEST_LOOKUP_CHUNK) {
            guests.extend(views::index_guests(self.store.clients_by_ids(chunk).await?));
        }
        Ok(guests)
    }

    async fn with_guests(
        &self,
        reservations: Vec<Reservation>,
    ) -> BackofficeResult<Vec<ReservationWithGuests>> {
        let guests = self.fetch_guests(&views::guest_ids(&reservations)).await?;
        Ok(views::attach_guests(reservations, &guests))
    }

    async fn fetch_in_house(&self, today: NaiveDate) -> BackofficeResult<Vec<Reservation>> {
        let by_status = self.store.reservations_in_house(today).await?;
        let by_date = self.store.reservations_spanning(today).await?;
        Ok(views::merge_in_house(by_status, by_date))
    }

    pub async fn dashboard_stats(&self) -> BackofficeResult<DashboardStats> {
        let today = self.today();
        self.cached(keys::DASHBOARD_STATS, self.long_ttl(), || async move {
            let total_clients = self.store.count_clients("").await?;
            let reservations = self.store.all_reservations().await?;
            let in_house = self.fetch_in_house(today).await?.len();
            Ok(views::dashboard_stats(total_clients, &reservations, in_house, today))
        })
        .await
    }

    /// Today's arrivals joined with their guests
    pub async fn arrivals_today(&self) -> BackofficeResult<Vec<ReservationWithGuests>> {
        let today = self.today();
        self.cached(keys::RESERVATIONS_TODAY, self.short_ttl(), || async move {
            let arrivals = self.store.reservations_arriving_on(today).await?;
            self.with_guests(arrivals).await
        })
        .await
    }

    pub async fn recent_clients(&self) -> BackofficeResult<Vec<Client>> {
        self.cached(keys::RECENT_CLIENTS, self.short_ttl(), || async {
            Ok(self
                .store
                .recent_clients(views::RECENT_CLIENTS_LIMIT)
                .await?)
        })
        .await
    }

    pub async fn dashboard(&self) -> BackofficeResult<Dashboard> {
        Ok(Dashboard {
            stats: self.dashboard_stats().await?,
            arrivals_today: self.arrivals_today().await?,
            recent_clients: self.recent_clients().await?,
        })
    }

    pub async fn clients(&self, request: &PageRequest) -> BackofficeResult<ClientPage> {
        let search = request.search();
        let key = keys::clients_page(search, request.page());
        self.cached(&key, self.short_ttl(), || async {
            let per_page = u64::from(views::CLIENTS_PER_PAGE);
            let clients = self
                .store
                .list_clients(search, request.offset(views::CLIENTS_PER_PAGE), per_page)
                .await?;
            let total = self.store.count_clients(search).await?;
            Ok(ClientPage {
                clients,
                total,
                total_pages: views::total_pages(total, views::CLIENTS_PER_PAGE),
            })
        })
        .await
    }

    /// In-house stays: flagged in-house and not yet departed, or spanning today
    pub async fn in_house_reservations(&self) -> BackofficeResult<Vec<Reservation>> {
        let today = self.today();
        self.cached(keys::RESERVATIONS_IN_HOUSE, self.short_ttl(), || {
            self.fetch_in_house(today)
        })
        .await
    }

    pub async fn occupied_rooms(&self, request: &PageRequest) -> BackofficeResult<OccupiedRoomsPage> {
        let key = keys::occupied_rooms_page(request.search(), request.page());
        self.cached(&key, self.short_ttl(), || async {
            let reservations = self.in_house_reservations().await?;
            let guests = self.fetch_guests(&views::guest_ids(&reservations)).await?;
            let rooms = views::occupied_rooms(&reservations, &guests);
            Ok(views::occupied_rooms_page(rooms, request))
        })
        .await
    }

    pub async fn reservations(&self, request: &PageRequest) -> BackofficeResult<ReservationPage> {
        let search = request.search();
        let key = keys::reservations_page(search, request.page());
        self.cached(&key, self.short_ttl(), || async {
            let filter = if search.is_empty() {
                ReservationFilter::all()
            } else {
                ReservationFilter {
                    search: search.to_string(),
                    client_ids: self.store.client_ids_matching(search).await?,
                }
            };

            let per_page = u64::from(views::RESERVATIONS_PER_PAGE);
            let rows = self
                .store
                .search_reservations(&filter, request.offset(views::RESERVATIONS_PER_PAGE), per_page)
                .await?;
            let total = self.store.count_reservations(&filter).await?;

            Ok(ReservationPage {
                reservations: self.with_guests(rows).await?,
                total,
                total_pages: views::total_pages(total, views::RESERVATIONS_PER_PAGE),
            })
        })
        .await
    }

    pub async fn client(&self, id: ClientId) -> BackofficeResult<Client> {
        self.client_for(id, self.short_ttl()).await
    }

    /// A missing client is cached too, so repeated lookups of a bad id stay local.
    async fn client_for(&self, id: ClientId, ttl: Duration) -> BackofficeResult<Client> {
        let found: Option<Client> = self
            .cached(&keys::client(id), ttl, || async {
                Ok(self.store.client_by_id(id).await?)
            })
            .await?;
        found.ok_or_else(|| BackofficeError::NotFound(format!("Client {id}")))
    }

    pub async fn client_reservations(&self, id: ClientId) -> BackofficeResult<Vec<Reservation>> {
        self.cached(&keys::client_reservations(id), self.short_ttl(), || async {
            Ok(self.store.reservations_for_client(id).await?)
        })
        .await
    }

    pub async fn client_detail(&self, id: ClientId) -> BackofficeResult<ClientDetail> {
        let client = self.client_for(id, self.long_ttl()).await?;
        let reservations = self.client_reservations(id).await?;
        Ok(ClientDetail {
            client,
            reservations,
        })
    }

    pub async fn reservation(&self, id: &str) -> BackofficeResult<Reservation> {
        let found: Option<Reservation> = self
            .cached(&keys::reservation(id), self.short_ttl(), || async {
                Ok(self.store.reservation_by_id(id).await?)
            })
            .await?;
        found.ok_or_else(|| BackofficeError::NotFound(format!("Reservation {id}")))
    }

    /// Primary and secondary guest of a stay, cached under the stay id
    pub async fn reservation_guests(&self, id: &str) -> BackofficeResult<ReservationGuests> {
        self.cached(&keys::reservation_guests(id), self.short_ttl(), || async {
            let Some(reservation) = self.store.reservation_by_id(id).await? else {
                return Ok(ReservationGuests::default());
            };
            let ids: Vec<ClientId> = reservation.guest_ids().collect();
            let guests = self.fetch_guests(&ids).await?;
            Ok(ReservationGuests {
                primary: reservation
                    .client_principal_id
                    .and_then(|g| guests.get(&g).cloned()),
                secondary: reservation
                    .client_secondaire_id
                    .and_then(|g| guests.get(&g).cloned()),
            })
        })
        .await
    }

    pub async fn reservation_detail(&self, id: &str) -> BackofficeResult<ReservationWithGuests> {
        let reservation = self.reservation(id).await?;
        let guests = self.reservation_guests(id).await?;
        Ok(ReservationWithGuests {
            reservation,
            primary_guest: guests.primary,
            secondary_guest: guests.secondary,
        })
    }

    pub async fn calendar(&self, year: i32, month: u32) -> BackofficeResult<CalendarMonth> {
        if views::month_bounds(year, month).is_none() {
            return Err(BackofficeError::InvalidMonth { year, month });
        }

        self.cached(&keys::calendar(year, month), self.long_ttl(), || async {
            let reservations = self.store.all_reservations().await?;
            let guests = self.fetch_guests(&views::guest_ids(&reservations)).await?;
            views::calendar_month(year, month, &reservations, &guests)
                .ok_or(BackofficeError::InvalidMonth { year, month })
        })
        .await
    }

    /// Apply a partial update to a client, then drop every cached view that embeds it
    pub async fn update_client(&self, id: ClientId, patch: &RecordPatch) -> BackofficeResult<Client> {
        validate_patch(patch, Table::Clients)?;

        let updated = self.store.update_client(id, patch).await?;
        let Some(client) = updated.into_iter().next() else {
            return Err(BackofficeError::NotUpdated(format!("Client {id}")));
        };

        let removed = self.cache.invalidate(keys::client_update_patterns(id));
        info!("client updated: id={}, invalidated={}", id, removed);
        Ok(client)
    }

    /// Apply a partial update to a stay, then drop every cached view that embeds it
    pub async fn update_reservation(
        &self,
        id: &str,
        patch: &RecordPatch,
    ) -> BackofficeResult<Reservation> {
        validate_patch(patch, Table::Reservations)?;

        let updated = self.store.update_reservation(id, patch).await?;
        let Some(reservation) = updated.into_iter().next() else {
            return Err(BackofficeError::NotUpdated(format!("Reservation {id}")));
        };

        let removed = self.cache.invalidate(keys::reservation_update_patterns(id));
        info!("reservation updated: id={}, invalidated={}", id, removed);
        Ok(reservation)
    }

    /// Context for the assistant, built from the cached dashboard reads
    pub async fn snapshot(&self) -> BackofficeResult<HotelSnapshot> {
        let stats = self.dashboard_stats().await?;
        let arrivals = self.arrivals_today().await?;
        let occupied_rooms = self
            .occupied_rooms(&PageRequest::new("", 1))
            .await?
            .total_rooms;

        Ok(HotelSnapshot {
            date: self.today(),
            stats,
            arrivals_today: arrivals
                .into_iter()
                .map(|a| ArrivalSummary {
                    reservation_id: a.reservation.resv_name_id,
                    room_no: a.reservation.room_no,
                    guest_name: a.primary_guest.map(|g| g.guest_name),
                    departure: a.reservation.departure,
                })
                .collect(),
            occupied_rooms,
        })
    }

    /// Reachability and latency of each table, never cached
    pub async fn system_status(&self) -> SystemStatus {
        let started = Instant::now();
        let clients_table = self.ping(Table::Clients).await;
        let reservations_table = self.ping(Table::Reservations).await;

        SystemStatus {
            clients_table,
            reservations_table,
            api: ServiceStatus {
                status: ServiceState::Online,
                response_time_ms: Some(elapsed_ms(started)),
                error: None,
            },
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    async fn ping(&self, table: Table) -> ServiceStatus {
        let started = Instant::now();
        match self.store.ping(table).await {
            Ok(()) => ServiceStatus {
                status: ServiceState::Online,
                response_time_ms: Some(elapsed_ms(started)),
                error: None,
            },
            Err(e) => {
                warn!("ping failed: table={}, error={}", table.as_str(), e);
                ServiceStatus {
                    status: ServiceState::Offline,
                    response_time_ms: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
        debug!("back-office cache cleared");
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    (started.elapsed().as_secs_f64() * 100_000.0).round() / 100.0
}

/// Reject empty patches and patches that would move the row to another key
fn validate_patch(patch: &RecordPatch, table: Table) -> BackofficeResult<()> {
    if patch.is_empty() {
        return Err(BackofficeError::InvalidPatch("no fields to update".to_string()));
    }
    if patch.contains_key(table.key_column()) {
        return Err(BackofficeError::InvalidPatch(format!(
            "{} cannot be changed",
            table.key_column()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReservationStatus;
    use crate::store::InMemoryRecordStore;
    use serde_json::json;
    use storage_engine::ManualClock;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    struct Fixture {
        store: Arc<InMemoryRecordStore>,
        clock: Arc<ManualClock>,
        backoffice: Backoffice,
    }

    fn fixture() -> Fixture {
        fixture_with_ttl(Duration::from_secs(30))
    }

    fn fixture_with_ttl(default_ttl: Duration) -> Fixture {
        let today = date(2025, 3, 10);
        let mut vip_guest = Client::new(1, "Alice Martin");
        vip_guest.vip = Some("V1".to_string());

        let store = Arc::new(
            InMemoryRecordStore::new()
                .with_clients([
                    vip_guest,
                    Client::new(2, "Bob Durand"),
                    Client::new(3, "Claire Petit"),
                ])
                .with_reservations([
                    Reservation::new("R-1")
                        .with_room("101")
                        .with_status(ReservationStatus::InHouse)
                        .with_dates(date(2025, 3, 8), date(2025, 3, 12))
                        .with_guests(Some(1), Some(2)),
                    Reservation::new("R-2")
                        .with_room("102")
                        .with_dates(today, date(2025, 3, 11))
                        .with_guests(Some(3), None),
                    Reservation::new("R-3")
                        .with_status(ReservationStatus::Upcoming)
                        .with_dates(date(2025, 4, 1), date(2025, 4, 5))
                        .with_guests(Some(2), None),
                ]),
        );
        let clock = Arc::new(ManualClock::new());
        let cache = Arc::new(TtlCache::with_clock(clock.clone(), default_ttl));
        let backoffice = Backoffice::with_today(store.clone(), cache, Arc::new(FixedToday(today)));

        Fixture {
            store,
            clock,
            backoffice,
        }
    }

    fn patch(fields: Value) -> RecordPatch {
        fields.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_dashboard_stats_cached_for_long_ttl() {
        let f = fixture();

        let stats = f.backoffice.dashboard_stats().await.unwrap();
        assert_eq!(stats.total_clients, 3);
        assert_eq!(stats.arrivals_today, 1);
        assert_eq!(stats.in_house, 2);
        assert_eq!(stats.upcoming, 1);
        assert_eq!(f.store.calls("all_reservations"), 1);

        f.clock.advance_secs(59);
        f.backoffice.dashboard_stats().await.unwrap();
        assert_eq!(f.store.calls("all_reservations"), 1);

        f.clock.advance_secs(1);
        f.backoffice.dashboard_stats().await.unwrap();
        assert_eq!(f.store.calls("all_reservations"), 2);
    }

    #[tokio::test]
    async fn test_client_page_hits_cache_within_ttl() {
        let f = fixture();
        let request = PageRequest::new("martin", 1);

        let page = f.backoffice.clients(&request).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.clients[0].id, 1);

        f.clock.advance_secs(29);
        f.backoffice.clients(&request).await.unwrap();
        assert_eq!(f.store.calls("list_clients"), 1);

        f.clock.advance_secs(1);
        f.backoffice.clients(&request).await.unwrap();
        assert_eq!(f.store.calls("list_clients"), 2);
    }

    #[tokio::test]
    async fn test_listings_follow_configured_default_ttl() {
        let f = fixture_with_ttl(Duration::from_secs(5));

        f.backoffice.recent_clients().await.unwrap();
        f.clock.advance_secs(4);
        f.backoffice.recent_clients().await.unwrap();
        assert_eq!(f.store.calls("recent_clients"), 1);

        f.clock.advance_secs(1);
        f.backoffice.recent_clients().await.unwrap();
        assert_eq!(f.store.calls("recent_clients"), 2);

        // Detail pages keep their longer lifetime
        f.backoffice.client_detail(1).await.unwrap();
        f.clock.advance_secs(59);
        f.backoffice.client_detail(1).await.unwrap();
        assert_eq!(f.store.calls("client_by_id"), 1);
    }

    #[tokio::test]
    async fn test_long_ttl_never_shorter_than_default() {
        let f = fixture_with_ttl(Duration::from_secs(90));

        f.backoffice.dashboard_stats().await.unwrap();
        f.clock.advance_secs(89);
        f.backoffice.dashboard_stats().await.unwrap();
        assert_eq!(f.store.calls("all_reservations"), 1);

        f.clock.advance_secs(1);
        f.backoffice.dashboard_stats().await.unwrap();
        assert_eq!(f.store.calls("all_reservations"), 2);
    }

    #[tokio::test]
    async fn test_store_failure_is_not_cached() {
        let f = fixture();
        f.store.set_unavailable(true);

        let failed = f.backoffice.clients(&PageRequest::default()).await;
        assert!(matches!(failed, Err(BackofficeError::Store(_))));

        f.store.set_unavailable(false);
        let page = f.backoffice.clients(&PageRequest::default()).await.unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(f.store.calls("list_clients"), 2);
    }

    #[tokio::test]
    async fn test_client_update_refreshes_dependent_views() {
        let f = fixture();

        let before = f.backoffice.client(1).await.unwrap();
        assert_eq!(before.guest_name, "Alice Martin");
        let rooms = f
            .backoffice
            .occupied_rooms(&PageRequest::default())
            .await
            .unwrap();
        assert_eq!(rooms.rooms[0].guests[0].guest_name, "Alice Martin");
        f.backoffice.reservation("R-2").await.unwrap();

        f.backoffice
            .update_client(1, &patch(json!({"guest_name": "Alice Bernard"})))
            .await
            .unwrap();

        let after = f.backoffice.client(1).await.unwrap();
        assert_eq!(after.guest_name, "Alice Bernard");
        assert_eq!(f.store.calls("client_by_id"), 2);

        let rooms = f
            .backoffice
            .occupied_rooms(&PageRequest::default())
            .await
            .unwrap();
        assert_eq!(rooms.rooms[0].guests[0].guest_name, "Alice Bernard");

        // Unrelated stay detail stays cached
        f.backoffice.reservation("R-2").await.unwrap();
        assert_eq!(f.store.calls("reservation_by_id"), 1);
    }

    #[tokio::test]
    async fn test_reservation_update_refreshes_listings() {
        let f = fixture();

        let listing = f
            .backoffice
            .reservations(&PageRequest::default())
            .await
            .unwrap();
        assert_eq!(listing.total, 3);
        f.backoffice.client_reservations(3).await.unwrap();
        f.backoffice.recent_clients().await.unwrap();

        let updated = f
            .backoffice
            .update_reservation("R-2", &patch(json!({"room_no": "204"})))
            .await
            .unwrap();
        assert_eq!(updated.room_no.as_deref(), Some("204"));

        let listing = f
            .backoffice
            .reservations(&PageRequest::default())
            .await
            .unwrap();
        assert_eq!(f.store.calls("search_reservations"), 2);
        assert!(listing
            .reservations
            .iter()
            .any(|r| r.reservation.room_no.as_deref() == Some("204")));

        f.backoffice.client_reservations(3).await.unwrap();
        assert_eq!(f.store.calls("reservations_for_client"), 2);

        // Client listings do not embed stays and stay cached
        f.backoffice.recent_clients().await.unwrap();
        assert_eq!(f.store.calls("recent_clients"), 1);
    }

    #[tokio::test]
    async fn test_update_of_missing_row_is_not_updated() {
        let f = fixture();
        let result = f
            .backoffice
            .update_client(404, &patch(json!({"vip": "V2"})))
            .await;
        assert!(matches!(result, Err(BackofficeError::NotUpdated(_))));
    }

    #[tokio::test]
    async fn test_invalid_patches_are_rejected_before_writing() {
        let f = fixture();

        let empty = f.backoffice.update_client(1, &RecordPatch::new()).await;
        assert!(matches!(empty, Err(BackofficeError::InvalidPatch(_))));

        let rekey = f
            .backoffice
            .update_reservation("R-1", &patch(json!({"resv_name_id": "R-9"})))
            .await;
        assert!(matches!(rekey, Err(BackofficeError::InvalidPatch(_))));
        assert_eq!(f.store.calls("update_client"), 0);
        assert_eq!(f.store.calls("update_reservation"), 0);
    }

    #[tokio::test]
    async fn test_missing_client_is_not_found() {
        let f = fixture();
        let result = f.backoffice.client_detail(404).await;
        assert!(matches!(result, Err(BackofficeError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_reservation_search_matches_guest_names() {
        let f = fixture();
        let page = f
            .backoffice
            .reservations(&PageRequest::new("durand", 1))
            .await
            .unwrap();

        let ids: Vec<&str> = page
            .reservations
            .iter()
            .map(|r| r.reservation.resv_name_id.as_str())
            .collect();
        assert_eq!(ids, vec!["R-1", "R-3"]);
        assert_eq!(
            page.reservations[0]
                .secondary_guest
                .as_ref()
                .map(|g| g.guest_name.as_str()),
            Some("Bob Durand")
        );
    }

    #[tokio::test]
    async fn test_reservation_detail_joins_guests() {
        let f = fixture();
        let detail = f.backoffice.reservation_detail("R-1").await.unwrap();

        assert_eq!(detail.primary_guest.map(|g| g.id), Some(1));
        assert_eq!(detail.secondary_guest.map(|g| g.id), Some(2));
        assert!(matches!(
            f.backoffice.reservation_detail("nope").await,
            Err(BackofficeError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_occupied_rooms_inherit_vip() {
        let f = fixture();
        let page = f
            .backoffice
            .occupied_rooms(&PageRequest::default())
            .await
            .unwrap();

        assert_eq!(page.total_rooms, 2);
        assert_eq!(page.total_vip, 2);
        assert_eq!(page.rooms[0].guests[1].vip.as_deref(), Some("V1"));
    }

    #[tokio::test]
    async fn test_calendar_validates_month_and_caches() {
        let f = fixture();

        assert!(matches!(
            f.backoffice.calendar(2025, 13).await,
            Err(BackofficeError::InvalidMonth { month: 13, .. })
        ));
        assert_eq!(f.store.calls("all_reservations"), 0);

        let march = f.backoffice.calendar(2025, 3).await.unwrap();
        assert_eq!(march.days[&date(2025, 3, 10)].guests.len(), 2);
        f.backoffice.calendar(2025, 3).await.unwrap();
        assert_eq!(f.store.calls("all_reservations"), 1);
    }

    #[tokio::test]
    async fn test_guest_lookup_is_chunked() {
        let today = date(2025, 3, 10);
        let clients = (1..=250).map(|id| Client::new(id, format!("Guest {id}")));
        let reservations = (1..=250).map(|id| {
            Reservation::new(format!("R-{id:03}"))
                .with_dates(today, date(2025, 3, 11))
                .with_guests(Some(id), None)
        });
        let store = Arc::new(
            InMemoryRecordStore::new()
                .with_clients(clients)
                .with_reservations(reservations),
        );
        let backoffice = Backoffice::with_today(
            store.clone(),
            Arc::new(TtlCache::new()),
            Arc::new(FixedToday(today)),
        );

        let arrivals = backoffice.arrivals_today().await.unwrap();
        assert_eq!(arrivals.len(), 250);
        assert!(arrivals.iter().all(|a| a.primary_guest.is_some()));
        assert_eq!(store.calls("clients_by_ids"), 3);
    }

    #[tokio::test]
    async fn test_system_status_reports_each_table() {
        let f = fixture();
        f.store.fail_operation("ping_reservations");

        let status = f.backoffice.system_status().await;
        assert_eq!(status.clients_table.status, ServiceState::Online);
        assert_eq!(status.reservations_table.status, ServiceState::Offline);
        assert!(status.reservations_table.error.is_some());
        assert_eq!(status.api.status, ServiceState::Online);
    }

    #[tokio::test]
    async fn test_snapshot_and_clear_cache() {
        let f = fixture();

        let snapshot = f.backoffice.snapshot().await.unwrap();
        assert_eq!(snapshot.occupied_rooms, 2);
        assert_eq!(snapshot.arrivals_today.len(), 1);
        assert_eq!(
            snapshot.arrivals_today[0].guest_name.as_deref(),
            Some("Claire Petit")
        );
        assert!(f.backoffice.cache_stats().entries > 0);

        f.backoffice.clear_cache();
        assert_eq!(f.backoffice.cache_stats().entries, 0);
    }
}
