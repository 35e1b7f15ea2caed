use super::error::{StoreError, StoreResult};
use crate::models::{Client, ClientId, RecordPatch, Reservation, ReservationStatus};
use crate::ports::{RecordStore, ReservationFilter, Table};
use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::{DashMap, DashSet};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::atomic::{AtomicBool, Ordering};

/// In-process record store with per-operation call counters and failure injection
#[derive(Default)]
pub struct InMemoryRecordStore {
    clients: DashMap<ClientId, Client>,
    reservations: DashMap<String, Reservation>,
    calls: DashMap<&'static str, usize>,
    failing: DashSet<&'static str>,
    unavailable: AtomicBool,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clients(self, clients: impl IntoIterator<Item = Client>) -> Self {
        for client in clients {
            self.insert_client(client);
        }
        self
    }

    pub fn with_reservations(self, reservations: impl IntoIterator<Item = Reservation>) -> Self {
        for reservation in reservations {
            self.insert_reservation(reservation);
        }
        self
    }

    pub fn insert_client(&self, client: Client) {
        self.clients.insert(client.id, client);
    }

    pub fn insert_reservation(&self, reservation: Reservation) {
        self.reservations
            .insert(reservation.resv_name_id.clone(), reservation);
    }

    /// How many times `operation` was called, failed calls included
    pub fn calls(&self, operation: &str) -> usize {
        self.calls.get(operation).map(|c| *c).unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.iter().map(|entry| *entry.value()).sum()
    }

    pub fn reset_calls(&self) {
        self.calls.clear();
    }

    /// Make every operation fail until called again with `false`
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn fail_operation(&self, operation: &'static str) {
        self.failing.insert(operation);
    }

    pub fn restore_operation(&self, operation: &str) {
        self.failing.remove(operation);
    }

    fn record(&self, operation: &'static str) -> StoreResult<()> {
        *self.calls.entry(operation).or_insert(0) += 1;

        if self.unavailable.load(Ordering::SeqCst) || self.failing.contains(operation) {
            return Err(StoreError::Unavailable(format!("{operation} failed")));
        }
        Ok(())
    }

    fn sorted_clients(&self) -> Vec<Client> {
        let mut clients: Vec<Client> = self.clients.iter().map(|e| e.value().clone()).collect();
        clients.sort_by_key(|c| c.id);
        clients
    }

    fn sorted_reservations(&self) -> Vec<Reservation> {
        let mut reservations: Vec<Reservation> = self
            .reservations
            .iter()
            .map(|e| e.value().clone())
            .collect();
        reservations.sort_by(|a, b| a.resv_name_id.cmp(&b.resv_name_id));
        reservations
    }

    fn matching_clients(&self, search: &str) -> Vec<Client> {
        self.sorted_clients()
            .into_iter()
            .filter(|c| search.is_empty() || c.matches(search))
            .collect()
    }

    fn reservations_where(&self, keep: impl Fn(&Reservation) -> bool) -> Vec<Reservation> {
        self.sorted_reservations()
            .into_iter()
            .filter(|r| keep(r))
            .collect()
    }
}

fn page<T>(rows: Vec<T>, offset: u64, limit: u64) -> Vec<T> {
    rows.into_iter()
        .skip(offset as usize)
        .take(limit as usize)
        .collect()
}

/// Merge `patch` into the serialized record, leaving the key column untouched
fn apply_patch<T>(record: &T, patch: &RecordPatch, key_column: &str) -> StoreResult<T>
where
    T: Serialize + DeserializeOwned,
{
    let mut value = serde_json::to_value(record)?;
    if let Some(fields) = value.as_object_mut() {
        for (column, new_value) in patch {
            if column != key_column {
                fields.insert(column.clone(), new_value.clone());
            }
        }
    }
    Ok(serde_json::from_value(value)?)
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn count_clients(&self, search: &str) -> StoreResult<u64> {
        self.record("count_clients")?;
        Ok(self.matching_clients(search).len() as u64)
    }

    async fn list_clients(&self, search: &str, offset: u64, limit: u64) -> StoreResult<Vec<Client>> {
        self.record("list_clients")?;
        Ok(page(self.matching_clients(search), offset, limit))
    }

    async fn client_ids_matching(&self, search: &str) -> StoreResult<Vec<ClientId>> {
        self.record("client_ids_matching")?;
        Ok(self
            .matching_clients(search)
            .into_iter()
            .map(|c| c.id)
            .collect())
    }

    async fn clients_by_ids(&self, ids: &[ClientId]) -> StoreResult<Vec<Client>> {
        self.record("clients_by_ids")?;
        Ok(ids
            .iter()
            .filter_map(|id| self.clients.get(id).map(|c| c.value().clone()))
            .collect())
    }

    async fn client_by_id(&self, id: ClientId) -> StoreResult<Option<Client>> {
        self.record("client_by_id")?;
        Ok(self.clients.get(&id).map(|c| c.value().clone()))
    }

    async fn recent_clients(&self, limit: u64) -> StoreResult<Vec<Client>> {
        self.record("recent_clients")?;
        let mut clients = self.sorted_clients();
        clients.reverse();
        Ok(page(clients, 0, limit))
    }

    async fn all_reservations(&self) -> StoreResult<Vec<Reservation>> {
        self.record("all_reservations")?;
        Ok(self.sorted_reservations())
    }

    async fn reservations_arriving_on(&self, day: NaiveDate) -> StoreResult<Vec<Reservation>> {
        self.record("reservations_arriving_on")?;
        Ok(self.reservations_where(|r| r.arrival == Some(day)))
    }

    async fn reservations_in_house(&self, day: NaiveDate) -> StoreResult<Vec<Reservation>> {
        self.record("reservations_in_house")?;
        Ok(self.reservations_where(|r| {
            r.has_status(&ReservationStatus::InHouse) && r.departure.is_some_and(|d| d >= day)
        }))
    }

    async fn reservations_spanning(&self, day: NaiveDate) -> StoreResult<Vec<Reservation>> {
        self.record("reservations_spanning")?;
        Ok(self.reservations_where(|r| r.spans(day)))
    }

    async fn search_reservations(
        &self,
        filter: &ReservationFilter,
        offset: u64,
        limit: u64,
    ) -> StoreResult<Vec<Reservation>> {
        self.record("search_reservations")?;
        Ok(page(self.reservations_where(|r| filter.matches(r)), offset, limit))
    }

    async fn count_reservations(&self, filter: &ReservationFilter) -> StoreResult<u64> {
        self.record("count_reservations")?;
        Ok(self.reservations_where(|r| filter.matches(r)).len() as u64)
    }

    async fn reservation_by_id(&self, id: &str) -> StoreResult<Option<Reservation>> {
        self.record("reservation_by_id")?;
        Ok(self.reservations.get(id).map(|r| r.value().clone()))
    }

    async fn reservations_for_client(&self, id: ClientId) -> StoreResult<Vec<Reservation>> {
        self.record("reservations_for_client")?;
        Ok(self.reservations_where(|r| r.involves(id)))
    }

    async fn update_client(&self, id: ClientId, patch: &RecordPatch) -> StoreResult<Vec<Client>> {
        self.record("update_client")?;

        let Some(mut entry) = self.clients.get_mut(&id) else {
            return Ok(Vec::new());
        };
        let updated = apply_patch(entry.value(), patch, Table::Clients.key_column())?;
        *entry = updated.clone();
        Ok(vec![updated])
    }

    async fn update_reservation(
        &self,
        id: &str,
        patch: &RecordPatch,
    ) -> StoreResult<Vec<Reservation>> {
        self.record("update_reservation")?;

        let Some(mut entry) = self.reservations.get_mut(id) else {
            return Ok(Vec::new());
        };
        let updated = apply_patch(entry.value(), patch, Table::Reservations.key_column())?;
        *entry = updated.clone();
        Ok(vec![updated])
    }

    async fn ping(&self, table: Table) -> StoreResult<()> {
        match table {
            Table::Clients => self.record("ping_clients"),
            Table::Reservations => self.record("ping_reservations"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> InMemoryRecordStore {
        InMemoryRecordStore::new()
            .with_clients([
                Client::new(1, "Alice Martin"),
                Client::new(2, "Bob Durand"),
                Client::new(3, "Claire Martin"),
            ])
            .with_reservations([
                Reservation::new("R-1").with_room("101").with_guests(Some(1), Some(2)),
                Reservation::new("R-2").with_room("102").with_guests(Some(3), None),
            ])
    }

    #[tokio::test]
    async fn test_search_and_paging() {
        let store = store();

        assert_eq!(store.count_clients("martin").await.unwrap(), 2);
        let page = store.list_clients("martin", 1, 10).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].id, 3);

        let recent = store.recent_clients(2).await.unwrap();
        assert_eq!(recent.iter().map(|c| c.id).collect::<Vec<_>>(), vec![3, 2]);
    }

    #[tokio::test]
    async fn test_update_applies_patch_and_keeps_key() {
        let store = store();
        let mut patch = RecordPatch::new();
        patch.insert("vip".to_string(), json!("V1"));
        patch.insert("id".to_string(), json!(99));

        let updated = store.update_client(1, &patch).await.unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].id, 1);
        assert_eq!(updated[0].vip.as_deref(), Some("V1"));

        let missing = store.update_client(404, &patch).await.unwrap();
        assert!(missing.is_empty());
    }

    #[tokio::test]
    async fn test_failure_injection_counts_calls() {
        let store = store();
        store.fail_operation("client_by_id");

        assert!(matches!(
            store.client_by_id(1).await,
            Err(StoreError::Unavailable(_))
        ));
        assert_eq!(store.calls("client_by_id"), 1);

        store.restore_operation("client_by_id");
        assert!(store.client_by_id(1).await.unwrap().is_some());

        store.set_unavailable(true);
        assert!(store.ping(Table::Reservations).await.is_err());
        assert_eq!(store.total_calls(), 3);
    }
}
