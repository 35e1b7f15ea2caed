use super::error::{StoreError, StoreResult};
use crate::models::{Client, ClientId, RecordPatch, Reservation};
use crate::ports::{RecordStore, ReservationFilter, Table};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::header::AUTHORIZATION;
use reqwest::{Method, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use shared::config::RecordStoreConfig;
use std::time::Duration;
use tracing::{debug, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

type Query = Vec<(&'static str, String)>;

/// Record store backed by a PostgREST endpoint (`{url}/rest/v1/{table}`)
pub struct PostgrestStore {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Deserialize)]
struct IdRow {
    id: ClientId,
}

impl PostgrestStore {
    pub fn new(config: &RecordStoreConfig) -> StoreResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.service_key.clone(),
        })
    }

    fn table_url(&self, table: Table) -> String {
        format!("{}/rest/v1/{}", self.base_url, table.as_str())
    }

    fn request(&self, method: Method, table: Table) -> RequestBuilder {
        self.client
            .request(method, self.table_url(table))
            .header("apikey", &self.api_key)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
    }

    async fn select<T: DeserializeOwned>(&self, table: Table, query: Query) -> StoreResult<Vec<T>> {
        debug!("select: table={}, query={:?}", table.as_str(), query);

        let response = self
            .request(Method::GET, table)
            .query(&query)
            .send()
            .await?;

        Ok(check_status(table, response).await?.json().await?)
    }

    async fn select_one<T: DeserializeOwned>(
        &self,
        table: Table,
        mut query: Query,
    ) -> StoreResult<Option<T>> {
        query.push(("limit", "1".to_string()));
        Ok(self.select(table, query).await?.into_iter().next())
    }

    /// Exact row count read from the `Content-Range` header
    async fn count(&self, table: Table, mut query: Query) -> StoreResult<u64> {
        query.push(("select", table.key_column().to_string()));
        query.push(("limit", "1".to_string()));

        let response = self
            .request(Method::GET, table)
            .header("Prefer", "count=exact")
            .query(&query)
            .send()
            .await?;
        let response = check_status(table, response).await?;

        response
            .headers()
            .get("content-range")
            .and_then(|h| h.to_str().ok())
            .and_then(parse_content_range_total)
            .ok_or_else(|| StoreError::Decode("missing or invalid Content-Range".to_string()))
    }

    async fn patch<T: DeserializeOwned>(
        &self,
        table: Table,
        id: &str,
        patch: &RecordPatch,
    ) -> StoreResult<Vec<T>> {
        let response = self
            .request(Method::PATCH, table)
            .header("Prefer", "return=representation")
            .query(&[(table.key_column(), format!("eq.{id}"))])
            .json(patch)
            .send()
            .await?;

        Ok(check_status(table, response).await?.json().await?)
    }
}

async fn check_status(table: Table, response: Response) -> StoreResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    warn!(
        "record store error: table={}, status={}, body={}",
        table.as_str(),
        status,
        body
    );

    Err(StoreError::Status {
        status: status.as_u16(),
        body,
    })
}

/// Wrap a filter value in double quotes so commas and parentheses stay literal
fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

fn ilike(search: &str) -> String {
    quote(&format!("*{search}*"))
}

fn in_list(ids: &[ClientId]) -> String {
    let joined = ids
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",");
    format!("in.({joined})")
}

fn client_search_filter(search: &str) -> String {
    let pattern = ilike(search);
    format!(
        "(guest_name.ilike.{pattern},guest_title.ilike.{pattern},guest_name_id.ilike.{pattern})"
    )
}

fn reservation_search_filter(filter: &ReservationFilter) -> String {
    let pattern = ilike(&filter.search);
    let mut conditions = vec![
        format!("resv_name_id.ilike.{pattern}"),
        format!("room_no.ilike.{pattern}"),
    ];

    if !filter.client_ids.is_empty() {
        let ids = in_list(&filter.client_ids);
        conditions.push(format!("client_principal_id.{ids}"));
        conditions.push(format!("client_secondaire_id.{ids}"));
    }

    format!("({})", conditions.join(","))
}

fn client_query(search: &str) -> Query {
    if search.is_empty() {
        Vec::new()
    } else {
        vec![("or", client_search_filter(search))]
    }
}

fn reservation_query(filter: &ReservationFilter) -> Query {
    if filter.is_empty() {
        Vec::new()
    } else {
        vec![("or", reservation_search_filter(filter))]
    }
}

/// Total from a `Content-Range` value such as `0-19/342` or `*/0`
fn parse_content_range_total(header: &str) -> Option<u64> {
    header.rsplit_once('/')?.1.trim().parse().ok()
}

#[async_trait]
impl RecordStore for PostgrestStore {
    async fn count_clients(&self, search: &str) -> StoreResult<u64> {
        self.count(Table::Clients, client_query(search)).await
    }

    async fn list_clients(&self, search: &str, offset: u64, limit: u64) -> StoreResult<Vec<Client>> {
        let mut query = client_query(search);
        query.push(("select", "*".to_string()));
        query.push(("order", "id.asc".to_string()));
        query.push(("offset", offset.to_string()));
        query.push(("limit", limit.to_string()));
        self.select(Table::Clients, query).await
    }

    async fn client_ids_matching(&self, search: &str) -> StoreResult<Vec<ClientId>> {
        let mut query = client_query(search);
        query.push(("select", "id".to_string()));
        let rows: Vec<IdRow> = self.select(Table::Clients, query).await?;
        Ok(rows.into_iter().map(|row| row.id).collect())
    }

    async fn clients_by_ids(&self, ids: &[ClientId]) -> StoreResult<Vec<Client>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.select(
            Table::Clients,
            vec![("select", "*".to_string()), ("id", in_list(ids))],
        )
        .await
    }

    async fn client_by_id(&self, id: ClientId) -> StoreResult<Option<Client>> {
        self.select_one(
            Table::Clients,
            vec![("select", "*".to_string()), ("id", format!("eq.{id}"))],
        )
        .await
    }

    async fn recent_clients(&self, limit: u64) -> StoreResult<Vec<Client>> {
        self.select(
            Table::Clients,
            vec![
                ("select", "*".to_string()),
                ("order", "id.desc".to_string()),
                ("limit", limit.to_string()),
            ],
        )
        .await
    }

    async fn all_reservations(&self) -> StoreResult<Vec<Reservation>> {
        self.select(Table::Reservations, vec![("select", "*".to_string())])
            .await
    }

    async fn reservations_arriving_on(&self, day: NaiveDate) -> StoreResult<Vec<Reservation>> {
        self.select(
            Table::Reservations,
            vec![("select", "*".to_string()), ("arrival", format!("eq.{day}"))],
        )
        .await
    }

    async fn reservations_in_house(&self, day: NaiveDate) -> StoreResult<Vec<Reservation>> {
        self.select(
            Table::Reservations,
            vec![
                ("select", "*".to_string()),
                ("statut", "eq.en_cours".to_string()),
                ("departure", format!("gte.{day}")),
            ],
        )
        .await
    }

    async fn reservations_spanning(&self, day: NaiveDate) -> StoreResult<Vec<Reservation>> {
        self.select(
            Table::Reservations,
            vec![
                ("select", "*".to_string()),
                ("arrival", format!("lte.{day}")),
                ("departure", format!("gte.{day}")),
            ],
        )
        .await
    }

    async fn search_reservations(
        &self,
        filter: &ReservationFilter,
        offset: u64,
        limit: u64,
    ) -> StoreResult<Vec<Reservation>> {
        let mut query = reservation_query(filter);
        query.push(("select", "*".to_string()));
        query.push(("order", "resv_name_id.asc".to_string()));
        query.push(("offset", offset.to_string()));
        query.push(("limit", limit.to_string()));
        self.select(Table::Reservations, query).await
    }

    async fn count_reservations(&self, filter: &ReservationFilter) -> StoreResult<u64> {
        self.count(Table::Reservations, reservation_query(filter))
            .await
    }

    async fn reservation_by_id(&self, id: &str) -> StoreResult<Option<Reservation>> {
        self.select_one(
            Table::Reservations,
            vec![
                ("select", "*".to_string()),
                ("resv_name_id", format!("eq.{id}")),
            ],
        )
        .await
    }

    async fn reservations_for_client(&self, id: ClientId) -> StoreResult<Vec<Reservation>> {
        self.select(
            Table::Reservations,
            vec![
                ("select", "*".to_string()),
                (
                    "or",
                    format!("(client_principal_id.eq.{id},client_secondaire_id.eq.{id})"),
                ),
            ],
        )
        .await
    }

    async fn update_client(&self, id: ClientId, patch: &RecordPatch) -> StoreResult<Vec<Client>> {
        self.patch(Table::Clients, &id.to_string(), patch).await
    }

    async fn update_reservation(
        &self,
        id: &str,
        patch: &RecordPatch,
    ) -> StoreResult<Vec<Reservation>> {
        self.patch(Table::Reservations, id, patch).await
    }

    async fn ping(&self, table: Table) -> StoreResult<()> {
        let _row: Option<serde_json::Value> = self
            .select_one(table, vec![("select", table.key_column().to_string())])
            .await?;
        Ok(())
    }
}

impl std::fmt::Debug for PostgrestStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgrestStore")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}
