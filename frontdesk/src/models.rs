use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

pub type ClientId = i64;

/// Column values sent with a partial update, keyed by column name
pub type RecordPatch = Map<String, Value>;

/// A guest row from the `clients` table
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Client {
    pub id: ClientId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub guest_name: String,
    #[serde(default)]
    pub guest_title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub guest_name_id: Option<String>,
    #[serde(default)]
    pub vip: Option<String>,
    /// Columns this service does not interpret, kept for display
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Client {
    pub fn new(id: ClientId, guest_name: impl Into<String>) -> Self {
        Self {
            id,
            guest_name: guest_name.into(),
            guest_title: None,
            guest_name_id: None,
            vip: None,
            extra: Map::new(),
        }
    }

    /// The VIP code, if one is set and not blank
    pub fn vip_code(&self) -> Option<&str> {
        self.vip.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }

    /// Case-insensitive match on name, title or external guest id
    pub fn matches(&self, search: &str) -> bool {
        let needle = search.to_lowercase();
        contains_ci(&self.guest_name, &needle)
            || self
                .guest_title
                .as_deref()
                .is_some_and(|t| contains_ci(t, &needle))
            || self
                .guest_name_id
                .as_deref()
                .is_some_and(|g| contains_ci(g, &needle))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ReservationStatus {
    InHouse,
    Upcoming,
    Completed,
    Other(String),
}

impl ReservationStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ReservationStatus::InHouse => "en_cours",
            ReservationStatus::Upcoming => "futures",
            ReservationStatus::Completed => "terminee",
            ReservationStatus::Other(raw) => raw,
        }
    }
}

impl From<String> for ReservationStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "en_cours" => ReservationStatus::InHouse,
            "futures" => ReservationStatus::Upcoming,
            "terminee" => ReservationStatus::Completed,
            _ => ReservationStatus::Other(raw),
        }
    }
}

impl From<ReservationStatus> for String {
    fn from(status: ReservationStatus) -> Self {
        status.as_str().to_string()
    }
}

/// A stay row from the `reservations` table
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Reservation {
    #[serde(deserialize_with = "required_string")]
    pub resv_name_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub room_no: Option<String>,
    #[serde(default)]
    pub room_category_label: Option<String>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub arrival: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub departure: Option<NaiveDate>,
    #[serde(default)]
    pub statut: Option<ReservationStatus>,
    #[serde(default)]
    pub client_principal_id: Option<ClientId>,
    #[serde(default)]
    pub client_secondaire_id: Option<ClientId>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Reservation {
    pub fn new(resv_name_id: impl Into<String>) -> Self {
        Self {
            resv_name_id: resv_name_id.into(),
            room_no: None,
            room_category_label: None,
            arrival: None,
            departure: None,
            statut: None,
            client_principal_id: None,
            client_secondaire_id: None,
            extra: Map::new(),
        }
    }

    pub fn with_room(mut self, room_no: impl Into<String>) -> Self {
        self.room_no = Some(room_no.into());
        self
    }

    pub fn with_dates(mut self, arrival: NaiveDate, departure: NaiveDate) -> Self {
        self.arrival = Some(arrival);
        self.departure = Some(departure);
        self
    }

    pub fn with_status(mut self, status: ReservationStatus) -> Self {
        self.statut = Some(status);
        self
    }

    pub fn with_guests(mut self, primary: Option<ClientId>, secondary: Option<ClientId>) -> Self {
        self.client_principal_id = primary;
        self.client_secondaire_id = secondary;
        self
    }

    pub fn has_status(&self, status: &ReservationStatus) -> bool {
        self.statut.as_ref() == Some(status)
    }

    /// Primary then secondary guest id, whichever are set
    pub fn guest_ids(&self) -> impl Iterator<Item = ClientId> + '_ {
        self.client_principal_id
            .into_iter()
            .chain(self.client_secondaire_id)
    }

    pub fn involves(&self, client_id: ClientId) -> bool {
        self.guest_ids().any(|id| id == client_id)
    }

    /// Arrival on or before `day` and departure on or after it
    pub fn spans(&self, day: NaiveDate) -> bool {
        matches!((self.arrival, self.departure), (Some(a), Some(d)) if a <= day && day <= d)
    }
}

/// Search text and 1-based page number of a listing request
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    #[serde(default)]
    pub search: String,
    #[serde(default = "first_page")]
    pub page: u32,
}

impl PageRequest {
    pub fn new(search: impl Into<String>, page: u32) -> Self {
        Self {
            search: search.into(),
            page: page.max(1),
        }
    }

    pub fn page(&self) -> u32 {
        self.page.max(1)
    }

    pub fn offset(&self, per_page: u32) -> u64 {
        u64::from(self.page() - 1) * u64::from(per_page)
    }

    pub fn search(&self) -> &str {
        self.search.trim()
    }
}

fn first_page() -> u32 {
    1
}

/// Parse a date column written either as `YYYY-MM-DD` or as a timestamp
pub fn parse_record_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.date_naive());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|ts| ts.date())
}

fn contains_ci(haystack: &str, lowered_needle: &str) -> bool {
    haystack.to_lowercase().contains(lowered_needle)
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn value_as_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(value_as_string))
}

fn required_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    value_as_string(value).ok_or_else(|| serde::de::Error::custom("expected a string or number"))
}

fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(raw)) => parse_record_date(&raw),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_client_keeps_unknown_columns() {
        let client: Client = serde_json::from_value(json!({
            "id": 42,
            "guest_name": "Martin",
            "guest_title": "Mme",
            "guest_name_id": 9001,
            "vip": "V2",
            "nationality": "FR"
        }))
        .unwrap();

        assert_eq!(client.guest_name_id.as_deref(), Some("9001"));
        assert_eq!(client.vip_code(), Some("V2"));
        assert_eq!(client.extra.get("nationality"), Some(&json!("FR")));

        let back = serde_json::to_value(&client).unwrap();
        assert_eq!(back["nationality"], json!("FR"));
    }

    #[test]
    fn test_client_null_name_and_blank_vip() {
        let client: Client =
            serde_json::from_value(json!({"id": 1, "guest_name": null, "vip": "  "})).unwrap();
        assert_eq!(client.guest_name, "");
        assert_eq!(client.vip_code(), None);
    }

    #[test]
    fn test_client_search_is_case_insensitive() {
        let mut client = Client::new(3, "Jean Dupont");
        client.guest_title = Some("M.".to_string());
        client.guest_name_id = Some("G-777".to_string());

        assert!(client.matches("dupont"));
        assert!(client.matches("g-7"));
        assert!(client.matches("M."));
        assert!(!client.matches("martin"));
    }

    #[test]
    fn test_reservation_accepts_both_date_formats() {
        let reservation: Reservation = serde_json::from_value(json!({
            "resv_name_id": "R-1",
            "room_no": 204,
            "arrival": "2025-03-03",
            "departure": "2025-03-05T11:00:00+00:00",
            "statut": "en_cours",
            "client_principal_id": 7
        }))
        .unwrap();

        assert_eq!(reservation.room_no.as_deref(), Some("204"));
        assert_eq!(reservation.arrival, Some(date(2025, 3, 3)));
        assert_eq!(reservation.departure, Some(date(2025, 3, 5)));
        assert!(reservation.has_status(&ReservationStatus::InHouse));
        assert_eq!(reservation.guest_ids().collect::<Vec<_>>(), vec![7]);
    }

    #[test]
    fn test_unparseable_date_is_absent() {
        let reservation: Reservation = serde_json::from_value(json!({
            "resv_name_id": 55,
            "arrival": "next tuesday",
            "departure": null
        }))
        .unwrap();

        assert_eq!(reservation.resv_name_id, "55");
        assert_eq!(reservation.arrival, None);
        assert_eq!(reservation.departure, None);
        assert!(!reservation.spans(date(2025, 1, 1)));
    }

    #[test]
    fn test_unknown_status_round_trips() {
        let status: ReservationStatus = serde_json::from_value(json!("annulee")).unwrap();
        assert_eq!(status, ReservationStatus::Other("annulee".to_string()));
        assert_eq!(serde_json::to_value(&status).unwrap(), json!("annulee"));
        assert_eq!(
            serde_json::to_value(ReservationStatus::Upcoming).unwrap(),
            json!("futures")
        );
    }

    #[test]
    fn test_spans_is_inclusive() {
        let stay = Reservation::new("R").with_dates(date(2025, 3, 1), date(2025, 3, 4));
        assert!(stay.spans(date(2025, 3, 1)));
        assert!(stay.spans(date(2025, 3, 4)));
        assert!(!stay.spans(date(2025, 3, 5)));
    }

    #[test]
    fn test_page_request_clamps_to_first_page() {
        let request = PageRequest::new("  bob ", 0);
        assert_eq!(request.page(), 1);
        assert_eq!(request.offset(20), 0);
        assert_eq!(request.search(), "bob");
        assert_eq!(PageRequest::new("", 3).offset(12), 24);
    }
}
