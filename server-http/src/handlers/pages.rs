use crate::api::requests::ListQuery;
use crate::api::responses::PageResponse;
use crate::api::{backoffice_error, ApiResult};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::NaiveDate;
use frontdesk::auth::Session;
use frontdesk::locale::PageHeader;
use frontdesk::models::ClientId;
use frontdesk::views::{
    ClientDetail, ClientPage, Dashboard, OccupiedRoomsPage, ReservationPage, ReservationWithGuests,
};
use serde::Serialize;

fn page<T: Serialize>(session: &Session, content: T) -> Json<PageResponse<T>> {
    Json(PageResponse {
        header: PageHeader::now(session.locale, session.identity.greeting_name()),
        content,
    })
}

/// Reservation listing with the date the in-house filters were computed for
#[derive(Serialize)]
pub struct ReservationsView {
    #[serde(flatten)]
    pub page: ReservationPage,
    pub today: NaiveDate,
}

/// GET /
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> ApiResult<PageResponse<Dashboard>> {
    let dashboard = state
        .backoffice
        .dashboard()
        .await
        .map_err(backoffice_error)?;
    Ok(page(&session, dashboard))
}

/// GET /clients?search&page
pub async fn clients(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(query): Query<ListQuery>,
) -> ApiResult<PageResponse<ClientPage>> {
    let listing = state
        .backoffice
        .clients(&query.into_page_request())
        .await
        .map_err(backoffice_error)?;
    Ok(page(&session, listing))
}

/// GET /clients-actuels?search&page
pub async fn occupied_rooms(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(query): Query<ListQuery>,
) -> ApiResult<PageResponse<OccupiedRoomsPage>> {
    let rooms = state
        .backoffice
        .occupied_rooms(&query.into_page_request())
        .await
        .map_err(backoffice_error)?;
    Ok(page(&session, rooms))
}

/// GET /reservations?search&page
pub async fn reservations(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(query): Query<ListQuery>,
) -> ApiResult<PageResponse<ReservationsView>> {
    let listing = state
        .backoffice
        .reservations(&query.into_page_request())
        .await
        .map_err(backoffice_error)?;
    Ok(page(
        &session,
        ReservationsView {
            page: listing,
            today: state.backoffice.today(),
        },
    ))
}

/// GET /client/{id}
pub async fn client_detail(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<ClientId>,
) -> ApiResult<PageResponse<ClientDetail>> {
    let detail = state
        .backoffice
        .client_detail(id)
        .await
        .map_err(backoffice_error)?;
    Ok(page(&session, detail))
}

/// GET /reservation/{id}
pub async fn reservation_detail(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> ApiResult<PageResponse<ReservationWithGuests>> {
    let detail = state
        .backoffice
        .reservation_detail(&id)
        .await
        .map_err(backoffice_error)?;
    Ok(page(&session, detail))
}
