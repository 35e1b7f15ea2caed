use crate::api::responses::UpdateResponse;
use crate::api::{backoffice_error, ApiResult};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use frontdesk::backoffice::SystemStatus;
use frontdesk::models::{Client, ClientId, RecordPatch, Reservation};
use frontdesk::views::CalendarMonth;
use tracing::info;

/// GET /api/client/{id}
pub async fn get_client(
    State(state): State<AppState>,
    Path(id): Path<ClientId>,
) -> ApiResult<Client> {
    state
        .backoffice
        .client(id)
        .await
        .map(Json)
        .map_err(backoffice_error)
}

/// PUT /api/client/{id}
pub async fn update_client(
    State(state): State<AppState>,
    Path(id): Path<ClientId>,
    Json(patch): Json<RecordPatch>,
) -> ApiResult<UpdateResponse<Client>> {
    info!("PUT client: id={}, fields={}", id, patch.len());

    let client = state
        .backoffice
        .update_client(id, &patch)
        .await
        .map_err(backoffice_error)?;

    Ok(Json(UpdateResponse {
        success: true,
        data: client,
    }))
}

/// GET /api/reservation/{id}
pub async fn get_reservation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Reservation> {
    state
        .backoffice
        .reservation(&id)
        .await
        .map(Json)
        .map_err(backoffice_error)
}

/// PUT /api/reservation/{id}
pub async fn update_reservation(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<RecordPatch>,
) -> ApiResult<UpdateResponse<Reservation>> {
    info!("PUT reservation: id={}, fields={}", id, patch.len());

    let reservation = state
        .backoffice
        .update_reservation(&id, &patch)
        .await
        .map_err(backoffice_error)?;

    Ok(Json(UpdateResponse {
        success: true,
        data: reservation,
    }))
}

/// GET /api/calendar/{year}/{month}
pub async fn calendar(
    State(state): State<AppState>,
    Path((year, month)): Path<(i32, u32)>,
) -> ApiResult<CalendarMonth> {
    state
        .backoffice
        .calendar(year, month)
        .await
        .map(Json)
        .map_err(backoffice_error)
}

/// GET /api/system/status
pub async fn system_status(State(state): State<AppState>) -> Json<SystemStatus> {
    Json(state.backoffice.system_status().await)
}
