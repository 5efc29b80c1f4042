//! Tile routes: CRUD, ordering, export/import and copy formats.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::model::{Tile, TileInput, TilePatch};
use crate::routes::auth::AuthUser;
use crate::services::clipboard::{ClipboardPayload, Notice, sms_safe};
use crate::services::selection::TileSelection;
use crate::services::transfer::{self, EXPORT_FILENAME};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct OrderBody {
    pub tile_ids: Vec<Uuid>,
}

#[derive(Deserialize)]
pub struct MoveBody {
    pub active_id: Uuid,
    pub over_id: Uuid,
}

/// Export selection. Without `tile_ids` the whole dashboard is exported.
#[derive(Debug, Default, Deserialize)]
pub struct ExportBody {
    pub tile_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Serialize)]
pub struct SmsResponse {
    pub text: String,
    pub modified: bool,
    pub length: usize,
    pub notice: Notice,
}

/// `GET /api/dashboards/{id}/tiles`
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(dashboard_id): Path<Uuid>,
) -> Result<Json<Vec<Tile>>, AppError> {
    Ok(Json(state.tiles.list(auth.user.id, Some(dashboard_id)).await?))
}

/// `POST /api/dashboards/{id}/tiles`
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(dashboard_id): Path<Uuid>,
    Json(input): Json<TileInput>,
) -> Result<(StatusCode, Json<Tile>), AppError> {
    let tile = state.tiles.create(auth.user.id, dashboard_id, input).await?;
    Ok((StatusCode::CREATED, Json(tile)))
}

/// `PUT /api/dashboards/{id}/order`: returns the tiles as persisted.
pub async fn reorder(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(dashboard_id): Path<Uuid>,
    Json(body): Json<OrderBody>,
) -> Result<Json<Vec<Tile>>, AppError> {
    let user_id = auth.user.id;
    state.tiles.reorder(user_id, dashboard_id, &body.tile_ids).await?;
    Ok(Json(state.tiles.list(user_id, Some(dashboard_id)).await?))
}

/// `POST /api/dashboards/{id}/move`: drag end.
pub async fn move_tile(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(dashboard_id): Path<Uuid>,
    Json(body): Json<MoveBody>,
) -> Result<Json<Vec<Tile>>, AppError> {
    let tiles = state
        .tiles
        .move_tile(auth.user.id, dashboard_id, body.active_id, body.over_id)
        .await?;
    Ok(Json(tiles))
}

/// `POST /api/dashboards/{id}/export`: JSON file download.
pub async fn export(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(dashboard_id): Path<Uuid>,
    body: Option<Json<ExportBody>>,
) -> Result<Response, AppError> {
    let tiles = state.tiles.list(auth.user.id, Some(dashboard_id)).await?;
    let selection = body.and_then(|Json(b)| b.tile_ids).map(TileSelection::from_ids);
    let json = match &selection {
        Some(selection) => transfer::export_json(selection.pick(&tiles)),
        None => transfer::export_json(&tiles),
    }?;

    Ok((
        [
            (CONTENT_TYPE, "application/json; charset=utf-8".to_owned()),
            (CONTENT_DISPOSITION, format!("attachment; filename=\"{EXPORT_FILENAME}\"")),
        ],
        json,
    )
        .into_response())
}

/// `POST /api/dashboards/{id}/import`: raw file body.
pub async fn import(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(dashboard_id): Path<Uuid>,
    body: Bytes,
) -> Result<(StatusCode, Json<Vec<Tile>>), AppError> {
    let created = transfer::import(&state.tiles, auth.user.id, dashboard_id, &body).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// `PATCH /api/tiles/{id}`
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(tile_id): Path<Uuid>,
    Json(patch): Json<TilePatch>,
) -> Result<Json<Tile>, AppError> {
    Ok(Json(state.tiles.update(auth.user.id, tile_id, patch).await?))
}

/// `DELETE /api/tiles/{id}`
pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(tile_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.tiles.delete(auth.user.id, tile_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/tiles/{id}/clipboard`
pub async fn clipboard(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(tile_id): Path<Uuid>,
) -> Result<Json<ClipboardPayload>, AppError> {
    let tile = state.tiles.get(auth.user.id, tile_id).await?;
    Ok(Json(ClipboardPayload::from_content(&tile.content)))
}

/// `GET /api/tiles/{id}/sms`
pub async fn sms(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(tile_id): Path<Uuid>,
) -> Result<Json<SmsResponse>, AppError> {
    let tile = state.tiles.get(auth.user.id, tile_id).await?;
    let sms = sms_safe(&tile.content);
    let notice = sms.notice();
    Ok(Json(SmsResponse { text: sms.text, modified: sms.modified, length: sms.length, notice }))
}

#[cfg(test)]
#[path = "tiles_test.rs"]
mod tests;
