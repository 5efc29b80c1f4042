//! Share routes: create a snapshot link, and the public read path.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::routes::auth::AuthUser;
use crate::routes::request_origin;
use crate::services::selection::TileSelection;
use crate::services::share::{self, ShareLink, SharedView};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateShareBody {
    pub dashboard_id: Uuid,
    pub tile_ids: Vec<Uuid>,
    pub name: Option<String>,
    pub expires_in_hours: Option<u32>,
}

/// `POST /api/shares`
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    headers: HeaderMap,
    Json(body): Json<CreateShareBody>,
) -> Result<(StatusCode, Json<ShareLink>), AppError> {
    let user_id = auth.user.id;
    let tiles = state.tiles.list(user_id, Some(body.dashboard_id)).await?;
    let picked = TileSelection::from_ids(body.tile_ids).pick(&tiles);
    let origin = request_origin(&headers, &state.config);

    let link = share::create_share_link(
        state.data.as_ref(),
        user_id,
        &picked,
        body.name.as_deref(),
        body.expires_in_hours,
        &origin,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(link)))
}

/// `GET /api/shared/{token}`: no session required.
pub async fn view(State(state): State<AppState>, Path(token): Path<String>) -> Result<Json<SharedView>, AppError> {
    let collection = share::get_shared_collection(state.data.as_ref(), &token).await?;
    Ok(Json(SharedView::from(collection)))
}

#[cfg(test)]
#[path = "shared_test.rs"]
mod tests;
