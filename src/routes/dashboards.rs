//! Dashboard routes.
//!
//! The active dashboard lives in the client. Requests carry it as
//! `?active=<id>` and responses return the resolved selection, so the
//! state machine in `services::dashboard` runs per request without any
//! server-side session state.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::model::Dashboard;
use crate::routes::auth::AuthUser;
use crate::services::dashboard::DashboardSelection;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ActiveQuery {
    pub active: Option<Uuid>,
}

#[derive(Deserialize)]
pub struct NameBody {
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DashboardsResponse {
    pub dashboards: Vec<Dashboard>,
    pub active: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedDashboard {
    pub dashboard: Dashboard,
    pub active: Option<Uuid>,
}

/// `GET /api/dashboards?active=`
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ActiveQuery>,
) -> Result<Json<DashboardsResponse>, AppError> {
    let dashboards = state.dashboards.list(auth.user.id).await?;
    let mut selection = DashboardSelection::new(query.active);
    selection.on_loaded(&dashboards);
    Ok(Json(DashboardsResponse { active: selection.active(), dashboards }))
}

/// `POST /api/dashboards`: the new dashboard becomes active.
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<NameBody>,
) -> Result<(StatusCode, Json<CreatedDashboard>), AppError> {
    let mut selection = DashboardSelection::default();
    let dashboard = state
        .dashboards
        .create(auth.user.id, &body.name, &mut selection)
        .await?;
    Ok((StatusCode::CREATED, Json(CreatedDashboard { active: selection.active(), dashboard })))
}

/// `PATCH /api/dashboards/{id}`
pub async fn rename(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<NameBody>,
) -> Result<Json<Dashboard>, AppError> {
    Ok(Json(state.dashboards.rename(auth.user.id, id, &body.name).await?))
}

/// `DELETE /api/dashboards/{id}?active=`: returns what is left and the new active id.
pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Query(query): Query<ActiveQuery>,
) -> Result<Json<DashboardsResponse>, AppError> {
    let user_id = auth.user.id;
    let mut selection = DashboardSelection::new(query.active);
    state.dashboards.delete(user_id, id, &mut selection).await?;
    state.tiles.forget_dashboard(user_id, id).await;

    let dashboards = state.dashboards.list(user_id).await?;
    selection.on_loaded(&dashboards);
    Ok(Json(DashboardsResponse { active: selection.active(), dashboards }))
}

#[cfg(test)]
#[path = "dashboards_test.rs"]
mod tests;
