//! Dashboards and the active-dashboard selection.
//!
//! DESIGN
//! ======
//! The active dashboard is explicit per-caller state (`DashboardSelection`)
//! that the HTTP layer round-trips as a query parameter. It is never stored
//! server-side. Transitions:
//!
//! - unset, or pointing at a dashboard that is gone: first dashboard once the
//!   list loads
//! - explicit selection
//! - creating a dashboard selects it
//! - deleting the active dashboard selects another one before the delete
//!
//! A user always keeps at least one dashboard. Deleting the last one is
//! refused before any data call, and listing an account with none creates
//! a default.

use std::sync::Arc;

use uuid::Uuid;

use crate::data::DataService;
use crate::error::AppError;
use crate::model::Dashboard;

pub const DEFAULT_DASHBOARD_NAME: &str = "My Dashboard";

// =============================================================================
// SELECTION
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DashboardSelection {
    active: Option<Uuid>,
}

impl DashboardSelection {
    #[must_use]
    pub fn new(active: Option<Uuid>) -> Self {
        Self { active }
    }

    #[must_use]
    pub fn active(&self) -> Option<Uuid> {
        self.active
    }

    /// Reconcile with a freshly loaded list.
    pub fn on_loaded(&mut self, dashboards: &[Dashboard]) {
        let still_exists = self
            .active
            .is_some_and(|id| dashboards.iter().any(|d| d.id == id));
        if !still_exists {
            self.active = dashboards.first().map(|d| d.id);
        }
    }

    /// Explicitly select one of `dashboards`.
    ///
    /// # Errors
    ///
    /// `NotFound` if `id` is not in the list.
    pub fn select(&mut self, id: Uuid, dashboards: &[Dashboard]) -> Result<(), AppError> {
        if !dashboards.iter().any(|d| d.id == id) {
            return Err(AppError::NotFound(id.to_string()));
        }
        self.active = Some(id);
        Ok(())
    }

    pub fn on_created(&mut self, dashboard: &Dashboard) {
        self.active = Some(dashboard.id);
    }

    /// Called before deleting `deleted`: move off it if it is active.
    pub fn on_deleting(&mut self, deleted: Uuid, dashboards: &[Dashboard]) {
        if self.active == Some(deleted) {
            self.active = dashboards.iter().find(|d| d.id != deleted).map(|d| d.id);
        }
    }
}

fn validated_name(name: &str) -> Result<&str, AppError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation("dashboard name is required".into()));
    }
    Ok(trimmed)
}

// =============================================================================
// SERVICE
// =============================================================================

pub struct DashboardService {
    data: Arc<dyn DataService>,
}

impl DashboardService {
    #[must_use]
    pub fn new(data: Arc<dyn DataService>) -> Self {
        Self { data }
    }

    /// Dashboards oldest first. An account with none gets a default.
    pub async fn list(&self, user_id: Uuid) -> Result<Vec<Dashboard>, AppError> {
        let dashboards = self.data.list_dashboards(user_id).await?;
        if !dashboards.is_empty() {
            return Ok(dashboards);
        }
        let created = self.create_default(user_id).await?;
        Ok(vec![created])
    }

    pub async fn create_default(&self, user_id: Uuid) -> Result<Dashboard, AppError> {
        let dashboard = self.data.insert_dashboard(user_id, DEFAULT_DASHBOARD_NAME).await?;
        tracing::info!(%user_id, dashboard_id = %dashboard.id, "default dashboard created");
        Ok(dashboard)
    }

    /// Create a dashboard and make it the active one.
    pub async fn create(
        &self,
        user_id: Uuid,
        name: &str,
        selection: &mut DashboardSelection,
    ) -> Result<Dashboard, AppError> {
        let name = validated_name(name)?;
        let dashboard = self.data.insert_dashboard(user_id, name).await?;
        selection.on_created(&dashboard);
        tracing::info!(%user_id, dashboard_id = %dashboard.id, "dashboard created");
        Ok(dashboard)
    }

    pub async fn rename(&self, user_id: Uuid, dashboard_id: Uuid, name: &str) -> Result<Dashboard, AppError> {
        let name = validated_name(name)?;
        Ok(self.data.rename_dashboard(user_id, dashboard_id, name).await?)
    }

    /// Delete a dashboard and its tiles.
    ///
    /// # Errors
    ///
    /// `Validation` when it is the caller's last dashboard (no delete is
    /// issued); `NotFound` when it is not one of the caller's dashboards.
    pub async fn delete(
        &self,
        user_id: Uuid,
        dashboard_id: Uuid,
        selection: &mut DashboardSelection,
    ) -> Result<(), AppError> {
        let dashboards = self.data.list_dashboards(user_id).await?;
        if dashboards.len() <= 1 {
            return Err(AppError::Validation("cannot delete the last dashboard".into()));
        }
        if !dashboards.iter().any(|d| d.id == dashboard_id) {
            return Err(AppError::NotFound(dashboard_id.to_string()));
        }

        selection.on_deleting(dashboard_id, &dashboards);
        self.data.delete_dashboard(user_id, dashboard_id).await?;
        tracing::info!(%user_id, %dashboard_id, "dashboard deleted");
        Ok(())
    }
}

#[cfg(test)]
#[path = "dashboard_test.rs"]
mod tests;
