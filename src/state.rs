//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It holds the data service and identity store behind trait objects, the
//! services built on them, the optional payment gateway and reset mailer,
//! and the parsed config. The only mutable state in the process is the tile store's cache
//! (and the in-process backend when no database is configured).

use std::sync::Arc;

use crate::config::AppConfig;
use crate::data::{DataService, IdentityStore};
use crate::services::auth::ResetMailer;
use crate::services::dashboard::DashboardService;
use crate::services::donation::PaymentGateway;
use crate::services::tile::TileStore;

/// Shared application state. Clone is required by Axum; every field is an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub data: Arc<dyn DataService>,
    pub identity: Arc<dyn IdentityStore>,
    pub tiles: Arc<TileStore>,
    pub dashboards: Arc<DashboardService>,
    /// `None` when no payment provider is configured.
    pub payments: Option<Arc<dyn PaymentGateway>>,
    /// `None` logs reset links instead of mailing them.
    pub mailer: Option<Arc<dyn ResetMailer>>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    #[must_use]
    pub fn new(
        data: Arc<dyn DataService>,
        identity: Arc<dyn IdentityStore>,
        payments: Option<Arc<dyn PaymentGateway>>,
        config: AppConfig,
    ) -> Self {
        Self {
            tiles: Arc::new(TileStore::new(data.clone())),
            dashboards: Arc::new(DashboardService::new(data.clone())),
            data,
            identity,
            payments,
            mailer: None,
            config: Arc::new(config),
        }
    }

    #[must_use]
    pub fn with_mailer(mut self, mailer: Arc<dyn ResetMailer>) -> Self {
        self.mailer = Some(mailer);
        self
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
#[path = "state_helpers_test.rs"]
pub mod test_helpers;
