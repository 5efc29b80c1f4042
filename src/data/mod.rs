//! Remote data service contract.
//!
//! SYSTEM CONTEXT
//! ==============
//! The data service is the system of record for users, sessions, dashboards,
//! tiles and shared collections. It enforces per-user row ownership: every
//! call that touches a user's rows takes that user's id, and a row owned by
//! someone else is reported as `NotFound`.
//!
//! Two backends implement the contract: `postgres` (production) and
//! `memory` (development without `DATABASE_URL`, and tests).
//!
//! TRADE-OFFS
//! ==========
//! `apply_tile_order` has a sequential default that writes one row at a time
//! and stops at the first failure, leaving the prefix applied. Backends that
//! can write atomically override it.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::model::{Dashboard, NewSharedCollection, NewTile, SharedCollection, Tile, TilePatch};

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("row not found: {0}")]
    NotFound(Uuid),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("backend error: {0}")]
    Backend(String),
}

/// Identity row. `password_hash` never leaves the identity services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub created_at: i64,
}

// =============================================================================
// BOARD DATA
// =============================================================================

#[async_trait]
pub trait DataService: Send + Sync {
    /// Dashboards owned by `user_id`, oldest first.
    async fn list_dashboards(&self, user_id: Uuid) -> Result<Vec<Dashboard>, DataError>;

    async fn insert_dashboard(&self, user_id: Uuid, name: &str) -> Result<Dashboard, DataError>;

    async fn rename_dashboard(&self, user_id: Uuid, dashboard_id: Uuid, name: &str) -> Result<Dashboard, DataError>;

    /// Delete a dashboard and every tile on it.
    async fn delete_dashboard(&self, user_id: Uuid, dashboard_id: Uuid) -> Result<(), DataError>;

    /// Tiles of one dashboard, ascending by `order_index`.
    async fn list_tiles(&self, user_id: Uuid, dashboard_id: Uuid) -> Result<Vec<Tile>, DataError>;

    async fn get_tile(&self, user_id: Uuid, tile_id: Uuid) -> Result<Tile, DataError>;

    /// Insert a batch of tiles. Either every row is written or none is.
    async fn insert_tiles(&self, user_id: Uuid, tiles: &[NewTile]) -> Result<Vec<Tile>, DataError>;

    async fn update_tile(&self, user_id: Uuid, tile_id: Uuid, patch: &TilePatch) -> Result<Tile, DataError>;

    /// Delete one tile and return the removed row.
    async fn delete_tile(&self, user_id: Uuid, tile_id: Uuid) -> Result<Tile, DataError>;

    /// Set one tile's position. Tiles outside `dashboard_id` are not found.
    async fn set_tile_order(
        &self,
        user_id: Uuid,
        dashboard_id: Uuid,
        tile_id: Uuid,
        order_index: i32,
    ) -> Result<(), DataError>;

    /// Rewrite `order_index` for a set of tiles of one dashboard.
    async fn apply_tile_order(&self, user_id: Uuid, dashboard_id: Uuid, order: &[(Uuid, i32)]) -> Result<(), DataError> {
        for (tile_id, order_index) in order {
            self.set_tile_order(user_id, dashboard_id, *tile_id, *order_index).await?;
        }
        Ok(())
    }

    /// Insert a shared collection; the backend mints the share token.
    async fn insert_shared_collection(
        &self,
        user_id: Uuid,
        collection: NewSharedCollection,
    ) -> Result<SharedCollection, DataError>;

    /// Read-only lookup by token. Requires no user.
    async fn shared_collection_by_token(&self, share_token: &str) -> Result<Option<SharedCollection>, DataError>;
}

// =============================================================================
// IDENTITY
// =============================================================================

#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Insert a user. Fails with `Conflict` when the email is taken.
    async fn create_user(&self, email: &str, password_hash: &str) -> Result<UserRow, DataError>;

    async fn user_by_email(&self, email: &str) -> Result<Option<UserRow>, DataError>;

    async fn set_password_hash(&self, user_id: Uuid, password_hash: &str) -> Result<(), DataError>;

    async fn create_session(&self, user_id: Uuid, token: &str, expires_at: i64) -> Result<(), DataError>;

    /// Resolve an unexpired session token to its user.
    async fn session_user(&self, token: &str, now_ms: i64) -> Result<Option<UserRow>, DataError>;

    async fn delete_session(&self, token: &str) -> Result<(), DataError>;

    async fn create_password_reset(&self, user_id: Uuid, token_hash: &str, expires_at: i64) -> Result<(), DataError>;

    /// Consume an unexpired reset token, returning its user. Single use.
    async fn consume_password_reset(&self, token_hash: &str, now_ms: i64) -> Result<Option<Uuid>, DataError>;
}
