//! In-process data service.
//!
//! DESIGN
//! ======
//! Plain vectors behind one `std::sync::Mutex`. No lock is held across an
//! await point. The backend also counts calls per operation and can be told
//! to fail an operation after N successful calls, which is how tests observe
//! "no delete call was issued" and partial reorder failures.
//!
//! Reorders use the sequential default of `apply_tile_order`.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use uuid::Uuid;

use super::{DataError, DataService, IdentityStore, UserRow};
use crate::model::{Dashboard, NewSharedCollection, NewTile, SharedCollection, Tile, TilePatch, now_ms};
use crate::services::session::generate_token;

#[derive(Default)]
struct Tables {
    users: Vec<UserRow>,
    sessions: HashMap<String, (Uuid, i64)>,
    resets: HashMap<String, (Uuid, i64)>,
    dashboards: Vec<Dashboard>,
    tiles: Vec<Tile>,
    shared: Vec<SharedCollection>,
    calls: HashMap<&'static str, usize>,
    failures: HashMap<&'static str, usize>,
}

impl Tables {
    /// Count a call and decide whether the failure plan rejects it.
    fn record(&mut self, op: &'static str) -> Result<(), DataError> {
        let count = self.calls.entry(op).or_insert(0);
        *count += 1;
        match self.failures.get(op) {
            Some(successes) if *count > *successes => Err(DataError::Backend(format!("injected failure in {op}"))),
            _ => Ok(()),
        }
    }

    fn owned_dashboard(&self, user_id: Uuid, dashboard_id: Uuid) -> Result<(), DataError> {
        if self
            .dashboards
            .iter()
            .any(|d| d.id == dashboard_id && d.user_id == user_id)
        {
            Ok(())
        } else {
            Err(DataError::NotFound(dashboard_id))
        }
    }

    fn owned_tile_mut(&mut self, user_id: Uuid, tile_id: Uuid) -> Result<&mut Tile, DataError> {
        self.tiles
            .iter_mut()
            .find(|t| t.id == tile_id && t.user_id == user_id)
            .ok_or(DataError::NotFound(tile_id))
    }
}

#[derive(Default)]
pub struct MemoryBackend {
    tables: Mutex<Tables>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, DataError> {
        self.tables
            .lock()
            .map_err(|_| DataError::Backend("memory backend lock poisoned".into()))
    }

    /// Number of calls made to `op` so far.
    #[must_use]
    pub fn call_count(&self, op: &str) -> usize {
        self.tables
            .lock()
            .map(|t| t.calls.get(op).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Let `op` succeed `successes` more times in total, then fail every call.
    pub fn fail_after(&self, op: &'static str, successes: usize) {
        if let Ok(mut tables) = self.tables.lock() {
            let already = tables.calls.get(op).copied().unwrap_or(0);
            tables.failures.insert(op, already + successes);
        }
    }

    pub fn clear_failures(&self) {
        if let Ok(mut tables) = self.tables.lock() {
            tables.failures.clear();
        }
    }
}

#[async_trait]
impl DataService for MemoryBackend {
    async fn list_dashboards(&self, user_id: Uuid) -> Result<Vec<Dashboard>, DataError> {
        let mut tables = self.tables()?;
        tables.record("list_dashboards")?;
        // Insertion order is creation order.
        Ok(tables
            .dashboards
            .iter()
            .filter(|d| d.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn insert_dashboard(&self, user_id: Uuid, name: &str) -> Result<Dashboard, DataError> {
        let mut tables = self.tables()?;
        tables.record("insert_dashboard")?;
        let now = now_ms();
        let dashboard = Dashboard { id: Uuid::new_v4(), user_id, name: name.to_owned(), created_at: now, updated_at: now };
        tables.dashboards.push(dashboard.clone());
        Ok(dashboard)
    }

    async fn rename_dashboard(&self, user_id: Uuid, dashboard_id: Uuid, name: &str) -> Result<Dashboard, DataError> {
        let mut tables = self.tables()?;
        tables.record("rename_dashboard")?;
        let dashboard = tables
            .dashboards
            .iter_mut()
            .find(|d| d.id == dashboard_id && d.user_id == user_id)
            .ok_or(DataError::NotFound(dashboard_id))?;
        name.clone_into(&mut dashboard.name);
        dashboard.updated_at = now_ms();
        Ok(dashboard.clone())
    }

    async fn delete_dashboard(&self, user_id: Uuid, dashboard_id: Uuid) -> Result<(), DataError> {
        let mut tables = self.tables()?;
        tables.record("delete_dashboard")?;
        tables.owned_dashboard(user_id, dashboard_id)?;
        tables.dashboards.retain(|d| d.id != dashboard_id);
        tables.tiles.retain(|t| t.dashboard_id != dashboard_id);
        Ok(())
    }

    async fn list_tiles(&self, user_id: Uuid, dashboard_id: Uuid) -> Result<Vec<Tile>, DataError> {
        let mut tables = self.tables()?;
        tables.record("list_tiles")?;
        let mut tiles: Vec<Tile> = tables
            .tiles
            .iter()
            .filter(|t| t.user_id == user_id && t.dashboard_id == dashboard_id)
            .cloned()
            .collect();
        tiles.sort_by_key(|t| t.order_index);
        Ok(tiles)
    }

    async fn get_tile(&self, user_id: Uuid, tile_id: Uuid) -> Result<Tile, DataError> {
        let mut tables = self.tables()?;
        tables.record("get_tile")?;
        tables
            .tiles
            .iter()
            .find(|t| t.id == tile_id && t.user_id == user_id)
            .cloned()
            .ok_or(DataError::NotFound(tile_id))
    }

    async fn insert_tiles(&self, user_id: Uuid, tiles: &[NewTile]) -> Result<Vec<Tile>, DataError> {
        let mut tables = self.tables()?;
        tables.record("insert_tiles")?;
        for tile in tiles {
            tables.owned_dashboard(user_id, tile.dashboard_id)?;
        }
        let now = now_ms();
        let inserted: Vec<Tile> = tiles
            .iter()
            .map(|t| Tile {
                id: Uuid::new_v4(),
                user_id,
                dashboard_id: t.dashboard_id,
                title: t.title.clone(),
                content: t.content.clone(),
                color: t.color,
                order_index: t.order_index,
                created_at: now,
                updated_at: now,
            })
            .collect();
        tables.tiles.extend(inserted.iter().cloned());
        Ok(inserted)
    }

    async fn update_tile(&self, user_id: Uuid, tile_id: Uuid, patch: &TilePatch) -> Result<Tile, DataError> {
        let mut tables = self.tables()?;
        tables.record("update_tile")?;
        let tile = tables.owned_tile_mut(user_id, tile_id)?;
        if let Some(title) = &patch.title {
            title.clone_into(&mut tile.title);
        }
        if let Some(content) = &patch.content {
            content.clone_into(&mut tile.content);
        }
        if let Some(color) = patch.color {
            tile.color = color;
        }
        tile.updated_at = now_ms();
        Ok(tile.clone())
    }

    async fn delete_tile(&self, user_id: Uuid, tile_id: Uuid) -> Result<Tile, DataError> {
        let mut tables = self.tables()?;
        tables.record("delete_tile")?;
        let position = tables
            .tiles
            .iter()
            .position(|t| t.id == tile_id && t.user_id == user_id)
            .ok_or(DataError::NotFound(tile_id))?;
        Ok(tables.tiles.remove(position))
    }

    async fn set_tile_order(
        &self,
        user_id: Uuid,
        dashboard_id: Uuid,
        tile_id: Uuid,
        order_index: i32,
    ) -> Result<(), DataError> {
        let mut tables = self.tables()?;
        tables.record("set_tile_order")?;
        let tile = tables.owned_tile_mut(user_id, tile_id)?;
        if tile.dashboard_id != dashboard_id {
            return Err(DataError::NotFound(tile_id));
        }
        tile.order_index = order_index;
        tile.updated_at = now_ms();
        Ok(())
    }

    async fn insert_shared_collection(
        &self,
        user_id: Uuid,
        collection: NewSharedCollection,
    ) -> Result<SharedCollection, DataError> {
        let mut tables = self.tables()?;
        tables.record("insert_shared_collection")?;
        let shared = SharedCollection {
            id: Uuid::new_v4(),
            user_id,
            name: collection.name,
            share_token: generate_token(),
            tiles: collection.tiles,
            created_at: now_ms(),
            expires_at: collection.expires_at,
        };
        tables.shared.push(shared.clone());
        Ok(shared)
    }

    async fn shared_collection_by_token(&self, share_token: &str) -> Result<Option<SharedCollection>, DataError> {
        let mut tables = self.tables()?;
        tables.record("shared_collection_by_token")?;
        Ok(tables
            .shared
            .iter()
            .find(|c| c.share_token == share_token)
            .cloned())
    }
}

#[async_trait]
impl IdentityStore for MemoryBackend {
    async fn create_user(&self, email: &str, password_hash: &str) -> Result<UserRow, DataError> {
        let mut tables = self.tables()?;
        tables.record("create_user")?;
        if tables.users.iter().any(|u| u.email == email) {
            return Err(DataError::Conflict("email already registered".into()));
        }
        let user = UserRow {
            id: Uuid::new_v4(),
            email: email.to_owned(),
            password_hash: password_hash.to_owned(),
            created_at: now_ms(),
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<UserRow>, DataError> {
        let tables = self.tables()?;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn set_password_hash(&self, user_id: Uuid, password_hash: &str) -> Result<(), DataError> {
        let mut tables = self.tables()?;
        let user = tables
            .users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or(DataError::NotFound(user_id))?;
        password_hash.clone_into(&mut user.password_hash);
        Ok(())
    }

    async fn create_session(&self, user_id: Uuid, token: &str, expires_at: i64) -> Result<(), DataError> {
        let mut tables = self.tables()?;
        tables.sessions.insert(token.to_owned(), (user_id, expires_at));
        Ok(())
    }

    async fn session_user(&self, token: &str, now_ms: i64) -> Result<Option<UserRow>, DataError> {
        let tables = self.tables()?;
        let Some((user_id, expires_at)) = tables.sessions.get(token).copied() else {
            return Ok(None);
        };
        if expires_at <= now_ms {
            return Ok(None);
        }
        Ok(tables.users.iter().find(|u| u.id == user_id).cloned())
    }

    async fn delete_session(&self, token: &str) -> Result<(), DataError> {
        let mut tables = self.tables()?;
        tables.sessions.remove(token);
        Ok(())
    }

    async fn create_password_reset(&self, user_id: Uuid, token_hash: &str, expires_at: i64) -> Result<(), DataError> {
        let mut tables = self.tables()?;
        tables.resets.retain(|_, (owner, _)| *owner != user_id);
        tables.resets.insert(token_hash.to_owned(), (user_id, expires_at));
        Ok(())
    }

    async fn consume_password_reset(&self, token_hash: &str, now_ms: i64) -> Result<Option<Uuid>, DataError> {
        let mut tables = self.tables()?;
        Ok(tables
            .resets
            .remove(token_hash)
            .filter(|(_, expires_at)| *expires_at > now_ms)
            .map(|(user_id, _)| user_id))
    }
}

#[cfg(test)]
#[path = "memory_test.rs"]
mod tests;
