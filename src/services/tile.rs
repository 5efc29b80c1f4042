//! Tile store: ordered tiles of one dashboard, with a read-through cache.
//!
//! DESIGN
//! ======
//! The data service is the system of record. The store keeps the last list
//! it read per `(user, dashboard)` and drops that entry on every mutation
//! that can change it, so the next read goes back to the data service.
//! The cache lock is never held across a data call.
//!
//! CACHE
//! =====
//! Every invalidation bumps a generation counter. A read that missed the
//! cache only stores its result if the generation is unchanged when the
//! fetch returns, so a list fetched before a concurrent write is never put
//! back. Entries expire after `CACHE_TTL` (writes from other processes show
//! up within that window) and the map holds at most `CACHE_CAPACITY`
//! entries, evicting expired ones first and then the oldest.
//!
//! ORDERING
//! ========
//! New tiles land at `max(order_index) + 1` (0 on an empty dashboard).
//! A reorder must name every tile of the dashboard exactly once; it then
//! rewrites `order_index = position` through `DataService::apply_tile_order`.
//! A drag end is an array move of the current list followed by that reorder.
//!
//! ERROR HANDLING
//! ==============
//! A failed reorder may leave a prefix applied on backends without a batch
//! write; the cache entry is dropped regardless so the next list shows what
//! actually persisted.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::data::DataService;
use crate::error::AppError;
use crate::model::{NewTile, SharedTile, Tile, TileInput, TilePatch};

type CacheKey = (Uuid, Uuid);

const CACHE_TTL: Duration = Duration::from_secs(30);
const CACHE_CAPACITY: usize = 1024;

/// Move the element at `from` so it ends up at `to`, shifting the elements
/// in between by one. Out-of-range indexes leave the slice untouched.
pub fn array_move<T>(items: &mut [T], from: usize, to: usize) {
    if from >= items.len() || to >= items.len() || from == to {
        return;
    }
    if from < to {
        items[from..=to].rotate_left(1);
    } else {
        items[to..=from].rotate_right(1);
    }
}

fn next_order_index(tiles: &[Tile]) -> i32 {
    tiles
        .iter()
        .map(|t| t.order_index)
        .max()
        .map_or(0, |max| max.saturating_add(1))
}

struct CachedList {
    tiles: Vec<Tile>,
    fetched_at: Instant,
}

#[derive(Default)]
struct TileCache {
    entries: HashMap<CacheKey, CachedList>,
    generation: u64,
}

enum Lookup {
    Hit(Vec<Tile>),
    /// Fill under this generation.
    Miss(u64),
}

pub struct TileStore {
    data: Arc<dyn DataService>,
    cache: RwLock<TileCache>,
    ttl: Duration,
    capacity: usize,
}

impl TileStore {
    #[must_use]
    pub fn new(data: Arc<dyn DataService>) -> Self {
        Self::with_limits(data, CACHE_TTL, CACHE_CAPACITY)
    }

    #[must_use]
    pub fn with_limits(data: Arc<dyn DataService>, ttl: Duration, capacity: usize) -> Self {
        Self { data, cache: RwLock::new(TileCache::default()), ttl, capacity: capacity.max(1) }
    }

    async fn invalidate(&self, user_id: Uuid, dashboard_id: Uuid) {
        let mut cache = self.cache.write().await;
        cache.generation = cache.generation.wrapping_add(1);
        cache.entries.remove(&(user_id, dashboard_id));
    }

    /// Drop any cached list for a dashboard that no longer exists.
    pub async fn forget_dashboard(&self, user_id: Uuid, dashboard_id: Uuid) {
        self.invalidate(user_id, dashboard_id).await;
    }

    #[cfg(test)]
    pub(crate) async fn is_cached(&self, user_id: Uuid, dashboard_id: Uuid) -> bool {
        self.cache.read().await.entries.contains_key(&(user_id, dashboard_id))
    }

    async fn lookup(&self, key: CacheKey) -> Lookup {
        let cache = self.cache.read().await;
        match cache.entries.get(&key) {
            Some(entry) if entry.fetched_at.elapsed() < self.ttl => Lookup::Hit(entry.tiles.clone()),
            _ => Lookup::Miss(cache.generation),
        }
    }

    /// Store a fetched list unless something was invalidated since `generation`.
    async fn fill(&self, key: CacheKey, generation: u64, tiles: &[Tile]) {
        let mut cache = self.cache.write().await;
        if cache.generation != generation {
            return;
        }
        if !cache.entries.contains_key(&key) && cache.entries.len() >= self.capacity {
            let ttl = self.ttl;
            cache.entries.retain(|_, entry| entry.fetched_at.elapsed() < ttl);
            if cache.entries.len() >= self.capacity {
                let oldest = cache
                    .entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.fetched_at)
                    .map(|(key, _)| *key);
                if let Some(oldest) = oldest {
                    cache.entries.remove(&oldest);
                }
            }
        }
        cache
            .entries
            .insert(key, CachedList { tiles: tiles.to_vec(), fetched_at: Instant::now() });
    }

    /// Tiles of the selected dashboard in board order. No selection yields
    /// an empty board without touching the data service.
    pub async fn list(&self, user_id: Uuid, dashboard_id: Option<Uuid>) -> Result<Vec<Tile>, AppError> {
        let Some(dashboard_id) = dashboard_id else {
            return Ok(Vec::new());
        };
        let key = (user_id, dashboard_id);
        let generation = match self.lookup(key).await {
            Lookup::Hit(tiles) => return Ok(tiles),
            Lookup::Miss(generation) => generation,
        };

        let tiles = self.data.list_tiles(user_id, dashboard_id).await?;
        self.fill(key, generation, &tiles).await;
        Ok(tiles)
    }

    pub async fn get(&self, user_id: Uuid, tile_id: Uuid) -> Result<Tile, AppError> {
        Ok(self.data.get_tile(user_id, tile_id).await?)
    }

    /// Create a tile at the end of the dashboard.
    ///
    /// # Errors
    ///
    /// `Validation` for a blank title or content, before any data call.
    pub async fn create(&self, user_id: Uuid, dashboard_id: Uuid, input: TileInput) -> Result<Tile, AppError> {
        let input = input.validated()?;
        let current = self.data.list_tiles(user_id, dashboard_id).await?;
        let row = NewTile {
            dashboard_id,
            title: input.title,
            content: input.content,
            color: input.color,
            order_index: next_order_index(&current),
        };

        let mut inserted = self.data.insert_tiles(user_id, std::slice::from_ref(&row)).await?;
        self.invalidate(user_id, dashboard_id).await;
        let tile = inserted
            .pop()
            .ok_or_else(|| AppError::Remote("insert returned no row".into()))?;
        tracing::info!(%user_id, %dashboard_id, tile_id = %tile.id, order_index = tile.order_index, "tile created");
        Ok(tile)
    }

    /// Append a batch of tiles after the current maximum, in input order.
    pub async fn append(&self, user_id: Uuid, dashboard_id: Uuid, drafts: Vec<SharedTile>) -> Result<Vec<Tile>, AppError> {
        if drafts.is_empty() {
            return Ok(Vec::new());
        }
        let current = self.data.list_tiles(user_id, dashboard_id).await?;
        let base = next_order_index(&current);
        let rows: Vec<NewTile> = drafts
            .into_iter()
            .zip(base..)
            .map(|(draft, order_index)| NewTile {
                dashboard_id,
                title: draft.title,
                content: draft.content,
                color: draft.color,
                order_index,
            })
            .collect();

        let inserted = self.data.insert_tiles(user_id, &rows).await?;
        self.invalidate(user_id, dashboard_id).await;
        tracing::info!(%user_id, %dashboard_id, count = inserted.len(), "tiles appended");
        Ok(inserted)
    }

    /// Partial update of title, content and color. Order is untouched.
    pub async fn update(&self, user_id: Uuid, tile_id: Uuid, patch: TilePatch) -> Result<Tile, AppError> {
        let patch = patch.validated()?;
        if patch.is_empty() {
            return self.get(user_id, tile_id).await;
        }
        let tile = self.data.update_tile(user_id, tile_id, &patch).await?;
        self.invalidate(user_id, tile.dashboard_id).await;
        Ok(tile)
    }

    pub async fn delete(&self, user_id: Uuid, tile_id: Uuid) -> Result<(), AppError> {
        let removed = self.data.delete_tile(user_id, tile_id).await?;
        self.invalidate(user_id, removed.dashboard_id).await;
        tracing::info!(%user_id, %tile_id, "tile deleted");
        Ok(())
    }

    /// Persist `order_index = position` for every id in `ordered_ids`.
    ///
    /// # Errors
    ///
    /// `Validation` when an id repeats or the ids are not exactly the
    /// dashboard's tiles. Data failures propagate as-is and may leave a
    /// prefix of the rewrite applied.
    pub async fn reorder(&self, user_id: Uuid, dashboard_id: Uuid, ordered_ids: &[Uuid]) -> Result<(), AppError> {
        let mut seen = HashSet::with_capacity(ordered_ids.len());
        if !ordered_ids.iter().all(|id| seen.insert(*id)) {
            return Err(AppError::Validation("tile ids must be unique".into()));
        }
        let current = self.data.list_tiles(user_id, dashboard_id).await?;
        if current.len() != seen.len() || !current.iter().all(|t| seen.contains(&t.id)) {
            return Err(AppError::Validation("tile ids must list every tile of the dashboard".into()));
        }

        let mut order = Vec::with_capacity(ordered_ids.len());
        for (position, tile_id) in ordered_ids.iter().enumerate() {
            let index = i32::try_from(position).map_err(|_| AppError::Validation("too many tiles".into()))?;
            order.push((*tile_id, index));
        }

        let result = self.data.apply_tile_order(user_id, dashboard_id, &order).await;
        self.invalidate(user_id, dashboard_id).await;
        result?;
        tracing::info!(%user_id, %dashboard_id, count = order.len(), "tiles reordered");
        Ok(())
    }

    /// Drag end: move `active_id` to the position of `over_id` and persist
    /// the resulting order. Dropping a tile on itself changes nothing.
    pub async fn move_tile(
        &self,
        user_id: Uuid,
        dashboard_id: Uuid,
        active_id: Uuid,
        over_id: Uuid,
    ) -> Result<Vec<Tile>, AppError> {
        let mut tiles = self.list(user_id, Some(dashboard_id)).await?;
        if active_id == over_id {
            return Ok(tiles);
        }

        let from = tiles
            .iter()
            .position(|t| t.id == active_id)
            .ok_or_else(|| AppError::NotFound(active_id.to_string()))?;
        let to = tiles
            .iter()
            .position(|t| t.id == over_id)
            .ok_or_else(|| AppError::NotFound(over_id.to_string()))?;

        array_move(&mut tiles, from, to);
        let ordered: Vec<Uuid> = tiles.iter().map(|t| t.id).collect();
        self.reorder(user_id, dashboard_id, &ordered).await?;

        for (position, tile) in (0..).zip(tiles.iter_mut()) {
            tile.order_index = position;
        }
        Ok(tiles)
    }
}

#[cfg(test)]
#[path = "tile_test.rs"]
mod tests;
