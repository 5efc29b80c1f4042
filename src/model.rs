//! Domain rows: tiles, dashboards, shared collections.
//!
//! DESIGN
//! ======
//! These types mirror the rows owned by the data service. The service is the
//! system of record; everything held in this process is a cache of them.
//! Timestamps are milliseconds since the Unix epoch.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

// =============================================================================
// TILE COLOR
// =============================================================================

/// Fixed tile palette.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TileColor {
    Red,
    #[default]
    Blue,
    Green,
    Yellow,
    Purple,
    Gray,
}

impl TileColor {
    pub const ALL: [Self; 6] = [Self::Red, Self::Blue, Self::Green, Self::Yellow, Self::Purple, Self::Gray];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Blue => "blue",
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Purple => "purple",
            Self::Gray => "gray",
        }
    }
}

impl fmt::Display for TileColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TileColor {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|color| color.as_str() == raw)
            .ok_or_else(|| AppError::Validation(format!("unknown tile color: {raw}")))
    }
}

// =============================================================================
// TILE
// =============================================================================

/// A titled, colored, rich-text note belonging to one dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub dashboard_id: Uuid,
    pub title: String,
    /// Author-supplied HTML. Trusted only for the owning user's own view.
    pub content: String,
    pub color: TileColor,
    pub order_index: i32,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Mutable fields of a tile, as submitted by the create/edit form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileInput {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub color: TileColor,
}

impl TileInput {
    /// Validate form input. Title is stored trimmed; content is kept as
    /// authored but must not be blank.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if title or content is empty after trimming.
    pub fn validated(self) -> Result<Self, AppError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(AppError::Validation("title is required".into()));
        }
        if self.content.trim().is_empty() {
            return Err(AppError::Validation("content is required".into()));
        }
        Ok(Self { title: title.to_owned(), content: self.content, color: self.color })
    }
}

/// Partial tile update. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TilePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub color: Option<TileColor>,
}

impl TilePatch {
    /// # Errors
    ///
    /// Returns `Validation` if a provided title or content is blank.
    pub fn validated(self) -> Result<Self, AppError> {
        let title = match self.title {
            Some(title) if title.trim().is_empty() => {
                return Err(AppError::Validation("title is required".into()));
            }
            Some(title) => Some(title.trim().to_owned()),
            None => None,
        };
        if self.content.as_deref().is_some_and(|c| c.trim().is_empty()) {
            return Err(AppError::Validation("content is required".into()));
        }
        Ok(Self { title, content: self.content, color: self.color })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.color.is_none()
    }
}

/// Row to insert for a new tile; `order_index` is decided by the tile store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTile {
    pub dashboard_id: Uuid,
    pub title: String,
    pub content: String,
    pub color: TileColor,
    pub order_index: i32,
}

// =============================================================================
// DASHBOARD
// =============================================================================

/// A named collection of tiles owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dashboard {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub created_at: i64,
    pub updated_at: i64,
}

// =============================================================================
// SHARED COLLECTION
// =============================================================================

/// Point-in-time copy of a tile. Field order is the export/share file order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedTile {
    pub title: String,
    pub content: String,
    pub color: TileColor,
}

impl From<&Tile> for SharedTile {
    fn from(tile: &Tile) -> Self {
        Self { title: tile.title.clone(), content: tile.content.clone(), color: tile.color }
    }
}

/// Immutable, token-addressable snapshot of selected tiles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedCollection {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    /// Capability secret: possession grants read access.
    pub share_token: String,
    pub tiles: Vec<SharedTile>,
    pub created_at: i64,
    pub expires_at: Option<i64>,
}

impl SharedCollection {
    #[must_use]
    pub fn is_expired(&self, now_ms: i64) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now_ms)
    }
}

/// Insert request for a shared collection. The token is minted by the data service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSharedCollection {
    pub name: String,
    pub tiles: Vec<SharedTile>,
    pub expires_at: Option<i64>,
}

/// Current time as milliseconds since Unix epoch.
#[must_use]
pub fn now_ms() -> i64 {
    let Ok(duration) = std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(duration.as_millis()).unwrap_or(0)
}

#[cfg(test)]
#[path = "model_test.rs"]
mod tests;
