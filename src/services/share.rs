//! Share links: immutable snapshots of selected tiles.
//!
//! DESIGN
//! ======
//! A share copies `{title, content, color}` of each selected tile into one
//! `SharedCollection` row. Later edits to the tiles never reach the
//! snapshot. The data service mints the token; possession of the token is
//! the only read credential.
//!
//! Tile content is author HTML. The public view returns it untouched next
//! to a tag-stripped `text` rendering so a viewer that does not trust the
//! author can render text only.

use serde::Serialize;
use uuid::Uuid;

use super::clipboard::plain_text;
use crate::data::DataService;
use crate::error::AppError;
use crate::model::{NewSharedCollection, SharedCollection, SharedTile, Tile, TileColor, now_ms};

pub const DEFAULT_SHARE_NAME: &str = "Shared collection";

/// Public URL for a share token.
#[must_use]
pub fn share_url(origin: &str, share_token: &str) -> String {
    format!("{}/shared/{share_token}", origin.trim_end_matches('/'))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShareLink {
    pub name: String,
    pub share_token: String,
    pub url: String,
    pub tile_count: usize,
    pub expires_at: Option<i64>,
}

/// Snapshot `tiles` (already in board order) into a new shared collection.
///
/// # Errors
///
/// `Validation` for an empty selection or a zero lifetime.
pub async fn create_share_link(
    data: &dyn DataService,
    user_id: Uuid,
    tiles: &[&Tile],
    name: Option<&str>,
    expires_in_hours: Option<u32>,
    origin: &str,
) -> Result<ShareLink, AppError> {
    if tiles.is_empty() {
        return Err(AppError::Validation("select at least one tile to share".into()));
    }
    let expires_at = match expires_in_hours {
        Some(0) => return Err(AppError::Validation("share lifetime must be at least one hour".into())),
        Some(hours) => Some(now_ms().saturating_add(i64::from(hours) * 3_600_000)),
        None => None,
    };
    let name = name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(DEFAULT_SHARE_NAME)
        .to_owned();

    let snapshot: Vec<SharedTile> = tiles.iter().map(|t| SharedTile::from(*t)).collect();
    let collection = data
        .insert_shared_collection(user_id, NewSharedCollection { name, tiles: snapshot, expires_at })
        .await?;

    tracing::info!(%user_id, collection_id = %collection.id, tiles = collection.tiles.len(), "share link created");
    Ok(ShareLink {
        url: share_url(origin, &collection.share_token),
        tile_count: collection.tiles.len(),
        name: collection.name,
        share_token: collection.share_token,
        expires_at: collection.expires_at,
    })
}

/// Public lookup. Unknown and expired tokens are both not found.
pub async fn get_shared_collection(data: &dyn DataService, share_token: &str) -> Result<SharedCollection, AppError> {
    let not_found = || AppError::NotFound("shared collection".into());
    let collection = data
        .shared_collection_by_token(share_token)
        .await?
        .ok_or_else(not_found)?;
    if collection.is_expired(now_ms()) {
        tracing::debug!(collection_id = %collection.id, "expired share requested");
        return Err(not_found());
    }
    Ok(collection)
}

// =============================================================================
// PUBLIC VIEW
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SharedTileView {
    pub title: String,
    /// Author HTML, untrusted.
    pub content: String,
    pub text: String,
    pub color: TileColor,
}

/// Read-only rendering of a collection. Omits the owner and the token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SharedView {
    pub name: String,
    pub created_at: i64,
    pub expires_at: Option<i64>,
    pub tiles: Vec<SharedTileView>,
}

impl From<SharedCollection> for SharedView {
    fn from(collection: SharedCollection) -> Self {
        let tiles = collection
            .tiles
            .into_iter()
            .map(|t| SharedTileView { text: plain_text(&t.content), title: t.title, content: t.content, color: t.color })
            .collect();
        Self { name: collection.name, created_at: collection.created_at, expires_at: collection.expires_at, tiles }
    }
}

#[cfg(test)]
#[path = "share_test.rs"]
mod tests;
