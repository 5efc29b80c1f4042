//! Tile export and import.
//!
//! FILE FORMAT
//! ===========
//! A UTF-8 JSON array of `{title, content, color}` objects, pretty-printed
//! with two-space indentation, fields always in that order. Export of the
//! same tiles is byte-for-byte stable.
//!
//! Import is lenient per element and strict about the envelope: anything
//! that is not a JSON array is rejected before a single tile is created.
//! Missing or empty fields fall back to defaults:
//!
//! - `title`: `"Untitled"`
//! - `content`: the `text` field, then `""`
//! - `color`: `blue`, also for colors outside the palette

use serde_json::Value;
use uuid::Uuid;

use super::tile::TileStore;
use crate::error::AppError;
use crate::model::{SharedTile, Tile, TileColor};

pub const EXPORT_FILENAME: &str = "computerslet_3000_tegels.json";
pub const UNTITLED: &str = "Untitled";

/// Serialize tiles as the export file body.
///
/// # Errors
///
/// Returns `Remote` only if serialization itself fails.
pub fn export_json<'a>(tiles: impl IntoIterator<Item = &'a Tile>) -> Result<String, AppError> {
    let rows: Vec<SharedTile> = tiles.into_iter().map(SharedTile::from).collect();
    serde_json::to_string_pretty(&rows).map_err(|e| AppError::Remote(format!("export failed: {e}")))
}

fn non_empty_str<'a>(obj: &'a serde_json::Map<String, Value>, key: &str) -> Option<&'a str> {
    obj.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

fn draft_from_value(value: &Value) -> SharedTile {
    let Some(obj) = value.as_object() else {
        return SharedTile { title: UNTITLED.into(), content: String::new(), color: TileColor::default() };
    };
    let title = non_empty_str(obj, "title").unwrap_or(UNTITLED);
    let content = non_empty_str(obj, "content")
        .or_else(|| non_empty_str(obj, "text"))
        .unwrap_or_default();
    let color = non_empty_str(obj, "color")
        .and_then(|c| c.parse::<TileColor>().ok())
        .unwrap_or_default();
    SharedTile { title: title.to_owned(), content: content.to_owned(), color }
}

/// Parse an import file into tile drafts.
///
/// # Errors
///
/// `Format` when the body is not JSON or not a JSON array.
pub fn parse_import(body: &[u8]) -> Result<Vec<SharedTile>, AppError> {
    let value: Value =
        serde_json::from_slice(body).map_err(|e| AppError::Format(format!("import file is not valid JSON: {e}")))?;
    let Value::Array(items) = value else {
        return Err(AppError::Format("import file must contain a JSON array".into()));
    };
    Ok(items.iter().map(draft_from_value).collect())
}

/// Parse `body` and append its tiles to the dashboard in one batch.
pub async fn import(store: &TileStore, user_id: Uuid, dashboard_id: Uuid, body: &[u8]) -> Result<Vec<Tile>, AppError> {
    let drafts = parse_import(body)?;
    let count = drafts.len();
    let inserted = store.append(user_id, dashboard_id, drafts).await?;
    tracing::info!(%user_id, %dashboard_id, count, "tiles imported");
    Ok(inserted)
}

#[cfg(test)]
#[path = "transfer_test.rs"]
mod tests;
