//! Postgres data service.
//!
//! DESIGN
//! ======
//! Row ownership is enforced in every statement with a `user_id = $n`
//! predicate, so a foreign row is indistinguishable from a missing one.
//! Timestamps are read back as epoch milliseconds in SQL.
//!
//! Tile order is rewritten inside one transaction with the
//! `(dashboard_id, order_index)` uniqueness check deferred to commit, so a
//! reorder either lands completely or not at all.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{DataError, DataService, IdentityStore, UserRow};
use crate::model::{
    Dashboard, NewSharedCollection, NewTile, SharedCollection, SharedTile, Tile, TileColor, TilePatch,
};
use crate::services::session::generate_token;

const TILE_COLUMNS: &str = "id, user_id, dashboard_id, title, content, color, order_index, \
     (EXTRACT(EPOCH FROM created_at) * 1000)::BIGINT, (EXTRACT(EPOCH FROM updated_at) * 1000)::BIGINT";

const DASHBOARD_COLUMNS: &str = "id, user_id, name, \
     (EXTRACT(EPOCH FROM created_at) * 1000)::BIGINT, (EXTRACT(EPOCH FROM updated_at) * 1000)::BIGINT";

const SHARED_COLUMNS: &str = "id, user_id, name, share_token, tiles_data, \
     (EXTRACT(EPOCH FROM created_at) * 1000)::BIGINT, (EXTRACT(EPOCH FROM expires_at) * 1000)::BIGINT";

const SET_TILE_ORDER_SQL: &str =
    "UPDATE tiles SET order_index = $4, updated_at = now() WHERE id = $1 AND user_id = $2 AND dashboard_id = $3";
const USER_COLUMNS: &str = "id, email, password_hash, (EXTRACT(EPOCH FROM created_at) * 1000)::BIGINT";

type TileTuple = (Uuid, Uuid, Uuid, String, String, String, i32, i64, i64);
type DashboardTuple = (Uuid, Uuid, String, i64, i64);
type SharedTuple = (Uuid, Uuid, String, String, serde_json::Value, i64, Option<i64>);
type UserTuple = (Uuid, String, String, i64);

fn tile_from_row(row: TileTuple) -> Result<Tile, DataError> {
    let (id, user_id, dashboard_id, title, content, color, order_index, created_at, updated_at) = row;
    let color = color
        .parse::<TileColor>()
        .map_err(|e| DataError::Backend(e.to_string()))?;
    Ok(Tile { id, user_id, dashboard_id, title, content, color, order_index, created_at, updated_at })
}

fn dashboard_from_row((id, user_id, name, created_at, updated_at): DashboardTuple) -> Dashboard {
    Dashboard { id, user_id, name, created_at, updated_at }
}

fn shared_from_row(row: SharedTuple) -> Result<SharedCollection, DataError> {
    let (id, user_id, name, share_token, tiles_data, created_at, expires_at) = row;
    let tiles = serde_json::from_value::<Vec<SharedTile>>(tiles_data)
        .map_err(|e| DataError::Backend(format!("malformed tiles_data: {e}")))?;
    Ok(SharedCollection { id, user_id, name, share_token, tiles, created_at, expires_at })
}

fn user_from_row((id, email, password_hash, created_at): UserTuple) -> UserRow {
    UserRow { id, email, password_hash, created_at }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[derive(Clone)]
pub struct PgBackend {
    pool: PgPool,
}

impl PgBackend {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DataService for PgBackend {
    async fn list_dashboards(&self, user_id: Uuid) -> Result<Vec<Dashboard>, DataError> {
        let sql = format!("SELECT {DASHBOARD_COLUMNS} FROM dashboards WHERE user_id = $1 ORDER BY created_at ASC, id ASC");
        let rows = sqlx::query_as::<_, DashboardTuple>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(dashboard_from_row).collect())
    }

    async fn insert_dashboard(&self, user_id: Uuid, name: &str) -> Result<Dashboard, DataError> {
        let sql = format!("INSERT INTO dashboards (id, user_id, name) VALUES ($1, $2, $3) RETURNING {DASHBOARD_COLUMNS}");
        let row = sqlx::query_as::<_, DashboardTuple>(&sql)
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(name)
            .fetch_one(&self.pool)
            .await?;
        Ok(dashboard_from_row(row))
    }

    async fn rename_dashboard(&self, user_id: Uuid, dashboard_id: Uuid, name: &str) -> Result<Dashboard, DataError> {
        let sql = format!(
            "UPDATE dashboards SET name = $3, updated_at = now() WHERE id = $1 AND user_id = $2 \
             RETURNING {DASHBOARD_COLUMNS}"
        );
        let row = sqlx::query_as::<_, DashboardTuple>(&sql)
            .bind(dashboard_id)
            .bind(user_id)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(DataError::NotFound(dashboard_id))?;
        Ok(dashboard_from_row(row))
    }

    async fn delete_dashboard(&self, user_id: Uuid, dashboard_id: Uuid) -> Result<(), DataError> {
        let result = sqlx::query("DELETE FROM dashboards WHERE id = $1 AND user_id = $2")
            .bind(dashboard_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DataError::NotFound(dashboard_id));
        }
        Ok(())
    }

    async fn list_tiles(&self, user_id: Uuid, dashboard_id: Uuid) -> Result<Vec<Tile>, DataError> {
        let sql = format!(
            "SELECT {TILE_COLUMNS} FROM tiles WHERE user_id = $1 AND dashboard_id = $2 \
             ORDER BY order_index ASC, id ASC"
        );
        let rows = sqlx::query_as::<_, TileTuple>(&sql)
            .bind(user_id)
            .bind(dashboard_id)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(tile_from_row).collect()
    }

    async fn get_tile(&self, user_id: Uuid, tile_id: Uuid) -> Result<Tile, DataError> {
        let sql = format!("SELECT {TILE_COLUMNS} FROM tiles WHERE id = $1 AND user_id = $2");
        let row = sqlx::query_as::<_, TileTuple>(&sql)
            .bind(tile_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(DataError::NotFound(tile_id))?;
        tile_from_row(row)
    }

    async fn insert_tiles(&self, user_id: Uuid, tiles: &[NewTile]) -> Result<Vec<Tile>, DataError> {
        let sql = format!(
            "INSERT INTO tiles (id, user_id, dashboard_id, title, content, color, order_index) \
             SELECT $1, $2, d.id, $4, $5, $6, $7 FROM dashboards d WHERE d.id = $3 AND d.user_id = $2 \
             RETURNING {TILE_COLUMNS}"
        );

        let mut tx = self.pool.begin().await?;
        let mut inserted = Vec::with_capacity(tiles.len());
        for tile in tiles {
            let row = sqlx::query_as::<_, TileTuple>(&sql)
                .bind(Uuid::new_v4())
                .bind(user_id)
                .bind(tile.dashboard_id)
                .bind(&tile.title)
                .bind(&tile.content)
                .bind(tile.color.as_str())
                .bind(tile.order_index)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(DataError::NotFound(tile.dashboard_id))?;
            inserted.push(tile_from_row(row)?);
        }
        tx.commit().await?;
        Ok(inserted)
    }

    async fn update_tile(&self, user_id: Uuid, tile_id: Uuid, patch: &TilePatch) -> Result<Tile, DataError> {
        let sql = format!(
            "UPDATE tiles SET \
                 title = COALESCE($3, title), \
                 content = COALESCE($4, content), \
                 color = COALESCE($5, color), \
                 updated_at = now() \
             WHERE id = $1 AND user_id = $2 \
             RETURNING {TILE_COLUMNS}"
        );
        let row = sqlx::query_as::<_, TileTuple>(&sql)
            .bind(tile_id)
            .bind(user_id)
            .bind(patch.title.as_deref())
            .bind(patch.content.as_deref())
            .bind(patch.color.map(TileColor::as_str))
            .fetch_optional(&self.pool)
            .await?
            .ok_or(DataError::NotFound(tile_id))?;
        tile_from_row(row)
    }

    async fn delete_tile(&self, user_id: Uuid, tile_id: Uuid) -> Result<Tile, DataError> {
        let sql = format!("DELETE FROM tiles WHERE id = $1 AND user_id = $2 RETURNING {TILE_COLUMNS}");
        let row = sqlx::query_as::<_, TileTuple>(&sql)
            .bind(tile_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(DataError::NotFound(tile_id))?;
        tile_from_row(row)
    }

    async fn set_tile_order(
        &self,
        user_id: Uuid,
        dashboard_id: Uuid,
        tile_id: Uuid,
        order_index: i32,
    ) -> Result<(), DataError> {
        let result = sqlx::query(SET_TILE_ORDER_SQL)
            .bind(tile_id)
            .bind(user_id)
            .bind(dashboard_id)
            .bind(order_index)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DataError::NotFound(tile_id));
        }
        Ok(())
    }

    async fn apply_tile_order(&self, user_id: Uuid, dashboard_id: Uuid, order: &[(Uuid, i32)]) -> Result<(), DataError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET CONSTRAINTS tiles_dashboard_order_key DEFERRED")
            .execute(&mut *tx)
            .await?;

        for (tile_id, order_index) in order {
            let result = sqlx::query(SET_TILE_ORDER_SQL)
                .bind(tile_id)
                .bind(user_id)
                .bind(dashboard_id)
                .bind(order_index)
                .execute(&mut *tx)
                .await?;
            if result.rows_affected() == 0 {
                // Dropping `tx` rolls back the rows already rewritten.
                return Err(DataError::NotFound(*tile_id));
            }
        }

        tx.commit().await?;
        Ok(())
    }

    async fn insert_shared_collection(
        &self,
        user_id: Uuid,
        collection: NewSharedCollection,
    ) -> Result<SharedCollection, DataError> {
        let tiles_data =
            serde_json::to_value(&collection.tiles).map_err(|e| DataError::Backend(format!("encode tiles_data: {e}")))?;
        let sql = format!(
            "INSERT INTO shared_collections (id, user_id, name, share_token, tiles_data, expires_at) \
             VALUES ($1, $2, $3, $4, $5, to_timestamp($6::BIGINT / 1000.0)) \
             RETURNING {SHARED_COLUMNS}"
        );
        let row = sqlx::query_as::<_, SharedTuple>(&sql)
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(&collection.name)
            .bind(generate_token())
            .bind(tiles_data)
            .bind(collection.expires_at)
            .fetch_one(&self.pool)
            .await?;
        shared_from_row(row)
    }

    async fn shared_collection_by_token(&self, share_token: &str) -> Result<Option<SharedCollection>, DataError> {
        let sql = format!("SELECT {SHARED_COLUMNS} FROM shared_collections WHERE share_token = $1");
        let row = sqlx::query_as::<_, SharedTuple>(&sql)
            .bind(share_token)
            .fetch_optional(&self.pool)
            .await?;
        row.map(shared_from_row).transpose()
    }
}

#[async_trait]
impl IdentityStore for PgBackend {
    async fn create_user(&self, email: &str, password_hash: &str) -> Result<UserRow, DataError> {
        let sql = format!("INSERT INTO users (id, email, password_hash) VALUES ($1, $2, $3) RETURNING {USER_COLUMNS}");
        let row = sqlx::query_as::<_, UserTuple>(&sql)
            .bind(Uuid::new_v4())
            .bind(email)
            .bind(password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    DataError::Conflict("email already registered".into())
                } else {
                    DataError::Database(e)
                }
            })?;
        Ok(user_from_row(row))
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<UserRow>, DataError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let row = sqlx::query_as::<_, UserTuple>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(user_from_row))
    }

    async fn set_password_hash(&self, user_id: Uuid, password_hash: &str) -> Result<(), DataError> {
        let result = sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(user_id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DataError::NotFound(user_id));
        }
        Ok(())
    }

    async fn create_session(&self, user_id: Uuid, token: &str, expires_at: i64) -> Result<(), DataError> {
        sqlx::query("INSERT INTO sessions (token, user_id, expires_at) VALUES ($1, $2, to_timestamp($3::BIGINT / 1000.0))")
            .bind(token)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn session_user(&self, token: &str, now_ms: i64) -> Result<Option<UserRow>, DataError> {
        let row = sqlx::query_as::<_, UserTuple>(
            "SELECT u.id, u.email, u.password_hash, (EXTRACT(EPOCH FROM u.created_at) * 1000)::BIGINT
             FROM sessions s
             JOIN users u ON u.id = s.user_id
             WHERE s.token = $1 AND s.expires_at > to_timestamp($2::BIGINT / 1000.0)",
        )
        .bind(token)
        .bind(now_ms)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(user_from_row))
    }

    async fn delete_session(&self, token: &str) -> Result<(), DataError> {
        sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn create_password_reset(&self, user_id: Uuid, token_hash: &str, expires_at: i64) -> Result<(), DataError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM password_resets WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            "INSERT INTO password_resets (token_hash, user_id, expires_at) VALUES ($1, $2, to_timestamp($3::BIGINT / 1000.0))",
        )
        .bind(token_hash)
        .bind(user_id)
        .bind(expires_at)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn consume_password_reset(&self, token_hash: &str, now_ms: i64) -> Result<Option<Uuid>, DataError> {
        let row = sqlx::query_as::<_, (Uuid,)>(
            "DELETE FROM password_resets
             WHERE token_hash = $1 AND expires_at > to_timestamp($2::BIGINT / 1000.0)
             RETURNING user_id",
        )
        .bind(token_hash)
        .bind(now_ms)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(user_id,)| user_id))
    }
}

#[cfg(test)]
#[path = "postgres_test.rs"]
mod tests;
