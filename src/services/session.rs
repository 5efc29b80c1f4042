//! Session tokens.
//!
//! ARCHITECTURE
//! ============
//! HTTP auth uses opaque random tokens carried in the `session_token` cookie
//! or a bearer header. The identity store keeps the token with an absolute
//! expiry; lookups past that instant resolve to no user.
//!
//! Tokens that must never be stored in clear (password recovery) are kept
//! only as their SHA-256 digest.

use std::fmt::Write;

use rand::Rng;
use serde::Serialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::data::{DataError, IdentityStore, UserRow};
use crate::model::now_ms;

pub(crate) fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}

/// Generate a cryptographically random 32-byte hex token.
#[must_use]
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    bytes_to_hex(&bytes)
}

/// Hex SHA-256 of a token, for at-rest storage.
#[must_use]
pub fn hash_token(token: &str) -> String {
    bytes_to_hex(&Sha256::digest(token.as_bytes()))
}

/// The signed-in user as exposed to handlers and the front end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub email: String,
}

impl From<UserRow> for SessionUser {
    fn from(row: UserRow) -> Self {
        Self { id: row.id, email: row.email }
    }
}

/// Create a session for `user_id` that lives `ttl_hours`, returning the token.
pub async fn create_session(identity: &dyn IdentityStore, user_id: Uuid, ttl_hours: u64) -> Result<String, DataError> {
    let token = generate_token();
    let ttl_ms = i64::try_from(ttl_hours.saturating_mul(3_600_000)).unwrap_or(i64::MAX);
    let expires_at = now_ms().saturating_add(ttl_ms);
    identity.create_session(user_id, &token, expires_at).await?;
    tracing::debug!(%user_id, "session created");
    Ok(token)
}

/// Validate a session token and return the associated user.
pub async fn validate_session(identity: &dyn IdentityStore, token: &str) -> Result<Option<SessionUser>, DataError> {
    Ok(identity
        .session_user(token, now_ms())
        .await?
        .map(SessionUser::from))
}

/// Delete a session by token.
pub async fn delete_session(identity: &dyn IdentityStore, token: &str) -> Result<(), DataError> {
    identity.delete_session(token).await
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
