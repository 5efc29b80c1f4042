//! Email/password identity: sign-up, sign-in, recovery.
//!
//! DESIGN
//! ======
//! Passwords are stored as `pbkdf2-sha256$<rounds>$<salt>$<key>`: a random
//! 16-byte salt and a PBKDF2-HMAC-SHA256 key, compared in constant time.
//! The round count travels with the hash, so raising it only affects new
//! hashes. Sessions come from `services::session`.
//!
//! RECOVERY
//! ========
//! A reset request mints a random token, stores only its hash with a one
//! hour expiry, and mails `{public_origin}/auth#type=recovery&token=...`.
//! The origin always comes from configuration, never from the request. The
//! front end routes any URL whose fragment carries `type=recovery` to the
//! auth page, which posts the token back with the new password. Consuming
//! the token is single use. Requests for unknown addresses succeed silently
//! so the endpoint does not reveal which emails are registered.

use async_trait::async_trait;
use pbkdf2::pbkdf2_hmac;
use rand::Rng;
use resend_rs::Resend;
use resend_rs::types::CreateEmailBaseOptions;
use sha2::Sha256;
use uuid::Uuid;

use super::dashboard::DashboardService;
use super::session::{SessionUser, bytes_to_hex, create_session, generate_token, hash_token};
use crate::config::MailerConfig;
use crate::data::{DataError, IdentityStore};
use crate::error::AppError;
use crate::model::now_ms;

pub const MIN_PASSWORD_LEN: usize = 6;
const HASH_SCHEME: &str = "pbkdf2-sha256";
#[cfg(not(test))]
const HASH_ROUNDS: u32 = 210_000;
#[cfg(test)]
const HASH_ROUNDS: u32 = 1_000;
const RESET_TTL_MS: i64 = 60 * 60 * 1000;
const PASSWORD_RESET_TEMPLATE: &str = include_str!("../../templates/password_reset.html");

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid email")]
    InvalidEmail,
    #[error("password must be at least 6 characters")]
    WeakPassword,
    #[error("email already registered")]
    EmailTaken,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("recovery link is invalid or expired")]
    InvalidRecoveryToken,
    #[error("data error: {0}")]
    Data(DataError),
    #[error("email delivery failed: {0}")]
    EmailDelivery(String),
}

impl From<DataError> for AuthError {
    fn from(err: DataError) -> Self {
        match err {
            DataError::Conflict(_) => Self::EmailTaken,
            other => Self::Data(other),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials | AuthError::InvalidRecoveryToken => Self::Auth,
            AuthError::InvalidEmail | AuthError::WeakPassword | AuthError::EmailTaken => {
                Self::Validation(err.to_string())
            }
            AuthError::Data(data) => data.into(),
            AuthError::EmailDelivery(msg) => {
                tracing::error!(error = %msg, "reset email failed");
                Self::Remote(msg)
            }
        }
    }
}

// =============================================================================
// CREDENTIALS
// =============================================================================

#[must_use]
pub fn normalize_email(email: &str) -> Option<String> {
    let normalized = email.trim().to_ascii_lowercase();
    let (local, domain) = normalized.split_once('@')?;
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return None;
    }
    Some(normalized)
}

fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::WeakPassword);
    }
    Ok(())
}

fn derive_key(password: &str, salt: &[u8], rounds: u32) -> [u8; 32] {
    let mut key = [0u8; 32];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, rounds, &mut key);
    key
}

fn hex_to_bytes(hex: &str) -> Option<Vec<u8>> {
    if hex.len() % 2 != 0 {
        return None;
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok())
        .collect()
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[must_use]
pub fn hash_password(password: &str) -> String {
    let salt: [u8; 16] = rand::rng().random();
    let key = derive_key(password, &salt, HASH_ROUNDS);
    format!("{HASH_SCHEME}${HASH_ROUNDS}${}${}", bytes_to_hex(&salt), bytes_to_hex(&key))
}

/// Check `password` against a stored hash. Malformed hashes never match.
#[must_use]
pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.split('$');
    let (Some(scheme), Some(rounds), Some(salt), Some(expected), None) =
        (parts.next(), parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    if scheme != HASH_SCHEME {
        return false;
    }
    let (Ok(rounds), Some(salt), Some(expected)) = (rounds.parse::<u32>(), hex_to_bytes(salt), hex_to_bytes(expected))
    else {
        return false;
    };
    if rounds == 0 {
        return false;
    }
    constant_time_eq(&derive_key(password, &salt, rounds), &expected)
}

// =============================================================================
// FLOWS
// =============================================================================

/// Register an account, give it a first dashboard, and sign it in.
pub async fn signup(
    identity: &dyn IdentityStore,
    dashboards: &DashboardService,
    email: &str,
    password: &str,
    ttl_hours: u64,
) -> Result<(SessionUser, String), AppError> {
    let email = normalize_email(email).ok_or(AuthError::InvalidEmail)?;
    validate_password(password)?;

    let user = identity
        .create_user(&email, &hash_password(password))
        .await
        .map_err(AuthError::from)?;
    dashboards.create_default(user.id).await?;
    let token = create_session(identity, user.id, ttl_hours).await?;
    tracing::info!(user_id = %user.id, "user signed up");
    Ok((SessionUser::from(user), token))
}

pub async fn signin(
    identity: &dyn IdentityStore,
    email: &str,
    password: &str,
    ttl_hours: u64,
) -> Result<(SessionUser, String), AppError> {
    let email = normalize_email(email).ok_or(AuthError::InvalidCredentials)?;
    let user = identity
        .user_by_email(&email)
        .await?
        .filter(|u| verify_password(password, &u.password_hash))
        .ok_or(AuthError::InvalidCredentials)?;
    let token = create_session(identity, user.id, ttl_hours).await?;
    tracing::info!(user_id = %user.id, "user signed in");
    Ok((SessionUser::from(user), token))
}

#[must_use]
pub fn recovery_link(origin: &str, token: &str) -> String {
    format!("{}/auth#type=recovery&token={token}", origin.trim_end_matches('/'))
}

#[must_use]
pub fn render_password_reset_email(email: &str, link: &str) -> String {
    PASSWORD_RESET_TEMPLATE
        .replace("{{EMAIL}}", email)
        .replace("{{LINK}}", link)
}

/// Delivers recovery links. Lives on `AppState` so tests can capture mail.
#[async_trait]
pub trait ResetMailer: Send + Sync {
    async fn send_reset(&self, to_email: &str, link: &str) -> Result<(), AuthError>;
}

/// Sends reset mail through Resend.
pub struct ResendMailer {
    client: Resend,
    from: String,
}

impl ResendMailer {
    #[must_use]
    pub fn new(config: &MailerConfig) -> Self {
        Self { client: Resend::new(&config.api_key), from: config.from.clone() }
    }
}

#[async_trait]
impl ResetMailer for ResendMailer {
    async fn send_reset(&self, to_email: &str, link: &str) -> Result<(), AuthError> {
        let to = [to_email];
        let html = render_password_reset_email(to_email, link);
        let email = CreateEmailBaseOptions::new(&self.from, to, "Reset your password").with_html(&html);
        self.client
            .emails
            .send(email)
            .await
            .map_err(|e| AuthError::EmailDelivery(e.to_string()))?;
        Ok(())
    }
}

/// Start password recovery. `public_origin` must be the configured origin:
/// the link carries a live token. Returns the raw token when one was issued
/// so callers without a mailer (and tests) can hand it over.
pub async fn request_reset(
    identity: &dyn IdentityStore,
    mailer: Option<&dyn ResetMailer>,
    public_origin: &str,
    email: &str,
) -> Result<Option<String>, AppError> {
    let Some(email) = normalize_email(email) else {
        return Ok(None);
    };
    let Some(user) = identity.user_by_email(&email).await? else {
        tracing::debug!("reset requested for unknown email");
        return Ok(None);
    };

    let token = generate_token();
    identity
        .create_password_reset(user.id, &hash_token(&token), now_ms().saturating_add(RESET_TTL_MS))
        .await?;
    let link = recovery_link(public_origin, &token);

    match mailer {
        Some(mailer) => mailer.send_reset(&email, &link).await?,
        None => tracing::warn!(user_id = %user.id, %link, "no mailer configured; reset link logged"),
    }
    Ok(Some(token))
}

/// Finish recovery: consume the token, set the new password, sign in.
pub async fn recover(
    identity: &dyn IdentityStore,
    token: &str,
    new_password: &str,
    ttl_hours: u64,
) -> Result<(Uuid, String), AppError> {
    validate_password(new_password)?;
    let user_id = identity
        .consume_password_reset(&hash_token(token.trim()), now_ms())
        .await?
        .ok_or(AuthError::InvalidRecoveryToken)?;
    identity
        .set_password_hash(user_id, &hash_password(new_password))
        .await?;
    let session = create_session(identity, user_id, ttl_hours).await?;
    tracing::info!(%user_id, "password recovered");
    Ok((user_id, session))
}

pub async fn update_password(identity: &dyn IdentityStore, user_id: Uuid, new_password: &str) -> Result<(), AppError> {
    validate_password(new_password)?;
    identity
        .set_password_hash(user_id, &hash_password(new_password))
        .await?;
    tracing::info!(%user_id, "password updated");
    Ok(())
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
