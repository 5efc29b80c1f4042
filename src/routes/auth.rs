//! Auth routes: email/password sign-up and sign-in, session cookie, recovery.

use axum::extract::{FromRef, State};
use axum::http::request::Parts;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Json, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use time::Duration;
use uuid::Uuid;

use crate::error::AppError;
use crate::services::{auth as auth_svc, session};
use crate::state::AppState;

const COOKIE_NAME: &str = "session_token";

fn session_cookie(token: String, secure: bool, ttl_hours: u64) -> Cookie<'static> {
    let max_age = i64::try_from(ttl_hours.saturating_mul(3600)).unwrap_or(i64::MAX);
    Cookie::build((COOKIE_NAME, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(Duration::seconds(max_age))
        .build()
}

fn cleared_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((COOKIE_NAME, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(Duration::ZERO)
        .build()
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

// =============================================================================
// AUTH EXTRACTOR
// =============================================================================

/// Authenticated user from the session cookie or a bearer header.
/// Use as a handler parameter to require authentication.
pub struct AuthUser {
    pub user: session::SessionUser,
    pub token: String,
}

impl<S> axum::extract::FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(COOKIE_NAME)
            .map(Cookie::value)
            .filter(|t| !t.is_empty())
            .or_else(|| bearer_token(&parts.headers))
            .ok_or(AppError::Auth)?
            .to_owned();

        let app_state = AppState::from_ref(state);
        let user = session::validate_session(app_state.identity.as_ref(), &token)
            .await?
            .ok_or(AppError::Auth)?;

        Ok(Self { user, token })
    }
}

// =============================================================================
// BODIES
// =============================================================================

#[derive(Deserialize)]
pub struct CredentialsBody {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct ResetBody {
    pub email: String,
}

#[derive(Deserialize)]
pub struct RecoverBody {
    pub token: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct PasswordBody {
    pub password: String,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub user: session::SessionUser,
    pub token: String,
}

#[derive(Serialize)]
pub struct RecoveredResponse {
    pub user_id: Uuid,
    pub token: String,
}

// =============================================================================
// HANDLERS
// =============================================================================

/// `POST /api/auth/signup`: create an account and sign it in.
pub async fn signup(State(state): State<AppState>, Json(body): Json<CredentialsBody>) -> Result<Response, AppError> {
    let ttl = state.config.session_ttl_hours;
    let (user, token) =
        auth_svc::signup(state.identity.as_ref(), &state.dashboards, &body.email, &body.password, ttl).await?;
    let jar = CookieJar::new().add(session_cookie(token.clone(), state.config.cookie_secure, ttl));
    Ok((StatusCode::CREATED, jar, Json(SessionResponse { user, token })).into_response())
}

/// `POST /api/auth/signin`
pub async fn signin(State(state): State<AppState>, Json(body): Json<CredentialsBody>) -> Result<Response, AppError> {
    let ttl = state.config.session_ttl_hours;
    let (user, token) = auth_svc::signin(state.identity.as_ref(), &body.email, &body.password, ttl).await?;
    let jar = CookieJar::new().add(session_cookie(token.clone(), state.config.cookie_secure, ttl));
    Ok((jar, Json(SessionResponse { user, token })).into_response())
}

/// `POST /api/auth/signout`: delete session, clear cookie.
pub async fn signout(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    if let Err(e) = session::delete_session(state.identity.as_ref(), &auth.token).await {
        tracing::warn!(error = %e, user_id = %auth.user.id, "session delete failed");
    }
    let jar = CookieJar::new().add(cleared_cookie(state.config.cookie_secure));
    (jar, StatusCode::NO_CONTENT)
}

/// `GET /api/auth/me`: return current user.
pub async fn me(auth: AuthUser) -> Json<session::SessionUser> {
    Json(auth.user)
}

/// `POST /api/auth/reset`: always 202, whether or not the email exists.
/// The link is built on the configured public origin; the request's
/// `Origin` header is ignored here.
pub async fn request_reset(State(state): State<AppState>, Json(body): Json<ResetBody>) -> Result<StatusCode, AppError> {
    auth_svc::request_reset(
        state.identity.as_ref(),
        state.mailer.as_deref(),
        &state.config.public_origin,
        &body.email,
    )
    .await?;
    Ok(StatusCode::ACCEPTED)
}

/// `POST /api/auth/recover`: set a new password from a recovery token.
pub async fn recover(State(state): State<AppState>, Json(body): Json<RecoverBody>) -> Result<Response, AppError> {
    let ttl = state.config.session_ttl_hours;
    let (user_id, token) = auth_svc::recover(state.identity.as_ref(), &body.token, &body.password, ttl).await?;
    let jar = CookieJar::new().add(session_cookie(token.clone(), state.config.cookie_secure, ttl));
    Ok((jar, Json(RecoveredResponse { user_id, token })).into_response())
}

/// `POST /api/auth/password`: change the signed-in user's password.
pub async fn update_password(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<PasswordBody>,
) -> Result<StatusCode, AppError> {
    auth_svc::update_password(state.identity.as_ref(), auth.user.id, &body.password).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
