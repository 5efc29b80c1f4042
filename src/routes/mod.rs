//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! This module binds the JSON API under `/api` and serves the single-page
//! front end from `STATIC_DIR`. Files that exist are served as-is; any other
//! path gets the app shell, with 200 for client routes the front end knows
//! and 404 for the rest. The shell gets the visitor's `ShellConfig` spliced
//! in before `</head>`.

pub mod auth;
pub mod dashboards;
pub mod donations;
pub mod shared;
pub mod tiles;

use std::path::Path;

use axum::Router;
use axum::extract::State;
use axum::handler::Handler;
use axum::http::{HeaderMap, StatusCode, Uri, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, patch, post, put};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::pages::{Language, Page, ShellConfig};
use crate::state::AppState;

/// JSON API routes.
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/signup", post(auth::signup))
        .route("/api/auth/signin", post(auth::signin))
        .route("/api/auth/signout", post(auth::signout))
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/reset", post(auth::request_reset))
        .route("/api/auth/recover", post(auth::recover))
        .route("/api/auth/password", post(auth::update_password))
        .route("/api/dashboards", get(dashboards::list).post(dashboards::create))
        .route("/api/dashboards/{id}", patch(dashboards::rename).delete(dashboards::delete))
        .route("/api/dashboards/{id}/tiles", get(tiles::list).post(tiles::create))
        .route("/api/dashboards/{id}/order", put(tiles::reorder))
        .route("/api/dashboards/{id}/move", post(tiles::move_tile))
        .route("/api/dashboards/{id}/export", post(tiles::export))
        .route("/api/dashboards/{id}/import", post(tiles::import))
        .route("/api/tiles/{id}", patch(tiles::update).delete(tiles::delete))
        .route("/api/tiles/{id}/clipboard", get(tiles::clipboard))
        .route("/api/tiles/{id}/sms", get(tiles::sms))
        .route("/api/shares", post(shared::create))
        .route("/api/shared/{token}", get(shared::view))
        .route("/api/donations", get(donations::options).post(donations::create))
        .route("/healthz", get(healthz))
}

/// Full application: API, static assets and the SPA shell fallback.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let shell = spa_shell.with_state(state.clone());
    // Directory requests fall through to the shell so `/` gets its config too.
    let static_files = ServeDir::new(&state.config.static_dir)
        .append_index_html_on_directories(false)
        .fallback(shell);

    api_routes()
        .fallback_service(static_files)
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// Served when `STATIC_DIR` has no `index.html`, e.g. an API-only deploy.
fn bare_shell(language: Language, config_tag: &str) -> String {
    format!(
        "<!doctype html><html lang=\"{language}\"><head><meta charset=\"utf-8\"><title>Computerslet 3000</title>{config_tag}</head><body><div id=\"root\"></div></body></html>"
    )
}

fn with_config(index_html: &str, config_tag: &str) -> String {
    index_html.replacen("</head>", &format!("{config_tag}</head>"), 1)
}

async fn spa_shell(State(state): State<AppState>, jar: CookieJar, uri: Uri) -> Response {
    let page = Page::resolve(uri.path());
    let status = if page.is_known() { StatusCode::OK } else { StatusCode::NOT_FOUND };

    let config = ShellConfig::for_visitor(jar.get(Language::STORAGE_KEY).map(Cookie::value));
    let config_tag = match config.script_tag() {
        Ok(tag) => tag,
        Err(e) => {
            tracing::error!(error = %e, "shell config serialization failed");
            String::new()
        }
    };

    let index = Path::new(&state.config.static_dir).join("index.html");
    let body = match tokio::fs::read_to_string(&index).await {
        Ok(html) => with_config(&html, &config_tag),
        Err(e) => {
            tracing::debug!(error = %e, path = %index.display(), "app shell not found; serving bare shell");
            bare_shell(config.language, &config_tag)
        }
    };
    (status, Html(body)).into_response()
}

/// Origin for links handed back to the browser: the request's `Origin`
/// header when it is an http(s) origin, else the configured public origin.
pub(crate) fn request_origin(headers: &HeaderMap, config: &AppConfig) -> String {
    headers
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().trim_end_matches('/'))
        .filter(|v| v.starts_with("http://") || v.starts_with("https://"))
        .map_or_else(|| config.public_origin.clone(), str::to_owned)
}

#[cfg(test)]
#[path = "server_helpers_test.rs"]
pub(crate) mod test_support;

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
