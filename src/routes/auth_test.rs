use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::StatusCode as Status;
use serde_json::{Value, json};

use super::*;
use crate::config::AppConfig;
use crate::services::auth::{AuthError, ResetMailer};
use crate::routes::test_support::{signed_up, spawn_app};
use crate::state::test_helpers::test_app_state;

#[test]
fn bearer_token_parses_header() {
    let mut headers = HeaderMap::new();
    assert_eq!(bearer_token(&headers), None);
    headers.insert(header::AUTHORIZATION, "Bearer abc".parse().unwrap());
    assert_eq!(bearer_token(&headers), Some("abc"));
    headers.insert(header::AUTHORIZATION, "Basic abc".parse().unwrap());
    assert_eq!(bearer_token(&headers), None);
    headers.insert(header::AUTHORIZATION, "Bearer ".parse().unwrap());
    assert_eq!(bearer_token(&headers), None);
}

#[test]
fn session_cookie_is_http_only_with_ttl() {
    let cookie = session_cookie("tok".into(), true, 2);
    assert_eq!(cookie.name(), COOKIE_NAME);
    assert_eq!(cookie.http_only(), Some(true));
    assert_eq!(cookie.secure(), Some(true));
    assert_eq!(cookie.max_age(), Some(Duration::hours(2)));
    assert_eq!(cleared_cookie(false).max_age(), Some(Duration::ZERO));
}

#[tokio::test]
async fn signup_sets_cookie_and_me_accepts_it() {
    let (state, _) = test_app_state();
    let base = spawn_app(state).await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{base}/api/auth/signup"))
        .json(&json!({ "email": "Ada@Example.com", "password": "secret1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), Status::CREATED);
    let set_cookie = res.headers()["set-cookie"].to_str().unwrap().to_owned();
    assert!(set_cookie.starts_with("session_token="));
    assert!(set_cookie.contains("HttpOnly"));
    let body: Value = res.json().await.unwrap();
    let token = body["token"].as_str().unwrap();

    let me: Value = client
        .get(format!("{base}/api/auth/me"))
        .header("cookie", format!("session_token={token}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(me["email"], "ada@example.com");
}

#[tokio::test]
async fn signin_rejects_bad_password_and_signout_ends_session() {
    let (state, _) = test_app_state();
    let base = spawn_app(state).await;
    let client = reqwest::Client::new();
    let token = signed_up(&base, "a@x.test").await;

    let res = client
        .post(format!("{base}/api/auth/signin"))
        .json(&json!({ "email": "a@x.test", "password": "nope123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), Status::UNAUTHORIZED);

    let res = client
        .post(format!("{base}/api/auth/signout"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), Status::NO_CONTENT);

    let res = client.get(format!("{base}/api/auth/me")).bearer_auth(&token).send().await.unwrap();
    assert_eq!(res.status(), Status::UNAUTHORIZED);
}

#[tokio::test]
async fn reset_is_accepted_for_unknown_email() {
    let (state, _) = test_app_state();
    let base = spawn_app(state).await;
    let res = reqwest::Client::new()
        .post(format!("{base}/api/auth/reset"))
        .json(&json!({ "email": "ghost@x.test" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), Status::ACCEPTED);
}

#[derive(Default)]
struct CapturingMailer {
    sent: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl ResetMailer for CapturingMailer {
    async fn send_reset(&self, to_email: &str, link: &str) -> Result<(), AuthError> {
        self.sent.lock().unwrap().push((to_email.to_owned(), link.to_owned()));
        Ok(())
    }
}

#[tokio::test]
async fn reset_link_ignores_request_origin() {
    let mailer = Arc::new(CapturingMailer::default());
    let (state, _) = test_app_state();
    let base = spawn_app(state.with_mailer(mailer.clone())).await;
    let client = reqwest::Client::new();
    signed_up(&base, "v@x.test").await;

    let res = client
        .post(format!("{base}/api/auth/reset"))
        .header("origin", "https://evil.example")
        .json(&json!({ "email": "v@x.test" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), Status::ACCEPTED);

    let sent = mailer.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    let (to, link) = &sent[0];
    assert_eq!(to, "v@x.test");
    let expected_prefix = format!("{}/auth#type=recovery&token=", AppConfig::default().public_origin);
    assert!(link.starts_with(&expected_prefix), "{link}");
    assert!(!link.contains("evil.example"));

    let token = link.trim_start_matches(&expected_prefix);
    let res = client
        .post(format!("{base}/api/auth/recover"))
        .json(&json!({ "token": token, "password": "secret9" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), Status::OK);
}

#[tokio::test]
async fn recover_with_unknown_token_is_unauthorized() {
    let (state, _) = test_app_state();
    let base = spawn_app(state).await;
    let res = reqwest::Client::new()
        .post(format!("{base}/api/auth/recover"))
        .json(&json!({ "token": "bogus", "password": "secret9" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), Status::UNAUTHORIZED);
}

#[tokio::test]
async fn password_update_validates_length() {
    let (state, _) = test_app_state();
    let base = spawn_app(state).await;
    let client = reqwest::Client::new();
    let token = signed_up(&base, "a@x.test").await;

    let res = client
        .post(format!("{base}/api/auth/password"))
        .bearer_auth(&token)
        .json(&json!({ "password": "abc" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), Status::UNPROCESSABLE_ENTITY);

    let res = client
        .post(format!("{base}/api/auth/password"))
        .bearer_auth(&token)
        .json(&json!({ "password": "brandnew" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), Status::NO_CONTENT);

    let res = client
        .post(format!("{base}/api/auth/signin"))
        .json(&json!({ "email": "a@x.test", "password": "brandnew" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), Status::OK);
}
