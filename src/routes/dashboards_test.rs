use reqwest::StatusCode as Status;
use serde_json::json;

use super::*;
use crate::routes::test_support::{signed_up, spawn_app};
use crate::state::test_helpers::test_app_state;

async fn list_dashboards(base: &str, token: &str, active: Option<Uuid>) -> DashboardsResponse {
    let mut url = format!("{base}/api/dashboards");
    if let Some(active) = active {
        url.push_str(&format!("?active={active}"));
    }
    reqwest::Client::new()
        .get(url)
        .bearer_auth(token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

#[tokio::test]
async fn new_account_has_one_active_dashboard() {
    let (state, _) = test_app_state();
    let base = spawn_app(state).await;
    let token = signed_up(&base, "a@x.test").await;

    let listed = list_dashboards(&base, &token, None).await;
    assert_eq!(listed.dashboards.len(), 1);
    assert_eq!(listed.dashboards[0].name, "My Dashboard");
    assert_eq!(listed.active, Some(listed.dashboards[0].id));

    let stale = list_dashboards(&base, &token, Some(Uuid::new_v4())).await;
    assert_eq!(stale.active, Some(listed.dashboards[0].id));
}

#[tokio::test]
async fn create_selects_and_rename_trims() {
    let (state, _) = test_app_state();
    let base = spawn_app(state).await;
    let token = signed_up(&base, "a@x.test").await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{base}/api/dashboards"))
        .bearer_auth(&token)
        .json(&json!({ "name": "  Work  " }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), Status::CREATED);
    let created: CreatedDashboard = res.json().await.unwrap();
    assert_eq!(created.dashboard.name, "Work");
    assert_eq!(created.active, Some(created.dashboard.id));

    let res = client
        .patch(format!("{base}/api/dashboards/{}", created.dashboard.id))
        .bearer_auth(&token)
        .json(&json!({ "name": "   " }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), Status::UNPROCESSABLE_ENTITY);

    let renamed: Dashboard = client
        .patch(format!("{base}/api/dashboards/{}", created.dashboard.id))
        .bearer_auth(&token)
        .json(&json!({ "name": "Home " }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(renamed.name, "Home");
}

#[tokio::test]
async fn deleting_last_dashboard_is_refused_without_data_call() {
    let (state, backend) = test_app_state();
    let base = spawn_app(state).await;
    let token = signed_up(&base, "a@x.test").await;
    let only = list_dashboards(&base, &token, None).await.dashboards[0].id;

    let res = reqwest::Client::new()
        .delete(format!("{base}/api/dashboards/{only}"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), Status::UNPROCESSABLE_ENTITY);
    assert_eq!(backend.call_count("delete_dashboard"), 0);
}

#[tokio::test]
async fn deleting_active_dashboard_switches_selection() {
    let (state, _) = test_app_state();
    let base = spawn_app(state).await;
    let token = signed_up(&base, "a@x.test").await;
    let client = reqwest::Client::new();
    let first = list_dashboards(&base, &token, None).await.dashboards[0].id;

    let created: CreatedDashboard = client
        .post(format!("{base}/api/dashboards"))
        .bearer_auth(&token)
        .json(&json!({ "name": "Second" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let second = created.dashboard.id;

    let after: DashboardsResponse = client
        .delete(format!("{base}/api/dashboards/{second}?active={second}"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(after.active, Some(first));
    assert_eq!(after.dashboards.len(), 1);
}
