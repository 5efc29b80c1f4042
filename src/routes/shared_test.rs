use reqwest::StatusCode as Status;
use serde_json::{Value, json};

use crate::model::Tile;
use crate::routes::dashboards::DashboardsResponse;
use crate::routes::test_support::{signed_up, spawn_app};
use crate::state::test_helpers::test_app_state;

async fn seeded() -> (String, String, uuid::Uuid, Vec<Tile>) {
    let (state, _) = test_app_state();
    let base = spawn_app(state).await;
    let token = signed_up(&base, "a@x.test").await;
    let client = reqwest::Client::new();
    let listed: DashboardsResponse = client
        .get(format!("{base}/api/dashboards"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let dashboard = listed.dashboards[0].id;

    let mut tiles = Vec::new();
    for (title, content) in [("One", "<b>bold</b> text"), ("Two", "<script>x()</script>two")] {
        let tile: Tile = client
            .post(format!("{base}/api/dashboards/{dashboard}/tiles"))
            .bearer_auth(&token)
            .json(&json!({ "title": title, "content": content }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        tiles.push(tile);
    }
    (base, token, dashboard, tiles)
}

#[tokio::test]
async fn share_link_round_trip_is_public_and_immutable() {
    let (base, token, dashboard, tiles) = seeded().await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{base}/api/shares"))
        .bearer_auth(&token)
        .header("origin", "https://tiles.example")
        .json(&json!({ "dashboard_id": dashboard, "tile_ids": [tiles[1].id, tiles[0].id], "name": " " }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), Status::CREATED);
    let link: Value = res.json().await.unwrap();
    let share_token = link["share_token"].as_str().unwrap();
    assert_eq!(link["url"], format!("https://tiles.example/shared/{share_token}"));
    assert_eq!(link["name"], "Shared collection");
    assert_eq!(link["tile_count"], 2);

    // Editing the source tile does not reach the snapshot.
    client
        .patch(format!("{base}/api/tiles/{}", tiles[0].id))
        .bearer_auth(&token)
        .json(&json!({ "title": "Changed" }))
        .send()
        .await
        .unwrap();

    let view: Value = reqwest::get(format!("{base}/api/shared/{share_token}"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(view["tiles"][0]["title"], "One");
    assert_eq!(view["tiles"][1]["title"], "Two");
    assert_eq!(view["tiles"][0]["text"], "bold text");
    assert!(view.get("share_token").is_none());
}

#[tokio::test]
async fn empty_selection_is_rejected() {
    let (base, token, dashboard, _) = seeded().await;
    let res = reqwest::Client::new()
        .post(format!("{base}/api/shares"))
        .bearer_auth(&token)
        .json(&json!({ "dashboard_id": dashboard, "tile_ids": [] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), Status::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn unknown_token_is_not_found() {
    let (state, _) = test_app_state();
    let base = spawn_app(state).await;
    let res = reqwest::get(format!("{base}/api/shared/nope")).await.unwrap();
    assert_eq!(res.status(), Status::NOT_FOUND);
}

#[tokio::test]
async fn share_falls_back_to_public_origin() {
    let (base, token, dashboard, tiles) = seeded().await;
    let link: Value = reqwest::Client::new()
        .post(format!("{base}/api/shares"))
        .bearer_auth(&token)
        .json(&json!({ "dashboard_id": dashboard, "tile_ids": [tiles[0].id], "expires_in_hours": 24 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(link["url"].as_str().unwrap().starts_with("http://localhost:3000/shared/"));
    assert!(link["expires_at"].is_i64());
}
