use super::*;
use crate::model::TileColor;

fn new_tile(dashboard_id: Uuid, title: &str, order_index: i32) -> NewTile {
    NewTile { dashboard_id, title: title.into(), content: "c".into(), color: TileColor::Blue, order_index }
}

#[tokio::test]
async fn dashboards_list_in_creation_order_per_user() {
    let backend = MemoryBackend::new();
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    backend.insert_dashboard(alice, "first").await.unwrap();
    backend.insert_dashboard(bob, "other").await.unwrap();
    backend.insert_dashboard(alice, "second").await.unwrap();

    let names: Vec<String> = backend
        .list_dashboards(alice)
        .await
        .unwrap()
        .into_iter()
        .map(|d| d.name)
        .collect();
    assert_eq!(names, ["first", "second"]);
}

#[tokio::test]
async fn tiles_are_scoped_to_owner() {
    let backend = MemoryBackend::new();
    let alice = Uuid::new_v4();
    let mallory = Uuid::new_v4();
    let dashboard = backend.insert_dashboard(alice, "d").await.unwrap();
    let tiles = backend
        .insert_tiles(alice, &[new_tile(dashboard.id, "a", 0)])
        .await
        .unwrap();

    let err = backend.get_tile(mallory, tiles[0].id).await.unwrap_err();
    assert!(matches!(err, DataError::NotFound(_)));
    let err = backend.delete_tile(mallory, tiles[0].id).await.unwrap_err();
    assert!(matches!(err, DataError::NotFound(_)));
    let err = backend
        .insert_tiles(mallory, &[new_tile(dashboard.id, "x", 1)])
        .await
        .unwrap_err();
    assert!(matches!(err, DataError::NotFound(_)));
}

#[tokio::test]
async fn list_tiles_sorts_by_order_index() {
    let backend = MemoryBackend::new();
    let user = Uuid::new_v4();
    let dashboard = backend.insert_dashboard(user, "d").await.unwrap();
    backend
        .insert_tiles(user, &[new_tile(dashboard.id, "late", 5), new_tile(dashboard.id, "early", 1)])
        .await
        .unwrap();

    let titles: Vec<String> = backend
        .list_tiles(user, dashboard.id)
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.title)
        .collect();
    assert_eq!(titles, ["early", "late"]);
}

#[tokio::test]
async fn deleting_dashboard_cascades_to_tiles() {
    let backend = MemoryBackend::new();
    let user = Uuid::new_v4();
    let dashboard = backend.insert_dashboard(user, "d").await.unwrap();
    let tiles = backend
        .insert_tiles(user, &[new_tile(dashboard.id, "a", 0)])
        .await
        .unwrap();

    backend.delete_dashboard(user, dashboard.id).await.unwrap();
    assert!(matches!(backend.get_tile(user, tiles[0].id).await, Err(DataError::NotFound(_))));
}

#[tokio::test]
async fn injected_failure_applies_after_successes() {
    let backend = MemoryBackend::new();
    let user = Uuid::new_v4();
    backend.fail_after("insert_dashboard", 1);

    assert!(backend.insert_dashboard(user, "ok").await.is_ok());
    assert!(matches!(backend.insert_dashboard(user, "boom").await, Err(DataError::Backend(_))));
    assert_eq!(backend.call_count("insert_dashboard"), 2);

    backend.clear_failures();
    assert!(backend.insert_dashboard(user, "ok again").await.is_ok());
}

#[tokio::test]
async fn shared_collection_token_is_minted_and_looked_up() {
    let backend = MemoryBackend::new();
    let user = Uuid::new_v4();
    let created = backend
        .insert_shared_collection(
            user,
            NewSharedCollection { name: "n".into(), tiles: Vec::new(), expires_at: None },
        )
        .await
        .unwrap();
    assert_eq!(created.share_token.len(), 64);

    let found = backend
        .shared_collection_by_token(&created.share_token)
        .await
        .unwrap();
    assert_eq!(found, Some(created));
    assert!(backend.shared_collection_by_token("nope").await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_email_conflicts() {
    let backend = MemoryBackend::new();
    backend.create_user("a@example.com", "h").await.unwrap();
    let err = backend.create_user("a@example.com", "h").await.unwrap_err();
    assert!(matches!(err, DataError::Conflict(_)));
}

#[tokio::test]
async fn sessions_expire_and_resets_are_single_use() {
    let backend = MemoryBackend::new();
    let user = backend.create_user("a@example.com", "h").await.unwrap();

    backend.create_session(user.id, "tok", 1_000).await.unwrap();
    assert!(backend.session_user("tok", 999).await.unwrap().is_some());
    assert!(backend.session_user("tok", 1_000).await.unwrap().is_none());

    backend.create_password_reset(user.id, "hash", 5_000).await.unwrap();
    assert_eq!(backend.consume_password_reset("hash", 10).await.unwrap(), Some(user.id));
    assert_eq!(backend.consume_password_reset("hash", 10).await.unwrap(), None);
}
