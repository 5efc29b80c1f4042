use super::*;
use crate::data::memory::MemoryBackend;

fn dashboard(name: &str) -> Dashboard {
    Dashboard { id: Uuid::new_v4(), user_id: Uuid::nil(), name: name.into(), created_at: 0, updated_at: 0 }
}

async fn setup() -> (Arc<MemoryBackend>, DashboardService, Uuid) {
    let backend = Arc::new(MemoryBackend::new());
    let service = DashboardService::new(backend.clone());
    (backend, service, Uuid::new_v4())
}

// =============================================================================
// DashboardSelection
// =============================================================================

#[test]
fn unset_selection_picks_first_on_load() {
    let list = [dashboard("a"), dashboard("b")];
    let mut selection = DashboardSelection::default();
    selection.on_loaded(&list);
    assert_eq!(selection.active(), Some(list[0].id));
}

#[test]
fn stale_selection_falls_back_to_first() {
    let list = [dashboard("a"), dashboard("b")];
    let mut selection = DashboardSelection::new(Some(Uuid::new_v4()));
    selection.on_loaded(&list);
    assert_eq!(selection.active(), Some(list[0].id));
}

#[test]
fn valid_selection_survives_reload() {
    let list = [dashboard("a"), dashboard("b")];
    let mut selection = DashboardSelection::new(Some(list[1].id));
    selection.on_loaded(&list);
    assert_eq!(selection.active(), Some(list[1].id));
}

#[test]
fn select_rejects_unknown_dashboard() {
    let list = [dashboard("a")];
    let mut selection = DashboardSelection::new(Some(list[0].id));
    assert!(matches!(selection.select(Uuid::new_v4(), &list), Err(AppError::NotFound(_))));
    assert_eq!(selection.active(), Some(list[0].id));
}

#[test]
fn deleting_inactive_dashboard_keeps_selection() {
    let list = [dashboard("a"), dashboard("b")];
    let mut selection = DashboardSelection::new(Some(list[0].id));
    selection.on_deleting(list[1].id, &list);
    assert_eq!(selection.active(), Some(list[0].id));
}

// =============================================================================
// DashboardService
// =============================================================================

#[tokio::test]
async fn list_creates_default_for_empty_account() {
    let (backend, service, user) = setup().await;
    let listed = service.list(user).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name, DEFAULT_DASHBOARD_NAME);

    service.list(user).await.unwrap();
    assert_eq!(backend.call_count("insert_dashboard"), 1);
}

#[tokio::test]
async fn create_trims_name_and_selects_it() {
    let (_backend, service, user) = setup().await;
    let mut selection = DashboardSelection::default();
    let created = service.create(user, "  Travel  ", &mut selection).await.unwrap();
    assert_eq!(created.name, "Travel");
    assert_eq!(selection.active(), Some(created.id));
}

#[tokio::test]
async fn blank_names_are_rejected_before_any_call() {
    let (backend, service, user) = setup().await;
    let mut selection = DashboardSelection::default();
    assert!(matches!(service.create(user, " \t", &mut selection).await, Err(AppError::Validation(_))));
    assert!(matches!(service.rename(user, Uuid::new_v4(), "").await, Err(AppError::Validation(_))));
    assert_eq!(backend.call_count("insert_dashboard"), 0);
    assert_eq!(backend.call_count("rename_dashboard"), 0);
    assert_eq!(selection.active(), None);
}

#[tokio::test]
async fn deleting_last_dashboard_is_refused_without_delete_call() {
    let (backend, service, user) = setup().await;
    let only = service.list(user).await.unwrap().remove(0);
    let mut selection = DashboardSelection::new(Some(only.id));

    let err = service.delete(user, only.id, &mut selection).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(backend.call_count("delete_dashboard"), 0);
    assert_eq!(selection.active(), Some(only.id));
}

#[tokio::test]
async fn deleting_active_dashboard_switches_selection() {
    let (_backend, service, user) = setup().await;
    let mut selection = DashboardSelection::default();
    let home = service.create(user, "Home", &mut selection).await.unwrap();
    let work = service.create(user, "Work", &mut selection).await.unwrap();
    assert_eq!(selection.active(), Some(work.id));

    service.delete(user, work.id, &mut selection).await.unwrap();
    assert_eq!(selection.active(), Some(home.id));
    let remaining: Vec<Uuid> = service.list(user).await.unwrap().iter().map(|d| d.id).collect();
    assert_eq!(remaining, [home.id]);
}

#[tokio::test]
async fn deleting_someone_elses_dashboard_is_not_found() {
    let (_backend, service, user) = setup().await;
    let mut selection = DashboardSelection::default();
    service.create(user, "Home", &mut selection).await.unwrap();
    service.create(user, "Work", &mut selection).await.unwrap();

    let other = service.list(Uuid::new_v4()).await.unwrap().remove(0);
    let err = service.delete(user, other.id, &mut selection).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn rename_keeps_identity() {
    let (_backend, service, user) = setup().await;
    let home = service.list(user).await.unwrap().remove(0);
    let renamed = service.rename(user, home.id, " Kitchen ").await.unwrap();
    assert_eq!(renamed.id, home.id);
    assert_eq!(renamed.name, "Kitchen");
}
