use super::*;
use crate::entity::UPSTREAM_ID_KEY;
use crate::entity_store::InMemoryEntityStore;
use crate::ProviderId;

struct AllowAll;
#[async_trait::async_trait]
impl FeatureFlagClient for AllowAll {
    async fn is_enabled(&self, _project_id: ProjectId, _flag: &str) -> bool {
        true
    }
}

struct DenyAll;
#[async_trait::async_trait]
impl FeatureFlagClient for DenyAll {
    async fn is_enabled(&self, _project_id: ProjectId, _flag: &str) -> bool {
        false
    }
}

async fn seed_repo(store: &InMemoryEntityStore, upstream_id: i64, hook_id: Option<i64>) -> (ProjectId, Entity) {
    let project = ProjectId::new();
    let mut tx = store.begin().await.unwrap();
    let entity = tx
        .create_or_ensure_entity_by_id(
            crate::EntityId::new(),
            EntityType::Repository,
            "acme/widgets".into(),
            project,
            ProviderId::new(),
            None,
        )
        .await
        .unwrap();
    tx.upsert_property(entity.id, UPSTREAM_ID_KEY.into(), serde_json::json!(upstream_id))
        .await
        .unwrap();
    if let Some(hook_id) = hook_id {
        tx.upsert_property(entity.id, "hook_id".into(), serde_json::json!(hook_id))
            .await
            .unwrap();
    }
    tx.commit().await.unwrap();
    (project, entity)
}

#[tokio::test]
async fn resolve_not_found_when_no_entity_matches() {
    let store = InMemoryEntityStore::new();
    let flags = AllowAll;
    let resolver = RepositoryResolver::new(&store, &flags);
    let err = resolver
        .resolve(&serde_json::json!(999), false, None, &NoopRefresher)
        .await
        .unwrap_err();
    assert!(matches!(err, ResolverError::RepoNotFound));
}

#[tokio::test]
async fn resolve_private_without_feature_flag_is_rejected() {
    let store = InMemoryEntityStore::new();
    seed_repo(&store, 42, None).await;
    let flags = DenyAll;
    let resolver = RepositoryResolver::new(&store, &flags);
    let err = resolver
        .resolve(&serde_json::json!(42), true, None, &NoopRefresher)
        .await
        .unwrap_err();
    assert!(matches!(err, ResolverError::RepoIsPrivate));
}

#[tokio::test]
async fn resolve_private_with_feature_flag_succeeds() {
    let store = InMemoryEntityStore::new();
    seed_repo(&store, 42, None).await;
    let flags = AllowAll;
    let resolver = RepositoryResolver::new(&store, &flags);
    let resolution = resolver
        .resolve(&serde_json::json!(42), true, None, &NoopRefresher)
        .await
        .unwrap();
    assert_eq!(resolution.entity.name, "acme/widgets");
}

#[tokio::test]
async fn resolve_meta_event_rejects_stale_hook_id() {
    let store = InMemoryEntityStore::new();
    seed_repo(&store, 42, Some(123)).await;
    let flags = AllowAll;
    let resolver = RepositoryResolver::new(&store, &flags);
    let err = resolver
        .resolve(&serde_json::json!(42), false, Some(999), &NoopRefresher)
        .await
        .unwrap_err();
    assert!(matches!(err, ResolverError::NotHandled));
}

#[tokio::test]
async fn resolve_meta_event_accepts_matching_hook_id() {
    let store = InMemoryEntityStore::new();
    seed_repo(&store, 42, Some(123)).await;
    let flags = AllowAll;
    let resolver = RepositoryResolver::new(&store, &flags);
    let resolution = resolver
        .resolve(&serde_json::json!(42), false, Some(123), &NoopRefresher)
        .await
        .unwrap();
    assert_eq!(resolution.entity.name, "acme/widgets");
}

struct FailingRefresher;
#[async_trait::async_trait]
impl PropertyRefresher for FailingRefresher {
    async fn refresh(&self, _entity: &Entity) -> Result<HashMap<String, serde_json::Value>, ResolverError> {
        Err(ResolverError::RefreshFailed("upstream unavailable".into()))
    }
}

#[tokio::test]
async fn refresh_failure_is_fatal_on_evaluate_path() {
    let store = InMemoryEntityStore::new();
    seed_repo(&store, 42, None).await;
    let flags = AllowAll;
    let resolver = RepositoryResolver::new(&store, &flags);
    let err = resolver
        .resolve(&serde_json::json!(42), false, None, &FailingRefresher)
        .await
        .unwrap_err();
    assert!(matches!(err, ResolverError::RefreshFailed(_)));
}

#[tokio::test]
async fn refresh_failure_is_non_fatal_on_delete_path() {
    let store = InMemoryEntityStore::new();
    seed_repo(&store, 42, None).await;
    let flags = AllowAll;
    let resolver = RepositoryResolver::new(&store, &flags);
    let resolution = resolver
        .resolve_for_delete(&serde_json::json!(42), false, None, &FailingRefresher)
        .await
        .unwrap();
    assert!(resolution.properties.is_empty());
}
