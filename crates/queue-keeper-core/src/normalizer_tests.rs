use super::*;
use crate::entity_store::InMemoryEntityStore;
use crate::ProjectId;
use std::collections::HashMap;

fn repo_entity() -> Entity {
    Entity::new(
        EntityType::Repository,
        "acme/widgets".to_string(),
        ProjectId::new(),
        ProviderId::new(),
        None,
    )
}

#[test]
fn repo_relevant_deleted_emits_reconcile_delete() {
    let entity = repo_entity();
    let item = normalize_repo_relevant(entity.clone(), "deleted", &HashMap::new());
    match item {
        WorkItem::EntityReconcileDelete { entity_id, .. } => assert_eq!(entity_id, entity.id),
        other => panic!("expected EntityReconcileDelete, got {other:?}"),
    }
}

#[test]
fn repo_relevant_transferred_emits_reconcile_delete() {
    let entity = repo_entity();
    let item = normalize_repo_relevant(entity, "transferred", &HashMap::new());
    assert!(matches!(item, WorkItem::EntityReconcileDelete { .. }));
}

#[test]
fn repo_relevant_other_action_emits_evaluate() {
    let entity = repo_entity();
    let item = normalize_repo_relevant(entity, "edited", &HashMap::new());
    assert!(matches!(item, WorkItem::EntityEvaluate { .. }));
}

#[test]
fn repo_other_always_emits_evaluate() {
    let entity = repo_entity();
    let item = normalize_repo_other(entity, &HashMap::new());
    assert!(matches!(item, WorkItem::EntityEvaluate { .. }));
}

#[tokio::test]
async fn package_published_upserts_version_and_evaluates() {
    let store = InMemoryEntityStore::new();
    let repo = repo_entity();
    let mut tx = store.begin().await.unwrap();
    tx.create_or_ensure_entity_by_id(
        repo.id,
        EntityType::Repository,
        repo.name.clone(),
        repo.project_id,
        repo.provider_id,
        None,
    )
    .await
    .unwrap();

    let item = normalize_package(
        tx.as_mut(),
        &repo,
        PackageEventInput {
            artifact_name: "widgets-image".into(),
            artifact_type: "container".into(),
            version_id: "v1".into(),
            primary_tag: "latest".into(),
            tags: vec!["latest".into()],
            sha: "sha256:abc".into(),
            created_at: Timestamp::now(),
        },
    )
    .await
    .unwrap();

    assert!(matches!(item, WorkItem::EntityEvaluate { entity_type: EntityType::Artifact, .. }));
}

#[tokio::test]
async fn package_signature_tag_looks_up_base_version() {
    let store = InMemoryEntityStore::new();
    let repo = repo_entity();
    let mut tx = store.begin().await.unwrap();
    tx.create_or_ensure_entity_by_id(
        repo.id,
        EntityType::Repository,
        repo.name.clone(),
        repo.project_id,
        repo.provider_id,
        None,
    )
    .await
    .unwrap();

    // Seed the base version first.
    normalize_package(
        tx.as_mut(),
        &repo,
        PackageEventInput {
            artifact_name: "widgets-image".into(),
            artifact_type: "container".into(),
            version_id: "v1".into(),
            primary_tag: "latest".into(),
            tags: vec!["latest".into()],
            sha: "sha256:abc".into(),
            created_at: Timestamp::now(),
        },
    )
    .await
    .unwrap();

    let item = normalize_package(
        tx.as_mut(),
        &repo,
        PackageEventInput {
            artifact_name: "widgets-image".into(),
            artifact_type: "container".into(),
            version_id: "sig-v1".into(),
            primary_tag: "sha256-abc".into(),
            tags: vec!["sha256-abc".into()],
            sha: "sha256:zzz".into(),
            created_at: Timestamp::now(),
        },
    )
    .await
    .unwrap();

    assert!(matches!(item, WorkItem::EntityEvaluate { .. }));
}

#[tokio::test]
async fn package_signature_tag_not_found_is_artifact_not_found() {
    let store = InMemoryEntityStore::new();
    let repo = repo_entity();
    let mut tx = store.begin().await.unwrap();
    tx.create_or_ensure_entity_by_id(
        repo.id,
        EntityType::Repository,
        repo.name.clone(),
        repo.project_id,
        repo.provider_id,
        None,
    )
    .await
    .unwrap();

    let err = normalize_package(
        tx.as_mut(),
        &repo,
        PackageEventInput {
            artifact_name: "widgets-image".into(),
            artifact_type: "container".into(),
            version_id: "sig-v1".into(),
            primary_tag: "sha256-missing".into(),
            tags: vec!["sha256-missing".into()],
            sha: "sha256:zzz".into(),
            created_at: Timestamp::now(),
        },
    )
    .await
    .unwrap_err();

    assert!(matches!(err, NormalizerError::ArtifactNotFound));
}

#[tokio::test]
async fn pull_request_synchronize_does_not_duplicate_entity() {
    let store = InMemoryEntityStore::new();
    let repo = repo_entity();
    let mut tx = store.begin().await.unwrap();
    tx.create_or_ensure_entity_by_id(
        repo.id,
        EntityType::Repository,
        repo.name.clone(),
        repo.project_id,
        repo.provider_id,
        None,
    )
    .await
    .unwrap();

    let first = normalize_pull_request_upsert(tx.as_mut(), &repo, 18, repo.provider_id, HashMap::new())
        .await
        .unwrap();
    let second = normalize_pull_request_upsert(tx.as_mut(), &repo, 18, repo.provider_id, HashMap::new())
        .await
        .unwrap();

    let first_id = match first {
        WorkItem::EntityEvaluate { entity_id, .. } => entity_id,
        _ => panic!("expected evaluate"),
    };
    let second_id = match second {
        WorkItem::EntityEvaluate { entity_id, .. } => entity_id,
        _ => panic!("expected evaluate"),
    };
    assert_eq!(first_id, second_id);
}

#[tokio::test]
async fn pull_request_closed_removes_row_and_entity() {
    let store = InMemoryEntityStore::new();
    let repo = repo_entity();
    let mut tx = store.begin().await.unwrap();
    tx.create_or_ensure_entity_by_id(
        repo.id,
        EntityType::Repository,
        repo.name.clone(),
        repo.project_id,
        repo.provider_id,
        None,
    )
    .await
    .unwrap();

    normalize_pull_request_upsert(tx.as_mut(), &repo, 18, repo.provider_id, HashMap::new())
        .await
        .unwrap();
    normalize_pull_request_closed(tx.as_mut(), &repo, 18).await.unwrap();

    assert!(tx.get_pull_request(repo.id, 18).await.unwrap().is_none());

    // Closing again is a no-op (§8 property 5).
    normalize_pull_request_closed(tx.as_mut(), &repo, 18).await.unwrap();
}

#[test]
fn installation_deleted_carries_installation_id() {
    let item = normalize_installation_deleted(42);
    match item {
        WorkItem::InstallationLifecycle { class, payload } => {
            assert_eq!(class, ProviderClass::GhApp);
            assert_eq!(payload["installation_id"], 42);
        }
        other => panic!("expected InstallationLifecycle, got {other:?}"),
    }
}
