use super::*;
use crate::entity::ProjectMetadata;
use crate::entity_store::{InMemoryEntityStore, NoopDeregistrar};
use crate::identity::{AuthorizationError, Role};
use async_trait::async_trait;
use std::sync::Mutex;

fn ctx(project_id: ProjectId) -> EntityContext {
    EntityContext {
        project_id,
        provider_name: None,
    }
}

#[tokio::test]
async fn create_provider_rejects_duplicate_name() {
    let store = InMemoryEntityStore::new();
    let project = ProjectId::new();
    let request = CreateProviderRequest {
        name: "primary".into(),
        class: "gh-oauth".into(),
        config: serde_json::json!({}),
    };
    create_provider(&store, &ctx(project), request).await.unwrap();

    let dup = CreateProviderRequest {
        name: "primary".into(),
        class: "gh-oauth".into(),
        config: serde_json::json!({}),
    };
    let err = create_provider(&store, &ctx(project), dup).await.unwrap_err();
    assert!(matches!(err, RpcError::AlreadyExists(_)));
}

#[tokio::test]
async fn create_provider_rejects_dockerhub_without_namespace() {
    let store = InMemoryEntityStore::new();
    let request = CreateProviderRequest {
        name: "dh".into(),
        class: "dockerhub".into(),
        config: serde_json::json!({}),
    };
    let err = create_provider(&store, &ctx(ProjectId::new()), request)
        .await
        .unwrap_err();
    assert!(matches!(err, RpcError::InvalidArgument(_)));
}

#[tokio::test]
async fn create_provider_rejects_unknown_auto_registration_key() {
    let store = InMemoryEntityStore::new();
    let request = CreateProviderRequest {
        name: "app".into(),
        class: "gh-app".into(),
        config: serde_json::json!({"auto_registration": {"entities": {"artifact": {"enabled": true}}}}),
    };
    let err = create_provider(&store, &ctx(ProjectId::new()), request)
        .await
        .unwrap_err();
    assert!(matches!(err, RpcError::InvalidArgument(_)));
}

#[tokio::test]
async fn get_entity_by_id_enforces_tenant_isolation() {
    let store = InMemoryEntityStore::new();
    let owner_project = ProjectId::new();
    let entity = create_entity(
        &store,
        &ctx(owner_project),
        ProviderId::new(),
        EntityType::Repository,
        EntityIdentity::Name("acme/widgets".into()),
        None,
    )
    .await
    .unwrap();

    let other_project = ProjectId::new();
    let err = get_entity_by_id(&store, &ctx(other_project), entity.id)
        .await
        .unwrap_err();
    assert!(matches!(err, RpcError::NotFound(_)));

    let found = get_entity_by_id(&store, &ctx(owner_project), entity.id)
        .await
        .unwrap();
    assert_eq!(found.id, entity.id);
}

#[tokio::test]
async fn create_entity_rejects_unspecified_type() {
    let store = InMemoryEntityStore::new();
    let err = create_entity(
        &store,
        &ctx(ProjectId::new()),
        ProviderId::new(),
        EntityType::Unspecified,
        EntityIdentity::Name("x".into()),
        None,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, RpcError::InvalidArgument(_)));
}

#[tokio::test]
async fn create_entity_requires_upstream_id_property() {
    let store = InMemoryEntityStore::new();
    let err = create_entity(
        &store,
        &ctx(ProjectId::new()),
        ProviderId::new(),
        EntityType::Repository,
        EntityIdentity::Properties(vec![("is_private".into(), serde_json::json!(false))]),
        None,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, RpcError::InvalidArgument(_)));
}

#[tokio::test]
async fn list_entities_defaults_to_page_size_twenty() {
    let store = InMemoryEntityStore::new();
    let project = ProjectId::new();
    for i in 0..25 {
        create_entity(
            &store,
            &ctx(project),
            ProviderId::new(),
            EntityType::Repository,
            EntityIdentity::Name(format!("repo-{i}")),
            None,
        )
        .await
        .unwrap();
    }

    let page = list_entities(&store, &ctx(project), EntityType::Repository, None, None)
        .await
        .unwrap();
    assert_eq!(page.entities.len(), DEFAULT_PAGE_SIZE);
    assert!(page.next.is_some());

    let second = list_entities(
        &store,
        &ctx(project),
        EntityType::Repository,
        page.next,
        None,
    )
    .await
    .unwrap();
    assert_eq!(second.entities.len(), 5);
    assert!(second.next.is_none());
}

#[test]
fn validate_guidance_rejects_html() {
    let err = validate_guidance("<div>foo</div>").unwrap_err();
    assert!(matches!(err, RpcError::InvalidArgument(_)));
}

#[test]
fn validate_guidance_rejects_oversized_text() {
    let huge = "a".repeat(4097);
    let err = validate_guidance(&huge).unwrap_err();
    assert!(matches!(err, RpcError::InvalidArgument(_)));
}

#[test]
fn validate_guidance_accepts_plain_text() {
    validate_guidance("keep pull requests under 400 lines").unwrap();
}

#[test]
fn validate_guidance_bytes_rejects_invalid_utf8() {
    let err = validate_guidance_bytes(&[0xff, 0xfe, 0xfd]).unwrap_err();
    assert!(matches!(err, RpcError::InvalidArgument(_)));
}

#[tokio::test]
async fn resolve_invitation_rejects_expired() {
    let authz = RecordingAuthz::default();
    let sponsor = UserRowId::new();
    let accepter = UserRowId::new();
    let old = Invitation {
        code: "abc".into(),
        project_id: ProjectId::new(),
        role: "viewer".into(),
        email: "a@example.com".into(),
        sponsor,
        updated_at: Timestamp::now().add_seconds(0),
    };
    let ancient = Invitation {
        updated_at: old.updated_at.subtract_duration(std::time::Duration::from_secs(8 * 24 * 3600)),
        ..old
    };
    let err = resolve_invitation(&authz, ancient, accepter, true, Timestamp::now())
        .await
        .unwrap_err();
    assert!(matches!(err, RpcError::PermissionDenied(_)));
}

#[tokio::test]
async fn resolve_invitation_rejects_self_invite() {
    let authz = RecordingAuthz::default();
    let same = UserRowId::new();
    let invitation = Invitation {
        code: "abc".into(),
        project_id: ProjectId::new(),
        role: "viewer".into(),
        email: "a@example.com".into(),
        sponsor: same,
        updated_at: Timestamp::now(),
    };
    let err = resolve_invitation(&authz, invitation, same, true, Timestamp::now())
        .await
        .unwrap_err();
    assert!(matches!(err, RpcError::InvalidArgument(_)));
}

#[tokio::test]
async fn resolve_invitation_accept_assigns_role_after_revoke() {
    let authz = RecordingAuthz::default();
    let project = ProjectId::new();
    let invitation = Invitation {
        code: "abc".into(),
        project_id: project,
        role: "editor".into(),
        email: "a@example.com".into(),
        sponsor: UserRowId::new(),
        updated_at: Timestamp::now(),
    };
    resolve_invitation(&authz, invitation, UserRowId::new(), true, Timestamp::now())
        .await
        .unwrap();
    let calls = authz.calls.lock().unwrap();
    assert_eq!(calls.as_slice(), ["revoke", "assign:editor"]);
}

#[tokio::test]
async fn list_projects_skips_races_preserving_order() {
    let store = InMemoryEntityStore::new();
    let p1 = store
        .create_project(Project::new(None, ProjectMetadata::default()))
        .await
        .unwrap();
    let p2 = Project::new(None, ProjectMetadata::default());
    let p3 = store
        .create_project(Project::new(None, ProjectMetadata::default()))
        .await
        .unwrap();

    // p2 is authorized but was deleted from the store mid-iteration (never
    // created here), simulating the race in §8 property 6.
    let authz = ListingAuthz {
        ids: vec![p1.id, p2.id, p3.id],
    };
    let projects = list_projects(&store, &authz, "alice").await.unwrap();
    assert_eq!(projects.iter().map(|p| p.id).collect::<Vec<_>>(), vec![p1.id, p3.id]);
}

#[tokio::test]
async fn create_user_generates_default_project() {
    let store = InMemoryEntityStore::new();
    let (user, project_id) = create_user(&store, "subject-1", None, "alice").await.unwrap();
    assert_eq!(user.subject, "subject-1");
    assert!(project_id.is_some());
}

#[tokio::test]
async fn create_user_disambiguates_colliding_preferred_usernames() {
    // §8 property 14: two distinct self-enrollments for the same preferred
    // username must not collide on project display name.
    let store = InMemoryEntityStore::new();
    let (_, first_project) = create_user(&store, "subject-1", None, "alice").await.unwrap();
    let (_, second_project) = create_user(&store, "subject-2", None, "alice").await.unwrap();

    let first = store.get_project(first_project.unwrap()).await.unwrap().unwrap();
    let second = store.get_project(second_project.unwrap()).await.unwrap().unwrap();

    assert_eq!(first.metadata.display_name, "alice");
    assert_ne!(second.metadata.display_name, "alice");
    let suffix = second.metadata.display_name.strip_prefix("alice-").unwrap();
    assert_eq!(suffix.len(), 4);
    assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
}

#[tokio::test]
async fn create_user_claims_pending_installation_by_gh_id() {
    let store = InMemoryEntityStore::new();
    let pending = crate::entity::Installation {
        installation_id: 42,
        app_id: 1,
        organization_id: 7,
        provider_id: None,
        project_id: None,
        enrolling_user_id: "555".to_string(),
    };
    store.upsert_installation(pending).await.unwrap();

    let (_, project_id) = create_user(&store, "subject-1", Some(555), "alice").await.unwrap();

    let claimed = store.get_installation(42).await.unwrap().unwrap();
    assert!(claimed.is_claimed());
    assert_eq!(claimed.project_id, project_id);
}

#[tokio::test]
async fn delete_provider_returns_deleted_row() {
    let store = InMemoryEntityStore::new();
    let provider = create_provider(
        &store,
        &ctx(ProjectId::new()),
        CreateProviderRequest {
            name: "primary".into(),
            class: "gh-oauth".into(),
            config: serde_json::json!({}),
        },
    )
    .await
    .unwrap();

    let deregistrar = NoopDeregistrar;
    let deleted = delete_provider(&store, &deregistrar, provider.id).await.unwrap();
    assert_eq!(deleted.id, provider.id);
    assert!(store.get_provider(provider.id).await.unwrap().is_none());
}

#[derive(Default)]
struct RecordingAuthz {
    calls: Mutex<Vec<&'static str>>,
}

#[async_trait]
impl AuthorizationClient for RecordingAuthz {
    async fn check(&self, _subject: &str, _role: Role, _project_id: ProjectId) -> Result<bool, AuthorizationError> {
        Ok(true)
    }

    async fn assign_role(&self, _subject: &str, role: Role, _project_id: ProjectId) -> Result<(), AuthorizationError> {
        let label = match role {
            Role::Viewer => "assign:viewer",
            Role::Editor => "assign:editor",
            Role::Admin => "assign:admin",
        };
        self.calls.lock().unwrap().push(label);
        Ok(())
    }

    async fn revoke_all_roles(&self, _subject: &str, _project_id: ProjectId) -> Result<(), AuthorizationError> {
        self.calls.lock().unwrap().push("revoke");
        Ok(())
    }

    async fn projects_for_user(&self, _subject: &str) -> Result<Vec<ProjectId>, AuthorizationError> {
        Ok(Vec::new())
    }

    async fn subjects_for_project(&self, _project_id: ProjectId) -> Result<Vec<String>, AuthorizationError> {
        Ok(Vec::new())
    }

    async fn delete_user(&self, _subject: &str) -> Result<(), AuthorizationError> {
        Ok(())
    }
}

struct ListingAuthz {
    ids: Vec<ProjectId>,
}

#[async_trait]
impl AuthorizationClient for ListingAuthz {
    async fn check(&self, _subject: &str, _role: Role, _project_id: ProjectId) -> Result<bool, AuthorizationError> {
        Ok(true)
    }

    async fn assign_role(&self, _subject: &str, _role: Role, _project_id: ProjectId) -> Result<(), AuthorizationError> {
        Ok(())
    }

    async fn revoke_all_roles(&self, _subject: &str, _project_id: ProjectId) -> Result<(), AuthorizationError> {
        Ok(())
    }

    async fn projects_for_user(&self, _subject: &str) -> Result<Vec<ProjectId>, AuthorizationError> {
        Ok(self.ids.clone())
    }

    async fn subjects_for_project(&self, _project_id: ProjectId) -> Result<Vec<String>, AuthorizationError> {
        Ok(Vec::new())
    }

    async fn delete_user(&self, _subject: &str) -> Result<(), AuthorizationError> {
        Ok(())
    }
}
