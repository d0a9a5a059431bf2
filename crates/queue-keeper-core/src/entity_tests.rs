use super::*;
use crate::{EntityType, ProjectId, ProviderId};

fn provider(class: ProviderClass) -> Provider {
    Provider::new(ProjectId::new(), "primary".to_string(), class, serde_json::json!({}))
}

#[test]
fn provider_class_round_trips() {
    for class in [ProviderClass::GhOauth, ProviderClass::GhApp, ProviderClass::DockerHub] {
        let s = class.as_str();
        assert_eq!(ProviderClass::parse(s).unwrap(), class);
    }
    assert!(ProviderClass::parse("bogus").is_err());
}

#[test]
fn provider_auto_registration_defaults_to_disabled() {
    let p = provider(ProviderClass::GhApp);
    assert!(!p.auto_registers(EntityType::Repository));
}

#[test]
fn provider_auto_registration_reads_definition_blob() {
    let mut p = provider(ProviderClass::GhApp);
    p.definition = serde_json::json!({
        "auto_registration": { "entities": { "repository": { "enabled": true } } }
    });
    assert!(p.auto_registers(EntityType::Repository));
    assert!(!p.auto_registers(EntityType::Artifact));
}

#[test]
fn property_bag_round_trips_upstream_id() {
    let mut bag = PropertyBag::new();
    bag.set(UPSTREAM_ID_KEY, serde_json::json!(42));
    assert_eq!(bag.upstream_id(), Some(&serde_json::json!(42)));
    assert_eq!(bag.len(), 1);
}

#[test]
fn property_bag_from_iter_dedups_by_key() {
    let bag: PropertyBag = vec![
        Property { key: "a".to_string(), value: serde_json::json!(1) },
        Property { key: "a".to_string(), value: serde_json::json!(2) },
    ]
    .into_iter()
    .collect();
    assert_eq!(bag.len(), 1);
    assert_eq!(bag.get("a"), Some(&serde_json::json!(2)));
}

#[test]
fn cosign_tag_recovers_digest() {
    assert_eq!(
        cosign_tag_to_sha("sha256-abc123"),
        Some("sha256:abc123".to_string())
    );
    assert_eq!(cosign_tag_to_sha("v1.0"), None);
}

#[test]
fn signature_tag_detection() {
    assert!(is_signature_tag("sha256-deadbeef"));
    assert!(is_signature_tag("v1.sig"));
    assert!(!is_signature_tag("latest"));
}

#[test]
fn artifact_version_tags_are_canonically_sorted() {
    let tags = ArtifactVersion::canonicalize_tags(vec![
        "latest".to_string(),
        "alpha".to_string(),
        "alpha".to_string(),
    ]);
    assert_eq!(tags, vec!["alpha".to_string(), "latest".to_string()]);
}

#[test]
fn invitation_expires_after_seven_days() {
    let now = Timestamp::now();
    let fresh = Invitation {
        code: "abc".to_string(),
        project_id: ProjectId::new(),
        role: "viewer".to_string(),
        email: "a@example.com".to_string(),
        sponsor: UserRowId::new(),
        updated_at: now,
    };
    assert!(!fresh.is_expired(now));

    let stale = Invitation {
        updated_at: now.subtract_duration(std::time::Duration::from_secs(8 * 24 * 3600)),
        ..fresh
    };
    assert!(stale.is_expired(now));
}

#[test]
fn session_state_expires_after_ttl() {
    let state = SessionState::new(Some(ProjectId::new()), Some(8080), None);
    assert!(!state.is_expired(Timestamp::now()));
    let later = Timestamp::now().add_seconds(SessionState::TTL_SECONDS + 1);
    assert!(state.is_expired(later));
}

#[test]
fn installation_claim_requires_both_ids() {
    let mut inst = Installation {
        installation_id: 1,
        app_id: 2,
        organization_id: 3,
        provider_id: None,
        project_id: None,
        enrolling_user_id: "user-1".to_string(),
    };
    assert!(!inst.is_claimed());
    inst.provider_id = Some(ProviderId::new());
    inst.project_id = Some(ProjectId::new());
    assert!(inst.is_claimed());
}

#[test]
fn remediation_url_builds_pull_request_link() {
    let metadata = serde_json::json!({ "pr_number": 18 });
    let url = remediation_url("My-Example_1.0/Test_2", &metadata).unwrap();
    assert_eq!(url, "https://github.com/My-Example_1.0/Test_2/pull/18");
}

#[test]
fn remediation_url_rejects_invalid_slug() {
    let metadata = serde_json::json!({ "pr_number": 18 });
    assert!(remediation_url("example", &metadata).is_err());
}

#[test]
fn remediation_url_empty_metadata_yields_empty_string() {
    let metadata = serde_json::json!({});
    assert_eq!(remediation_url("example", &metadata).unwrap(), "");
}

#[test]
fn alert_url_builds_advisory_link() {
    let metadata = serde_json::json!({ "ghsa_id": "GHAS-advisory_ID_here" });
    let url = alert_url("example/test", &metadata).unwrap();
    assert_eq!(
        url,
        "https://github.com/example/test/security/advisories/GHAS-advisory_ID_here"
    );
}

#[test]
fn alert_url_missing_ghsa_id_yields_empty_string() {
    let metadata = serde_json::json!({});
    assert_eq!(alert_url("example/test", &metadata).unwrap(), "");
}

#[test]
fn alert_url_rejects_invalid_slug() {
    let metadata = serde_json::json!({ "ghsa_id": "GHAS-advisory_ID_here" });
    assert!(alert_url("example", &metadata).is_err());
}
