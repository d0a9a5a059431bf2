use super::*;

#[test]
fn repository_and_meta_are_repo_relevant() {
    assert_eq!(classify_event("repository", Some("deleted")), EventFamily::RepoRelevant);
    assert_eq!(classify_event("meta", None), EventFamily::RepoRelevant);
}

#[test]
fn package_requires_published_action() {
    assert_eq!(classify_event("package", Some("published")), EventFamily::Package);
    assert_eq!(classify_event("package", Some("updated")), EventFamily::Ignored);
    assert_eq!(classify_event("package", None), EventFamily::Ignored);
}

#[test]
fn pull_request_family() {
    assert_eq!(classify_event("pull_request", Some("opened")), EventFamily::PullRequest);
}

#[test]
fn installation_families() {
    assert_eq!(classify_event("installation", Some("deleted")), EventFamily::Installation);
    assert_eq!(
        classify_event("installation_repositories", Some("added")),
        EventFamily::InstallationRepositories
    );
}

#[test]
fn ping_is_its_own_family() {
    assert_eq!(classify_event("ping", None), EventFamily::Ping);
}

#[test]
fn repo_other_events_are_distinguished_from_ignored() {
    assert_eq!(classify_event("push", None), EventFamily::RepoOther);
    assert_eq!(classify_event("team", Some("added_to_repository")), EventFamily::RepoOther);
    assert_eq!(classify_event("star", Some("created")), EventFamily::Ignored);
}
