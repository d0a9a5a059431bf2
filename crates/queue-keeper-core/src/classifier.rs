//! # Payload classifier (C2, spec §4.2)
//!
//! Assigns a fixed event family to every validated webhook delivery. This is
//! pure: no store or network access, just the `X-GitHub-Event` name plus the
//! payload's `action` field.

use serde::{Deserialize, Serialize};

/// The fixed event-family enumeration (§4.2 table).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventFamily {
    RepoRelevant,
    RepoOther,
    Package,
    PullRequest,
    Installation,
    InstallationRepositories,
    Ping,
    Ignored,
}

impl EventFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RepoRelevant => "repo-relevant",
            Self::RepoOther => "repo-other",
            Self::Package => "package",
            Self::PullRequest => "pull-request",
            Self::Installation => "installation",
            Self::InstallationRepositories => "installation-repositories",
            Self::Ping => "ping",
            Self::Ignored => "ignored",
        }
    }
}

/// Event types that only ever carry repository-metadata concerns, not a
/// change to an entity's own state (§4.2 "repo-other" triggers).
const REPO_OTHER_EVENTS: &[&str] = &[
    "push",
    "team",
    "branch_protection_rule",
    "secret_scanning_alert",
    "secret_scanning_alert_location",
    "repository_advisory",
    "repository_vulnerability_alert",
    "code_scanning_alert",
    "dependabot_alert",
    "deploy_key",
    "label",
    "milestone",
];

/// Classify a webhook delivery into its event family (§4.2).
///
/// `action` is the payload's top-level `action` field, when present.
pub fn classify_event(event_type: &str, action: Option<&str>) -> EventFamily {
    match event_type {
        "repository" | "meta" => EventFamily::RepoRelevant,
        "package" if action == Some("published") => EventFamily::Package,
        "package" => EventFamily::Ignored,
        "pull_request" => EventFamily::PullRequest,
        "installation" => EventFamily::Installation,
        "installation_repositories" => EventFamily::InstallationRepositories,
        "ping" => EventFamily::Ping,
        other if REPO_OTHER_EVENTS.contains(&other) => EventFamily::RepoOther,
        _ => EventFamily::Ignored,
    }
}

#[cfg(test)]
#[path = "classifier_tests.rs"]
mod tests;
