// GENERATED FROM: github-bot-sdk-specs/interfaces/additional-operations.md (Workflow section)
// Workflow and workflow run operations for GitHub API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::client::InstallationClient;
use crate::error::ApiError;

/// GitHub Actions workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    /// Unique workflow identifier
    pub id: u64,

    /// Node ID for GraphQL API
    pub node_id: String,

    /// Workflow name
    pub name: String,

    /// Workflow file path
    pub path: String,

    /// Workflow state
    pub state: String, // "active", "disabled_manually", "disabled_inactivity"

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,

    /// Workflow URL
    pub url: String,

    /// Workflow HTML URL
    pub html_url: String,

    /// Workflow badge URL
    pub badge_url: String,
}

/// GitHub Actions workflow run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowRun {
    /// Unique workflow run identifier
    pub id: u64,

    /// Node ID for GraphQL API
    pub node_id: String,

    /// Workflow run name
    pub name: String,

    /// Workflow run number
    pub run_number: u64,

    /// Event that triggered the workflow
    pub event: String,

    /// Workflow run status
    pub status: String, // "queued", "in_progress", "completed"

    /// Workflow run conclusion (if completed)
    pub conclusion: Option<String>, // "success", "failure", "cancelled", "skipped", etc.

    /// Workflow ID
    pub workflow_id: u64,

    /// Head branch
    pub head_branch: String,

    /// Head commit SHA
    pub head_sha: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,

    /// Workflow run URL
    pub url: String,

    /// Workflow run HTML URL
    pub html_url: String,
}

/// Request to trigger a workflow.
#[derive(Debug, Clone, Serialize)]
pub struct TriggerWorkflowRequest {
    /// Git reference (branch or tag)
    #[serde(rename = "ref")]
    pub git_ref: String,

    /// Workflow inputs (key-value pairs)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inputs: Option<std::collections::HashMap<String, String>>,
}

impl InstallationClient {
    // ========================================================================
    // Workflow Operations
    // ========================================================================

    /// List workflows in a repository.
    pub async fn list_workflows(&self, owner: &str, repo: &str) -> Result<Vec<Workflow>, ApiError> {
        #[derive(Deserialize)]
        struct Page {
            workflows: Vec<Workflow>,
        }
        let path = format!("/repos/{}/{}/actions/workflows", owner, repo);
        let page: Page = Self::parse_response(self.get(&path).await?).await?;
        Ok(page.workflows)
    }

    /// Get a specific workflow by ID.
    pub async fn get_workflow(
        &self,
        owner: &str,
        repo: &str,
        workflow_id: u64,
    ) -> Result<Workflow, ApiError> {
        let path = format!("/repos/{}/{}/actions/workflows/{}", owner, repo, workflow_id);
        Self::parse_response(self.get(&path).await?).await
    }

    /// Trigger a workflow run.
    pub async fn trigger_workflow(
        &self,
        owner: &str,
        repo: &str,
        workflow_id: u64,
        request: TriggerWorkflowRequest,
    ) -> Result<(), ApiError> {
        let path = format!(
            "/repos/{}/{}/actions/workflows/{}/dispatches",
            owner, repo, workflow_id
        );
        let response = self.post(&path, &request).await?;
        Self::expect_no_content(response).await
    }

    // ========================================================================
    // Workflow Run Operations
    // ========================================================================

    /// List workflow runs for a workflow.
    pub async fn list_workflow_runs(
        &self,
        owner: &str,
        repo: &str,
        workflow_id: u64,
    ) -> Result<Vec<WorkflowRun>, ApiError> {
        #[derive(Deserialize)]
        struct Page {
            workflow_runs: Vec<WorkflowRun>,
        }
        let path = format!(
            "/repos/{}/{}/actions/workflows/{}/runs",
            owner, repo, workflow_id
        );
        let page: Page = Self::parse_response(self.get(&path).await?).await?;
        Ok(page.workflow_runs)
    }

    /// Get a specific workflow run by ID.
    pub async fn get_workflow_run(
        &self,
        owner: &str,
        repo: &str,
        run_id: u64,
    ) -> Result<WorkflowRun, ApiError> {
        let path = format!("/repos/{}/{}/actions/runs/{}", owner, repo, run_id);
        Self::parse_response(self.get(&path).await?).await
    }

    /// Cancel a workflow run.
    pub async fn cancel_workflow_run(
        &self,
        owner: &str,
        repo: &str,
        run_id: u64,
    ) -> Result<(), ApiError> {
        let path = format!("/repos/{}/{}/actions/runs/{}/cancel", owner, repo, run_id);
        let response = self.post(&path, &serde_json::json!({})).await?;
        Self::expect_no_content(response).await
    }

    /// Re-run a workflow run.
    pub async fn rerun_workflow_run(
        &self,
        owner: &str,
        repo: &str,
        run_id: u64,
    ) -> Result<(), ApiError> {
        let path = format!("/repos/{}/{}/actions/runs/{}/rerun", owner, repo, run_id);
        let response = self.post(&path, &serde_json::json!({})).await?;
        Self::expect_no_content(response).await
    }

    async fn expect_no_content(response: reqwest::Response) -> Result<(), ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        Err(Self::status_to_error(status, response).await)
    }
}

#[cfg(test)]
#[path = "workflow_tests.rs"]
mod tests;
