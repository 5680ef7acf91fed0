//! GitHub REST implementation of [`SprintGateway`]
//!
//! Uses the classic projects API (`inertia` preview) for boards and the issue
//! timeline API (`mockingbird` preview) for events.
//!
//! ## Authentication
//!
//! The access token is sent as `Authorization: token <token>` and never
//! inspected otherwise. Without a token only public repositories are visible
//! and GitHub allows 60 requests/hour, far less than one run of a large board
//! needs.
//!
//! ## Retries
//!
//! Requests are not retried here. A non-2xx status surfaces as
//! [`GatewayError::Status`] and the caller decides whether the task degrades.

mod records;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use serde::de::DeserializeOwned;

use super::{PAGE_SIZE, SprintGateway};
use crate::error::{GatewayError, ModelError};
use crate::models::{
    Card, Column, Commit, Event, Issue, Project, PullRequest, PullRequestStats, Repository,
    Review,
};
use records::{
    GitHubCard, GitHubColumn, GitHubComparison, GitHubIssue, GitHubProject, GitHubPullRequest,
    GitHubPullRequestStats, GitHubRefObject, GitHubReview, GitHubTimelineEvent,
};

/// Default GitHub REST endpoint
pub const GITHUB_API_URL: &str = "https://api.github.com";

const PROJECTS_PREVIEW: &str = "application/vnd.github.inertia-preview+json";
const TIMELINE_PREVIEW: &str = "application/vnd.github.mockingbird-preview+json";
const CLIENT_USER_AGENT: &str = "ghsprint/0.1.0 (https://github.com/tacogips/ghsprint)";

/// GitHub REST client for the sprint pipeline
#[derive(Debug, Clone)]
pub struct GithubGateway {
    client: Client,
    github_token: Option<String>,
    base_url: String,
}

impl GithubGateway {
    pub fn new(client: Client, github_token: Option<String>) -> Self {
        Self::with_base_url(client, github_token, GITHUB_API_URL)
    }

    /// Creates a gateway talking to another endpoint, e.g. GitHub Enterprise or a test server
    pub fn with_base_url(
        client: Client,
        github_token: Option<String>,
        base_url: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        GithubGateway {
            client,
            github_token,
            base_url,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Performs one GET round trip and decodes the JSON body
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        accept: &str,
    ) -> Result<(String, T), GatewayError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("GET {}", url);

        let mut req_builder = self
            .client
            .get(&url)
            .header(USER_AGENT, CLIENT_USER_AGENT)
            .header(ACCEPT, accept);

        if let Some(token) = self.github_token.as_ref() {
            req_builder = req_builder.header(AUTHORIZATION, format!("token {}", token));
        }

        let response = req_builder
            .send()
            .await
            .map_err(|source| GatewayError::Request {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = match response.text().await {
                Ok(text) => text,
                Err(_) => "Unknown error".to_string(),
            };
            return Err(GatewayError::Status {
                url,
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|source| GatewayError::Request {
                url: url.clone(),
                source,
            })?;
        let decoded =
            serde_json::from_slice(&bytes).map_err(|source| GatewayError::Decode {
                url: url.clone(),
                source,
            })?;
        Ok((url, decoded))
    }
}

fn invalid_record(url: &str) -> impl Fn(ModelError) -> GatewayError + '_ {
    move |source| GatewayError::InvalidRecord {
        url: url.to_string(),
        source,
    }
}

#[async_trait]
impl SprintGateway for GithubGateway {
    async fn list_projects(&self, repo: &Repository) -> Result<Vec<Project>, GatewayError> {
        let path = format!("/repos/{}/{}/projects", repo.owner, repo.name);
        let (_, projects): (_, Vec<GitHubProject>) =
            self.get_json(&path, PROJECTS_PREVIEW).await?;
        Ok(projects.into_iter().map(GitHubProject::into_model).collect())
    }

    async fn list_columns(&self, project_id: u64) -> Result<Vec<Column>, GatewayError> {
        let path = format!("/projects/{}/columns?per_page={}", project_id, PAGE_SIZE);
        let (_, columns): (_, Vec<GitHubColumn>) =
            self.get_json(&path, PROJECTS_PREVIEW).await?;
        Ok(columns
            .into_iter()
            .map(|column| column.into_model(project_id))
            .collect())
    }

    async fn list_cards(&self, column: &Column) -> Result<Vec<Card>, GatewayError> {
        let path = format!(
            "/projects/columns/{}/cards?per_page={}",
            column.id, PAGE_SIZE
        );
        let (url, cards): (_, Vec<GitHubCard>) = self.get_json(&path, PROJECTS_PREVIEW).await?;
        cards
            .into_iter()
            .map(|card| card.into_model(column))
            .collect::<Result<_, _>>()
            .map_err(invalid_record(&url))
    }

    async fn list_issue_events(
        &self,
        repo: &Repository,
        issue_number: u64,
    ) -> Result<Vec<Event>, GatewayError> {
        let path = format!(
            "/repos/{}/{}/issues/{}/timeline?per_page={}",
            repo.owner, repo.name, issue_number, PAGE_SIZE
        );
        let (url, entries): (_, Vec<GitHubTimelineEvent>) =
            self.get_json(&path, TIMELINE_PREVIEW).await?;
        let mut events = Vec::new();
        for entry in entries {
            if let Some(event) = entry.into_model().map_err(invalid_record(&url))? {
                events.push(event);
            }
        }
        Ok(events)
    }

    async fn list_issues(&self, repo: &Repository) -> Result<Vec<Issue>, GatewayError> {
        let path = format!(
            "/repos/{}/{}/issues?per_page={}",
            repo.owner, repo.name, PAGE_SIZE
        );
        let (_, issues): (_, Vec<GitHubIssue>) = self.get_json(&path, PROJECTS_PREVIEW).await?;
        Ok(issues
            .into_iter()
            .map(|issue| issue.into_model(repo))
            .collect())
    }

    async fn get_issue(
        &self,
        repo: &Repository,
        issue_number: u64,
    ) -> Result<Issue, GatewayError> {
        let path = format!("/repos/{}/{}/issues/{}", repo.owner, repo.name, issue_number);
        let (_, issue): (_, GitHubIssue) = self.get_json(&path, PROJECTS_PREVIEW).await?;
        Ok(issue.into_model(repo))
    }

    async fn list_pull_requests(
        &self,
        repo: &Repository,
    ) -> Result<Vec<PullRequest>, GatewayError> {
        let path = format!(
            "/repos/{}/{}/pulls?state=all&sort=updated&direction=desc&per_page={}",
            repo.owner, repo.name, PAGE_SIZE
        );
        let (_, pulls): (_, Vec<GitHubPullRequest>) =
            self.get_json(&path, PROJECTS_PREVIEW).await?;
        Ok(pulls.into_iter().map(|pull| pull.into_model(repo)).collect())
    }

    async fn get_pull_request(
        &self,
        repo: &Repository,
        number: u64,
    ) -> Result<PullRequest, GatewayError> {
        let path = format!("/repos/{}/{}/pulls/{}", repo.owner, repo.name, number);
        let (_, pull): (_, GitHubPullRequest) = self.get_json(&path, PROJECTS_PREVIEW).await?;
        Ok(pull.into_model(repo))
    }

    async fn list_reviews(
        &self,
        repo: &Repository,
        number: u64,
    ) -> Result<Vec<Review>, GatewayError> {
        let path = format!(
            "/repos/{}/{}/pulls/{}/reviews?per_page={}",
            repo.owner, repo.name, number, PAGE_SIZE
        );
        let (url, reviews): (_, Vec<GitHubReview>) =
            self.get_json(&path, PROJECTS_PREVIEW).await?;
        reviews
            .into_iter()
            .map(GitHubReview::into_model)
            .collect::<Result<_, _>>()
            .map_err(invalid_record(&url))
    }

    async fn get_pull_request_stats(
        &self,
        repo: &Repository,
        number: u64,
    ) -> Result<PullRequestStats, GatewayError> {
        let path = format!("/repos/{}/{}/pulls/{}", repo.owner, repo.name, number);
        let (_, stats): (_, GitHubPullRequestStats) =
            self.get_json(&path, PROJECTS_PREVIEW).await?;
        Ok(stats.into_model())
    }

    async fn get_tag_sha(&self, repo: &Repository, tag: &str) -> Result<String, GatewayError> {
        let path = format!("/repos/{}/{}/git/ref/tags/{}", repo.owner, repo.name, tag);
        let (_, reference): (_, GitHubRefObject) = self.get_json(&path, PROJECTS_PREVIEW).await?;
        Ok(reference.sha())
    }

    async fn get_branch_sha(
        &self,
        repo: &Repository,
        branch: &str,
    ) -> Result<String, GatewayError> {
        let path = format!("/repos/{}/{}/git/ref/heads/{}", repo.owner, repo.name, branch);
        let (_, reference): (_, GitHubRefObject) = self.get_json(&path, PROJECTS_PREVIEW).await?;
        Ok(reference.sha())
    }

    async fn compare_commits(
        &self,
        repo: &Repository,
        base: &str,
        head: &str,
    ) -> Result<Vec<Commit>, GatewayError> {
        let path = format!(
            "/repos/{}/{}/compare/{}...{}",
            repo.owner, repo.name, base, head
        );
        let (_, comparison): (_, GitHubComparison) =
            self.get_json(&path, PROJECTS_PREVIEW).await?;
        Ok(comparison.into_commits())
    }
}
