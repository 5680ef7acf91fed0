//! GitHub-specific response records
//!
//! These mirror the JSON the REST API returns and stay private to the
//! gateway. Each record converts into a domain model, rejecting records that
//! lack a field the model needs.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::ModelError;
use crate::models::{
    Card, Column, Commit, CrossReference, Event, EventKind, Issue, IssueState, Project,
    PullRequest, PullRequestInfo, PullRequestStats, Repository, Review, ReviewState,
};

#[derive(Debug, Deserialize)]
pub(super) struct GitHubProject {
    id: u64,
    name: String,
}

impl GitHubProject {
    pub(super) fn into_model(self) -> Project {
        Project {
            id: self.id,
            name: self.name,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct GitHubColumn {
    id: u64,
    name: String,
}

impl GitHubColumn {
    pub(super) fn into_model(self, project_id: u64) -> Column {
        Column {
            id: self.id,
            project_id,
            name: self.name,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct GitHubCard {
    id: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    content_url: Option<String>,
}

impl GitHubCard {
    pub(super) fn into_model(self, column: &Column) -> Result<Card, ModelError> {
        Card::new(
            column,
            self.id,
            self.created_at,
            self.updated_at,
            self.content_url,
        )
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct GitHubUser {
    login: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct GitHubLabel {
    name: String,
}

fn label_names(labels: Vec<GitHubLabel>) -> Vec<String> {
    labels.into_iter().map(|label| label.name).collect()
}

/// One entry of an issue timeline
///
/// Timeline entries of other kinds (commits, comments, ...) lack most of these
/// fields, so everything is optional until the kind is known.
#[derive(Debug, Deserialize)]
pub(super) struct GitHubTimelineEvent {
    id: Option<u64>,
    event: Option<String>,
    created_at: Option<DateTime<Utc>>,
    label: Option<GitHubLabel>,
    assignee: Option<GitHubUser>,
    source: Option<GitHubEventSource>,
}

#[derive(Debug, Deserialize)]
pub(super) struct GitHubEventSource {
    issue: Option<GitHubSourceIssue>,
}

#[derive(Debug, Deserialize)]
pub(super) struct GitHubSourceIssue {
    number: u64,
    repository_url: String,
    title: Option<String>,
    state: Option<String>,
    body: Option<String>,
    pull_request: Option<serde_json::Value>,
}

impl GitHubTimelineEvent {
    /// Converts an entry of a tracked kind, `Ok(None)` for every other kind
    pub(super) fn into_model(self) -> Result<Option<Event>, ModelError> {
        let Some(kind) = self
            .event
            .as_deref()
            .and_then(|name| name.parse::<EventKind>().ok())
        else {
            return Ok(None);
        };
        let created_at = self.created_at.ok_or(ModelError::MissingField {
            record: "timeline event",
            field: "created_at",
        })?;

        let mut event = Event::new(created_at, kind);
        if let Some(id) = self.id {
            event = event.with_id(id);
        }
        if let Some(label) = self.label {
            event = event.with_label(label.name);
        }
        if let Some(assignee) = self.assignee {
            event = event.with_assignee(assignee.login);
        }
        if let Some(issue) = self.source.and_then(|source| source.issue) {
            event = event.with_source(CrossReference {
                repository: Repository::from_repository_url(&issue.repository_url)?,
                number: issue.number,
                title: issue.title,
                state: IssueState::parse(issue.state.as_deref()),
                is_pull_request: issue.pull_request.is_some(),
                body: issue.body,
            });
        }
        Ok(Some(event))
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct GitHubIssue {
    id: u64,
    number: u64,
    title: Option<String>,
    html_url: Option<String>,
    closed_at: Option<DateTime<Utc>>,
    state: Option<String>,
    #[serde(default)]
    assignees: Vec<GitHubUser>,
    #[serde(default)]
    labels: Vec<GitHubLabel>,
}

impl GitHubIssue {
    pub(super) fn into_model(self, repository: &Repository) -> Issue {
        Issue {
            repository: repository.clone(),
            id: Some(self.id),
            number: self.number,
            title: self.title,
            url: self.html_url,
            closed_at: self.closed_at,
            state: IssueState::parse(self.state.as_deref()),
            assignees: self
                .assignees
                .into_iter()
                .map(|user| user.login)
                .collect(),
            labels: label_names(self.labels),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct GitHubPullRequest {
    id: u64,
    number: u64,
    title: String,
    state: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    merged_at: Option<DateTime<Utc>>,
    html_url: String,
    body: Option<String>,
    merge_commit_sha: Option<String>,
    user: Option<GitHubUser>,
    #[serde(default)]
    labels: Vec<GitHubLabel>,
    #[serde(default)]
    draft: bool,
}

impl GitHubPullRequest {
    pub(super) fn into_model(self, repository: &Repository) -> PullRequest {
        PullRequest::new(PullRequestInfo {
            repository: repository.clone(),
            id: self.id,
            number: self.number,
            title: self.title,
            state: IssueState::parse(self.state.as_deref()),
            created_at: self.created_at,
            updated_at: self.updated_at,
            merged_at: self.merged_at,
            url: self.html_url,
            body: self.body.unwrap_or_default(),
            merge_commit_sha: self.merge_commit_sha,
            author: self
                .user
                .map(|user| user.login)
                .unwrap_or_else(|| "ghost".to_string()),
            labels: label_names(self.labels),
            draft: self.draft,
        })
    }
}

/// Fields only present on the single pull request resource
#[derive(Debug, Deserialize)]
pub(super) struct GitHubPullRequestStats {
    #[serde(default)]
    additions: u64,
    #[serde(default)]
    deletions: u64,
    #[serde(default)]
    changed_files: u64,
    #[serde(default)]
    draft: bool,
    #[serde(default)]
    labels: Vec<GitHubLabel>,
}

impl GitHubPullRequestStats {
    pub(super) fn into_model(self) -> PullRequestStats {
        PullRequestStats {
            additions: self.additions,
            deletions: self.deletions,
            changed_files: self.changed_files,
            draft: self.draft,
            labels: label_names(self.labels),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct GitHubReview {
    submitted_at: Option<DateTime<Utc>>,
    html_url: String,
    user: Option<GitHubUser>,
    state: String,
}

impl GitHubReview {
    pub(super) fn into_model(self) -> Result<Review, ModelError> {
        let state = self
            .state
            .parse::<ReviewState>()
            .map_err(|_| ModelError::InvalidField {
                record: "review",
                field: "state",
                value: self.state.clone(),
            })?;
        Ok(Review {
            submitted_at: self.submitted_at,
            url: self.html_url,
            reviewer: self
                .user
                .map(|user| user.login)
                .unwrap_or_else(|| "ghost".to_string()),
            state,
        })
    }
}

/// GitHub reference type returned by the API
#[derive(Debug, Deserialize)]
pub(super) struct GitHubRefObject {
    object: GitHubRefTarget,
}

#[derive(Debug, Deserialize)]
struct GitHubRefTarget {
    sha: String,
}

impl GitHubRefObject {
    pub(super) fn sha(self) -> String {
        self.object.sha
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct GitHubComparison {
    #[serde(default)]
    commits: Vec<GitHubCommitItem>,
}

#[derive(Debug, Deserialize)]
struct GitHubCommitItem {
    commit: GitHubCommit,
}

#[derive(Debug, Deserialize)]
struct GitHubCommit {
    message: String,
    tree: GitHubTree,
    committer: Option<GitHubCommitter>,
}

#[derive(Debug, Deserialize)]
struct GitHubTree {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct GitHubCommitter {
    name: String,
    date: Option<DateTime<Utc>>,
}

impl GitHubComparison {
    pub(super) fn into_commits(self) -> Vec<Commit> {
        self.commits
            .into_iter()
            .map(|item| {
                let (name, date) = item
                    .commit
                    .committer
                    .map(|committer| (committer.name, committer.date))
                    .unwrap_or_default();
                Commit::new(item.commit.message, item.commit.tree.sha, name, date)
            })
            .collect()
    }
}
