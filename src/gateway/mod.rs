//! Remote gateway to the issue tracker
//!
//! One method per remote collection. Each call is a single round trip that
//! returns validated models or a [`GatewayError`]; the gateway keeps no state
//! besides its connection parameters.
//!
//! List calls request one page of [`PAGE_SIZE`] records and never walk further
//! pages, so larger boards and pull request lists are truncated.

pub mod github;

use async_trait::async_trait;

pub use crate::error::GatewayError;
use crate::models::{
    Card, Column, Commit, Event, Issue, Project, PullRequest, PullRequestStats, Repository,
    Review,
};

pub use github::GithubGateway;

/// Records requested from every list endpoint
pub const PAGE_SIZE: u8 = 100;

/// Access to the remote collections the sprint pipeline reads
#[async_trait]
pub trait SprintGateway: Send + Sync {
    /// Classic projects of a repository
    async fn list_projects(&self, repo: &Repository) -> Result<Vec<Project>, GatewayError>;

    /// Columns of a project
    async fn list_columns(&self, project_id: u64) -> Result<Vec<Column>, GatewayError>;

    /// Cards of a column, in board order
    async fn list_cards(&self, column: &Column) -> Result<Vec<Card>, GatewayError>;

    /// Timeline of an issue in chronological order, restricted to the event
    /// kinds in [`crate::models::EventKind`]
    async fn list_issue_events(
        &self,
        repo: &Repository,
        issue_number: u64,
    ) -> Result<Vec<Event>, GatewayError>;

    /// Issues of a repository
    async fn list_issues(&self, repo: &Repository) -> Result<Vec<Issue>, GatewayError>;

    /// Full detail of one issue
    async fn get_issue(&self, repo: &Repository, issue_number: u64)
    -> Result<Issue, GatewayError>;

    /// Pull requests of a repository in any state, most recently updated first
    async fn list_pull_requests(&self, repo: &Repository)
    -> Result<Vec<PullRequest>, GatewayError>;

    /// One pull request, without reviews attached
    async fn get_pull_request(
        &self,
        repo: &Repository,
        number: u64,
    ) -> Result<PullRequest, GatewayError>;

    /// Reviews of a pull request in submission order
    async fn list_reviews(&self, repo: &Repository, number: u64)
    -> Result<Vec<Review>, GatewayError>;

    /// Diff stats, draft flag and labels of a pull request
    async fn get_pull_request_stats(
        &self,
        repo: &Repository,
        number: u64,
    ) -> Result<PullRequestStats, GatewayError>;

    /// Commit sha a tag points at
    async fn get_tag_sha(&self, repo: &Repository, tag: &str) -> Result<String, GatewayError>;

    /// Commit sha at the head of a branch
    async fn get_branch_sha(&self, repo: &Repository, branch: &str)
    -> Result<String, GatewayError>;

    /// Commits reachable from `head` but not from `base`
    async fn compare_commits(
        &self,
        repo: &Repository,
        base: &str,
        head: &str,
    ) -> Result<Vec<Commit>, GatewayError>;
}
