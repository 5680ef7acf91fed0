//! Fetch orchestrator
//!
//! Populates a [`Snapshot`] by driving a [`SprintGateway`] through a fixed
//! sequence of stages. Each stage fans out over a [`WorkerPool`] and fully
//! drains before the next one starts, because later stages need the complete
//! output of earlier ones (e.g. the repository set discovered from cards
//! decides which pull request lists are fetched).
//!
//! Only project resolution can fail the run. Any other failed call is logged
//! and contributes an empty result.

mod pool;

pub use pool::{WorkerPool, degrade};

use std::collections::HashSet;
use std::time::Instant;

use tracing::{Instrument, Span};

use crate::error::SprintError;
use crate::gateway::SprintGateway;
use crate::models::{Card, Column, Commit, Event, Issue, Project, PullRequest, Repository, Story};

/// Concurrency limits of the fan-out stages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchLimits {
    /// Limit for columns, pull requests, reviews, stats and issue detail
    pub default: usize,
    /// Limit for issue timelines, the stage with the most calls
    pub events: usize,
}

impl Default for FetchLimits {
    fn default() -> Self {
        Self {
            default: 30,
            events: 50,
        }
    }
}

/// Board, issue and pull request state of one run
///
/// Built once by [`FetchOrchestrator::fetch`] and read-only afterwards.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub project: Project,
    /// Columns that were not ignored, in board order
    pub columns: Vec<Column>,
    /// Cards without an issue link
    pub notes: Vec<Card>,
    /// Issue cards with their timelines and issue detail
    pub stories: Vec<Story>,
    pub pull_requests: Vec<PullRequest>,
    /// Configured repositories followed by those discovered on cards
    pub repositories: Vec<Repository>,
}

/// Drives the gateway through the fetch stages of one run
pub struct FetchOrchestrator<'a> {
    gateway: &'a dyn SprintGateway,
    limits: FetchLimits,
    span: Span,
}

impl<'a> FetchOrchestrator<'a> {
    /// `span` is the run span; every stage logs inside a child of it
    pub fn new(gateway: &'a dyn SprintGateway, span: Span) -> Self {
        Self {
            gateway,
            limits: FetchLimits::default(),
            span,
        }
    }

    pub fn with_limits(mut self, limits: FetchLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn limits(&self) -> FetchLimits {
        self.limits
    }

    fn stage_span(&self, stage: &'static str) -> Span {
        tracing::info_span!(parent: &self.span, "fetch_stage", stage)
    }

    /// Fetches everything the report needs for `project_name`
    ///
    /// # Errors
    ///
    /// [`SprintError::Gateway`] when a project list cannot be fetched and
    /// [`SprintError::ProjectNotFound`] when no repository has the project.
    pub async fn fetch(
        &self,
        project_name: &str,
        repositories: &[Repository],
        ignore_columns: &HashSet<String>,
    ) -> Result<Snapshot, SprintError> {
        let started = Instant::now();

        let project = self
            .resolve_project(project_name, repositories)
            .instrument(self.stage_span("project"))
            .await?;

        let columns = self
            .fetch_columns(&project, ignore_columns)
            .instrument(self.stage_span("columns"))
            .await;

        let cards = self
            .fetch_cards(&columns)
            .instrument(self.stage_span("cards"))
            .await;

        let repositories = expand_repositories(repositories, &cards);

        let pull_requests = self
            .fetch_pull_requests(&repositories)
            .instrument(self.stage_span("pull_requests"))
            .await;
        let pull_requests = self
            .attach_reviews(pull_requests)
            .instrument(self.stage_span("reviews"))
            .await;
        let pull_requests = self
            .attach_stats(pull_requests)
            .instrument(self.stage_span("stats"))
            .await;

        let (linked, notes): (Vec<_>, Vec<_>) = cards
            .into_iter()
            .map(Card::into_linked)
            .partition(Result::is_ok);
        let linked: Vec<_> = linked.into_iter().filter_map(Result::ok).collect();
        let notes: Vec<_> = notes.into_iter().filter_map(Result::err).collect();

        let keys: Vec<(Repository, u64)> = linked
            .iter()
            .map(|card| (card.link().repository.clone(), card.link().number))
            .collect();
        let events = self
            .fetch_events(keys.clone())
            .instrument(self.stage_span("events"))
            .await;
        let issues = self
            .fetch_issues(keys)
            .instrument(self.stage_span("issues"))
            .await;

        let stories: Vec<Story> = linked
            .into_iter()
            .zip(events)
            .zip(issues)
            .map(|((card, events), issue)| card.complete(events, issue))
            .collect();

        self.span.in_scope(|| {
            tracing::info!(
                "Fetched {} stories, {} notes and {} pull requests in {:.2?}",
                stories.len(),
                notes.len(),
                pull_requests.len(),
                started.elapsed()
            )
        });

        Ok(Snapshot {
            project,
            columns,
            notes,
            stories,
            pull_requests,
            repositories,
        })
    }

    /// Finds the project in the first repository that has one with this name
    async fn resolve_project(
        &self,
        project_name: &str,
        repositories: &[Repository],
    ) -> Result<Project, SprintError> {
        let started = Instant::now();
        for repository in repositories {
            let projects = self.gateway.list_projects(repository).await?;
            if let Some(project) = projects.into_iter().find(|p| p.has_name(project_name)) {
                tracing::info!(
                    "Found project {} ({}) in {} in {:.2?}",
                    project.name,
                    project.id,
                    repository,
                    started.elapsed()
                );
                return Ok(project);
            }
            tracing::debug!("No project named {} in {}", project_name, repository);
        }
        Err(SprintError::ProjectNotFound {
            project: project_name.to_string(),
            searched: repositories.to_vec(),
        })
    }

    async fn fetch_columns(
        &self,
        project: &Project,
        ignore_columns: &HashSet<String>,
    ) -> Vec<Column> {
        let started = Instant::now();
        let columns = degrade(
            "columns",
            &project.name,
            self.gateway.list_columns(project.id).await,
        )
        .unwrap_or_default();
        let columns: Vec<Column> = columns
            .into_iter()
            .filter(|column| {
                let ignored = ignore_columns.contains(&column.name);
                if ignored {
                    tracing::debug!("Ignoring column {}", column.name);
                }
                !ignored
            })
            .collect();
        tracing::info!("Time for columns: {:.2?} ({})", started.elapsed(), columns.len());
        columns
    }

    async fn fetch_cards(&self, columns: &[Column]) -> Vec<Card> {
        let started = Instant::now();
        let gateway = self.gateway;
        let pool = WorkerPool::new("cards", self.limits.default);
        let cards: Vec<Card> = pool
            .run_degraded(
                columns.to_vec(),
                |column| column.name.clone(),
                move |column| async move { gateway.list_cards(&column).await },
            )
            .await
            .into_iter()
            .flatten()
            .flatten()
            .collect();
        tracing::info!("Time for cards: {:.2?} ({})", started.elapsed(), cards.len());
        cards
    }

    async fn fetch_pull_requests(&self, repositories: &[Repository]) -> Vec<PullRequest> {
        let started = Instant::now();
        let gateway = self.gateway;
        let pool = WorkerPool::new("pull_requests", self.limits.default);
        let pull_requests: Vec<PullRequest> = pool
            .run_degraded(
                repositories.to_vec(),
                |repository| repository.to_string(),
                move |repository| async move { gateway.list_pull_requests(&repository).await },
            )
            .await
            .into_iter()
            .flatten()
            .flatten()
            .collect();
        tracing::info!(
            "Time for PRs: {:.2?} ({})",
            started.elapsed(),
            pull_requests.len()
        );
        pull_requests
    }

    async fn attach_reviews(&self, pull_requests: Vec<PullRequest>) -> Vec<PullRequest> {
        let started = Instant::now();
        let gateway = self.gateway;
        let pool = WorkerPool::new("reviews", self.limits.default);
        let reviews = pool
            .run_degraded(
                pull_request_keys(&pull_requests),
                describe_key,
                move |(repository, number)| async move {
                    gateway.list_reviews(&repository, number).await
                },
            )
            .await;
        tracing::info!("Time for reviews: {:.2?}", started.elapsed());
        pull_requests
            .into_iter()
            .zip(reviews)
            .map(|(pr, reviews)| pr.with_reviews(reviews.unwrap_or_default()))
            .collect()
    }

    async fn attach_stats(&self, pull_requests: Vec<PullRequest>) -> Vec<PullRequest> {
        let started = Instant::now();
        let gateway = self.gateway;
        let pool = WorkerPool::new("stats", self.limits.default);
        let stats = pool
            .run_degraded(
                pull_request_keys(&pull_requests),
                describe_key,
                move |(repository, number)| async move {
                    gateway.get_pull_request_stats(&repository, number).await
                },
            )
            .await;
        tracing::info!("Time for PR stats: {:.2?}", started.elapsed());
        pull_requests
            .into_iter()
            .zip(stats)
            .map(|(pr, stats)| match stats {
                Some(stats) => pr.with_stats(stats),
                None => pr,
            })
            .collect()
    }

    async fn fetch_events(&self, keys: Vec<(Repository, u64)>) -> Vec<Vec<Event>> {
        let started = Instant::now();
        let count = keys.len();
        let gateway = self.gateway;
        let pool = WorkerPool::new("events", self.limits.events);
        let events: Vec<_> = pool
            .run_degraded(keys, describe_key, move |(repository, number)| async move {
                gateway.list_issue_events(&repository, number).await
            })
            .await
            .into_iter()
            .map(Option::unwrap_or_default)
            .collect();
        tracing::info!("Time for events: {:.2?} ({} cards)", started.elapsed(), count);
        events
    }

    async fn fetch_issues(&self, keys: Vec<(Repository, u64)>) -> Vec<Option<Issue>> {
        let started = Instant::now();
        let gateway = self.gateway;
        let pool = WorkerPool::new("issues", self.limits.default);
        let issues = pool
            .run_degraded(keys, describe_key, move |(repository, number)| async move {
                gateway.get_issue(&repository, number).await
            })
            .await;
        tracing::info!("Time for issues: {:.2?}", started.elapsed());
        issues
    }

    /// Commits on `base_branch` that the production tag does not contain, per repository
    ///
    /// A repository whose tag, branch or comparison cannot be fetched is left out.
    pub async fn fetch_undeployed_commits(
        &self,
        repositories: &[Repository],
        production_tag: &str,
        base_branch: &str,
    ) -> Vec<(Repository, Vec<Commit>)> {
        let started = Instant::now();
        let gateway = self.gateway;
        let pool = WorkerPool::new("deploy", self.limits.default);
        let commits = pool
            .run_degraded(
                repositories.to_vec(),
                |repository| repository.to_string(),
                move |repository| async move {
                    let tag_sha = gateway.get_tag_sha(&repository, production_tag).await?;
                    let branch_sha = gateway.get_branch_sha(&repository, base_branch).await?;
                    gateway
                        .compare_commits(&repository, &tag_sha, &branch_sha)
                        .await
                },
            )
            .instrument(self.stage_span("deploy"))
            .await;
        self.span.in_scope(|| {
            tracing::info!("Time for deploy comparison: {:.2?}", started.elapsed())
        });
        repositories
            .iter()
            .cloned()
            .zip(commits)
            .filter_map(|(repository, commits)| commits.map(|commits| (repository, commits)))
            .collect()
    }
}

/// Configured repositories first, then every other repository a card links to
fn expand_repositories(configured: &[Repository], cards: &[Card]) -> Vec<Repository> {
    let mut seen: HashSet<Repository> = HashSet::new();
    let mut repositories = Vec::new();
    let discovered = cards
        .iter()
        .filter_map(Card::issue_link)
        .map(|link| &link.repository);
    for repository in configured.iter().chain(discovered) {
        if seen.insert(repository.clone()) {
            if !configured.contains(repository) {
                tracing::debug!("Adding repository {} found on a card", repository);
            }
            repositories.push(repository.clone());
        }
    }
    repositories
}

fn pull_request_keys(pull_requests: &[PullRequest]) -> Vec<(Repository, u64)> {
    pull_requests
        .iter()
        .map(|pr| (pr.repository.clone(), pr.number))
        .collect()
}

fn describe_key((repository, number): &(Repository, u64)) -> String {
    format!("{}#{}", repository, number)
}
