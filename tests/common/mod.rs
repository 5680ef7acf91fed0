//! In-memory gateway and fixtures shared by the integration tests

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use rand::Rng;

use ghsprint::error::GatewayError;
use ghsprint::gateway::SprintGateway;
use ghsprint::models::{
    Card, Column, Commit, Event, EventKind, Issue, IssueState, Project, PullRequest,
    PullRequestInfo, PullRequestStats, Repository, Review, ReviewState,
};

/// A Thursday inside the sprint starting Wednesday 2019-02-06 09:00
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2019, 2, 7, 12, 0, 0).unwrap()
}

pub fn sprint_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2019, 2, 6, 9, 0, 0).unwrap()
}

pub fn widgets() -> Repository {
    Repository::new("acme", "widgets")
}

pub fn column(id: u64, name: &str) -> Column {
    Column {
        id,
        project_id: 1,
        name: name.to_string(),
    }
}

pub fn issue_card(column: &Column, id: u64, repository: &Repository, number: u64) -> Card {
    Card::new(
        column,
        id,
        sprint_start(),
        sprint_start(),
        Some(format!(
            "https://api.github.com/repos/{}/{}/issues/{}",
            repository.owner, repository.name, number
        )),
    )
    .unwrap()
}

pub fn note_card(column: &Column, id: u64) -> Card {
    Card::new(column, id, sprint_start(), sprint_start(), None).unwrap()
}

pub fn labeled(at: DateTime<Utc>, label: &str) -> Event {
    Event::new(at, EventKind::Labeled).with_label(label)
}

pub fn issue(repository: &Repository, number: u64, title: &str, assignees: &[&str]) -> Issue {
    let mut issue = Issue::reference(
        repository.clone(),
        number,
        Some(format!(
            "https://github.com/{}/{}/issues/{}",
            repository.owner, repository.name, number
        )),
    );
    issue.title = Some(title.to_string());
    issue.state = IssueState::Open;
    issue.assignees = assignees.iter().map(|login| login.to_string()).collect();
    issue
}

pub fn pull_request(
    repository: &Repository,
    number: u64,
    created_at: DateTime<Utc>,
    body: &str,
) -> PullRequest {
    PullRequest::new(PullRequestInfo {
        repository: repository.clone(),
        id: 1000 + number,
        number,
        title: format!("Change {}", number),
        state: IssueState::Open,
        created_at,
        updated_at: created_at,
        merged_at: None,
        url: format!(
            "https://github.com/{}/{}/pull/{}",
            repository.owner, repository.name, number
        ),
        body: body.to_string(),
        merge_commit_sha: None,
        author: "octocat".to_string(),
        labels: Vec::new(),
        draft: false,
    })
}

pub fn review(reviewer: &str, state: ReviewState) -> Review {
    Review {
        submitted_at: Some(now()),
        url: String::new(),
        reviewer: reviewer.to_string(),
        state,
    }
}

fn not_found(what: String) -> GatewayError {
    GatewayError::Status {
        url: format!("http://fake/{}", what),
        status: 404,
        body: "Not Found".to_string(),
    }
}

fn random_latency(max_ms: u64) -> Duration {
    Duration::from_millis(rand::thread_rng().gen_range(0..=max_ms))
}

/// Gateway answering from maps filled by the test
///
/// Every call is recorded; collections without an entry are empty, single
/// resources without an entry are a 404.
#[derive(Default)]
pub struct FakeGateway {
    pub projects: HashMap<Repository, Vec<Project>>,
    pub columns: HashMap<u64, Vec<Column>>,
    pub cards: HashMap<u64, Vec<Card>>,
    pub events: HashMap<(Repository, u64), Vec<Event>>,
    pub issues: HashMap<(Repository, u64), Issue>,
    pub pull_requests: HashMap<Repository, Vec<PullRequest>>,
    /// Pull requests only reachable through `get_pull_request`
    pub hidden_pull_requests: HashMap<(Repository, u64), PullRequest>,
    pub reviews: HashMap<(Repository, u64), Vec<Review>>,
    pub stats: HashMap<(Repository, u64), PullRequestStats>,
    pub tags: HashMap<(Repository, String), String>,
    pub branches: HashMap<(Repository, String), String>,
    pub comparisons: HashMap<(Repository, String, String), Vec<Commit>>,
    pub failing_projects: HashSet<Repository>,
    pub failing_columns: HashSet<u64>,
    pub failing_events: HashSet<(Repository, u64)>,
    pub max_latency_ms: u64,
    calls: Mutex<Vec<String>>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded calls of one gateway method
    pub fn calls(&self, method: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.split(' ').next() == Some(method))
            .count()
    }

    /// Recorded keys of one gateway method
    pub fn call_keys(&self, method: &str) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|call| call.strip_prefix(&format!("{} ", method)).map(String::from))
            .collect()
    }

    async fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
        if self.max_latency_ms > 0 {
            tokio::time::sleep(random_latency(self.max_latency_ms)).await;
        }
    }
}

#[async_trait]
impl SprintGateway for FakeGateway {
    async fn list_projects(&self, repo: &Repository) -> Result<Vec<Project>, GatewayError> {
        self.record(format!("list_projects {}", repo)).await;
        if self.failing_projects.contains(repo) {
            return Err(GatewayError::Status {
                url: format!("http://fake/repos/{}/projects", repo),
                status: 502,
                body: "Bad Gateway".to_string(),
            });
        }
        Ok(self.projects.get(repo).cloned().unwrap_or_default())
    }

    async fn list_columns(&self, project_id: u64) -> Result<Vec<Column>, GatewayError> {
        self.record(format!("list_columns {}", project_id)).await;
        Ok(self.columns.get(&project_id).cloned().unwrap_or_default())
    }

    async fn list_cards(&self, column: &Column) -> Result<Vec<Card>, GatewayError> {
        self.record(format!("list_cards {}", column.id)).await;
        if self.failing_columns.contains(&column.id) {
            return Err(not_found(format!("columns/{}", column.id)));
        }
        Ok(self.cards.get(&column.id).cloned().unwrap_or_default())
    }

    async fn list_issue_events(
        &self,
        repo: &Repository,
        issue_number: u64,
    ) -> Result<Vec<Event>, GatewayError> {
        self.record(format!("list_issue_events {}#{}", repo, issue_number))
            .await;
        let key = (repo.clone(), issue_number);
        if self.failing_events.contains(&key) {
            return Err(not_found(format!("{}/issues/{}/timeline", repo, issue_number)));
        }
        Ok(self.events.get(&key).cloned().unwrap_or_default())
    }

    async fn list_issues(&self, repo: &Repository) -> Result<Vec<Issue>, GatewayError> {
        self.record(format!("list_issues {}", repo)).await;
        Ok(self
            .issues
            .iter()
            .filter(|((repository, _), _)| repository == repo)
            .map(|(_, issue)| issue.clone())
            .collect())
    }

    async fn get_issue(
        &self,
        repo: &Repository,
        issue_number: u64,
    ) -> Result<Issue, GatewayError> {
        self.record(format!("get_issue {}#{}", repo, issue_number)).await;
        self.issues
            .get(&(repo.clone(), issue_number))
            .cloned()
            .ok_or_else(|| not_found(format!("{}/issues/{}", repo, issue_number)))
    }

    async fn list_pull_requests(
        &self,
        repo: &Repository,
    ) -> Result<Vec<PullRequest>, GatewayError> {
        self.record(format!("list_pull_requests {}", repo)).await;
        Ok(self.pull_requests.get(repo).cloned().unwrap_or_default())
    }

    async fn get_pull_request(
        &self,
        repo: &Repository,
        number: u64,
    ) -> Result<PullRequest, GatewayError> {
        self.record(format!("get_pull_request {}#{}", repo, number)).await;
        let key = (repo.clone(), number);
        self.hidden_pull_requests
            .get(&key)
            .cloned()
            .or_else(|| {
                self.pull_requests
                    .get(repo)
                    .and_then(|prs| prs.iter().find(|pr| pr.number == number).cloned())
            })
            .ok_or_else(|| not_found(format!("{}/pulls/{}", repo, number)))
    }

    async fn list_reviews(
        &self,
        repo: &Repository,
        number: u64,
    ) -> Result<Vec<Review>, GatewayError> {
        self.record(format!("list_reviews {}#{}", repo, number)).await;
        Ok(self
            .reviews
            .get(&(repo.clone(), number))
            .cloned()
            .unwrap_or_default())
    }

    async fn get_pull_request_stats(
        &self,
        repo: &Repository,
        number: u64,
    ) -> Result<PullRequestStats, GatewayError> {
        self.record(format!("get_pull_request_stats {}#{}", repo, number))
            .await;
        Ok(self
            .stats
            .get(&(repo.clone(), number))
            .cloned()
            .unwrap_or_default())
    }

    async fn get_tag_sha(&self, repo: &Repository, tag: &str) -> Result<String, GatewayError> {
        self.record(format!("get_tag_sha {} {}", repo, tag)).await;
        self.tags
            .get(&(repo.clone(), tag.to_string()))
            .cloned()
            .ok_or_else(|| not_found(format!("{}/git/ref/tags/{}", repo, tag)))
    }

    async fn get_branch_sha(
        &self,
        repo: &Repository,
        branch: &str,
    ) -> Result<String, GatewayError> {
        self.record(format!("get_branch_sha {} {}", repo, branch)).await;
        self.branches
            .get(&(repo.clone(), branch.to_string()))
            .cloned()
            .ok_or_else(|| not_found(format!("{}/git/ref/heads/{}", repo, branch)))
    }

    async fn compare_commits(
        &self,
        repo: &Repository,
        base: &str,
        head: &str,
    ) -> Result<Vec<Commit>, GatewayError> {
        self.record(format!("compare_commits {} {}...{}", repo, base, head))
            .await;
        Ok(self
            .comparisons
            .get(&(repo.clone(), base.to_string(), head.to_string()))
            .cloned()
            .unwrap_or_default())
    }
}
