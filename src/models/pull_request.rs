use chrono::{DateTime, Utc};
use strum::{AsRefStr, Display, EnumString};

use super::issue::is_closes_line;
use super::{Issue, IssueState, Repository};

/// State of a submitted review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum ReviewState {
    ChangesRequested,
    Commented,
    Approved,
    Dismissed,
    Pending,
}

impl ReviewState {
    /// Upper-case initial used in the report
    pub fn initial(self) -> char {
        match self {
            ReviewState::ChangesRequested => 'C',
            ReviewState::Commented => 'C',
            ReviewState::Approved => 'A',
            ReviewState::Dismissed => 'D',
            ReviewState::Pending => 'P',
        }
    }
}

/// A review submitted on a pull request
#[derive(Debug, Clone, PartialEq)]
pub struct Review {
    pub submitted_at: Option<DateTime<Utc>>,
    pub url: String,
    pub reviewer: String,
    pub state: ReviewState,
}

/// Extended metadata only present on the single pull request resource
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PullRequestStats {
    pub additions: u64,
    pub deletions: u64,
    pub changed_files: u64,
    pub draft: bool,
    pub labels: Vec<String>,
}

/// Fields of a pull request as listed by the API
#[derive(Debug, Clone, PartialEq)]
pub struct PullRequestInfo {
    pub repository: Repository,
    pub id: u64,
    pub number: u64,
    pub title: String,
    pub state: IssueState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub merged_at: Option<DateTime<Utc>>,
    pub url: String,
    pub body: String,
    pub merge_commit_sha: Option<String>,
    pub author: String,
    pub labels: Vec<String>,
    pub draft: bool,
}

/// A pull request with the issues its description closes
#[derive(Debug, Clone, PartialEq)]
pub struct PullRequest {
    pub repository: Repository,
    pub id: u64,
    pub number: u64,
    pub title: String,
    pub state: IssueState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub merged_at: Option<DateTime<Utc>>,
    pub url: String,
    pub body: String,
    pub merge_commit_sha: Option<String>,
    pub author: String,
    pub labels: Vec<String>,
    pub draft: bool,
    pub additions: Option<u64>,
    pub deletions: Option<u64>,
    pub changed_files: Option<u64>,
    closes: Vec<Issue>,
    reviews: Vec<Review>,
}

impl PullRequest {
    /// Builds the pull request and parses the `- closes ...` lines of its description
    ///
    /// Lines that reference nothing (`- closes none`) or cannot be read are skipped.
    pub fn new(info: PullRequestInfo) -> Self {
        let closes = closed_issues(&info.body, &info.repository);
        Self {
            repository: info.repository,
            id: info.id,
            number: info.number,
            title: info.title,
            state: info.state,
            created_at: info.created_at,
            updated_at: info.updated_at,
            merged_at: info.merged_at,
            url: info.url,
            body: info.body,
            merge_commit_sha: info.merge_commit_sha,
            author: info.author,
            labels: info.labels,
            draft: info.draft,
            additions: None,
            deletions: None,
            changed_files: None,
            closes,
            reviews: Vec::new(),
        }
    }

    /// Replaces the reviews, kept in submission order
    pub fn with_reviews(mut self, reviews: Vec<Review>) -> Self {
        self.reviews = reviews;
        self
    }

    /// Merges the metadata of the single pull request resource
    pub fn with_stats(mut self, stats: PullRequestStats) -> Self {
        self.additions = Some(stats.additions);
        self.deletions = Some(stats.deletions);
        self.changed_files = Some(stats.changed_files);
        self.draft = stats.draft;
        if !stats.labels.is_empty() {
            self.labels = stats.labels;
        }
        self
    }

    pub fn closes(&self) -> &[Issue] {
        &self.closes
    }

    pub fn reviews(&self) -> &[Review] {
        &self.reviews
    }

    pub fn is_merged(&self) -> bool {
        self.merged_at.is_some()
    }

    /// `merged` for merged pull requests, otherwise the API state
    pub fn display_state(&self) -> String {
        if self.is_merged() {
            "merged".to_string()
        } else {
            self.state.to_string()
        }
    }
}

/// The pull request `number` of `repository`, if it is in `pull_requests`
pub fn find_pull_request<'a>(
    pull_requests: &'a [PullRequest],
    repository: &Repository,
    number: u64,
) -> Option<&'a PullRequest> {
    pull_requests
        .iter()
        .find(|pr| pr.number == number && &pr.repository == repository)
}

fn closed_issues(body: &str, repository: &Repository) -> Vec<Issue> {
    body.lines()
        .map(str::trim)
        .filter(|line| is_closes_line(line))
        .filter_map(|line| match Issue::from_closes_line(line, repository) {
            Ok(issue) => issue,
            Err(e) => {
                tracing::debug!("Skipping closes line in {}: {}", repository, e);
                None
            }
        })
        .collect()
}
