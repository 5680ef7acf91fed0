//! Issue/pull request correlation

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::error::SprintError;
use crate::gateway::SprintGateway;
use crate::models::{Commit, PullRequest, Repository, ReviewState, Story, find_pull_request};

/// Pull requests linked to each reported story, keyed by card id
pub type LinkedPullRequests<'a> = HashMap<u64, Vec<Cow<'a, PullRequest>>>;

/// Pull requests that cross-referenced `story`, in timeline order and each once
///
/// A pull request missing from `pull_requests` (e.g. one in a repository
/// outside the fetched set, or beyond the first page) is fetched on demand
/// together with its reviews.
///
/// # Errors
///
/// [`SprintError::CrossReference`] when the on-demand lookup fails.
pub async fn resolve_linked_pull_requests<'a>(
    story: &Story,
    pull_requests: &'a [PullRequest],
    gateway: &dyn SprintGateway,
) -> Result<Vec<Cow<'a, PullRequest>>, SprintError> {
    let mut seen: HashSet<(&Repository, u64)> = HashSet::new();
    let mut linked = Vec::new();
    for reference in story.pull_request_references() {
        if !seen.insert((&reference.repository, reference.number)) {
            continue;
        }
        match find_pull_request(pull_requests, &reference.repository, reference.number) {
            Some(pr) => linked.push(Cow::Borrowed(pr)),
            None => {
                tracing::debug!(
                    "PR {}#{} referenced by {}#{} was not fetched, looking it up",
                    reference.repository,
                    reference.number,
                    story.repository(),
                    story.issue_number()
                );
                let pr = fetch_pull_request(gateway, &reference.repository, reference.number)
                    .await?;
                linked.push(Cow::Owned(pr));
            }
        }
    }
    Ok(linked)
}

async fn fetch_pull_request(
    gateway: &dyn SprintGateway,
    repository: &Repository,
    number: u64,
) -> Result<PullRequest, SprintError> {
    let to_error = |source| SprintError::CrossReference {
        repository: repository.clone(),
        number,
        source,
    };
    let pr = gateway
        .get_pull_request(repository, number)
        .await
        .map_err(to_error)?;
    let reviews = gateway
        .list_reviews(repository, number)
        .await
        .map_err(to_error)?;
    Ok(pr.with_reviews(reviews))
}

/// Resolves the linked pull requests of every story in `stories`
pub async fn link_pull_requests<'a>(
    stories: &[&Story],
    pull_requests: &'a [PullRequest],
    gateway: &dyn SprintGateway,
) -> Result<LinkedPullRequests<'a>, SprintError> {
    let mut linked = HashMap::new();
    for story in stories {
        let prs = resolve_linked_pull_requests(story, pull_requests, gateway).await?;
        linked.insert(story.card().id, prs);
    }
    Ok(linked)
}

/// Latest decisive review of each reviewer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewConsensus {
    NotReviewed,
    /// Reviewers in order of their first decisive review
    Reviewed(Vec<(String, ReviewState)>),
}

impl fmt::Display for ReviewConsensus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReviewConsensus::NotReviewed => write!(f, "-"),
            ReviewConsensus::Reviewed(reviews) => reviews
                .iter()
                .try_for_each(|(_, state)| write!(f, "{}", state.initial())),
        }
    }
}

/// Consensus over the reviews of `pr`, ignoring comments and dismissed reviews
pub fn reviewer_consensus(pr: &PullRequest) -> ReviewConsensus {
    let mut latest: Vec<(String, ReviewState)> = Vec::new();
    for review in pr
        .reviews()
        .iter()
        .filter(|review| !matches!(review.state, ReviewState::Dismissed | ReviewState::Commented))
    {
        match latest
            .iter_mut()
            .find(|(reviewer, _)| *reviewer == review.reviewer)
        {
            Some(entry) => entry.1 = review.state,
            None => latest.push((review.reviewer.clone(), review.state)),
        }
    }
    if latest.is_empty() {
        ReviewConsensus::NotReviewed
    } else {
        ReviewConsensus::Reviewed(latest)
    }
}

/// Fetched pull requests whose squash commits are not deployed yet
pub fn pull_requests_pending_deploy<'a>(
    undeployed: &[(Repository, Vec<Commit>)],
    pull_requests: &'a [PullRequest],
) -> Vec<&'a PullRequest> {
    let mut seen = HashSet::new();
    let mut pending = Vec::new();
    for (repository, commits) in undeployed {
        for number in commits.iter().filter_map(|commit| commit.pull_request_number) {
            if !seen.insert((repository, number)) {
                continue;
            }
            match find_pull_request(pull_requests, repository, number) {
                Some(pr) => pending.push(pr),
                None => tracing::debug!("Undeployed {}#{} was not fetched", repository, number),
            }
        }
    }
    pending
}
