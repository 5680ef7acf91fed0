use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;

/// Squash merges end their subject with ` (#<pull request number>)`
static SQUASH_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" \(#(\d+)\)$").expect("valid squash suffix pattern"));

/// A commit returned by a branch comparison
#[derive(Debug, Clone, PartialEq)]
pub struct Commit {
    pub message: String,
    pub tree_sha: String,
    pub committer_name: String,
    pub committer_date: Option<DateTime<Utc>>,
    /// Pull request number from a squash-merge subject
    pub pull_request_number: Option<u64>,
}

impl Commit {
    pub fn new(
        message: impl Into<String>,
        tree_sha: impl Into<String>,
        committer_name: impl Into<String>,
        committer_date: Option<DateTime<Utc>>,
    ) -> Self {
        let message = message.into();
        let pull_request_number = squash_pull_request_number(&message);
        Self {
            message,
            tree_sha: tree_sha.into(),
            committer_name: committer_name.into(),
            committer_date,
            pull_request_number,
        }
    }
}

fn squash_pull_request_number(message: &str) -> Option<u64> {
    let subject = message.lines().next()?.trim_end();
    SQUASH_SUFFIX
        .captures(subject)
        .and_then(|captures| captures.get(1))
        .and_then(|number| number.as_str().parse().ok())
}
