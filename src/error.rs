//! Error types for the sprint pipeline
//!
//! Errors are split by layer:
//! - [`ModelError`] for records and description lines that cannot be turned into models
//! - [`GatewayError`] for a single failed round trip to the remote API
//! - [`ConfigError`] for caller configuration rejected before any network activity
//! - [`SprintError`] for the conditions that abort a whole run
//!
//! A failed task inside a fan-out stage is not an error at this level: the
//! orchestrator logs it and continues with an empty result for that task.

use thiserror::Error;

use crate::models::Repository;

/// Failure to build a model from a raw value
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("`{0}` is not a resource url")]
    InvalidUrl(String),

    #[error("this line `{0}` is not like `- closes [...]`")]
    NotClosesLine(String),

    #[error("this line `{0}` does not have a `#` in it")]
    MissingIssueReference(String),

    #[error("invalid issue number in `{0}`")]
    InvalidIssueNumber(String),

    #[error("unrecognized {field} `{value}` in {record} record")]
    InvalidField {
        record: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("missing required field `{field}` in {record} record")]
    MissingField {
        record: &'static str,
        field: &'static str,
    },
}

/// Failure of one remote round trip
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("failed to send request to {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("GitHub API error {status} for {url}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("failed to parse GitHub response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid record in response from {url}: {source}")]
    InvalidRecord {
        url: String,
        #[source]
        source: ModelError,
    },
}

impl GatewayError {
    /// Whether the failure came from the transport or an HTTP status,
    /// as opposed to a response body that could not be understood.
    pub fn is_transient(&self) -> bool {
        matches!(self, GatewayError::Request { .. } | GatewayError::Status { .. })
    }
}

/// Rejected caller configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("set at least one repository as `owner/name`")]
    EmptyRepositories,

    #[error("invalid repository `{0}`\n  hint: repositories are written as `owner/name`")]
    InvalidRepository(String),

    #[error("invalid login mapping entry `{0}`\n  hint: entries are written as `<login>:<name>`")]
    InvalidLoginMapping(String),

    #[error("project name must not be empty")]
    EmptyProjectName,

    #[error("invalid week {0}\n  hint: weeks are counted from 0 to 53 within the current year")]
    InvalidWeek(u32),
}

/// Conditions that abort a sprint run
#[derive(Debug, Error)]
pub enum SprintError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("no project named `{project}` found in {}", searched_list(.searched))]
    ProjectNotFound {
        project: String,
        searched: Vec<Repository>,
    },

    #[error("no pull request found for {repository} #{number}: {source}")]
    CrossReference {
        repository: Repository,
        number: u64,
        #[source]
        source: GatewayError,
    },

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("sprint end {end} is not after sprint start {start}")]
    InvalidWindow { start: String, end: String },
}

fn searched_list(searched: &[Repository]) -> String {
    searched
        .iter()
        .map(|repo| repo.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_not_found_lists_every_repository() {
        let err = SprintError::ProjectNotFound {
            project: "Board".to_string(),
            searched: vec![
                Repository::new("acme", "widgets"),
                Repository::new("acme", "gadgets"),
            ],
        };
        assert_eq!(
            err.to_string(),
            "no project named `Board` found in acme/widgets, acme/gadgets"
        );
    }

    #[test]
    fn test_transient_classification() {
        let status = GatewayError::Status {
            url: "https://api.github.com/x".to_string(),
            status: 502,
            body: String::new(),
        };
        assert!(status.is_transient());

        let invalid = GatewayError::InvalidRecord {
            url: "https://api.github.com/x".to_string(),
            source: ModelError::MissingField {
                record: "card",
                field: "id",
            },
        };
        assert!(!invalid.is_transient());
    }
}
