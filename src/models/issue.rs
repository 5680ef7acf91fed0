use chrono::{DateTime, Utc};
use strum::{AsRefStr, Display, EnumString};

use super::Repository;
use crate::error::ModelError;

const CLOSES_PREFIX: &str = "- closes ";

/// State of an issue or pull request as reported by the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum IssueState {
    #[default]
    Unknown,
    Open,
    Closed,
}

impl IssueState {
    /// Parses an API state string; absent or unrecognized states are `Unknown`
    pub fn parse(state: Option<&str>) -> Self {
        state
            .and_then(|s| s.parse().ok())
            .unwrap_or(IssueState::Unknown)
    }
}

/// An issue of a tracked repository
#[derive(Debug, Clone, PartialEq)]
pub struct Issue {
    pub repository: Repository,
    pub id: Option<u64>,
    pub number: u64,
    pub title: Option<String>,
    pub url: Option<String>,
    pub closed_at: Option<DateTime<Utc>>,
    pub state: IssueState,
    /// Logins of the assignees
    pub assignees: Vec<String>,
    /// Label names
    pub labels: Vec<String>,
}

impl Issue {
    /// An issue known only by its reference, as written in a pull request description
    pub fn reference(repository: Repository, number: u64, url: Option<String>) -> Self {
        Self {
            repository,
            id: None,
            number,
            title: None,
            url,
            closed_at: None,
            state: IssueState::Unknown,
            assignees: Vec::new(),
            labels: Vec::new(),
        }
    }

    /// Parses one `- closes ...` line of a pull request description
    ///
    /// Accepted forms:
    /// - `- closes https://github.com/acme/widgets/issues/42` refers to the url's repository
    /// - `- closes #7` refers to `default_repo`
    /// - `- closes none` and template placeholders such as `- closes #<issue>` yield `None`
    ///
    /// # Errors
    ///
    /// Returns an error when the line does not start with `- closes `, when a
    /// short reference has no `#`, or when the issue number cannot be read.
    ///
    /// ```
    /// use ghsprint::models::{Issue, Repository};
    ///
    /// let default_repo = Repository::new("acme", "widgets");
    /// let issue = Issue::from_closes_line("- closes #7", &default_repo).unwrap().unwrap();
    /// assert_eq!(issue.number, 7);
    /// assert!(Issue::from_closes_line("- closes none", &default_repo).unwrap().is_none());
    /// ```
    pub fn from_closes_line(
        line: &str,
        default_repo: &Repository,
    ) -> Result<Option<Issue>, ModelError> {
        let line = line.trim();
        if !is_closes_line(line) {
            return Err(ModelError::NotClosesLine(line.to_string()));
        }

        if let Some(position) = line.rfind("http") {
            let url = line[position..]
                .trim()
                .trim_end_matches(')')
                .trim_end_matches('/')
                .to_string();
            let number = url
                .rsplit('/')
                .next()
                .and_then(|segment| segment.parse::<u64>().ok());
            let repository = Repository::from_resource_url(&url).ok();
            return match (repository, number) {
                (Some(repository), Some(number)) => {
                    Ok(Some(Issue::reference(repository, number, Some(url))))
                }
                _ => Err(ModelError::InvalidIssueNumber(line.to_string())),
            };
        }

        if line.to_lowercase().ends_with("none") || line.contains('<') || line.contains('>') {
            return Ok(None);
        }

        let Some((_, reference)) = line.split_once('#') else {
            return Err(ModelError::MissingIssueReference(line.to_string()));
        };
        let digits: String = reference
            .trim_start()
            .chars()
            .take_while(char::is_ascii_digit)
            .collect();
        let number = digits
            .parse::<u64>()
            .map_err(|_| ModelError::InvalidIssueNumber(line.to_string()))?;
        Ok(Some(Issue::reference(default_repo.clone(), number, None)))
    }
}

/// Whether a trimmed description line is a `- closes ...` line, in any case
pub(crate) fn is_closes_line(line: &str) -> bool {
    line.len() >= CLOSES_PREFIX.len()
        && line.is_char_boundary(CLOSES_PREFIX.len())
        && line[..CLOSES_PREFIX.len()].eq_ignore_ascii_case(CLOSES_PREFIX)
}
