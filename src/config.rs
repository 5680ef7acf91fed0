//! Validated run configuration

use std::collections::{HashMap, HashSet};

use crate::error::ConfigError;
use crate::gateway::github::GITHUB_API_URL;
use crate::models::Repository;
use crate::sprint::MAX_WEEK;

/// Branch compared against the production tag when none is given
pub const DEFAULT_BASE_BRANCH: &str = "master";

/// Configuration as written by the caller, before validation
#[derive(Debug, Clone, Default)]
pub struct SprintArgs {
    pub access_token: Option<String>,
    pub project_name: String,
    pub repositories: Vec<String>,
    pub ignore_columns: Option<String>,
    pub keep_columns: Option<String>,
    /// `<login>:<name>` entries separated by commas
    pub login_name_mapper: Option<String>,
    pub special_tags: Option<String>,
    pub week: Option<u32>,
    pub production_tag: Option<String>,
    pub base_branch: Option<String>,
    pub api_url: Option<String>,
}

/// Configuration of one sprint run
#[derive(Debug, Clone, PartialEq)]
pub struct SprintConfig {
    pub access_token: Option<String>,
    pub project_name: String,
    pub repositories: Vec<Repository>,
    pub ignore_columns: HashSet<String>,
    pub keep_columns: HashSet<String>,
    /// Display names keyed by lower-cased login
    pub login_names: HashMap<String, String>,
    pub special_labels: HashSet<String>,
    pub week: Option<u32>,
    pub production_tag: Option<String>,
    pub base_branch: String,
    pub api_url: String,
}

impl SprintConfig {
    /// Validates `args` without touching the network
    ///
    /// # Errors
    ///
    /// - [`ConfigError::EmptyProjectName`] for a blank project name
    /// - [`ConfigError::EmptyRepositories`] when no repository is given
    /// - [`ConfigError::InvalidRepository`] for a repository not written as `owner/name`
    /// - [`ConfigError::InvalidLoginMapping`] for a login mapping entry without `:`
    /// - [`ConfigError::InvalidWeek`] for a week after [`MAX_WEEK`]
    pub fn from_args(args: SprintArgs) -> Result<Self, ConfigError> {
        let project_name = args.project_name.trim().to_string();
        if project_name.is_empty() {
            return Err(ConfigError::EmptyProjectName);
        }
        if args.repositories.is_empty() {
            return Err(ConfigError::EmptyRepositories);
        }
        let repositories = args
            .repositories
            .iter()
            .map(|raw| {
                raw.trim()
                    .parse::<Repository>()
                    .map_err(|_| ConfigError::InvalidRepository(raw.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        if let Some(week) = args.week.filter(|week| *week > MAX_WEEK) {
            return Err(ConfigError::InvalidWeek(week));
        }

        Ok(Self {
            access_token: args.access_token.filter(|token| !token.trim().is_empty()),
            project_name,
            repositories,
            ignore_columns: parse_set(args.ignore_columns.as_deref()),
            keep_columns: parse_set(args.keep_columns.as_deref()),
            login_names: parse_login_names(args.login_name_mapper.as_deref())?,
            special_labels: parse_set(args.special_tags.as_deref()),
            week: args.week,
            production_tag: args.production_tag.filter(|tag| !tag.trim().is_empty()),
            base_branch: args
                .base_branch
                .unwrap_or_else(|| DEFAULT_BASE_BRANCH.to_string()),
            api_url: args.api_url.unwrap_or_else(|| GITHUB_API_URL.to_string()),
        })
    }
}

/// Comma separated names, trimmed, without empty entries
pub fn parse_set(raw: Option<&str>) -> HashSet<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(String::from)
        .collect()
}

/// Parses `login:name,login:name` into names keyed by lower-cased login
pub fn parse_login_names(raw: Option<&str>) -> Result<HashMap<String, String>, ConfigError> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once(':') {
            Some((login, name)) if !login.trim().is_empty() => {
                Ok((login.trim().to_lowercase(), name.trim().to_string()))
            }
            _ => Err(ConfigError::InvalidLoginMapping(entry.to_string())),
        })
        .collect()
}
