//! Project board models
//!
//! Cards go through three stages while the snapshot is assembled:
//! [`Card`] as listed in a column, [`LinkedCard`] once it is known to link an
//! issue, and [`Story`] once its timeline and issue detail are attached. A
//! `Story` always has its events, so nothing downstream checks for them.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use strum::{AsRefStr, Display};

use super::{CrossReference, Estimate, Event, Issue, Repository};
use crate::error::ModelError;

/// A classic project board
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    pub id: u64,
    pub name: String,
}

impl Project {
    /// Project names are compared ignoring case
    pub fn has_name(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase()
    }
}

/// A named lane of a project board
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub id: u64,
    pub project_id: u64,
    pub name: String,
}

/// The issue a card points at
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IssueLink {
    pub repository: Repository,
    pub number: u64,
}

impl IssueLink {
    /// Parses a card content url such as
    /// `https://api.github.com/repos/acme/widgets/issues/42`
    pub fn from_content_url(url: &str) -> Result<Self, ModelError> {
        let repository = Repository::from_resource_url(url)?;
        let number = url
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .and_then(|segment| segment.parse::<u64>().ok())
            .ok_or_else(|| ModelError::InvalidIssueNumber(url.to_string()))?;
        Ok(Self { repository, number })
    }
}

/// A board entry as listed in its column
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub id: u64,
    pub column_id: u64,
    pub column_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub content_url: Option<String>,
    issue: Option<IssueLink>,
}

impl Card {
    /// Builds a card of `column`; a content url makes it an issue card
    ///
    /// # Errors
    ///
    /// Fails when the content url does not end in `<owner>/<name>/issues/<number>`.
    pub fn new(
        column: &Column,
        id: u64,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        content_url: Option<String>,
    ) -> Result<Self, ModelError> {
        let issue = content_url
            .as_deref()
            .map(IssueLink::from_content_url)
            .transpose()?;
        Ok(Self {
            id,
            column_id: column.id,
            column_name: column.name.clone(),
            created_at,
            updated_at,
            content_url,
            issue,
        })
    }

    pub fn has_issue(&self) -> bool {
        self.issue.is_some()
    }

    pub fn issue_link(&self) -> Option<&IssueLink> {
        self.issue.as_ref()
    }

    /// Moves an issue card to the next stage, handing back notes unchanged
    pub fn into_linked(self) -> Result<LinkedCard, Card> {
        match self.issue.clone() {
            Some(link) => Ok(LinkedCard { card: self, link }),
            None => Err(self),
        }
    }
}

/// A card known to link an issue, waiting for its timeline and detail
#[derive(Debug, Clone, PartialEq)]
pub struct LinkedCard {
    card: Card,
    link: IssueLink,
}

impl LinkedCard {
    pub fn card(&self) -> &Card {
        &self.card
    }

    pub fn link(&self) -> &IssueLink {
        &self.link
    }

    /// Attaches the timeline (in API order) and the issue detail, if it could be fetched
    pub fn complete(self, events: Vec<Event>, issue: Option<Issue>) -> Story {
        Story {
            card: self.card,
            link: self.link,
            events,
            issue,
        }
    }
}

/// Current state of a story derived from its timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum CardState {
    Open,
    Reopened,
    Closed,
}

/// An issue card with its timeline and issue detail attached
#[derive(Debug, Clone, PartialEq)]
pub struct Story {
    card: Card,
    link: IssueLink,
    events: Vec<Event>,
    issue: Option<Issue>,
}

impl Story {
    pub fn card(&self) -> &Card {
        &self.card
    }

    pub fn link(&self) -> &IssueLink {
        &self.link
    }

    pub fn repository(&self) -> &Repository {
        &self.link.repository
    }

    pub fn issue_number(&self) -> u64 {
        self.link.number
    }

    pub fn column_name(&self) -> &str {
        &self.card.column_name
    }

    /// Timeline in the chronological order the API returned it
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn issue(&self) -> Option<&Issue> {
        self.issue.as_ref()
    }

    /// Estimate of the first event within `[start, end]` carrying an estimate label
    pub fn estimate_within(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Estimate> {
        self.events
            .iter()
            .filter(|event| start <= event.created_at && event.created_at <= end)
            .find_map(|event| event.estimate)
    }

    /// Estimate of the last event carrying an estimate label
    pub fn current_estimate(&self) -> Option<Estimate> {
        self.events.iter().rev().find_map(|event| event.estimate)
    }

    /// Kind of the latest `reopened`/`closed` event, `Open` without one
    pub fn state(&self) -> CardState {
        self.events
            .iter()
            .rev()
            .find(|event| event.is_state_change())
            .map(|event| match event.kind {
                super::EventKind::Closed => CardState::Closed,
                _ => CardState::Reopened,
            })
            .unwrap_or(CardState::Open)
    }

    pub fn was_assigned(&self) -> bool {
        self.events.iter().any(|event| event.assignee.is_some())
    }

    /// Pull requests that mentioned this issue, in timeline order
    pub fn pull_request_references(&self) -> impl Iterator<Item = &CrossReference> {
        self.events
            .iter()
            .filter_map(Event::referencing_pull_request)
    }

    pub fn title(&self) -> &str {
        self.issue
            .as_ref()
            .and_then(|issue| issue.title.as_deref())
            .map(str::trim)
            .unwrap_or("<untitled>")
    }

    pub fn url(&self) -> String {
        self.issue
            .as_ref()
            .and_then(|issue| issue.url.clone())
            .unwrap_or_else(|| {
                format!(
                    "https://github.com/{}/issues/{}",
                    self.link.repository, self.link.number
                )
            })
    }

    /// Display names of the assignees, `not assigned` when there are none
    ///
    /// `login_names` is keyed by lower-cased login.
    pub fn assignees(&self, login_names: &HashMap<String, String>) -> Vec<String> {
        let names: Vec<String> = self
            .issue
            .iter()
            .flat_map(|issue| issue.assignees.iter())
            .map(|login| {
                login_names
                    .get(&login.to_lowercase())
                    .cloned()
                    .unwrap_or_else(|| login.clone())
            })
            .collect();
        if names.is_empty() {
            vec!["not assigned".to_string()]
        } else {
            names
        }
    }

    /// Issue labels that are in the highlighted set
    pub fn special_labels<'a>(&'a self, special: &HashSet<String>) -> Vec<&'a str> {
        self.issue
            .iter()
            .flat_map(|issue| issue.labels.iter())
            .filter(|label| special.contains(label.as_str()))
            .map(String::as_str)
            .collect()
    }
}
