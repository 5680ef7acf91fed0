use chrono::{DateTime, Utc};
use strum::{AsRefStr, Display, EnumString};

use super::{Estimate, IssueState, Repository};

/// Timeline event kinds the sprint engine looks at
///
/// The gateway drops every other timeline entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "kebab-case")]
pub enum EventKind {
    Labeled,
    Unlabeled,
    Reopened,
    Closed,
    Assigned,
    CrossReferenced,
}

/// The issue or pull request that mentioned an issue, copied from a
/// `cross-referenced` event
#[derive(Debug, Clone, PartialEq)]
pub struct CrossReference {
    pub repository: Repository,
    pub number: u64,
    pub title: Option<String>,
    pub state: IssueState,
    pub is_pull_request: bool,
    pub body: Option<String>,
}

/// One timeline entry of an issue
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub id: Option<u64>,
    pub created_at: DateTime<Utc>,
    pub kind: EventKind,
    /// Label name of `labeled`/`unlabeled` events
    pub label: Option<String>,
    /// Estimate carried by `label`, if it is an estimate label
    pub estimate: Option<Estimate>,
    /// Assignee login of `assigned` events
    pub assignee: Option<String>,
    /// Referencing issue or pull request of `cross-referenced` events
    pub source: Option<CrossReference>,
}

impl Event {
    pub fn new(created_at: DateTime<Utc>, kind: EventKind) -> Self {
        Self {
            id: None,
            created_at,
            kind,
            label: None,
            estimate: None,
            assignee: None,
            source: None,
        }
    }

    pub fn with_id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }

    /// Sets the label and looks up its estimate
    pub fn with_label(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.estimate = Estimate::from_label(&name);
        self.label = Some(name);
        self
    }

    pub fn with_assignee(mut self, login: impl Into<String>) -> Self {
        self.assignee = Some(login.into());
        self
    }

    pub fn with_source(mut self, source: CrossReference) -> Self {
        self.source = Some(source);
        self
    }

    /// The referencing pull request, if this event is a cross-reference from one
    pub fn referencing_pull_request(&self) -> Option<&CrossReference> {
        self.source
            .as_ref()
            .filter(|source| source.is_pull_request)
    }

    /// Whether this event changes the open/closed state
    pub fn is_state_change(&self) -> bool {
        matches!(self.kind, EventKind::Reopened | EventKind::Closed)
    }
}
