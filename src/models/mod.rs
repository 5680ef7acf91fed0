//! Entity models built from remote records
//!
//! Models are plain values: the gateway builds them from validated API
//! records and nothing in them touches the network.

mod board;
mod commit;
mod estimate;
mod event;
mod issue;
mod pull_request;
mod repository;

pub use board::{Card, CardState, Column, IssueLink, LinkedCard, Project, Story};
pub use commit::Commit;
pub use estimate::Estimate;
pub use event::{CrossReference, Event, EventKind};
pub use issue::{Issue, IssueState};
pub use pull_request::{
    PullRequest, PullRequestInfo, PullRequestStats, Review, ReviewState, find_pull_request,
};
pub use repository::Repository;
