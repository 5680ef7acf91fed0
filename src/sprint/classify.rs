//! Sprint buckets
//!
//! Leftover, current and re-estimated membership are tested against three
//! different time ranges and are independent of each other. A story can be in
//! all three at once.

use std::collections::{HashMap, HashSet};

use super::SprintWindow;
use crate::fetch::Snapshot;
use crate::models::{CardState, Estimate, PullRequest, Story};

/// Estimate set in the day before the sprint
pub fn leftover_estimate(story: &Story, window: &SprintWindow) -> Option<Estimate> {
    let (from, to) = window.leftover_range();
    story.estimate_within(from, to)
}

/// Estimate set during planning
pub fn planning_estimate(story: &Story, window: &SprintWindow) -> Option<Estimate> {
    let (from, to) = window.planning_range();
    story.estimate_within(from, to)
}

/// Estimate revised at the end of the sprint
pub fn re_estimate(story: &Story, window: &SprintWindow) -> Option<Estimate> {
    let (from, to) = window.re_estimate_range();
    story.estimate_within(from, to)
}

/// Bucket membership of one story
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Buckets {
    pub leftover: bool,
    pub current: bool,
    pub re_estimated: bool,
    pub stale: bool,
}

impl Buckets {
    /// `keep_columns` is matched against the column name exactly, case included
    pub fn of(story: &Story, window: &SprintWindow, keep_columns: &HashSet<String>) -> Self {
        let leftover = leftover_estimate(story, window).is_some();
        let current = planning_estimate(story, window).is_some();
        let re_estimated = re_estimate(story, window).is_some();
        let stale = keep_columns.contains(story.column_name()) && !leftover && !current;
        Self {
            leftover,
            current,
            re_estimated,
            stale,
        }
    }
}

/// Pull requests created strictly inside the window that close no issue
pub fn pull_requests_without_issue<'a>(
    pull_requests: &'a [PullRequest],
    window: &SprintWindow,
) -> Vec<&'a PullRequest> {
    pull_requests
        .iter()
        .filter(|pr| pr.closes().is_empty() && window.strictly_contains(pr.created_at))
        .collect()
}

/// A snapshot sorted into sprint buckets
#[derive(Debug, Clone)]
pub struct ClassifiedSprint<'a> {
    window: SprintWindow,
    pub leftover: Vec<&'a Story>,
    pub current: Vec<&'a Story>,
    pub stale: Vec<&'a Story>,
    pub re_estimated: Vec<&'a Story>,
    pub pull_requests: &'a [PullRequest],
    pub without_issue: Vec<&'a PullRequest>,
}

impl<'a> ClassifiedSprint<'a> {
    pub fn classify(
        snapshot: &'a Snapshot,
        window: SprintWindow,
        keep_columns: &HashSet<String>,
    ) -> Self {
        let mut sprint = Self {
            window,
            leftover: Vec::new(),
            current: Vec::new(),
            stale: Vec::new(),
            re_estimated: Vec::new(),
            pull_requests: &snapshot.pull_requests,
            without_issue: pull_requests_without_issue(&snapshot.pull_requests, &window),
        };
        for story in &snapshot.stories {
            let buckets = Buckets::of(story, &window, keep_columns);
            if buckets.leftover {
                sprint.leftover.push(story);
            }
            if buckets.current {
                sprint.current.push(story);
            }
            if buckets.stale {
                sprint.stale.push(story);
            }
            if buckets.re_estimated {
                sprint.re_estimated.push(story);
            }
        }
        tracing::info!(
            "Classified {} stories: {} leftover, {} current, {} stale, {} re-estimated, {} PRs without issue",
            snapshot.stories.len(),
            sprint.leftover.len(),
            sprint.current.len(),
            sprint.stale.len(),
            sprint.re_estimated.len(),
            sprint.without_issue.len()
        );
        sprint
    }

    pub fn window(&self) -> &SprintWindow {
        &self.window
    }

    /// Sum of the current estimates of closed leftover and current stories
    ///
    /// A story in both buckets counts once.
    pub fn velocity(&self) -> f64 {
        let done: HashMap<u64, &Story> = self
            .leftover
            .iter()
            .chain(self.current.iter())
            .filter(|story| story.state() == CardState::Closed)
            .map(|story| (story.card().id, *story))
            .collect();
        done.values()
            .filter_map(|story| story.current_estimate())
            .map(Estimate::value)
            .sum()
    }

    /// Stories rendered in the report, each once
    pub fn reported_stories(&self) -> Vec<&'a Story> {
        let mut seen = HashSet::new();
        self.leftover
            .iter()
            .chain(self.current.iter())
            .chain(self.stale.iter())
            .filter(|story| seen.insert(story.card().id))
            .copied()
            .collect()
    }
}
