//! Sprint window and the classification/correlation engine
//!
//! Everything here is a pure function of a [`SprintWindow`] and a fetched
//! [`crate::fetch::Snapshot`], apart from [`correlate::resolve_linked_pull_requests`]
//! which may look up one missing pull request through the gateway.

pub mod classify;
pub mod correlate;

pub use classify::{Buckets, ClassifiedSprint, pull_requests_without_issue};
pub use correlate::{
    LinkedPullRequests, ReviewConsensus, link_pull_requests, pull_requests_pending_deploy,
    resolve_linked_pull_requests, reviewer_consensus,
};

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};

use crate::error::{ConfigError, SprintError};

/// Hour (UTC) a sprint starts on its first Wednesday
pub const SPRINT_START_HOUR: i64 = 9;
/// Hour (UTC) a sprint ends on its last day
pub const SPRINT_END_HOUR: i64 = 19;
/// Days from the first to the last day of a sprint
pub const SPRINT_LENGTH_DAYS: i64 = 6;
/// Last week index of a year
pub const MAX_WEEK: u32 = 53;

/// The `[start, end)` interval under report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SprintWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl SprintWindow {
    /// # Errors
    ///
    /// [`SprintError::InvalidWindow`] unless `end` is after `start`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, SprintError> {
        if end <= start {
            return Err(SprintError::InvalidWindow {
                start: start.to_rfc3339(),
                end: end.to_rfc3339(),
            });
        }
        Ok(Self { start, end })
    }

    /// The sprint running at `now`, starting on the last Wednesday on or before it
    pub fn containing(now: DateTime<Utc>) -> Self {
        Self::starting_week_of(now.date_naive())
    }

    /// The sprint of week `week` of the year `now` falls in
    ///
    /// Week 0 is the sprint starting on the last Wednesday on or before January 1st.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidWeek`] for a week after [`MAX_WEEK`].
    pub fn for_week(week: u32, now: DateTime<Utc>) -> Result<Self, SprintError> {
        if week > MAX_WEEK {
            return Err(ConfigError::InvalidWeek(week).into());
        }
        let today = now.date_naive();
        let new_year = today - Duration::days(i64::from(today.ordinal0()));
        let anchor = new_year
            .checked_add_signed(Duration::weeks(i64::from(week)))
            .ok_or(ConfigError::InvalidWeek(week))?;
        Ok(Self::starting_week_of(anchor))
    }

    /// [`SprintWindow::for_week`] when a week is given, else [`SprintWindow::containing`]
    pub fn resolve(week: Option<u32>, now: DateTime<Utc>) -> Result<Self, SprintError> {
        match week {
            Some(week) => Self::for_week(week, now),
            None => Ok(Self::containing(now)),
        }
    }

    fn starting_week_of(anchor: NaiveDate) -> Self {
        let days_back = (anchor.weekday().num_days_from_monday() + 7
            - Weekday::Wed.num_days_from_monday())
            % 7;
        let first_day = anchor - Duration::days(i64::from(days_back));
        let midnight = first_day.and_time(chrono::NaiveTime::MIN).and_utc();
        Self {
            start: midnight + Duration::hours(SPRINT_START_HOUR),
            end: midnight + Duration::days(SPRINT_LENGTH_DAYS) + Duration::hours(SPRINT_END_HOUR),
        }
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Whether `at` is strictly between start and end
    pub fn strictly_contains(&self, at: DateTime<Utc>) -> bool {
        self.start < at && at < self.end
    }

    /// Estimates set during the day before the sprint started
    pub fn leftover_range(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        (self.start - Duration::days(1), self.start)
    }

    /// Estimates set in planning, the first eight hours of the sprint
    pub fn planning_range(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        (self.start, self.start + Duration::hours(8))
    }

    /// Estimates revised during the last twelve hours of the sprint
    pub fn re_estimate_range(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        (self.end - Duration::hours(12), self.end)
    }
}
