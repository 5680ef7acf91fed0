//! Markdown sprint report

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::models::{PullRequest, Story};
use crate::sprint::classify::{leftover_estimate, planning_estimate, re_estimate};
use crate::sprint::{ClassifiedSprint, LinkedPullRequests, reviewer_consensus};

/// Renders a classified sprint as markdown through [`fmt::Display`]
pub struct MarkdownReport<'r, 'a> {
    sprint: &'r ClassifiedSprint<'a>,
    linked: &'r LinkedPullRequests<'a>,
    login_names: &'r HashMap<String, String>,
    special_labels: &'r HashSet<String>,
    pending_deploy: Option<&'r [&'a PullRequest]>,
}

impl<'r, 'a> MarkdownReport<'r, 'a> {
    pub fn new(
        sprint: &'r ClassifiedSprint<'a>,
        linked: &'r LinkedPullRequests<'a>,
        login_names: &'r HashMap<String, String>,
        special_labels: &'r HashSet<String>,
    ) -> Self {
        Self {
            sprint,
            linked,
            login_names,
            special_labels,
            pending_deploy: None,
        }
    }

    /// Adds the `Not yet in production` section
    pub fn with_pending_deploy(mut self, pull_requests: &'r [&'a PullRequest]) -> Self {
        self.pending_deploy = Some(pull_requests);
        self
    }

    fn title(&self) -> String {
        if self.sprint.current.is_empty() {
            return "Sprint report".to_string();
        }
        self.sprint
            .current
            .iter()
            .map(|story| story.title())
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn display_name<'n>(&'n self, login: &'n str) -> &'n str {
        self.login_names
            .get(&login.to_lowercase())
            .map(String::as_str)
            .unwrap_or(login)
    }

    fn write_story(&self, f: &mut fmt::Formatter<'_>, story: &Story) -> fmt::Result {
        let window = self.sprint.window();
        let estimate = planning_estimate(story, window)
            .or_else(|| leftover_estimate(story, window))
            .map(|estimate| estimate.to_string())
            .unwrap_or_else(|| "?".to_string());
        let revised = re_estimate(story, window)
            .map(|estimate| estimate.to_string())
            .unwrap_or_else(|| "?".to_string());

        write!(
            f,
            "- {} [**{}({})**] [**{}**]({} ) {}",
            story.state(),
            revised,
            estimate,
            story.title(),
            story.url(),
            story.assignees(self.login_names).join(", ")
        )?;
        for label in story.special_labels(self.special_labels) {
            write!(f, " `{}`", label)?;
        }
        writeln!(f)?;

        if let Some(pull_requests) = self.linked.get(&story.card().id) {
            for pr in pull_requests {
                self.write_pull_request(f, "  ", pr)?;
            }
        }
        Ok(())
    }

    fn write_pull_request(
        &self,
        f: &mut fmt::Formatter<'_>,
        indent: &str,
        pr: &PullRequest,
    ) -> fmt::Result {
        writeln!(
            f,
            "{}- PR {} {} [{} #{} {}]({} ) {}",
            indent,
            pr.display_state(),
            reviewer_consensus(pr),
            pr.repository.name,
            pr.number,
            pr.title.trim(),
            pr.url,
            self.display_name(&pr.author)
        )
    }

    fn write_stories(
        &self,
        f: &mut fmt::Formatter<'_>,
        heading: &str,
        stories: &[&Story],
    ) -> fmt::Result {
        writeln!(f, "# {}", heading)?;
        writeln!(f)?;
        for story in stories {
            self.write_story(f, story)?;
        }
        writeln!(f)
    }
}

impl fmt::Display for MarkdownReport<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let window = self.sprint.window();
        writeln!(f, "# {}", self.title())?;
        writeln!(f)?;
        writeln!(
            f,
            "{} - {}",
            window.start().format("%d. %B"),
            window.end().format("%d. %B %Y")
        )?;
        writeln!(f)?;
        writeln!(f, "Velocity: **{}**", format_points(self.sprint.velocity()))?;
        writeln!(f)?;

        if !self.sprint.leftover.is_empty() {
            self.write_stories(f, "Leftover stories from last week", &self.sprint.leftover)?;
        }
        self.write_stories(f, "Stories of the week", &self.sprint.current)?;
        if !self.sprint.stale.is_empty() {
            self.write_stories(f, "Stale stories", &self.sprint.stale)?;
        }

        writeln!(f, "# PRs without issue")?;
        writeln!(f)?;
        for pr in &self.sprint.without_issue {
            self.write_pull_request(f, "", pr)?;
        }

        if let Some(pending) = self.pending_deploy {
            writeln!(f)?;
            writeln!(f, "# Not yet in production")?;
            writeln!(f)?;
            for pr in pending {
                self.write_pull_request(f, "", pr)?;
            }
        }
        Ok(())
    }
}

fn format_points(points: f64) -> String {
    if points.fract() == 0.0 {
        format!("{}", points as i64)
    } else {
        format!("{}", points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_points() {
        assert_eq!(format_points(0.0), "0");
        assert_eq!(format_points(13.0), "13");
        assert_eq!(format_points(3.5), "3.5");
    }
}
