use chrono::{DateTime, Utc};
use tracing::Instrument;

use crate::config::SprintConfig;
use crate::error::SprintError;
use crate::fetch::{FetchLimits, FetchOrchestrator};
use crate::gateway::SprintGateway;
use crate::report::MarkdownReport;
use crate::sprint::{
    ClassifiedSprint, SprintWindow, link_pull_requests, pull_requests_pending_deploy,
};

/// Generates the markdown sprint report for the sprint running at `now`
///
/// Runs the whole pipeline for one configuration:
/// 1. Resolves the sprint window from the configured week
/// 2. Fetches the board, issues and pull requests through `gateway`
/// 3. Classifies the stories and resolves their linked pull requests
/// 4. Compares the production tag with the base branch when a tag is configured
/// 5. Renders the report
///
/// All logging of the run happens inside one `sprint_run` span.
///
/// # Errors
///
/// Returns an error if:
/// - The configured week is past the end of the year
/// - No configured repository has the project, or a project list cannot be fetched
/// - A pull request referenced by a story cannot be looked up
pub async fn generate_sprint_report(
    config: &SprintConfig,
    gateway: &dyn SprintGateway,
    now: DateTime<Utc>,
) -> Result<String, SprintError> {
    generate_sprint_report_with_limits(config, gateway, now, FetchLimits::default()).await
}

/// [`generate_sprint_report`] with explicit fan-out limits
pub async fn generate_sprint_report_with_limits(
    config: &SprintConfig,
    gateway: &dyn SprintGateway,
    now: DateTime<Utc>,
    limits: FetchLimits,
) -> Result<String, SprintError> {
    let span = tracing::info_span!(
        "sprint_run",
        project = %config.project_name,
        repositories = config.repositories.len()
    );
    let window = SprintWindow::resolve(config.week, now)?;
    span.in_scope(|| {
        tracing::info!(
            "Sprint window {} - {}",
            window.start().to_rfc3339(),
            window.end().to_rfc3339()
        )
    });

    let orchestrator = FetchOrchestrator::new(gateway, span.clone()).with_limits(limits);
    let snapshot = orchestrator
        .fetch(
            &config.project_name,
            &config.repositories,
            &config.ignore_columns,
        )
        .await?;

    async {
        let sprint = ClassifiedSprint::classify(&snapshot, window, &config.keep_columns);
        let linked = link_pull_requests(
            &sprint.reported_stories(),
            &snapshot.pull_requests,
            gateway,
        )
        .await?;

        let report = MarkdownReport::new(
            &sprint,
            &linked,
            &config.login_names,
            &config.special_labels,
        );
        let rendered = match config.production_tag.as_deref() {
            Some(tag) => {
                let undeployed = orchestrator
                    .fetch_undeployed_commits(&config.repositories, tag, &config.base_branch)
                    .await;
                let pending = pull_requests_pending_deploy(&undeployed, &snapshot.pull_requests);
                report.with_pending_deploy(&pending).to_string()
            }
            None => report.to_string(),
        };
        Ok::<_, SprintError>(rendered)
    }
    .instrument(span.clone())
    .await
}
