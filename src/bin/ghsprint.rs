use std::time::Duration;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use tracing_subscriber::EnvFilter;

use ghsprint::config::{SprintArgs, SprintConfig};
use ghsprint::gateway::GithubGateway;
use ghsprint::services::generate_sprint_report;

#[derive(Parser)]
#[command(author, version = "0.1.0", about = "Sprint report for a GitHub project board", long_about = None)]
struct Cli {
    /// GitHub API token for authentication (overrides GHSPRINT_GITHUB_TOKEN environment variable)
    #[arg(short = 't', long, env = "GHSPRINT_GITHUB_TOKEN", hide_env_values = true)]
    github_token: Option<String>,

    /// Name of the project board, matched ignoring case
    project_name: String,

    /// Repositories to search for the board, as `owner/name`
    #[arg(required = true)]
    repos: Vec<String>,

    /// Comma separated column names to leave out
    #[arg(long)]
    ignore_columns: Option<String>,

    /// Comma separated column names whose untouched stories are reported as stale
    #[arg(long)]
    keep_columns: Option<String>,

    /// Comma separated `<login>:<name>` pairs used to display assignees
    #[arg(long)]
    login_name_mapper: Option<String>,

    /// Comma separated labels shown next to a story
    #[arg(long)]
    special_tags: Option<String>,

    /// Sprint of the given week of the current year instead of the current sprint
    #[arg(short, long)]
    week: Option<u32>,

    /// Tag deployed to production; lists merged PRs it does not contain yet
    #[arg(long)]
    production_tag: Option<String>,

    /// Branch compared against the production tag (default is 'master')
    #[arg(long)]
    base_branch: Option<String>,

    /// GitHub API base url
    #[arg(long)]
    api_url: Option<String>,

    /// Increase log verbosity (-v warn, -vv info, -vvv debug)
    #[arg(short, action = ArgAction::Count)]
    verbose: u8,
}

impl From<Cli> for SprintArgs {
    fn from(cli: Cli) -> Self {
        SprintArgs {
            access_token: cli.github_token,
            project_name: cli.project_name,
            repositories: cli.repos,
            ignore_columns: cli.ignore_columns,
            keep_columns: cli.keep_columns,
            login_name_mapper: cli.login_name_mapper,
            special_tags: cli.special_tags,
            week: cli.week,
            production_tag: cli.production_tag,
            base_branch: cli.base_branch,
            api_url: cli.api_url,
        }
    }
}

fn log_level(verbose: u8) -> tracing::Level {
    match verbose {
        0 => tracing::Level::ERROR,
        1 => tracing::Level::WARN,
        2 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(log_level(cli.verbose).into()),
        )
        .with_writer(std::io::stderr) // stdout carries the report
        .with_target(false)
        .init();

    let config = SprintConfig::from_args(cli.into()).context("Invalid configuration")?;

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .context("Failed to build HTTP client")?;
    let gateway =
        GithubGateway::with_base_url(client, config.access_token.clone(), config.api_url.clone());

    let report = generate_sprint_report(&config, &gateway, chrono::Utc::now())
        .await
        .with_context(|| format!("Failed to generate report for {}", config.project_name))?;
    println!("{}", report);
    Ok(())
}
