//! Sprint reports from GitHub project boards
//!
//! This library reads a classic GitHub project board together with the
//! timelines of its issues and the pull requests of the involved
//! repositories, sorts the stories into sprint buckets and renders a markdown
//! report.
//!
//! ## Pipeline
//!
//! - [`gateway`]: one call per remote collection behind the [`gateway::SprintGateway`] trait
//! - [`fetch`]: bounded fan-out of gateway calls into a read-only [`fetch::Snapshot`]
//! - [`sprint`]: sprint window, bucket classification, issue/pull request correlation
//! - [`report`]: markdown rendering
//!
//! [`services::generate_sprint_report`] runs all of them for one [`config::SprintConfig`].
//!
//! ## Authentication
//!
//! The access token is passed through to the GitHub gateway unchanged. The
//! binary reads it from `--github-token` or the `GHSPRINT_GITHUB_TOKEN`
//! environment variable.
//!
//! ```bash
//! export GHSPRINT_GITHUB_TOKEN=your_github_token
//! ghsprint "Sprint Board" acme/widgets acme/gadgets --keep-columns Backlog -vv
//! ```
//!
//! ## Limitations
//!
//! Every list endpoint is read as a single page of 100 records. Larger
//! boards and pull request lists are truncated.

pub mod config;
pub mod error;
pub mod fetch;
pub mod gateway;
pub mod models;
pub mod report;
pub mod services;
pub mod sprint;
