//! Tests for the GitHub REST gateway against a local mock server
//!
//! These tests verify that the gateway:
//! 1. Sends the token and the preview media types the classic APIs need
//! 2. Converts API records into models, dropping untracked timeline entries
//! 3. Reports HTTP, decode and record errors as distinct kinds

use ghsprint::error::GatewayError;
use ghsprint::gateway::{GithubGateway, SprintGateway};
use ghsprint::models::{Column, EventKind, IssueState, Repository, ReviewState};
use mockito::{Matcher, Server, ServerGuard};

const PROJECTS_PREVIEW: &str = "application/vnd.github.inertia-preview+json";
const TIMELINE_PREVIEW: &str = "application/vnd.github.mockingbird-preview+json";

fn widgets() -> Repository {
    Repository::new("acme", "widgets")
}

/// Matches a request path with any query string
fn path(path: &str) -> Matcher {
    Matcher::Regex(format!("^{}(\\?.*)?$", regex::escape(path)))
}

fn gateway(server: &ServerGuard) -> GithubGateway {
    GithubGateway::with_base_url(reqwest::Client::new(), Some("secret".to_string()), server.url())
}

#[tokio::test]
async fn test_list_projects_sends_token_and_preview() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", path("/repos/acme/widgets/projects"))
        .match_header("authorization", "token secret")
        .match_header("accept", PROJECTS_PREVIEW)
        .match_header("user-agent", Matcher::Regex("^ghsprint/".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"[{"id": 1, "name": "Sprint Board", "body": "", "state": "open"}]"#)
        .create_async()
        .await;

    let projects = gateway(&server).list_projects(&widgets()).await.unwrap();
    mock.assert_async().await;
    assert_eq!(projects.len(), 1);
    assert!(projects[0].has_name("sprint board"));
}

#[tokio::test]
async fn test_list_cards_reads_issue_links() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", path("/projects/columns/11/cards"))
        .match_query(Matcher::UrlEncoded("per_page".into(), "100".into()))
        .with_status(200)
        .with_body(
            r#"[
                {
                    "id": 1,
                    "note": null,
                    "created_at": "2019-02-06T08:00:00Z",
                    "updated_at": "2019-02-06T10:00:00Z",
                    "content_url": "https://api.github.com/repos/acme/gadgets/issues/42"
                },
                {
                    "id": 2,
                    "note": "Remember the demo",
                    "created_at": "2019-02-06T08:00:00Z",
                    "updated_at": "2019-02-06T08:00:00Z"
                }
            ]"#,
        )
        .create_async()
        .await;

    let column = Column {
        id: 11,
        project_id: 1,
        name: "Done".to_string(),
    };
    let cards = gateway(&server).list_cards(&column).await.unwrap();
    mock.assert_async().await;

    assert_eq!(cards.len(), 2);
    let link = cards[0].issue_link().unwrap();
    assert_eq!(link.repository, Repository::new("acme", "gadgets"));
    assert_eq!(link.number, 42);
    assert_eq!(cards[0].column_name, "Done");
    assert!(!cards[1].has_issue());
}

#[tokio::test]
async fn test_timeline_keeps_tracked_events_in_order() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", path("/repos/acme/widgets/issues/10/timeline"))
        .match_header("accept", TIMELINE_PREVIEW)
        .with_status(200)
        .with_body(
            r#"[
                {"id": 1, "event": "labeled", "created_at": "2019-02-06T10:00:00Z", "label": {"name": "3", "color": "fff"}},
                {"event": "commented", "created_at": "2019-02-06T10:30:00Z", "body": "on it"},
                {"id": 2, "event": "assigned", "created_at": "2019-02-06T11:00:00Z", "assignee": {"login": "octocat"}},
                {
                    "event": "cross-referenced",
                    "created_at": "2019-02-06T12:00:00Z",
                    "source": {
                        "type": "issue",
                        "issue": {
                            "number": 20,
                            "title": "Ship it",
                            "state": "closed",
                            "repository_url": "https://api.github.com/repos/acme/widgets",
                            "pull_request": {"url": "https://api.github.com/repos/acme/widgets/pulls/20"}
                        }
                    }
                },
                {"id": 3, "event": "closed", "created_at": "2019-02-06T13:00:00Z"}
            ]"#,
        )
        .create_async()
        .await;

    let events = gateway(&server)
        .list_issue_events(&widgets(), 10)
        .await
        .unwrap();
    mock.assert_async().await;

    let kinds: Vec<EventKind> = events.iter().map(|event| event.kind).collect();
    assert_eq!(
        kinds,
        vec![
            EventKind::Labeled,
            EventKind::Assigned,
            EventKind::CrossReferenced,
            EventKind::Closed
        ]
    );
    assert_eq!(events[0].estimate.map(|e| e.value()), Some(3.0));
    assert_eq!(events[1].assignee.as_deref(), Some("octocat"));
    let source = events[2].referencing_pull_request().unwrap();
    assert_eq!(source.number, 20);
    assert_eq!(source.state, IssueState::Closed);
}

#[tokio::test]
async fn test_pull_requests_parse_closes_lines() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", path("/repos/acme/widgets/pulls"))
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("state".into(), "all".into()),
            Matcher::UrlEncoded("per_page".into(), "100".into()),
        ]))
        .with_status(200)
        .with_body(
            r#"[{
                "id": 500,
                "number": 20,
                "title": "Ship it",
                "state": "closed",
                "created_at": "2019-02-07T10:00:00Z",
                "updated_at": "2019-02-07T12:00:00Z",
                "merged_at": "2019-02-07T12:00:00Z",
                "html_url": "https://github.com/acme/widgets/pull/20",
                "body": "Ships it\r\n\r\n- closes #10\r\n- closes none",
                "merge_commit_sha": "abc",
                "user": {"login": "octocat"},
                "labels": [{"name": "backend"}]
            }]"#,
        )
        .create_async()
        .await;

    let prs = gateway(&server).list_pull_requests(&widgets()).await.unwrap();
    mock.assert_async().await;

    assert_eq!(prs.len(), 1);
    let pr = &prs[0];
    assert_eq!(pr.display_state(), "merged");
    assert_eq!(pr.author, "octocat");
    assert_eq!(pr.labels, vec!["backend".to_string()]);
    assert_eq!(pr.closes().len(), 1);
    assert_eq!(pr.closes()[0].number, 10);
    assert_eq!(pr.closes()[0].repository, widgets());
}

#[tokio::test]
async fn test_reviews_and_stats() {
    let mut server = Server::new_async().await;
    let reviews_mock = server
        .mock("GET", path("/repos/acme/widgets/pulls/20/reviews"))
        .with_status(200)
        .with_body(
            r#"[
                {"html_url": "https://github.com/acme/widgets/pull/20#r1", "user": {"login": "alice"}, "state": "COMMENTED", "submitted_at": "2019-02-07T10:00:00Z"},
                {"html_url": "https://github.com/acme/widgets/pull/20#r2", "user": {"login": "alice"}, "state": "APPROVED", "submitted_at": "2019-02-07T11:00:00Z"}
            ]"#,
        )
        .create_async()
        .await;
    let stats_mock = server
        .mock("GET", path("/repos/acme/widgets/pulls/20"))
        .with_status(200)
        .with_body(r#"{"additions": 12, "deletions": 3, "changed_files": 2, "draft": false, "labels": []}"#)
        .create_async()
        .await;

    let gateway = gateway(&server);
    let reviews = gateway.list_reviews(&widgets(), 20).await.unwrap();
    let stats = gateway.get_pull_request_stats(&widgets(), 20).await.unwrap();
    reviews_mock.assert_async().await;
    stats_mock.assert_async().await;

    assert_eq!(reviews.len(), 2);
    assert_eq!(reviews[1].state, ReviewState::Approved);
    assert_eq!(reviews[1].reviewer, "alice");
    assert_eq!(stats.additions, 12);
    assert_eq!(stats.changed_files, 2);
}

#[tokio::test]
async fn test_compare_maps_squash_commits() {
    let mut server = Server::new_async().await;
    let tag_mock = server
        .mock("GET", path("/repos/acme/widgets/git/ref/tags/v1.0"))
        .with_status(200)
        .with_body(r#"{"ref": "refs/tags/v1.0", "object": {"sha": "aaa", "type": "commit"}}"#)
        .create_async()
        .await;
    let compare_mock = server
        .mock("GET", path("/repos/acme/widgets/compare/aaa...bbb"))
        .with_status(200)
        .with_body(
            r#"{"commits": [
                {"sha": "c1", "commit": {"message": "Ship it (#20)\n\n* details", "tree": {"sha": "t1"}, "committer": {"name": "GitHub", "date": "2019-02-07T12:00:00Z"}}},
                {"sha": "c2", "commit": {"message": "Fix typo", "tree": {"sha": "t2"}, "committer": {"name": "octocat", "date": "2019-02-07T13:00:00Z"}}}
            ]}"#,
        )
        .create_async()
        .await;

    let gateway = gateway(&server);
    let tag_sha = gateway.get_tag_sha(&widgets(), "v1.0").await.unwrap();
    assert_eq!(tag_sha, "aaa");
    let commits = gateway
        .compare_commits(&widgets(), &tag_sha, "bbb")
        .await
        .unwrap();
    tag_mock.assert_async().await;
    compare_mock.assert_async().await;

    assert_eq!(commits.len(), 2);
    assert_eq!(commits[0].pull_request_number, Some(20));
    assert_eq!(commits[1].pull_request_number, None);
}

#[tokio::test]
async fn test_error_status_is_transient() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", path("/repos/acme/widgets/issues/10"))
        .with_status(502)
        .with_body("Bad Gateway")
        .create_async()
        .await;

    let err = gateway(&server).get_issue(&widgets(), 10).await.unwrap_err();
    match &err {
        GatewayError::Status { status, body, .. } => {
            assert_eq!(*status, 502);
            assert_eq!(body, "Bad Gateway");
        }
        other => panic!("unexpected error: {}", other),
    }
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_malformed_body_is_terminal() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", path("/projects/1/columns"))
        .with_status(200)
        .with_body(r#"{"message": "not a list"}"#)
        .create_async()
        .await;

    let err = gateway(&server).list_columns(1).await.unwrap_err();
    assert!(matches!(err, GatewayError::Decode { .. }));
    assert!(!err.is_transient());
}

#[tokio::test]
async fn test_invalid_card_link_is_terminal() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", path("/projects/columns/11/cards"))
        .with_status(200)
        .with_body(
            r#"[{"id": 1, "created_at": "2019-02-06T08:00:00Z", "updated_at": "2019-02-06T08:00:00Z", "content_url": "not a url"}]"#,
        )
        .create_async()
        .await;

    let column = Column {
        id: 11,
        project_id: 1,
        name: "Done".to_string(),
    };
    let err = gateway(&server).list_cards(&column).await.unwrap_err();
    assert!(matches!(err, GatewayError::InvalidRecord { .. }));
}

#[tokio::test]
async fn test_list_issues() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", path("/repos/acme/widgets/issues"))
        .with_status(200)
        .with_body(
            r#"[{
                "id": 900,
                "number": 10,
                "title": "Ship the widget",
                "html_url": "https://github.com/acme/widgets/issues/10",
                "state": "open",
                "closed_at": null,
                "assignees": [{"login": "octocat"}],
                "labels": [{"name": "3"}, {"name": "urgent"}]
            }]"#,
        )
        .create_async()
        .await;

    let issues = gateway(&server).list_issues(&widgets()).await.unwrap();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].number, 10);
    assert_eq!(issues[0].state, IssueState::Open);
    assert_eq!(issues[0].assignees, vec!["octocat".to_string()]);
    assert_eq!(issues[0].labels, vec!["3".to_string(), "urgent".to_string()]);
    assert_eq!(issues[0].repository, widgets());
}
