use chrono::{DateTime, Duration, FixedOffset};
use serde_json::json;
use tracing::{debug, info, instrument, warn};

use super::RepoRef;
use crate::analysis::stats::round_to;
use crate::dataset::PrRecord;
use crate::github::types::{count, PullRequestNode, RepositoryData};
use crate::github::{self, queries, GithubError, GraphqlExecutor, Page, Paginator};

/// Shortest creation-to-final span a pull request must have to be kept.
pub const MIN_REVIEW_DURATION_SECS: i64 = 3600;

fn parse_timestamp(value: Option<&str>) -> Option<DateTime<FixedOffset>> {
    value
        .filter(|s| !s.is_empty())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
}

/// Time from creation to merge, or to close when the PR was never merged.
pub fn review_duration(node: &PullRequestNode) -> Option<Duration> {
    let created = parse_timestamp(node.created_at.as_deref())?;
    let finished = node
        .merged_at
        .as_deref()
        .filter(|s| !s.is_empty())
        .or(node.closed_at.as_deref());
    let finished = parse_timestamp(finished)?;
    Some(finished.signed_duration_since(created))
}

/// Apply the eligibility filters and map a surviving node to its record.
///
/// A PR is kept when it has at least one review and was open for at least an
/// hour; missing or unparseable timestamps reject it.
pub fn eligible_record(repo: &RepoRef, node: &PullRequestNode) -> Option<PrRecord> {
    let reviews = count(&node.reviews);
    if reviews < 1 {
        return None;
    }

    let duration = review_duration(node)?;
    if duration < Duration::seconds(MIN_REVIEW_DURATION_SECS) {
        return None;
    }

    Some(PrRecord {
        repository: repo.to_string(),
        final_status: node.state.clone(),
        review_time_hours: round_to(duration.num_milliseconds() as f64 / 3_600_000.0, 2),
        files: count(&node.files),
        additions: node.additions,
        deletions: node.deletions,
        description_chars: node.body_text.as_deref().map_or(0, |s| s.chars().count() as u64),
        participants: count(&node.participants),
        comments: count(&node.comments),
        reviews,
    })
}

async fn fetch_pull_request_page(
    executor: &dyn GraphqlExecutor,
    repo: &RepoRef,
    page_size: u32,
    cursor: Option<String>,
) -> Result<Page<PullRequestNode>, GithubError> {
    let variables = json!({
        "owner": repo.owner,
        "name": repo.name,
        "pageSize": page_size,
        "cursor": cursor,
    });
    let data: RepositoryData = github::query(executor, queries::REPOSITORY_PULL_REQUESTS, variables).await?;
    let connection = data
        .repository
        .and_then(|r| r.pull_requests)
        .ok_or(GithubError::MissingData)?;

    Ok(Page {
        items: connection.nodes.into_iter().flatten().collect(),
        page_info: connection.page_info,
    })
}

/// Collect eligible pull requests of one repository, newest first.
///
/// Stops after `cap` eligible records, abandoning the rest of the current
/// page, or when the repository runs out of pages. A failed page ends the
/// repository; records from earlier pages are kept.
#[instrument(skip(executor), fields(repository = %repo))]
pub async fn collect_repository(
    executor: &dyn GraphqlExecutor,
    repo: &RepoRef,
    page_size: u32,
    cap: Option<usize>,
) -> Vec<PrRecord> {
    let mut records = Vec::new();
    if cap == Some(0) {
        return records;
    }

    let mut paginator = Paginator::new();
    'pages: while let Some(result) = paginator
        .next_page(|cursor| fetch_pull_request_page(executor, repo, page_size, cursor))
        .await
    {
        let page = match result {
            Ok(page) => page,
            Err(e) => {
                warn!(error = %e, "could not fetch pull requests, skipping repository");
                break;
            }
        };

        for node in &page.items {
            let Some(record) = eligible_record(repo, node) else {
                debug!(state = %node.state, created_at = ?node.created_at, "pull request filtered out");
                continue;
            };
            records.push(record);
            if cap.is_some_and(|cap| records.len() >= cap) {
                info!(collected = records.len(), "per-repository cap reached");
                break 'pages;
            }
        }
        debug!(collected = records.len(), next_cursor = ?paginator.cursor(), "page processed");
    }
    records
}

/// Collect eligible pull requests from every repository in turn.
pub async fn collect_pull_requests(
    executor: &dyn GraphqlExecutor,
    repos: &[RepoRef],
    page_size: u32,
    cap: Option<usize>,
) -> Vec<PrRecord> {
    let mut all = Vec::new();
    for (index, repo) in repos.iter().enumerate() {
        info!(repository = %repo, position = index + 1, total = repos.len(), "processing repository");
        let records = collect_repository(executor, repo, page_size, cap).await;
        all.extend(records);
        info!(collected = all.len(), "eligible pull requests so far");
    }
    all
}

#[cfg(test)]
mod tests {
    use super::super::testing::{pr_node, pr_page, ScriptedExecutor};
    use super::*;

    fn node(value: serde_json::Value) -> PullRequestNode {
        serde_json::from_value(value).unwrap()
    }

    fn repo() -> RepoRef {
        RepoRef::new("octo", "widgets")
    }

    #[test]
    fn test_record_fields() {
        let mut value = pr_node(2, "2024-01-01T00:00:00Z", Some("2024-01-02T02:30:00Z"), Some("2024-01-02T02:30:00Z"));
        value["bodyText"] = json!("Fixes naïve parsing");
        let record = eligible_record(&repo(), &node(value)).unwrap();

        assert_eq!(record.repository, "octo/widgets");
        assert_eq!(record.final_status, "MERGED");
        assert_eq!(record.review_time_hours, 26.5);
        assert_eq!(record.files, 3);
        assert_eq!(record.additions, 40);
        assert_eq!(record.deletions, 8);
        assert_eq!(record.description_chars, 19);
        assert_eq!(record.participants, 2);
        assert_eq!(record.comments, 4);
        assert_eq!(record.reviews, 2);
    }

    #[test]
    fn test_rejects_unreviewed() {
        let value = pr_node(0, "2024-01-01T00:00:00Z", Some("2024-01-03T00:00:00Z"), None);
        assert!(eligible_record(&repo(), &node(value)).is_none());

        let mut missing = pr_node(1, "2024-01-01T00:00:00Z", Some("2024-01-03T00:00:00Z"), None);
        missing["reviews"] = serde_json::Value::Null;
        assert!(eligible_record(&repo(), &node(missing)).is_none());
    }

    #[test]
    fn test_duration_boundary() {
        let just_under = pr_node(1, "2024-01-01T00:00:00Z", None, Some("2024-01-01T00:59:59Z"));
        assert!(eligible_record(&repo(), &node(just_under)).is_none());

        let exactly = pr_node(1, "2024-01-01T00:00:00Z", None, Some("2024-01-01T01:00:00Z"));
        let record = eligible_record(&repo(), &node(exactly)).unwrap();
        assert_eq!(record.review_time_hours, 1.0);
        assert_eq!(record.final_status, "CLOSED");
    }

    #[test]
    fn test_merge_time_wins_over_close_time() {
        // merged quickly, closed (as GitHub reports for merged PRs) much later
        let value = pr_node(1, "2024-01-01T00:00:00Z", Some("2024-01-01T00:10:00Z"), Some("2024-01-05T00:00:00Z"));
        assert!(eligible_record(&repo(), &node(value)).is_none());
    }

    #[test]
    fn test_missing_or_bad_timestamps_reject() {
        let no_final = pr_node(1, "2024-01-01T00:00:00Z", None, None);
        assert!(eligible_record(&repo(), &node(no_final)).is_none());

        let garbage = pr_node(1, "yesterday", None, Some("2024-01-05T00:00:00Z"));
        assert!(eligible_record(&repo(), &node(garbage)).is_none());
    }

    #[test]
    fn test_offsets_are_honored() {
        let value = pr_node(1, "2024-01-01T10:00:00+02:00", None, Some("2024-01-01T09:30:00Z"));
        let duration = review_duration(&node(value)).unwrap();
        assert_eq!(duration, Duration::minutes(90));
    }

    #[tokio::test]
    async fn test_collects_across_pages_and_filters() {
        let executor = ScriptedExecutor::new(vec![
            Ok(pr_page(
                vec![
                    pr_node(1, "2024-01-01T00:00:00Z", Some("2024-01-01T05:00:00Z"), None),
                    pr_node(0, "2024-01-01T00:00:00Z", Some("2024-01-01T05:00:00Z"), None),
                    pr_node(3, "2024-01-01T00:00:00Z", None, Some("2024-01-01T00:30:00Z")),
                ],
                Some("c1"),
                true,
            )),
            Ok(pr_page(
                vec![pr_node(2, "2023-12-01T00:00:00Z", None, Some("2023-12-03T00:00:00Z"))],
                Some("c2"),
                false,
            )),
        ]);

        let records = collect_repository(&executor, &repo(), 25, None).await;
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.reviews >= 1 && r.review_time_hours >= 1.0));

        let calls = executor.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0]["owner"], "octo");
        assert_eq!(calls[0]["name"], "widgets");
        assert_eq!(calls[1]["cursor"], "c1");
        assert_eq!(calls[1]["pageSize"], 25);
    }

    #[tokio::test]
    async fn test_cap_limits_eligible_records() {
        let eligible = || pr_node(1, "2024-01-01T00:00:00Z", Some("2024-01-01T02:00:00Z"), None);
        let executor = ScriptedExecutor::new(vec![
            Ok(pr_page(vec![eligible(), eligible(), eligible()], Some("c1"), true)),
            Ok(pr_page(vec![eligible(), eligible(), eligible()], Some("c2"), true)),
            Ok(pr_page(vec![eligible(), eligible(), eligible()], None, false)),
        ]);

        let records = collect_repository(&executor, &repo(), 3, Some(4)).await;
        assert_eq!(records.len(), 4);
        // the cap was hit on the second page; the third is never requested
        assert_eq!(executor.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_cap_counts_only_eligible() {
        let eligible = || pr_node(1, "2024-01-01T00:00:00Z", Some("2024-01-01T02:00:00Z"), None);
        let rejected = || pr_node(0, "2024-01-01T00:00:00Z", Some("2024-01-01T02:00:00Z"), None);
        let executor = ScriptedExecutor::new(vec![
            Ok(pr_page(vec![rejected(), eligible(), rejected()], Some("c1"), true)),
            Ok(pr_page(vec![rejected(), eligible(), eligible()], None, false)),
        ]);

        let records = collect_repository(&executor, &repo(), 3, Some(2)).await;
        assert_eq!(records.len(), 2);
        assert_eq!(executor.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_page_keeps_earlier_records() {
        let executor = ScriptedExecutor::new(vec![
            Ok(pr_page(
                vec![pr_node(1, "2024-01-01T00:00:00Z", Some("2024-01-02T00:00:00Z"), None)],
                Some("c1"),
                true,
            )),
            Err(GithubError::Status {
                status: 502,
                body: String::new(),
            }),
        ]);

        let records = collect_repository(&executor, &repo(), 25, None).await;
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn test_unreachable_repository_is_skipped() {
        let executor = ScriptedExecutor::new(vec![
            Ok(json!({ "repository": null })),
            Ok(pr_page(
                vec![pr_node(1, "2024-01-01T00:00:00Z", Some("2024-01-02T00:00:00Z"), None)],
                None,
                false,
            )),
        ]);

        let repos = vec![RepoRef::new("gone", "away"), repo()];
        let records = collect_pull_requests(&executor, &repos, 25, None).await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].repository, "octo/widgets");
    }

    #[tokio::test]
    async fn test_zero_cap_makes_no_requests() {
        let executor = ScriptedExecutor::new(vec![]);
        assert!(collect_repository(&executor, &repo(), 25, Some(0)).await.is_empty());
        assert!(executor.calls().is_empty());
    }
}
