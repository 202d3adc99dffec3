use serde_json::json;
use tracing::{error, info, instrument, warn};

use super::RepoRef;
use crate::config::CollectorConfig;
use crate::github::types::{count, SearchData, SearchNode};
use crate::github::{self, queries, GithubError, GraphqlExecutor, Page, Paginator};

async fn fetch_search_page(
    executor: &dyn GraphqlExecutor,
    config: &CollectorConfig,
    cursor: Option<String>,
) -> Result<Page<SearchNode>, GithubError> {
    let variables = json!({
        "searchQuery": config.search_query,
        "pageSize": config.repository_page_size,
        "cursor": cursor,
    });
    let data: SearchData = github::query(executor, queries::SEARCH_REPOSITORIES, variables).await?;
    let search = data.search.ok_or(GithubError::MissingData)?;

    Ok(Page {
        items: search.edges.into_iter().filter_map(|edge| edge.node).collect(),
        page_info: search.page_info,
    })
}

/// A search hit qualifies when it is a repository with enough finished PRs.
fn qualifying(node: SearchNode, min_pull_requests: u64) -> Option<RepoRef> {
    let owner = node.owner?.login;
    let name = node.name?;
    (count(&node.pull_requests) >= min_pull_requests).then(|| RepoRef::new(owner, name))
}

/// Walk the repository search, most-starred first, keeping repositories with
/// at least `min_pull_requests` MERGED + CLOSED pull requests until
/// `target_repositories` are found.
///
/// Returns fewer repositories when the search runs out or a page cannot be
/// fetched.
#[instrument(skip_all, fields(target = config.target_repositories, min_prs = config.min_pull_requests))]
pub async fn discover_repositories(executor: &dyn GraphqlExecutor, config: &CollectorConfig) -> Vec<RepoRef> {
    let target = config.target_repositories;
    let mut found = Vec::new();
    if target == 0 {
        return found;
    }

    info!("searching for eligible repositories");
    let mut paginator = Paginator::new();
    while let Some(result) = paginator
        .next_page(|cursor| fetch_search_page(executor, config, cursor))
        .await
    {
        let page = match result {
            Ok(page) => page,
            Err(e) => {
                error!(error = %e, "repository search failed, stopping discovery");
                break;
            }
        };

        for node in page.items {
            let Some(repo) = qualifying(node, config.min_pull_requests) else {
                continue;
            };
            info!(repository = %repo, found = found.len() + 1, target, "eligible repository");
            found.push(repo);
            if found.len() >= target {
                return found;
            }
        }

        if paginator.is_done() {
            warn!(found = found.len(), target, "search exhausted before reaching the target");
        }
    }
    found
}
