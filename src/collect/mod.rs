pub mod discovery;
pub mod pull_requests;
pub mod types;

#[cfg(test)]
mod testing;

pub use discovery::discover_repositories;
pub use pull_requests::collect_pull_requests;
pub use types::RepoRef;

use tracing::{info, warn};

use crate::config::CollectorConfig;
use crate::dataset::PrRecord;
use crate::github::GraphqlExecutor;

/// Result of a collection run.
#[derive(Debug, Default)]
pub struct Collection {
    pub repositories: Vec<RepoRef>,
    pub records: Vec<PrRecord>,
}

/// Discover repositories, then collect their eligible pull requests.
///
/// When discovery finds nothing, collection does not start.
pub async fn run(executor: &dyn GraphqlExecutor, config: &CollectorConfig) -> Collection {
    let repositories = discover_repositories(executor, config).await;
    info!(found = repositories.len(), "repository discovery finished");
    if repositories.is_empty() {
        warn!("no eligible repositories found, nothing to collect");
        return Collection::default();
    }

    let records = collect_pull_requests(
        executor,
        &repositories,
        config.pull_request_page_size,
        config.per_repository_cap,
    )
    .await;
    info!(records = records.len(), "pull request collection finished");

    Collection {
        repositories,
        records,
    }
}
