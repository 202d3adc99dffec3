//! Response shapes of the collector's GraphQL queries.
//!
//! Everything the API may leave out or null is optional here; deciding what
//! a missing value means is up to the collector.

use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub end_cursor: Option<String>,
    pub has_next_page: bool,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalCount {
    pub total_count: u64,
}

/// Reads `totalCount` of an optional sub-collection, treating absence as zero.
pub fn count(collection: &Option<TotalCount>) -> u64 {
    collection.map(|c| c.total_count).unwrap_or(0)
}

#[derive(Debug, Deserialize)]
pub struct SearchData {
    pub search: Option<SearchConnection>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchConnection {
    pub page_info: PageInfo,
    #[serde(default)]
    pub edges: Vec<SearchEdge>,
}

#[derive(Debug, Deserialize)]
pub struct SearchEdge {
    pub node: Option<SearchNode>,
}

/// A search hit. Non-repository hits deserialize with every field absent.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchNode {
    pub owner: Option<Owner>,
    pub name: Option<String>,
    pub pull_requests: Option<TotalCount>,
}

#[derive(Debug, Deserialize)]
pub struct Owner {
    pub login: String,
}

#[derive(Debug, Deserialize)]
pub struct RepositoryData {
    pub repository: Option<RepositoryNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryNode {
    pub pull_requests: Option<PullRequestConnection>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestConnection {
    pub page_info: PageInfo,
    #[serde(default)]
    pub nodes: Vec<Option<PullRequestNode>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestNode {
    pub state: String,
    pub created_at: Option<String>,
    pub closed_at: Option<String>,
    pub merged_at: Option<String>,
    #[serde(default)]
    pub additions: u64,
    #[serde(default)]
    pub deletions: u64,
    pub files: Option<TotalCount>,
    pub body_text: Option<String>,
    pub participants: Option<TotalCount>,
    pub comments: Option<TotalCount>,
    pub reviews: Option<TotalCount>,
}
