//! GraphQL documents sent by the collector.

/// Popular repositories with their MERGED + CLOSED pull request totals.
pub const SEARCH_REPOSITORIES: &str = r#"
query SearchRepositories($searchQuery: String!, $pageSize: Int!, $cursor: String) {
  search(query: $searchQuery, type: REPOSITORY, first: $pageSize, after: $cursor) {
    pageInfo {
      endCursor
      hasNextPage
    }
    edges {
      node {
        ... on Repository {
          owner { login }
          name
          pullRequests(states: [MERGED, CLOSED]) {
            totalCount
          }
        }
      }
    }
  }
}
"#;

/// One page of a repository's finished pull requests, newest first.
///
/// Sub-collections ask for a single node: only their `totalCount` is used.
pub const REPOSITORY_PULL_REQUESTS: &str = r#"
query RepositoryPullRequests($owner: String!, $name: String!, $pageSize: Int!, $cursor: String) {
  repository(owner: $owner, name: $name) {
    pullRequests(
      states: [MERGED, CLOSED],
      first: $pageSize,
      after: $cursor,
      orderBy: { field: CREATED_AT, direction: DESC }
    ) {
      pageInfo {
        endCursor
        hasNextPage
      }
      nodes {
        state
        createdAt
        closedAt
        mergedAt
        additions
        deletions
        files(first: 1) { totalCount }
        bodyText
        participants(first: 1) { totalCount }
        comments(first: 1) { totalCount }
        reviews(first: 1) { totalCount }
      }
    }
  }
}
"#;
