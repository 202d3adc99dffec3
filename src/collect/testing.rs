//! Scripted GraphQL responses for collector tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::github::{GithubError, GraphqlExecutor};

/// Replays queued results in order and records the variables of each call.
/// Runs out with `MissingData`.
pub struct ScriptedExecutor {
    responses: Mutex<VecDeque<Result<Value, GithubError>>>,
    calls: Mutex<Vec<Value>>,
}

impl ScriptedExecutor {
    pub fn new(responses: Vec<Result<Value, GithubError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Value> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl GraphqlExecutor for ScriptedExecutor {
    async fn execute(&self, _query: &str, variables: Value) -> Result<Value, GithubError> {
        self.calls.lock().unwrap().push(variables);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(GithubError::MissingData))
    }
}

/// `data` of a search page with `(owner, name, finished PR count)` hits.
pub fn search_page(repos: &[(&str, &str, u64)], end_cursor: Option<&str>, has_next_page: bool) -> Value {
    let edges: Vec<Value> = repos
        .iter()
        .map(|(owner, name, prs)| {
            json!({
                "node": {
                    "owner": { "login": owner },
                    "name": name,
                    "pullRequests": { "totalCount": prs },
                }
            })
        })
        .collect();

    json!({
        "search": {
            "pageInfo": { "endCursor": end_cursor, "hasNextPage": has_next_page },
            "edges": edges,
        }
    })
}

/// A pull request node; MERGED when `merged_at` is set, CLOSED otherwise.
pub fn pr_node(reviews: u64, created_at: &str, merged_at: Option<&str>, closed_at: Option<&str>) -> Value {
    let state = if merged_at.is_some() { "MERGED" } else { "CLOSED" };
    json!({
        "state": state,
        "createdAt": created_at,
        "closedAt": closed_at,
        "mergedAt": merged_at,
        "additions": 40,
        "deletions": 8,
        "files": { "totalCount": 3 },
        "bodyText": "",
        "participants": { "totalCount": 2 },
        "comments": { "totalCount": 4 },
        "reviews": { "totalCount": reviews },
    })
}

/// `data` of one page of a repository's pull requests.
pub fn pr_page(nodes: Vec<Value>, end_cursor: Option<&str>, has_next_page: bool) -> Value {
    json!({
        "repository": {
            "pullRequests": {
                "pageInfo": { "endCursor": end_cursor, "hasNextPage": has_next_page },
                "nodes": nodes,
            }
        }
    })
}
