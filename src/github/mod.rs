pub mod pagination;
pub mod queries;
pub mod retry;
pub mod types;

pub use pagination::{Page, Paginator};
pub use retry::{with_retry, RetryPolicy};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::config::Config;

#[derive(Debug, Error)]
pub enum GithubError {
    #[error("GitHub API request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("GitHub API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("GraphQL errors: {0}")]
    GraphQl(String),

    #[error("GraphQL response missing data")]
    MissingData,

    #[error("Unexpected GraphQL response shape: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("GitHub token not found in config or GITHUB_TOKEN")]
    MissingToken,
}

impl GithubError {
    /// Transport-level failures are worth another attempt; anything the API
    /// answered coherently is not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GithubError::Transport(_) | GithubError::Status { .. })
    }
}

/// Executes one GraphQL request and returns its `data` object.
///
/// Implemented by [`GithubClient`] for the real API; collection code only
/// depends on this trait so it can be driven by scripted responses.
#[async_trait]
pub trait GraphqlExecutor: Send + Sync {
    async fn execute(&self, query: &str, variables: Value) -> Result<Value, GithubError>;
}

/// Run a query and decode its `data` into `T`.
pub async fn query<T: DeserializeOwned>(
    executor: &dyn GraphqlExecutor,
    query: &str,
    variables: Value,
) -> Result<T, GithubError> {
    let data = executor.execute(query, variables).await?;
    Ok(serde_json::from_value(data)?)
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<Value>,
    errors: Option<Vec<GraphQlErrorEntry>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlErrorEntry {
    message: String,
}

/// GitHub GraphQL client with a static bearer token and a fixed retry policy.
pub struct GithubClient {
    http: reqwest::Client,
    endpoint: String,
    token: String,
    user_agent: String,
    retry: RetryPolicy,
}

impl GithubClient {
    pub fn new(config: &Config) -> Result<Self, GithubError> {
        let token = config.github_token().ok_or(GithubError::MissingToken)?;
        Ok(Self {
            http: reqwest::Client::new(),
            endpoint: config.github.endpoint.clone(),
            token,
            user_agent: config.github.user_agent.clone(),
            retry: config.retry.policy(),
        })
    }

    /// Single POST without retries.
    async fn post_once(&self, query: &str, variables: &Value) -> Result<Value, GithubError> {
        let body = json!({
            "query": query,
            "variables": variables,
        });

        let response = self
            .http
            .post(&self.endpoint)
            .header("User-Agent", &self.user_agent)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response".to_string());
            return Err(GithubError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed = response.json::<GraphQlResponse>().await?;
        if let Some(errors) = parsed.errors.filter(|errors| !errors.is_empty()) {
            let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
            return Err(GithubError::GraphQl(messages.join(", ")));
        }

        parsed.data.ok_or(GithubError::MissingData)
    }
}

#[async_trait]
impl GraphqlExecutor for GithubClient {
    #[instrument(skip_all)]
    async fn execute(&self, query: &str, variables: Value) -> Result<Value, GithubError> {
        debug!(%variables, "posting GraphQL query");
        with_retry(&self.retry, || self.post_once(query, &variables)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        let status = GithubError::Status {
            status: 502,
            body: "bad gateway".to_string(),
        };
        assert!(status.is_retryable());
        assert!(!GithubError::GraphQl("rate limited".to_string()).is_retryable());
        assert!(!GithubError::MissingData.is_retryable());
        assert!(!GithubError::MissingToken.is_retryable());
    }

    #[test]
    fn test_client_requires_token() {
        let mut config = Config::default();
        config.github.token = Some("   ".to_string());
        // A blank configured token is treated as absent; only fails when the
        // environment does not provide one either.
        if std::env::var("GITHUB_TOKEN").is_err() {
            assert!(matches!(
                GithubClient::new(&config),
                Err(GithubError::MissingToken)
            ));
        }
    }

    #[test]
    fn test_client_uses_configured_endpoint() {
        let mut config = Config::default();
        config.github.token = Some("secret".to_string());
        config.github.endpoint = "http://localhost:9/graphql".to_string();
        let client = GithubClient::new(&config).unwrap();
        assert_eq!(client.endpoint, "http://localhost:9/graphql");
        assert_eq!(client.user_agent, "pr-insights");
        assert_eq!(client.retry.max_attempts, 3);
    }

    #[test]
    fn test_graphql_envelope_with_errors() {
        let raw = r#"{"data": null, "errors": [{"message": "Something went wrong", "path": ["search"]}]}"#;
        let parsed: GraphQlResponse = serde_json::from_str(raw).unwrap();
        assert!(parsed.data.is_none());
        assert_eq!(parsed.errors.unwrap()[0].message, "Something went wrong");
    }
}
