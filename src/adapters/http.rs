//! Shared HTTP plumbing for the upstream clients.
//!
//! Every call gets a bounded timeout and a small retry budget for transient
//! failures (network errors, timeouts, 429 and 5xx). Missing users and
//! rejected credentials are final on the first attempt.

use crate::domain::model::Platform;
use crate::utils::error::{Result, StatsError};
use rand::Rng;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    /// Fractional spread applied to each delay (0.25 = ±25%).
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 1,
            base_delay: Duration::from_millis(200),
            jitter: 0.25,
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Exponential backoff: `base_delay * 2^attempt`, jittered.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let base = self.base_delay.as_secs_f64() * 2f64.powi(attempt.min(16) as i32);
        let wait = if self.jitter > 0.0 && base > 0.0 {
            let spread = base * self.jitter;
            base + rand::thread_rng().gen_range(-spread..spread)
        } else {
            base
        };
        Duration::from_secs_f64(wait.max(0.0))
    }
}

#[derive(Debug, Deserialize)]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQlError {
    pub message: String,
}

impl<T> GraphQlResponse<T> {
    pub fn error_summary(&self) -> Option<String> {
        let errors = self.errors.as_ref()?;
        if errors.is_empty() {
            return None;
        }
        Some(
            errors
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

pub struct HttpTransport {
    platform: Platform,
    client: Client,
    timeout: Duration,
    retry: RetryPolicy,
    bearer_token: Option<String>,
}

impl HttpTransport {
    pub fn new(
        platform: Platform,
        user_agent: &str,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self> {
        let client = Client::builder().user_agent(user_agent).build()?;

        Ok(Self {
            platform,
            client,
            timeout,
            retry,
            bearer_token: None,
        })
    }

    pub fn with_bearer_token(mut self, token: Option<String>) -> Self {
        self.bearer_token = token.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn has_bearer_token(&self) -> bool {
        self.bearer_token.is_some()
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        url: &str,
        query: &[(&str, &str)],
        username: &str,
    ) -> Result<T> {
        self.execute_with_retry(operation, move || {
            let request = self.prepare(self.client.get(url).query(query));
            self.send_once(operation, username, request)
        })
        .await
    }

    pub async fn post_graphql<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        url: &str,
        query: &str,
        variables: serde_json::Value,
        username: &str,
    ) -> Result<GraphQlResponse<T>> {
        let body = serde_json::json!({ "query": query, "variables": variables });
        let body = &body;

        self.execute_with_retry(operation, move || {
            let request = self.prepare(self.client.post(url).json(body));
            self.send_once(operation, username, request)
        })
        .await
    }

    fn prepare(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request
            .timeout(self.timeout)
            .header("Accept", "application/json");
        match &self.bearer_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send_once<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        username: &str,
        request: RequestBuilder,
    ) -> Result<T> {
        let response = request
            .send()
            .await
            .map_err(|e| self.transport_error(operation, &e))?;

        let status = response.status();
        tracing::debug!(platform = %self.platform, operation, %status, "upstream response");

        if !status.is_success() {
            return Err(self.status_error(operation, username, status));
        }

        response.json::<T>().await.map_err(|e| {
            StatsError::upstream(
                self.platform,
                operation,
                format!("malformed response body: {}", e),
            )
        })
    }

    async fn execute_with_retry<F, Fut, T>(&self, operation: &'static str, request_fn: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            match request_fn().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.retry.max_retries => {
                    let wait = self.retry.backoff(attempt);
                    tracing::warn!(
                        platform = %self.platform,
                        operation,
                        attempt = attempt + 1,
                        "transient upstream failure, retrying in {:?}: {}",
                        wait,
                        e
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn transport_error(&self, operation: &'static str, error: &reqwest::Error) -> StatsError {
        let message = if error.is_timeout() {
            format!("timed out after {:?}", self.timeout)
        } else {
            format!("network error: {}", error)
        };
        StatsError::upstream(self.platform, operation, message)
    }

    fn status_error(&self, operation: &'static str, username: &str, status: StatusCode) -> StatsError {
        match status {
            StatusCode::NOT_FOUND => StatsError::NotFound {
                platform: self.platform,
                username: username.to_string(),
            },
            StatusCode::UNAUTHORIZED => StatsError::Auth {
                platform: self.platform,
                message: format!("{} rejected the credential (HTTP 401)", operation),
            },
            other => StatsError::upstream(self.platform, operation, format!("HTTP {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn transport(retry: RetryPolicy) -> HttpTransport {
        HttpTransport::new(Platform::GitHub, "devstats-test", DEFAULT_TIMEOUT, retry).unwrap()
    }

    fn fast_retry(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_delay: Duration::from_millis(1),
            jitter: 0.0,
        }
    }

    #[test]
    fn test_backoff_grows_and_respects_jitter_bounds() {
        let policy = RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(100),
            jitter: 0.25,
        };
        for _ in 0..50 {
            let first = policy.backoff(0);
            let second = policy.backoff(1);
            assert!(first >= Duration::from_millis(75) && first <= Duration::from_millis(125));
            assert!(second >= Duration::from_millis(150) && second <= Duration::from_millis(250));
        }

        let unjittered = fast_retry(1).backoff(2);
        assert!(unjittered >= Duration::from_micros(3_900) && unjittered <= Duration::from_micros(4_100));
    }

    #[tokio::test]
    async fn test_server_errors_are_retried_up_to_budget() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/flaky");
            then.status(502);
        });

        let result: Result<serde_json::Value> = transport(fast_retry(2))
            .get_json("get flaky", &server.url("/flaky"), &[], "octocat")
            .await;

        assert!(matches!(result, Err(StatsError::Upstream { .. })));
        mock.assert_hits(3);
    }

    #[tokio::test]
    async fn test_not_found_is_never_retried() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/users/ghost");
            then.status(404);
        });

        let result: Result<serde_json::Value> = transport(fast_retry(2))
            .get_json("get user", &server.url("/users/ghost"), &[], "ghost")
            .await;

        match result {
            Err(StatsError::NotFound { platform, username }) => {
                assert_eq!(platform, Platform::GitHub);
                assert_eq!(username, "ghost");
            }
            other => panic!("expected NotFound, got {:?}", other),
        }
        mock.assert_hits(1);
    }

    #[tokio::test]
    async fn test_unauthorized_maps_to_auth_error() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/users/octocat");
            then.status(401);
        });

        let result: Result<serde_json::Value> = transport(fast_retry(2))
            .get_json("get user", &server.url("/users/octocat"), &[], "octocat")
            .await;

        assert!(result.unwrap_err().is_auth());
        mock.assert_hits(1);
    }

    #[tokio::test]
    async fn test_timeout_is_an_upstream_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/slow");
            then.status(200)
                .delay(Duration::from_millis(500))
                .json_body(serde_json::json!({}));
        });

        let client = HttpTransport::new(
            Platform::LeetCode,
            "devstats-test",
            Duration::from_millis(50),
            RetryPolicy::none(),
        )
        .unwrap();
        let result: Result<serde_json::Value> = client
            .get_json("get slow", &server.url("/slow"), &[], "someone")
            .await;

        match result {
            Err(StatsError::Upstream { message, .. }) => assert!(message.contains("timed out")),
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_bearer_token_is_sent() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/graphql")
                .header("Authorization", "Bearer secret-token")
                .json_body_partial(r#"{"variables": {"username": "octocat"}}"#);
            then.status(200)
                .json_body(serde_json::json!({ "data": { "ok": true } }));
        });

        let client = transport(RetryPolicy::none()).with_bearer_token(Some("secret-token".into()));
        let response: GraphQlResponse<serde_json::Value> = client
            .post_graphql(
                "query",
                &server.url("/graphql"),
                "query { ok }",
                serde_json::json!({ "username": "octocat" }),
                "octocat",
            )
            .await
            .unwrap();

        mock.assert();
        assert_eq!(response.data.as_ref().unwrap()["ok"], true);
        assert!(response.error_summary().is_none());
    }

    #[test]
    fn test_blank_token_counts_as_absent() {
        let client = transport(RetryPolicy::none()).with_bearer_token(Some("  ".into()));
        assert!(!client.has_bearer_token());
    }
}
