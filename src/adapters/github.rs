use crate::config::toml_config::StatsConfig;
use crate::domain::model::{AccountProfile, ContributionCount, Platform, RepositoryAggregate};
use crate::domain::ports::AccountStatsSource;
use crate::adapters::http::HttpTransport;
use crate::utils::error::{Result, StatsError};
use crate::utils::validation::validate_username;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";
pub const DEFAULT_GRAPHQL_URL: &str = "https://api.github.com/graphql";

/// Repositories beyond the first page are not counted.
pub const REPOSITORY_PAGE_SIZE: usize = 100;

/// No `from`/`to` arguments: the totals cover whatever window the upstream
/// reports by default (currently the last year), since an explicit range may
/// not span more than a year.
const CONTRIBUTIONS_QUERY: &str = r#"
query userContributions($username: String!) {
  user(login: $username) {
    contributionsCollection {
      totalCommitContributions
      totalPullRequestContributions
      totalIssueContributions
    }
  }
}
"#;

#[derive(Debug, Deserialize)]
struct UserRecord {
    #[serde(default)]
    followers: Option<u64>,
    #[serde(default)]
    following: Option<u64>,
    #[serde(default)]
    public_repos: Option<u64>,
}

/// Client for the source-control host's REST and GraphQL APIs.
pub struct GitHubClient {
    transport: HttpTransport,
    api_base_url: String,
    graphql_url: String,
}

impl GitHubClient {
    pub fn new(transport: HttpTransport, api_base_url: &str, graphql_url: &str) -> Self {
        Self {
            transport,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            graphql_url: graphql_url.to_string(),
        }
    }

    pub fn from_config(config: &StatsConfig) -> Result<Self> {
        let transport = HttpTransport::new(
            Platform::GitHub,
            &config.http.user_agent,
            config.timeout(),
            config.retry_policy(),
        )?
        .with_bearer_token(config.github_token());

        Ok(Self::new(
            transport,
            &config.github.api_base_url,
            &config.github.graphql_url,
        ))
    }

    fn require_token(&self, operation: &str) -> Result<()> {
        if self.transport.has_bearer_token() {
            Ok(())
        } else {
            Err(StatsError::Auth {
                platform: Platform::GitHub,
                message: format!("no access token configured for {}", operation),
            })
        }
    }

    pub async fn fetch_profile(&self, username: &str) -> Result<AccountProfile> {
        let url = format!("{}/users/{}", self.api_base_url, username);
        let user: UserRecord = self
            .transport
            .get_json("get user", &url, &[], username)
            .await?;

        Ok(AccountProfile {
            following_count: user.following.unwrap_or(0),
            follower_count: user.followers.unwrap_or(0),
            public_repo_count: user.public_repos.unwrap_or(0),
        })
    }

    pub async fn fetch_repositories(&self, username: &str) -> Result<RepositoryAggregate> {
        let url = format!("{}/users/{}/repos", self.api_base_url, username);
        let per_page = REPOSITORY_PAGE_SIZE.to_string();
        let repos: Vec<Value> = self
            .transport
            .get_json(
                "list repositories",
                &url,
                &[("sort", "updated"), ("per_page", per_page.as_str())],
                username,
            )
            .await?;

        tracing::debug!(username, count = repos.len(), "fetched repository page");
        Ok(sum_repository_counts(&repos))
    }
}

/// Records with missing, null or non-numeric counts contribute zero.
pub(crate) fn sum_repository_counts(repos: &[Value]) -> RepositoryAggregate {
    let count = |repo: &Value, field: &str| repo.get(field).and_then(Value::as_u64).unwrap_or(0);

    repos
        .iter()
        .take(REPOSITORY_PAGE_SIZE)
        .fold(RepositoryAggregate::default(), |acc, repo| RepositoryAggregate {
            total_stars: acc.total_stars.saturating_add(count(repo, "stargazers_count")),
            total_forks: acc.total_forks.saturating_add(count(repo, "forks_count")),
        })
}

/// Missing structure (e.g. the GraphQL API not knowing a user the REST API
/// does) yields zero rather than an error.
pub(crate) fn contributions_from_data(data: Option<&Value>) -> Option<ContributionCount> {
    let collection = data?.pointer("/user/contributionsCollection")?;
    let commits = collection.get("totalCommitContributions")?.as_u64()?;
    let pull_requests = collection.get("totalPullRequestContributions")?.as_u64()?;
    let issues = collection.get("totalIssueContributions")?.as_u64()?;

    Some(ContributionCount(
        commits.saturating_add(pull_requests).saturating_add(issues),
    ))
}

#[async_trait]
impl AccountStatsSource for GitHubClient {
    async fn fetch_account_and_repos(
        &self,
        username: &str,
    ) -> Result<(AccountProfile, RepositoryAggregate)> {
        self.require_token("account lookup")?;
        validate_username("account username", username)?;

        tokio::try_join!(self.fetch_profile(username), self.fetch_repositories(username))
    }

    async fn fetch_contributions(&self, username: &str) -> Result<ContributionCount> {
        self.require_token("contribution query")?;
        validate_username("account username", username)?;

        let response = self
            .transport
            .post_graphql::<Value>(
                "contribution query",
                &self.graphql_url,
                CONTRIBUTIONS_QUERY,
                serde_json::json!({ "username": username }),
                username,
            )
            .await?;

        match contributions_from_data(response.data.as_ref()) {
            Some(count) => Ok(count),
            None => {
                tracing::warn!(
                    username,
                    errors = %response.error_summary().unwrap_or_default(),
                    "contribution totals missing from response, using 0"
                );
                Ok(ContributionCount::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::http::{RetryPolicy, DEFAULT_TIMEOUT};
    use httpmock::prelude::*;
    use serde_json::json;

    fn client(server: &MockServer, token: Option<&str>) -> GitHubClient {
        let transport = HttpTransport::new(
            Platform::GitHub,
            "devstats-test",
            DEFAULT_TIMEOUT,
            RetryPolicy::none(),
        )
        .unwrap()
        .with_bearer_token(token.map(str::to_string));
        GitHubClient::new(transport, &server.base_url(), &server.url("/graphql"))
    }

    #[test]
    fn test_sum_repository_counts_treats_bad_records_as_zero() {
        let repos = vec![
            json!({"name": "a", "stargazers_count": 10, "forks_count": 2}),
            json!({"name": "b", "stargazers_count": null, "forks_count": 1}),
            json!({"name": "c"}),
            json!({"name": "d", "stargazers_count": "many", "forks_count": 4}),
            json!("not even an object"),
        ];

        let totals = sum_repository_counts(&repos);
        assert_eq!(totals.total_stars, 10);
        assert_eq!(totals.total_forks, 7);
    }

    #[test]
    fn test_contributions_from_data() {
        let data = json!({
            "user": {
                "contributionsCollection": {
                    "totalCommitContributions": 150,
                    "totalPullRequestContributions": 30,
                    "totalIssueContributions": 20
                }
            }
        });
        assert_eq!(contributions_from_data(Some(&data)), Some(ContributionCount(200)));
        assert_eq!(contributions_from_data(Some(&json!({"user": null}))), None);
        assert_eq!(contributions_from_data(None), None);
    }

    #[test]
    fn test_contribution_sum_saturates() {
        let data = json!({
            "user": {
                "contributionsCollection": {
                    "totalCommitContributions": u64::MAX,
                    "totalPullRequestContributions": 1,
                    "totalIssueContributions": 1
                }
            }
        });
        assert_eq!(
            contributions_from_data(Some(&data)),
            Some(ContributionCount(u64::MAX))
        );
    }

    #[test]
    fn test_contributions_query_uses_upstream_default_window() {
        assert!(CONTRIBUTIONS_QUERY.contains("contributionsCollection {"));
        assert!(!CONTRIBUTIONS_QUERY.contains("from:"));
        assert!(!CONTRIBUTIONS_QUERY.contains("to:"));
    }

    #[tokio::test]
    async fn test_missing_token_wins_over_invalid_username() {
        let server = MockServer::start();
        let github = client(&server, None);

        assert!(github.fetch_account_and_repos("").await.unwrap_err().is_auth());
        assert!(github.fetch_contributions("  ").await.unwrap_err().is_auth());
    }

    #[tokio::test]
    async fn test_fetch_account_and_repos() {
        let server = MockServer::start();
        let user_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/users/octocat")
                .header("Authorization", "Bearer token-123");
            then.status(200).json_body(json!({
                "login": "octocat",
                "followers": 100,
                "following": 7,
                "public_repos": 20
            }));
        });
        let repos_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/users/octocat/repos")
                .query_param("sort", "updated")
                .query_param("per_page", "100");
            then.status(200).json_body(json!([
                {"stargazers_count": 30, "forks_count": 6},
                {"stargazers_count": 20, "forks_count": null}
            ]));
        });

        let (profile, repos) = client(&server, Some("token-123"))
            .fetch_account_and_repos("octocat")
            .await
            .unwrap();

        user_mock.assert();
        repos_mock.assert();
        assert_eq!(profile.follower_count, 100);
        assert_eq!(profile.following_count, 7);
        assert_eq!(profile.public_repo_count, 20);
        assert_eq!(repos.total_stars, 50);
        assert_eq!(repos.total_forks, 6);
    }

    #[tokio::test]
    async fn test_unknown_user_is_not_found() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/users/ghost");
            then.status(404).json_body(json!({"message": "Not Found"}));
        });
        server.mock(|when, then| {
            when.method(GET).path("/users/ghost/repos");
            then.status(404).json_body(json!({"message": "Not Found"}));
        });

        let result = client(&server, Some("token")).fetch_account_and_repos("ghost").await;
        assert!(matches!(result, Err(StatsError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_missing_token_fails_without_network_calls() {
        let server = MockServer::start();
        let any_call = server.mock(|when, then| {
            when.path_contains("/");
            then.status(200).json_body(json!({}));
        });

        let github = client(&server, None);
        assert!(github.fetch_account_and_repos("octocat").await.unwrap_err().is_auth());
        assert!(github.fetch_contributions("octocat").await.unwrap_err().is_auth());
        any_call.assert_hits(0);
    }

    #[tokio::test]
    async fn test_fetch_contributions() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/graphql")
                .body_contains("contributionsCollection")
                .json_body_partial(r#"{"variables": {"username": "octocat"}}"#);
            then.status(200).json_body(json!({
                "data": {
                    "user": {
                        "contributionsCollection": {
                            "totalCommitContributions": 120,
                            "totalPullRequestContributions": 50,
                            "totalIssueContributions": 30
                        }
                    }
                }
            }));
        });

        let count = client(&server, Some("token"))
            .fetch_contributions("octocat")
            .await
            .unwrap();

        mock.assert();
        assert_eq!(count, ContributionCount(200));
    }

    #[tokio::test]
    async fn test_contributions_degrade_to_zero_when_graphql_misses_user() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/graphql");
            then.status(200).json_body(json!({
                "data": { "user": null },
                "errors": [{"message": "Could not resolve to a User with the login of 'octocat'."}]
            }));
        });

        let count = client(&server, Some("token"))
            .fetch_contributions("octocat")
            .await
            .unwrap();
        assert_eq!(count, ContributionCount(0));
    }

    #[tokio::test]
    async fn test_contribution_endpoint_failure_propagates() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/graphql");
            then.status(500);
        });

        let result = client(&server, Some("token")).fetch_contributions("octocat").await;
        assert!(matches!(result, Err(StatsError::Upstream { .. })));
    }
}
