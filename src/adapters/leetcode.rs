use crate::adapters::http::HttpTransport;
use crate::config::toml_config::StatsConfig;
use crate::domain::model::{Difficulty, JudgeProfile, Platform};
use crate::domain::ports::JudgeStatsSource;
use crate::utils::error::{Result, StatsError};
use crate::utils::validation::validate_username;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

pub const DEFAULT_GRAPHQL_URL: &str = "https://leetcode.com/graphql";

const PROFILE_QUERY: &str = r#"
query userProblemsSolved($username: String!) {
  matchedUser(username: $username) {
    profile {
      ranking
    }
    submitStats {
      acSubmissionNum {
        difficulty
        count
      }
      totalSubmissionNum {
        difficulty
        count
      }
    }
  }
}
"#;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MatchedUser {
    #[serde(default)]
    profile: Option<ProfileRecord>,
    #[serde(default)]
    submit_stats: Option<SubmitStats>,
}

#[derive(Debug, Deserialize)]
struct ProfileRecord {
    #[serde(default)]
    ranking: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitStats {
    #[serde(default)]
    ac_submission_num: Vec<SubmissionCount>,
    #[serde(default)]
    total_submission_num: Vec<SubmissionCount>,
}

#[derive(Debug, Deserialize)]
struct SubmissionCount {
    difficulty: String,
    #[serde(default)]
    count: Option<u64>,
}

/// Client for the judge's public GraphQL endpoint. No credential is needed.
pub struct LeetCodeClient {
    transport: HttpTransport,
    graphql_url: String,
}

impl LeetCodeClient {
    pub fn new(transport: HttpTransport, graphql_url: &str) -> Self {
        Self {
            transport,
            graphql_url: graphql_url.to_string(),
        }
    }

    pub fn from_config(config: &StatsConfig) -> Result<Self> {
        let transport = HttpTransport::new(
            Platform::LeetCode,
            &config.http.user_agent,
            config.timeout(),
            config.retry_policy(),
        )?;
        Ok(Self::new(transport, &config.leetcode.graphql_url))
    }
}

/// `matchedUser: null` means the account does not exist; a missing
/// `matchedUser` key means the response itself is malformed.
fn parse_judge_data(data: Option<Value>, username: &str) -> Result<JudgeProfile> {
    let matched = data
        .as_ref()
        .and_then(|d| d.get("matchedUser"))
        .ok_or_else(|| {
            StatsError::upstream(Platform::LeetCode, "profile query", "response has no matchedUser field")
        })?;

    if matched.is_null() {
        return Err(StatsError::NotFound {
            platform: Platform::LeetCode,
            username: username.to_string(),
        });
    }

    let user: MatchedUser = serde_json::from_value(matched.clone()).map_err(|e| {
        StatsError::upstream(
            Platform::LeetCode,
            "profile query",
            format!("malformed matchedUser record: {}", e),
        )
    })?;

    let mut profile = JudgeProfile {
        ranking: user.profile.and_then(|p| p.ranking).unwrap_or(0),
        ..JudgeProfile::default()
    };

    let stats = user.submit_stats.unwrap_or_default();
    for entry in &stats.ac_submission_num {
        if let Some(difficulty) = Difficulty::from_label(&entry.difficulty) {
            profile.bucket_mut(difficulty).solved_count = entry.count.unwrap_or(0);
        }
    }
    for entry in &stats.total_submission_num {
        if let Some(difficulty) = Difficulty::from_label(&entry.difficulty) {
            profile.bucket_mut(difficulty).total_count = entry.count.unwrap_or(0);
        }
    }

    Ok(profile)
}

#[async_trait]
impl JudgeStatsSource for LeetCodeClient {
    async fn fetch_judge_profile(&self, username: &str) -> Result<JudgeProfile> {
        validate_username("judge username", username)?;

        let response = self
            .transport
            .post_graphql::<Value>(
                "profile query",
                &self.graphql_url,
                PROFILE_QUERY,
                serde_json::json!({ "username": username }),
                username,
            )
            .await?;

        if let Some(errors) = response.error_summary() {
            tracing::debug!(username, %errors, "judge returned GraphQL errors");
        }

        parse_judge_data(response.data, username)
    }
}
