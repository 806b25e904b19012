// Adapters layer: concrete upstream clients behind the domain ports.

pub mod github;
pub mod http;
pub mod leetcode;

pub use github::GitHubClient;
pub use http::{HttpTransport, RetryPolicy};
pub use leetcode::LeetCodeClient;
