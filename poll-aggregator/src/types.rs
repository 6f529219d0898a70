use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

pub use interfaces::defs::{Headline, HeadlineSource, NewsApiEnvelope, NewsQuery};

pub const MIN_OPTIONS: usize = 2;
pub const MAX_OPTIONS: usize = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Poll {
    pub id: Uuid,
    pub topic: String,
    pub question: String,
    pub options: Vec<String>,
    /// `votes[i]` counts `options[i]`.
    pub votes: Vec<i64>,
    pub created_at: DateTime<Utc>,
}

impl Poll {
    pub fn total_votes(&self) -> i64 {
        self.votes.iter().sum()
    }

    pub fn votes_aligned(&self) -> bool {
        self.votes.len() == self.options.len()
    }

    /// Resets the tally to zeros when it has drifted from the option list.
    /// Returns true if a repair was needed.
    pub fn repair_votes(&mut self) -> bool {
        if self.votes_aligned() {
            return false;
        }
        self.votes = vec![0; self.options.len()];
        true
    }
}

/// A poll that has not been persisted yet; the store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPoll {
    pub topic: String,
    pub question: String,
    pub options: Vec<String>,
    pub votes: Vec<i64>,
    pub created_at: DateTime<Utc>,
}

impl NewPoll {
    pub fn new(topic: String, question: String, options: Vec<String>) -> Self {
        let votes = vec![0; options.len()];
        Self {
            topic,
            question,
            options,
            votes,
            created_at: Utc::now(),
        }
    }

    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn into_poll(self, id: Uuid) -> Poll {
        Poll {
            id,
            topic: self.topic,
            question: self.question,
            options: self.options,
            votes: self.votes,
            created_at: self.created_at,
        }
    }
}

/// Listing shape of a poll, with its tally pre-summed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollSummary {
    pub id: Uuid,
    pub topic: String,
    pub question: String,
    pub options: Vec<String>,
    pub votes: Vec<i64>,
    pub total_votes: i64,
}

impl From<Poll> for PollSummary {
    fn from(poll: Poll) -> Self {
        let total_votes = poll.total_votes();
        Self {
            id: poll.id,
            topic: poll.topic,
            question: poll.question,
            options: poll.options,
            votes: poll.votes,
            total_votes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivePolls {
    pub polls: Vec<PollSummary>,
    /// Epoch milliseconds of the next scheduled generation.
    pub next_poll_time: i64,
}

/// Body of a vote request. Fields stay loosely typed so that a malformed
/// id or a non-numeric index is reported as an invalid argument rather than
/// a deserialisation failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    #[serde(default)]
    pub poll_id: serde_json::Value,
    #[serde(default)]
    pub option_index: serde_json::Value,
}

impl VoteRequest {
    pub fn new(poll_id: impl Serialize, option_index: impl Serialize) -> Self {
        Self {
            poll_id: serde_json::to_value(poll_id).unwrap_or_default(),
            option_index: serde_json::to_value(option_index).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub news_api_url: String,
    pub news_api_key: String,
    pub news_country: String,
    pub gemini_api_url: String,
    pub gemini_api_key: String,
    pub gemini_model: String,
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            user_agent: "Poll-Aggregator/1.0".to_string(),
            timeout_seconds: 30,
            news_api_url: "https://newsapi.org/v2/top-headlines".to_string(),
            news_api_key: String::new(),
            news_country: "us".to_string(),
            gemini_api_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            gemini_api_key: String::new(),
            gemini_model: "gemini-1.5-flash".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    pub generation_interval: Duration,
    pub retention: Duration,
}

impl ScheduleConfig {
    pub fn retention_window(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.retention).unwrap_or_else(|_| chrono::Duration::hours(24))
    }

    pub fn generation_window(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.generation_interval)
            .unwrap_or_else(|_| chrono::Duration::minutes(15))
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            generation_interval: Duration::from_secs(15 * 60),
            retention: Duration::from_secs(24 * 60 * 60),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PollError {
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Parse failure: {0}")]
    ParseFailure(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Poll not found: {id}")]
    NotFound { id: Uuid },

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<reqwest::Error> for PollError {
    fn from(e: reqwest::Error) -> Self {
        PollError::UpstreamUnavailable(e.to_string())
    }
}

impl From<sqlx::Error> for PollError {
    fn from(e: sqlx::Error) -> Self {
        PollError::StoreUnavailable(e.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for PollError {
    fn from(e: sqlx::migrate::MigrateError) -> Self {
        PollError::StoreUnavailable(e.to_string())
    }
}

impl From<crate::parser::ParseError> for PollError {
    fn from(e: crate::parser::ParseError) -> Self {
        PollError::ParseFailure(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PollError>;
