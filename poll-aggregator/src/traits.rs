use crate::types::{Headline, NewPoll, NewsQuery, Poll, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Source of current top headlines.
#[async_trait]
pub trait NewsSource: Send + Sync {
    /// Human-readable name for logs
    fn source_name(&self) -> String;

    /// Fetch the latest headlines matching `query`.
    /// An empty list is a valid answer, not an error.
    async fn top_headlines(&self, query: &NewsQuery) -> Result<Vec<Headline>>;

    /// Headlines for the default country of this source
    async fn latest(&self) -> Result<Vec<Headline>>;
}

/// Free-text generation backend.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    fn adapter_name(&self) -> String;

    /// Returns the first usable candidate text, or `None` when the backend
    /// answered without one.
    async fn generate_text(&self, prompt: &str) -> Result<Option<String>>;
}

/// Persistence for polls.
#[async_trait]
pub trait PollStore: Send + Sync {
    /// Persist a new poll and return it with its assigned id.
    async fn insert(&self, poll: NewPoll) -> Result<Poll>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Poll>>;

    /// Polls created at or after `since`, newest first.
    async fn find_created_since(&self, since: DateTime<Utc>) -> Result<Vec<Poll>>;

    /// Delete polls created strictly before `cutoff`; returns the number removed.
    async fn delete_created_before(&self, cutoff: DateTime<Utc>) -> Result<u64>;

    /// Atomically add one vote at `option_index`.
    ///
    /// A tally whose length differs from the option list is reset to zeros
    /// first. Returns `None` if the poll no longer exists. Implementations
    /// must not lose increments under concurrent calls for the same poll.
    async fn record_vote(&self, id: Uuid, option_index: usize) -> Result<Option<Poll>>;
}
