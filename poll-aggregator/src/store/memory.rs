use crate::traits::PollStore;
use crate::types::{NewPoll, Poll, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

/// Process-local poll store for development runs and tests.
#[derive(Default)]
pub struct MemoryPollStore {
    polls: RwLock<HashMap<Uuid, Poll>>,
}

impl MemoryPollStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a poll exactly as given, id included.
    pub async fn put(&self, poll: Poll) {
        self.polls.write().await.insert(poll.id, poll);
    }

    pub async fn len(&self) -> usize {
        self.polls.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.polls.read().await.is_empty()
    }
}

#[async_trait]
impl PollStore for MemoryPollStore {
    async fn insert(&self, poll: NewPoll) -> Result<Poll> {
        let poll = poll.into_poll(Uuid::new_v4());
        self.polls.write().await.insert(poll.id, poll.clone());
        Ok(poll)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Poll>> {
        Ok(self.polls.read().await.get(&id).cloned())
    }

    async fn find_created_since(&self, since: DateTime<Utc>) -> Result<Vec<Poll>> {
        let mut polls: Vec<Poll> = self
            .polls
            .read()
            .await
            .values()
            .filter(|poll| poll.created_at >= since)
            .cloned()
            .collect();
        polls.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(polls)
    }

    async fn delete_created_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let mut polls = self.polls.write().await;
        let before = polls.len();
        polls.retain(|_, poll| poll.created_at >= cutoff);
        Ok((before - polls.len()) as u64)
    }

    async fn record_vote(&self, id: Uuid, option_index: usize) -> Result<Option<Poll>> {
        let mut polls = self.polls.write().await;
        let Some(poll) = polls.get_mut(&id) else {
            return Ok(None);
        };

        if poll.repair_votes() {
            warn!("Reset misaligned vote tally of poll {}", id);
        }

        match poll.votes.get_mut(option_index) {
            Some(count) => *count += 1,
            None => return Ok(None),
        }

        debug!("Recorded vote on poll {} at option {}", id, option_index);
        Ok(Some(poll.clone()))
    }
}
