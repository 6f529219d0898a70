use crate::parser::parse_poll_text;
use crate::traits::{NewsSource, PollStore, TextGenerator};
use crate::types::{NewPoll, Poll, PollError, Result};
use crate::utils::{derive_topic, display_title, poll_prompt};
use rand::seq::SliceRandom;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Turns a random current headline into a stored opinion poll.
pub struct PollGenerator {
    news: Arc<dyn NewsSource>,
    llm: Arc<dyn TextGenerator>,
    store: Arc<dyn PollStore>,
    upstream_timeout: Duration,
}

impl PollGenerator {
    pub fn new(
        news: Arc<dyn NewsSource>,
        llm: Arc<dyn TextGenerator>,
        store: Arc<dyn PollStore>,
        upstream_timeout: Duration,
    ) -> Self {
        Self {
            news,
            llm,
            store,
            upstream_timeout,
        }
    }

    /// Run one generation cycle. Failures are logged and swallowed so the
    /// caller (usually the scheduler) never sees them.
    pub async fn run_cycle(&self) -> Option<Poll> {
        match self.generate().await {
            Ok(poll) => Some(poll),
            Err(PollError::UpstreamUnavailable(reason)) => {
                warn!("Poll generation skipped, upstream unavailable: {}", reason);
                None
            }
            Err(PollError::ParseFailure(reason)) => {
                warn!("Poll generation skipped, unusable model output: {}", reason);
                None
            }
            Err(e) => {
                error!("Poll generation failed: {}", e);
                None
            }
        }
    }

    /// One generation cycle, reporting why it stopped.
    pub async fn generate(&self) -> Result<Poll> {
        info!("Generating a new poll from {}", self.news.source_name());

        let headlines = self.bounded("headline fetch", self.news.latest()).await?;
        let headline = headlines
            .choose(&mut rand::thread_rng())
            .cloned()
            .ok_or_else(|| PollError::UpstreamUnavailable("no headlines returned".to_string()))?;

        let title = display_title(&headline);
        let topic = derive_topic(&title);
        let prompt = poll_prompt(&title);

        let raw = self
            .bounded("text generation", self.llm.generate_text(&prompt))
            .await?
            .ok_or_else(|| {
                PollError::UpstreamUnavailable(format!(
                    "{} returned no candidate text",
                    self.llm.adapter_name()
                ))
            })?;

        let parsed = parse_poll_text(&raw)?;
        let poll = self
            .store
            .insert(NewPoll::new(topic, parsed.question, parsed.options))
            .await?;

        info!("New poll generated: {}", poll.question);
        Ok(poll)
    }

    async fn bounded<T>(
        &self,
        what: &str,
        call: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        tokio::time::timeout(self.upstream_timeout, call)
            .await
            .map_err(|_| {
                PollError::UpstreamUnavailable(format!(
                    "{} timed out after {:?}",
                    what, self.upstream_timeout
                ))
            })?
    }
}
