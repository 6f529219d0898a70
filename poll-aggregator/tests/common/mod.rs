#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use poll_aggregator::{
    routes, AppState, Headline, MemoryPollStore, NewPoll, NewsQuery, NewsSource, NextPollTime,
    Poll, PollError, PollGenerator, PollService, PollStore, Result, TextGenerator,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

pub const WELL_FORMED_OUTPUT: &str =
    "**Question:** Do you support X?\n**Options:**\n1) Yes\n2) No\n3) Unsure";

/// Headline source answering from a fixed list, or failing on demand.
pub struct StaticNews {
    pub headlines: Vec<Headline>,
    pub fail: bool,
    pub queries: Mutex<Vec<NewsQuery>>,
}

impl StaticNews {
    pub fn with_titles(titles: &[&str]) -> Self {
        Self {
            headlines: titles.iter().map(|title| Headline::titled(*title)).collect(),
            fail: false,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn empty() -> Self {
        Self::with_titles(&[])
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::empty()
        }
    }
}

#[async_trait]
impl NewsSource for StaticNews {
    fn source_name(&self) -> String {
        "static-news".to_string()
    }

    async fn top_headlines(&self, query: &NewsQuery) -> Result<Vec<Headline>> {
        self.queries.lock().unwrap().push(query.clone());
        if self.fail {
            return Err(PollError::UpstreamUnavailable("HTTP 503: unavailable".to_string()));
        }
        Ok(self.headlines.clone())
    }

    async fn latest(&self) -> Result<Vec<Headline>> {
        self.top_headlines(&NewsQuery::default()).await
    }
}

/// Generator that returns canned text after an optional delay and records
/// every prompt it receives.
pub struct CannedGenerator {
    pub text: Option<String>,
    pub delay: Duration,
    pub prompts: Mutex<Vec<String>>,
}

impl CannedGenerator {
    pub fn new(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            delay: Duration::ZERO,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn silent() -> Self {
        Self {
            text: None,
            ..Self::new("")
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl TextGenerator for CannedGenerator {
    fn adapter_name(&self) -> String {
        "canned".to_string()
    }

    async fn generate_text(&self, prompt: &str) -> Result<Option<String>> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(self.text.clone())
    }
}

pub struct Harness {
    pub store: Arc<MemoryPollStore>,
    pub news: Arc<StaticNews>,
    pub llm: Arc<CannedGenerator>,
    pub next_poll: NextPollTime,
    pub generator: Arc<PollGenerator>,
    pub service: Arc<PollService>,
}

impl Harness {
    pub fn new(news: StaticNews, llm: CannedGenerator) -> Self {
        let store = Arc::new(MemoryPollStore::new());
        let news = Arc::new(news);
        let llm = Arc::new(llm);
        let next_poll = NextPollTime::starting_now(ChronoDuration::minutes(15));

        let generator = Arc::new(PollGenerator::new(
            news.clone(),
            llm.clone(),
            store.clone(),
            Duration::from_secs(30),
        ));
        let service = Arc::new(PollService::new(
            store.clone(),
            next_poll.clone(),
            ChronoDuration::hours(24),
        ));

        Self {
            store,
            news,
            llm,
            next_poll,
            generator,
            service,
        }
    }

    pub fn ready() -> Self {
        Self::new(
            StaticNews::with_titles(&["Elections: turnout hits record"]),
            CannedGenerator::new(WELL_FORMED_OUTPUT),
        )
    }

    pub fn router(&self) -> axum::Router {
        routes::router(AppState::new(
            self.service.clone(),
            self.generator.clone(),
            self.news.clone(),
            self.next_poll.clone(),
            ChronoDuration::minutes(15),
        ))
    }

    pub fn dyn_store(&self) -> Arc<dyn PollStore> {
        self.store.clone()
    }

    /// Store a poll with the given tally, created `hours_old` hours ago.
    pub async fn seed(&self, options: &[&str], votes: &[i64], hours_old: i64) -> Poll {
        let mut poll = NewPoll::new(
            "Topic".to_string(),
            "What do you think?".to_string(),
            options.iter().map(|option| option.to_string()).collect(),
        )
        .created_at(Utc::now() - ChronoDuration::hours(hours_old))
        .into_poll(Uuid::new_v4());
        poll.votes = votes.to_vec();
        self.store.put(poll.clone()).await;
        poll
    }
}
