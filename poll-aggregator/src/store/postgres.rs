use crate::traits::PollStore;
use crate::types::{NewPoll, Poll, PollError, Result};
use async_trait::async_trait;
use backoff::{backoff::Backoff, exponential::ExponentialBackoff};
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

const POLL_COLUMNS: &str = "id, topic, question, options, votes, created_at";

pub struct PgPollStore {
    db: Pool<Postgres>,
}

impl PgPollStore {
    /// Connect, retrying with exponential backoff up to `max_retries` times.
    pub async fn connect(database_url: &str, max_retries: u32) -> Result<Self> {
        let mut backoff: ExponentialBackoff<backoff::SystemClock> = ExponentialBackoff {
            current_interval: Duration::from_secs(1),
            initial_interval: Duration::from_secs(1),
            max_interval: Duration::from_secs(30),
            multiplier: 2.0,
            max_elapsed_time: Some(Duration::from_secs(120)),
            ..Default::default()
        };

        let mut attempt = 0;
        loop {
            match PgPoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await
            {
                Ok(db) => return Ok(Self { db }),
                Err(e) => {
                    attempt += 1;
                    let delay = match backoff.next_backoff() {
                        Some(delay) if attempt <= max_retries => delay,
                        _ => return Err(e.into()),
                    };
                    warn!(
                        "Database connection attempt {} failed: {}, retrying in {:?}",
                        attempt, e, delay
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    pub fn from_pool(db: Pool<Postgres>) -> Self {
        Self { db }
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.db).await?;
        info!("Database schema is up to date");
        Ok(())
    }

    pub fn get_db_pool(&self) -> &Pool<Postgres> {
        &self.db
    }
}

#[async_trait]
impl PollStore for PgPollStore {
    async fn insert(&self, poll: NewPoll) -> Result<Poll> {
        let poll_id = Uuid::new_v4();

        let stored = sqlx::query_as::<_, Poll>(&format!(
            r#"
            INSERT INTO polls (id, topic, question, options, votes, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {POLL_COLUMNS}
            "#
        ))
        .bind(poll_id)
        .bind(&poll.topic)
        .bind(&poll.question)
        .bind(&poll.options)
        .bind(&poll.votes)
        .bind(poll.created_at)
        .fetch_one(&self.db)
        .await?;

        info!("Stored poll {} ({})", stored.id, stored.topic);
        Ok(stored)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Poll>> {
        let poll = sqlx::query_as::<_, Poll>(&format!(
            "SELECT {POLL_COLUMNS} FROM polls WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(poll)
    }

    async fn find_created_since(&self, since: DateTime<Utc>) -> Result<Vec<Poll>> {
        let polls = sqlx::query_as::<_, Poll>(&format!(
            "SELECT {POLL_COLUMNS} FROM polls WHERE created_at >= $1 ORDER BY created_at DESC"
        ))
        .bind(since)
        .fetch_all(&self.db)
        .await?;

        Ok(polls)
    }

    async fn delete_created_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM polls WHERE created_at < $1")
            .bind(cutoff)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected())
    }

    async fn record_vote(&self, id: Uuid, option_index: usize) -> Result<Option<Poll>> {
        // SQL arrays are 1-based
        let position = option_index
            .checked_add(1)
            .and_then(|p| i32::try_from(p).ok())
            .ok_or_else(|| PollError::InvalidArgument(format!("option index {}", option_index)))?;

        let mut tx = self.db.begin().await?;

        // Both statements take the row lock, so concurrent voters queue up
        // behind each other and each increment sees the previous one.
        let repaired = sqlx::query(
            r#"
            UPDATE polls
            SET votes = array_fill(0::BIGINT, ARRAY[cardinality(options)])
            WHERE id = $1 AND cardinality(votes) <> cardinality(options)
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if repaired.rows_affected() > 0 {
            warn!("Reset misaligned vote tally of poll {}", id);
        }

        let poll = sqlx::query_as::<_, Poll>(&format!(
            r#"
            UPDATE polls
            SET votes[$2] = votes[$2] + 1
            WHERE id = $1 AND $2 BETWEEN 1 AND cardinality(options)
            RETURNING {POLL_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(position)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!("Recorded vote on poll {} at option {}", id, option_index);
        Ok(poll)
    }
}
