use crate::state::NextPollTime;
use crate::traits::PollStore;
use crate::types::{ActivePolls, Poll, PollError, PollSummary, Result, VoteRequest};
use chrono::{Duration, Utc};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Read and vote access to polls for request handlers.
pub struct PollService {
    store: Arc<dyn PollStore>,
    next_poll: NextPollTime,
    window: Duration,
}

impl PollService {
    pub fn new(store: Arc<dyn PollStore>, next_poll: NextPollTime, window: Duration) -> Self {
        Self {
            store,
            next_poll,
            window,
        }
    }

    /// Polls created within the active window, newest first, together with
    /// the next generation estimate.
    pub async fn list_active(&self) -> Result<ActivePolls> {
        let since = Utc::now() - self.window;
        let polls = self.store.find_created_since(since).await?;
        debug!("Listing {} active polls", polls.len());

        Ok(ActivePolls {
            polls: polls.into_iter().map(PollSummary::from).collect(),
            next_poll_time: self.next_poll.millis(),
        })
    }

    /// Add one vote and return the updated poll.
    ///
    /// Checks run in order: poll id shape, poll existence, option index.
    pub async fn vote(&self, request: &VoteRequest) -> Result<Poll> {
        let poll_id = parse_poll_id(&request.poll_id)?;

        let poll = self
            .store
            .find_by_id(poll_id)
            .await?
            .ok_or(PollError::NotFound { id: poll_id })?;

        let option_index = parse_option_index(&request.option_index, poll.options.len())?;

        let updated = self
            .store
            .record_vote(poll_id, option_index)
            .await?
            .ok_or(PollError::NotFound { id: poll_id })?;

        info!("Vote recorded on poll {} for option {}", poll_id, option_index);
        Ok(updated)
    }
}

fn parse_poll_id(value: &Value) -> Result<Uuid> {
    value
        .as_str()
        .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
        .ok_or_else(|| PollError::InvalidArgument("Invalid poll ID".to_string()))
}

/// Integral JSON number in `[0, option_count)`.
fn parse_option_index(value: &Value, option_count: usize) -> Result<usize> {
    let invalid = || PollError::InvalidArgument("Invalid option selected".to_string());

    let index = match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| {
                number
                    .as_f64()
                    .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                    .map(|f| f as i64)
            })
            .ok_or_else(invalid)?,
        _ => return Err(invalid()),
    };

    usize::try_from(index)
        .ok()
        .filter(|index| *index < option_count)
        .ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn poll_id_must_be_a_uuid_string() {
        let id = Uuid::new_v4();
        assert_eq!(parse_poll_id(&json!(id.to_string())).unwrap(), id);
        assert!(parse_poll_id(&json!("65b0c1e2a9")).is_err());
        assert!(parse_poll_id(&json!(42)).is_err());
        assert!(parse_poll_id(&Value::Null).is_err());
    }

    #[test]
    fn option_index_bounds() {
        assert_eq!(parse_option_index(&json!(0), 3).unwrap(), 0);
        assert_eq!(parse_option_index(&json!(2), 3).unwrap(), 2);
        assert_eq!(parse_option_index(&json!(1.0), 3).unwrap(), 1);
        assert!(parse_option_index(&json!(-1), 3).is_err());
        assert!(parse_option_index(&json!(3), 3).is_err());
        assert!(parse_option_index(&json!(1.5), 3).is_err());
        assert!(parse_option_index(&json!("1"), 3).is_err());
        assert!(parse_option_index(&Value::Null, 3).is_err());
    }
}
