use crate::types::Headline;

pub const FALLBACK_TITLE: &str = "Breaking News";

/// Title to show for a headline, falling back when the provider sent none.
pub fn display_title(headline: &Headline) -> String {
    headline
        .title
        .as_deref()
        .map(str::trim)
        .filter(|title| !title.is_empty())
        .unwrap_or(FALLBACK_TITLE)
        .to_string()
}

/// Short topic label: the part of the title before its first colon.
pub fn derive_topic(title: &str) -> String {
    let topic = title.split(':').next().unwrap_or(title).trim();
    if topic.is_empty() {
        title.trim().to_string()
    } else {
        topic.to_string()
    }
}

/// Prompt asking for an opinion poll about `title`.
pub fn poll_prompt(title: &str) -> String {
    format!(
        r#"Based on the latest news headline:
**"{title}"**

Generate a **user opinion-based multiple-choice poll question**.
The poll should ask users for their **thoughts or stance** on the topic, NOT factual knowledge.

Format:
**Question:** [Opinion-Based Poll Question]
**Options:**
1) Option A
2) Option B
3) Option C
4) Option D

Keep it **engaging** and **controversial if needed** to spark discussion."#
    )
}

/// Time utilities
pub mod time {
    use chrono::{DateTime, Duration, Local, NaiveTime, TimeZone, Utc};

    /// The next local midnight strictly after `now`.
    pub fn next_local_midnight(now: DateTime<Local>) -> DateTime<Local> {
        let tomorrow = now.date_naive().succ_opt().unwrap_or(now.date_naive());
        let midnight = tomorrow.and_time(NaiveTime::MIN);
        // DST transitions can make local midnight ambiguous or skip it
        Local
            .from_local_datetime(&midnight)
            .earliest()
            .unwrap_or_else(|| now + Duration::hours(24))
    }

    /// How long to wait from `now` until the next local midnight.
    pub fn until_next_local_midnight(now: DateTime<Local>) -> std::time::Duration {
        (next_local_midnight(now) - now)
            .to_std()
            .unwrap_or(std::time::Duration::from_secs(24 * 60 * 60))
    }

    pub fn cutoff(now: DateTime<Utc>, window: Duration) -> DateTime<Utc> {
        now - window
    }
}
