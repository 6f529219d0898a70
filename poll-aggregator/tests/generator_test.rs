mod common;

use common::{CannedGenerator, Harness, StaticNews, WELL_FORMED_OUTPUT};
use poll_aggregator::{PollError, PollStore};
use std::time::Duration;

#[tokio::test]
async fn cycle_stores_parsed_poll_with_zero_votes() {
    let harness = Harness::ready();

    let poll = harness.generator.run_cycle().await.expect("poll generated");

    assert_eq!(poll.topic, "Elections");
    assert_eq!(poll.question, "Do you support X?");
    assert_eq!(poll.options, vec!["Yes", "No", "Unsure"]);
    assert_eq!(poll.votes, vec![0, 0, 0]);
    assert_eq!(
        harness.store.find_by_id(poll.id).await.unwrap(),
        Some(poll)
    );
}

#[tokio::test]
async fn prompt_is_built_from_the_chosen_headline() {
    let harness = Harness::ready();
    harness.generator.run_cycle().await;

    let prompts = harness.llm.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("\"Elections: turnout hits record\""));
    assert!(prompts[0].contains("opinion-based"));
}

#[tokio::test]
async fn untitled_headline_uses_fallback_topic() {
    let mut news = StaticNews::empty();
    news.headlines.push(Default::default());
    let harness = Harness::new(news, CannedGenerator::new(WELL_FORMED_OUTPUT));

    let poll = harness.generator.run_cycle().await.expect("poll generated");
    assert_eq!(poll.topic, "Breaking News");
}

#[tokio::test]
async fn empty_headline_list_creates_nothing() {
    let harness = Harness::new(StaticNews::empty(), CannedGenerator::new(WELL_FORMED_OUTPUT));

    assert!(harness.generator.run_cycle().await.is_none());
    assert!(harness.store.is_empty().await);
    assert!(harness.llm.prompts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn news_failure_is_upstream_unavailable() {
    let harness = Harness::new(StaticNews::failing(), CannedGenerator::new(WELL_FORMED_OUTPUT));

    let result = harness.generator.generate().await;
    assert!(matches!(result, Err(PollError::UpstreamUnavailable(_))));
    assert!(harness.generator.run_cycle().await.is_none());
    assert!(harness.store.is_empty().await);
}

#[tokio::test]
async fn missing_candidate_text_creates_nothing() {
    let harness = Harness::new(
        StaticNews::with_titles(&["Budget vote"]),
        CannedGenerator::silent(),
    );

    let result = harness.generator.generate().await;
    assert!(matches!(result, Err(PollError::UpstreamUnavailable(_))));
    assert!(harness.store.is_empty().await);
}

#[tokio::test]
async fn unparseable_output_is_a_parse_failure() {
    let harness = Harness::new(
        StaticNews::with_titles(&["Budget vote"]),
        CannedGenerator::new("I think the budget is interesting.\nA) Yes\nB) No"),
    );

    let result = harness.generator.generate().await;
    assert!(matches!(result, Err(PollError::ParseFailure(_))));
    assert!(harness.store.is_empty().await);
}

#[tokio::test]
async fn single_option_output_is_discarded() {
    let harness = Harness::new(
        StaticNews::with_titles(&["Budget vote"]),
        CannedGenerator::new("Question: Agree?\n1) Yes"),
    );

    assert!(harness.generator.run_cycle().await.is_none());
    assert!(harness.store.is_empty().await);
}

#[tokio::test(start_paused = true)]
async fn slow_generation_times_out() {
    let harness = Harness::new(
        StaticNews::with_titles(&["Budget vote"]),
        CannedGenerator::new(WELL_FORMED_OUTPUT).with_delay(Duration::from_secs(120)),
    );

    let result = harness.generator.generate().await;
    match result {
        Err(PollError::UpstreamUnavailable(reason)) => assert!(reason.contains("timed out")),
        other => panic!("expected a timeout, got {:?}", other),
    }
    assert!(harness.store.is_empty().await);
}
