// tests/collector_scenarios.rs
//! End-to-end runs of the collector against scripted sources.

mod common;

use common::*;
use insta::assert_snapshot;
use pretty_assertions::assert_eq;
use std::collections::HashSet;
use tubesift::{
    summarize, AppError, ChannelAttributes, CollectorEngine, QueryDescriptor, TerminalState,
};

fn pages_of(ids: Vec<String>, size: usize) -> Vec<Vec<String>> {
    ids.chunks(size).map(<[String]>::to_vec).collect()
}

/// `page_count` pages of ten, every second video passing, one big US channel.
fn half_passing_source(page_count: usize) -> ScriptedSource {
    let all = ids("vid", 0..page_count * 10);
    ScriptedSource::with_pages(pages_of(all.clone(), 10))
        .videos(half_passing(&all, "UCbrand"))
        .channels([big_us_channel("UCbrand")])
}

#[test]
fn keeps_batching_until_target_reached() {
    let source = half_passing_source(5);
    let mut engine =
        CollectorEngine::new(&source, test_config(10), keys(&["key-one"])).unwrap();

    let result = engine.collect(&QueryDescriptor::new("brand", 10)).unwrap();

    assert_eq!(result.terminal_state, TerminalState::TargetReached);
    assert_eq!(result.batches, 2);
    assert_eq!(result.filtered_items.len(), 10);
    assert_eq!(result.raw_items.len(), 20);
    assert_eq!(source.calls_to("search").len(), 2);
}

#[test]
fn stops_with_fewer_items_when_upstream_runs_dry() {
    let source = half_passing_source(2);
    let mut engine =
        CollectorEngine::new(&source, test_config(10), keys(&["key-one"])).unwrap();

    let result = engine.collect(&QueryDescriptor::new("brand", 20)).unwrap();

    assert_eq!(result.terminal_state, TerminalState::UpstreamExhausted);
    assert_eq!(result.batches, 2);
    assert_eq!(result.filtered_items.len(), 10);
    assert_eq!(result.raw_items.len(), 20);
}

#[test]
fn overshooting_batch_is_truncated_to_target() {
    let all = ids("vid", 0..40);
    let source = ScriptedSource::with_pages(pages_of(all.clone(), 20))
        .videos(half_passing(&all, "UCbrand"))
        .channels([big_us_channel("UCbrand")]);
    let mut engine =
        CollectorEngine::new(&source, test_config(20), keys(&["key-one"])).unwrap();

    let result = engine.collect(&QueryDescriptor::new("brand", 15)).unwrap();

    assert_eq!(result.terminal_state, TerminalState::TargetReached);
    assert_eq!(result.filtered_items.len(), 15);
    assert_eq!(result.identifiers.len(), 15);
    assert_eq!(result.raw_items.len(), 40);
    let first: Vec<&str> = result
        .identifiers
        .iter()
        .take(2)
        .map(|id| id.as_str())
        .collect();
    assert_eq!(first, vec!["vid000", "vid002"]);

    let passing_raw = result
        .raw_items
        .iter()
        .filter(|item| item.quality_filter_passed)
        .count();
    assert_eq!(passing_raw, 20);
}

#[test]
fn results_are_deduplicated_and_filter_sound() {
    let source = half_passing_source(2);
    let mut engine =
        CollectorEngine::new(&source, test_config(10), keys(&["key-one"])).unwrap();

    let result = engine.collect(&QueryDescriptor::new("brand", 20)).unwrap();

    let distinct: HashSet<_> = result.identifiers.iter().collect();
    assert_eq!(distinct.len(), result.identifiers.len());
    assert!(result.raw_items.len() >= result.filtered_items.len());

    for item in &result.filtered_items {
        assert!(engine.filter().evaluate(item).passed);
    }
    let passing: HashSet<_> = result.identifiers.iter().collect();
    for item in result
        .raw_items
        .iter()
        .filter(|item| !passing.contains(&item.video_id))
    {
        let verdict = engine.filter().evaluate(item);
        assert!(!verdict.passed);
        assert!(!verdict.reasons.is_empty());
        assert_eq!(item.filter_fail_reason, Some(verdict.reason_text()));
    }
}

#[test]
fn stalls_when_every_batch_repeats_the_same_items() {
    let repeated: Vec<_> = ids("dup", 0..5)
        .iter()
        .map(|id| failing_video(id, "UCbrand"))
        .collect();
    let source = ScriptedSource::endless(50)
        .fixed_details(repeated)
        .channels([big_us_channel("UCbrand")]);
    let config = test_config(50);
    let max_stall = config.max_stall_batches;
    let mut engine = CollectorEngine::new(&source, config, keys(&["key-one"])).unwrap();

    let result = engine.collect(&QueryDescriptor::new("brand", 10)).unwrap();

    assert_eq!(result.terminal_state, TerminalState::Stalled);
    assert_eq!(result.batches, max_stall + 1);
    assert_eq!(result.raw_items.len(), 5);
    assert!(result.filtered_items.is_empty());
}

#[test]
fn rotates_past_a_key_without_quota() {
    let source = half_passing_source(1).quota_for_key("key-one");
    let mut engine =
        CollectorEngine::new(&source, test_config(10), keys(&["key-one", "key-two"])).unwrap();

    let result = engine.collect(&QueryDescriptor::new("brand", 50)).unwrap();

    assert_eq!(result.raw_items.len(), 10);
    let current = engine.credentials().current();
    assert_eq!(current.index, 1);
    assert_eq!(current.key.as_str(), "key-two");

    let used: Vec<String> = source.calls().into_iter().map(|call| call.key).collect();
    assert_eq!(used.first().map(String::as_str), Some("key-one"));
    assert!(used[1..].iter().all(|key| key == "key-two"));
}

#[test]
fn fails_when_every_key_is_out_of_quota() {
    let source = half_passing_source(1)
        .quota_for_key("key-one")
        .quota_for_key("key-two");
    let mut engine =
        CollectorEngine::new(&source, test_config(10), keys(&["key-one", "key-two"])).unwrap();

    let err = engine.collect(&QueryDescriptor::new("brand", 10)).unwrap_err();

    assert!(matches!(
        err,
        AppError::CredentialsExhausted {
            credentials: 2,
            partial: None
        }
    ));
    assert_eq!(source.calls().len(), 2);
}

#[test]
fn partial_results_are_attached_only_on_request() {
    let run = |partial_results_on_exhaustion: bool| {
        // one batch costs a search, a detail and a channel call
        let source = half_passing_source(3).quota_after(3);
        let mut config = test_config(10);
        config.partial_results_on_exhaustion = partial_results_on_exhaustion;
        let mut engine =
            CollectorEngine::new(&source, config, keys(&["key-one", "key-two"])).unwrap();
        engine.collect(&QueryDescriptor::new("brand", 50)).unwrap_err()
    };

    let without = run(false);
    assert!(without.is_credentials_exhausted());
    assert!(without.into_partial().is_none());

    let with = run(true);
    assert!(with.is_credentials_exhausted());
    let partial = with.into_partial().unwrap();
    assert_eq!(partial.terminal_state, TerminalState::CredentialsExhausted);
    assert_eq!(partial.batches, 1);
    assert_eq!(partial.raw_items.len(), 10);
    assert_eq!(partial.filtered_items.len(), 5);
}

#[test]
fn failed_owner_lookup_degrades_to_empty_attributes() {
    let all = ids("vid", 0..4);
    let source = ScriptedSource::with_pages(vec![all.clone()])
        .videos(all.iter().map(|id| passing_video(id, "UCbrand")))
        .channels([big_us_channel("UCbrand")])
        .fail_next("channels", backend_error())
        .fail_next("channels", backend_error())
        .fail_next("channels", backend_error());
    let mut engine =
        CollectorEngine::new(&source, test_config(10), keys(&["key-one"])).unwrap();

    let result = engine.collect(&QueryDescriptor::new("brand", 10)).unwrap();

    assert_eq!(result.raw_items.len(), 4);
    assert!(result.filtered_items.is_empty());
    for item in &result.raw_items {
        assert_eq!(item.channel, ChannelAttributes::default());
        let reason = item.filter_fail_reason.as_deref().unwrap_or_default();
        assert!(reason.contains("channel country unknown"), "{}", reason);
    }
}

#[test]
fn quota_running_out_on_owner_lookup_aborts_the_run() {
    // search and detail calls succeed, the channel call finds every key spent
    let source = half_passing_source(1).quota_after(2);
    let mut config = test_config(10);
    config.partial_results_on_exhaustion = true;
    let mut engine =
        CollectorEngine::new(&source, config, keys(&["key-one", "key-two"])).unwrap();

    let err = engine.collect(&QueryDescriptor::new("brand", 10)).unwrap_err();

    assert!(err.is_credentials_exhausted());
    let lookups: Vec<String> = source
        .calls_to("channels")
        .into_iter()
        .map(|call| call.key)
        .collect();
    assert_eq!(lookups, vec!["key-one".to_string(), "key-two".to_string()]);

    let partial = err.into_partial().unwrap();
    assert_eq!(partial.terminal_state, TerminalState::CredentialsExhausted);
    assert_eq!(partial.batches, 0);
    assert!(partial.raw_items.is_empty());
}

#[test]
fn owners_are_looked_up_once_per_distinct_channel() {
    let all = ids("vid", 0..10);
    let videos: Vec<_> = all
        .iter()
        .enumerate()
        .map(|(i, id)| passing_video(id, if i % 2 == 0 { "UCeven" } else { "UCodd" }))
        .collect();
    let source = ScriptedSource::with_pages(vec![all])
        .videos(videos)
        .channels([big_us_channel("UCeven"), big_us_channel("UCodd")]);
    let mut engine =
        CollectorEngine::new(&source, test_config(10), keys(&["key-one"])).unwrap();

    let result = engine.collect(&QueryDescriptor::new("brand", 50)).unwrap();

    let lookups = source.calls_to("channels");
    assert_eq!(lookups.len(), 1);
    assert_eq!(lookups[0].ids, vec!["UCeven".to_string(), "UCodd".to_string()]);
    assert_eq!(result.filtered_items.len(), 10);
    assert_eq!(result.filtered_items[1].channel.title, "Channel UCodd");
}

#[test]
fn transient_search_failure_is_retried() {
    let source = half_passing_source(1).fail_next("search", backend_error());
    let mut engine =
        CollectorEngine::new(&source, test_config(10), keys(&["key-one"])).unwrap();

    let result = engine.collect(&QueryDescriptor::new("brand", 50)).unwrap();

    assert_eq!(result.raw_items.len(), 10);
    assert_eq!(source.calls_to("search").len(), 2);
}

#[test]
fn rejected_search_surfaces_as_upstream_error() {
    let source = half_passing_source(1).fail_next("search", bad_request_error());
    let mut engine =
        CollectorEngine::new(&source, test_config(10), keys(&["key-one"])).unwrap();

    let err = engine.collect(&QueryDescriptor::new("brand", 50)).unwrap_err();

    assert!(err.is_upstream());
    assert!(!err.is_credentials_exhausted());
    assert_eq!(source.calls_to("search").len(), 1);
}

#[test]
fn persistent_detail_failure_gives_up_after_bounded_attempts() {
    let source = half_passing_source(1)
        .fail_next("videos", backend_error())
        .fail_next("videos", backend_error())
        .fail_next("videos", backend_error());
    let mut engine =
        CollectorEngine::new(&source, test_config(10), keys(&["key-one"])).unwrap();

    let err = engine.collect(&QueryDescriptor::new("brand", 50)).unwrap_err();

    match err {
        AppError::UpstreamFailure {
            endpoint, attempts, ..
        } => {
            assert_eq!(endpoint, "videos");
            assert_eq!(attempts, 3);
        }
        other => panic!("expected upstream failure, got {:?}", other),
    }
}

#[test]
fn engine_requires_at_least_one_key() {
    let source = half_passing_source(1);
    let result = CollectorEngine::new(&source, test_config(10), Vec::new());
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[test]
fn summary_reports_failures_by_predicate() {
    let source = half_passing_source(5);
    let mut engine =
        CollectorEngine::new(&source, test_config(10), keys(&["key-one"])).unwrap();

    let result = engine.collect(&QueryDescriptor::new("brand", 10)).unwrap();
    let summary = summarize(&result, engine.filter());

    assert_snapshot!(
        summary.to_string(),
        @"'brand': target reached after 2 batch(es), 10/20 passed (50%), 1 channel(s); failures: category=10"
    );
}
