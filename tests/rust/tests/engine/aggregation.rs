//! Concurrent enumeration across selected sources

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use tests::streams::{collect, errors, hosts, hosts_from, CLOSE_TIMEOUT};
use tests::{
    Agent, CancellationToken, MockSession, MockSource, ScrapeError, SelectionCriteria, Session,
    Source, SourceRegistry,
};

const DOMAIN: &str = "example.com";

fn session() -> Arc<dyn Session> {
    Arc::new(MockSession::new())
}

fn agent_over(sources: Vec<Arc<dyn Source>>) -> (SourceRegistry, Agent) {
    let registry = SourceRegistry::new(sources);
    let agent = Agent::new(&registry, &SelectionCriteria::all());
    (registry, agent)
}

// =============================================================================
// Fan-in
// =============================================================================

#[tokio::test]
async fn test_single_default_source_scenario() {
    let registry = SourceRegistry::new(vec![
        MockSource::new("a")
            .emitting(["www.example.com", "HTTPS://api.example.com"])
            .into_arc(),
        MockSource::new("b")
            .with_default(false)
            .with_needs_key(true)
            .emitting(["never.example.com"])
            .into_arc(),
    ]);
    let agent = Agent::new(&registry, &SelectionCriteria::new());
    assert_eq!(agent.source_names(), vec!["a"]);

    let cancel = CancellationToken::new();
    let results = collect(agent.enumerate(&cancel, DOMAIN, session())).await;

    assert_eq!(hosts(&results), vec!["www.example.com", "api.example.com"]);
    assert!(results.iter().all(|r| r.source == "a"));
}

#[tokio::test]
async fn test_total_results_equal_sum_over_sources() {
    let (_registry, agent) = agent_over(vec![
        MockSource::new("a").flooding(7).into_arc(),
        MockSource::new("b").flooding(3).failing("quota").into_arc(),
        MockSource::new("c").failing("down").into_arc(),
        MockSource::new("d").into_arc(),
    ]);

    let cancel = CancellationToken::new();
    let results = collect(agent.enumerate(&cancel, DOMAIN, session())).await;

    let report = agent.statistics();
    let expected: usize = report.iter().map(|(_, s)| s.results + s.errors).sum();

    assert_eq!(results.len(), 12);
    assert_eq!(results.len(), expected);
    assert_eq!(errors(&results).len(), 2);
    assert_eq!(report.total_results(), 10);
    assert_eq!(report.total_errors(), 2);
}

#[tokio::test]
async fn test_per_source_order_is_preserved() {
    let (_registry, agent) = agent_over(vec![
        MockSource::new("a").flooding(200).into_arc(),
        MockSource::new("b").flooding(200).into_arc(),
        MockSource::new("c").flooding(200).into_arc(),
    ]);

    let cancel = CancellationToken::new();
    let results = collect(agent.enumerate(&cancel, DOMAIN, session())).await;

    for name in ["a", "b", "c"] {
        let expected: Vec<_> = (0..200)
            .map(|i| format!("h{}.{}.example.com", i, name))
            .collect();
        assert_eq!(hosts_from(&results, name), expected);
    }
}

#[tokio::test]
async fn test_flood_without_loss_or_duplication() {
    let (_registry, agent) = agent_over(
        (0..8)
            .map(|i| MockSource::new(&format!("s{}", i)).flooding(1000).into_arc())
            .collect(),
    );

    let cancel = CancellationToken::new();
    let mut rx = agent.enumerate(&cancel, DOMAIN, session());

    // Slow consumer: the merge buffer fills up and producers must wait
    let mut seen = HashSet::new();
    let mut count = 0;
    while let Some(result) = rx.recv().await {
        if count % 500 == 0 {
            tokio::task::yield_now().await;
        }
        count += 1;
        assert!(seen.insert(result.value().map(str::to_string)));
    }

    assert_eq!(count, 8000);
    assert_eq!(agent.statistics().total_results(), 8000);
}

#[tokio::test]
async fn test_failing_source_does_not_affect_siblings() {
    let (_registry, agent) = agent_over(vec![
        MockSource::new("bad")
            .emitting(["one.example.com"])
            .failing("api count exceeded")
            .into_arc(),
        MockSource::new("good").flooding(50).into_arc(),
    ]);

    let cancel = CancellationToken::new();
    let results = collect(agent.enumerate(&cancel, DOMAIN, session())).await;

    assert_eq!(hosts_from(&results, "bad"), vec!["one.example.com"]);
    assert_eq!(hosts_from(&results, "good").len(), 50);

    let errs = errors(&results);
    assert_eq!(errs.len(), 1);
    assert_eq!(errs[0].source, "bad");
    assert!(matches!(errs[0].as_error(), Some(ScrapeError::Provider(msg)) if msg == "api count exceeded"));
    // the error is the last thing the failing source emitted
    let last_bad = results.iter().rposition(|r| r.source == "bad");
    let err_pos = results.iter().position(|r| r.is_error());
    assert_eq!(last_bad, err_pos);
}

#[tokio::test]
async fn test_empty_agent_closes_immediately() {
    let registry = SourceRegistry::new(vec![MockSource::new("a").into_arc()]);
    let agent = Agent::new(&registry, &SelectionCriteria::new().with_sources(["missing"]));

    let cancel = CancellationToken::new();
    let results = collect(agent.enumerate(&cancel, DOMAIN, session())).await;

    assert!(results.is_empty());
}

// =============================================================================
// Statistics
// =============================================================================

#[tokio::test]
async fn test_skipped_source_reports_skip() {
    let (_registry, agent) = agent_over(vec![
        MockSource::new("keyed").with_needs_key(true).flooding(5).into_arc(),
        MockSource::new("open").flooding(5).into_arc(),
    ]);

    let cancel = CancellationToken::new();
    let results = collect(agent.enumerate(&cancel, DOMAIN, session())).await;
    let report = agent.statistics();

    assert_eq!(hosts_from(&results, "keyed"), Vec::<String>::new());
    assert!(report.get("keyed").expect("keyed").skipped);
    assert_eq!(report.get("open").expect("open").results, 5);
    assert!(!report.get("open").expect("open").skipped);
}

#[tokio::test]
async fn test_keys_from_provider_config_unlock_source() {
    let keyed = Arc::new(MockSource::new("keyed").with_needs_key(true).flooding(3));
    let registry = SourceRegistry::new(vec![keyed.clone() as Arc<dyn Source>]);

    let mut config = tests::ProviderConfig::new();
    config.insert("KEYED", vec!["token-1".to_string(), " ".to_string()]);
    assert_eq!(registry.apply_provider_config(&config), 1);
    assert_eq!(keyed.keys(), vec!["token-1"]);

    let agent = Agent::new(&registry, &SelectionCriteria::new());
    let cancel = CancellationToken::new();
    let results = collect(agent.enumerate(&cancel, DOMAIN, session())).await;

    assert_eq!(hosts(&results).len(), 3);
    assert!(!agent.statistics().get("keyed").expect("keyed").skipped);
}

#[tokio::test]
async fn test_statistics_reset_between_runs() {
    let source = Arc::new(MockSource::new("a").flooding(4));
    let registry = SourceRegistry::new(vec![source.clone() as Arc<dyn Source>]);
    let agent = Agent::new(&registry, &SelectionCriteria::new());

    for _ in 0..2 {
        let cancel = CancellationToken::new();
        collect(agent.enumerate(&cancel, DOMAIN, session())).await;
        assert_eq!(agent.statistics().get("a").expect("a").results, 4);
    }
    assert_eq!(source.runs(), 2);
}

// =============================================================================
// Cancellation and deadlines
// =============================================================================

#[tokio::test]
async fn test_cancel_before_network_calls_complete() {
    let mock_session = Arc::new(MockSession::new().with_delay(Duration::from_secs(3600)));
    let (_registry, agent) = agent_over(vec![
        MockSource::new("a")
            .with_request("http://a.invalid/")
            .flooding(10)
            .into_arc(),
        MockSource::new("b")
            .with_request("http://b.invalid/")
            .flooding(10)
            .into_arc(),
    ]);

    let cancel = CancellationToken::new();
    let rx = agent.enumerate(&cancel, DOMAIN, mock_session.clone());
    cancel.cancel();

    let results = collect(rx).await;

    assert!(hosts(&results).is_empty());
}

#[tokio::test]
async fn test_pre_cancelled_token_yields_no_subdomains() {
    let (_registry, agent) = agent_over(vec![MockSource::new("a").flooding(100).into_arc()]);

    let cancel = CancellationToken::new();
    cancel.cancel();
    let results = collect(agent.enumerate(&cancel, DOMAIN, session())).await;

    assert!(hosts(&results).is_empty());
}

#[tokio::test]
async fn test_cancel_does_not_wait_for_hung_source() {
    let (_registry, agent) = agent_over(vec![
        MockSource::new("hung").emitting(["early.example.com"]).hanging().into_arc(),
        MockSource::new("quick").flooding(3).into_arc(),
    ]);

    let cancel = CancellationToken::new();
    let mut rx = agent.enumerate(&cancel, DOMAIN, session());

    let mut received = 0;
    while received < 4 {
        rx.recv().await.expect("stream open while hung source runs");
        received += 1;
    }
    cancel.cancel();

    let rest = collect(rx).await;
    assert!(rest.is_empty());

    // counters incremented before the cancellation stay readable
    agent.wait_finished().await;
    let report = agent.statistics();
    assert_eq!(report.get("hung").expect("hung").results, 1);
    assert_eq!(report.get("quick").expect("quick").results, 3);
}

#[tokio::test]
async fn test_statistics_match_merged_stream_after_cancel() {
    let (_registry, agent) = agent_over(vec![MockSource::new("a").flooding(1000).into_arc()]);

    let cancel = CancellationToken::new();
    let mut rx = agent.enumerate(&cancel, DOMAIN, session());

    let mut received = 0;
    while received < 5 {
        rx.recv().await.expect("stream open");
        received += 1;
    }
    // source and merged buffers fill up while nobody reads
    tokio::time::sleep(Duration::from_millis(50)).await;
    cancel.cancel();

    received += collect(rx).await.len();
    agent.wait_finished().await;

    let report = agent.statistics();
    assert_eq!(report.get("a").expect("a").results, received);
    assert_eq!(report.total_results() + report.total_errors(), received);
    assert!(received < 1000);
}

#[tokio::test]
async fn test_wait_finished_covers_sources_stopped_early() {
    let hung = Arc::new(MockSource::new("hung").emitting(["early.example.com"]).hanging());
    let quick = Arc::new(MockSource::new("quick").flooding(3));
    let (_registry, agent) = agent_over(vec![
        hung.clone() as Arc<dyn Source>,
        quick.clone() as Arc<dyn Source>,
    ]);

    let cancel = CancellationToken::new();
    let mut rx = agent.enumerate(&cancel, DOMAIN, session());
    for _ in 0..4 {
        rx.recv().await.expect("stream open while hung source runs");
    }
    cancel.cancel();
    assert!(collect(rx).await.is_empty());

    tokio::time::timeout(CLOSE_TIMEOUT, agent.wait_finished())
        .await
        .expect("stopped sources did not return");
    assert_eq!(hung.finished_runs(), 1);
    assert_eq!(quick.finished_runs(), 1);

    // the next run starts only after the stopped one returned
    let cancel = CancellationToken::new();
    let results = collect(agent.enumerate_with_timeout(
        &cancel,
        DOMAIN,
        session(),
        Duration::from_millis(100),
    ))
    .await;
    agent.wait_finished().await;

    assert_eq!(hosts_from(&results, "hung"), vec!["early.example.com"]);
    assert_eq!(hung.runs(), 2);
    assert_eq!(hung.finished_runs(), 2);
    assert_eq!(agent.statistics().get("quick").expect("quick").results, 3);
}

#[tokio::test]
async fn test_wait_finished_without_enumeration_returns() {
    let (_registry, agent) = agent_over(vec![MockSource::new("a").into_arc()]);

    tokio::time::timeout(CLOSE_TIMEOUT, agent.wait_finished())
        .await
        .expect("nothing in flight");
}

#[tokio::test(start_paused = true)]
async fn test_deadline_closes_stream_of_hung_sources() {
    let (_registry, agent) = agent_over(vec![
        MockSource::new("a").emitting(["a.example.com"]).hanging().into_arc(),
        MockSource::new("b").hanging().into_arc(),
    ]);

    let cancel = CancellationToken::new();
    let started = tokio::time::Instant::now();
    let results = collect(agent.enumerate_with_timeout(
        &cancel,
        DOMAIN,
        session(),
        Duration::from_secs(5),
    ))
    .await;

    assert_eq!(hosts(&results), vec!["a.example.com"]);
    assert!(started.elapsed() >= Duration::from_secs(5));
    // the caller's token is untouched
    assert!(!cancel.is_cancelled());
}

#[tokio::test(start_paused = true)]
async fn test_deadline_not_reached_when_sources_finish() {
    let (_registry, agent) = agent_over(vec![MockSource::new("a").flooding(5).into_arc()]);

    let cancel = CancellationToken::new();
    let started = tokio::time::Instant::now();
    let results = collect(agent.enumerate_with_timeout(
        &cancel,
        DOMAIN,
        session(),
        Duration::from_secs(60),
    ))
    .await;

    assert_eq!(results.len(), 5);
    assert!(started.elapsed() < Duration::from_secs(60));
}

#[tokio::test]
async fn test_dropping_consumer_stops_sources() {
    let (_registry, agent) = agent_over(vec![MockSource::new("a").flooding(10_000).into_arc()]);

    let cancel = CancellationToken::new();
    let mut rx = agent.enumerate(&cancel, DOMAIN, session());
    rx.recv().await.expect("first result");
    drop(rx);

    tokio::time::sleep(Duration::from_millis(100)).await;
    let results = agent.statistics().get("a").expect("a").results;
    assert!(results < 10_000);
}
