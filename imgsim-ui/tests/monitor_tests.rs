//! Metrics poller integration tests

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use helpers::{health_snapshot, stats_snapshot, FakeService};
use imgsim_common::events::{ClientEvent, EventBus};
use imgsim_ui::client::ClientError;
use imgsim_ui::monitor::{MetricsPoller, TickOutcome};
use tokio_util::sync::CancellationToken;

fn poller(fake: &Arc<FakeService>, interval: Duration) -> (Arc<MetricsPoller>, EventBus) {
    let events = EventBus::new(100);
    let poller = Arc::new(MetricsPoller::new(fake.clone(), interval, events.clone()));
    (poller, events)
}

#[tokio::test]
async fn test_tick_derives_cache_hit_rate() {
    let fake = Arc::new(FakeService::new());
    fake.set_stats(Ok(stats_snapshot(80, 20)));
    fake.set_health(Ok(health_snapshot("healthy")));
    let (poller, _events) = poller(&fake, Duration::from_secs(5));

    let outcome = poller.tick().await;
    assert_eq!(outcome, TickOutcome { stats_ok: true, health_ok: true });

    let report = poller.report().await;
    let rate = report.derived.cache_hit_rate.unwrap();
    assert!((rate - 0.8).abs() < 1e-12, "hit rate {}", rate);
    assert_eq!(report.derived.healthy_services, Some(2));
    assert_eq!(report.derived.service_healthy, Some(true));
    assert_eq!(report.snapshot.ticks, 1);
    assert_eq!(report.snapshot.failed_ticks, 0);
}

#[tokio::test]
async fn test_hit_rate_zero_without_lookups() {
    let fake = Arc::new(FakeService::new());
    fake.set_stats(Ok(stats_snapshot(0, 0)));
    let (poller, _events) = poller(&fake, Duration::from_secs(5));

    poller.tick().await;
    assert_eq!(poller.report().await.derived.cache_hit_rate, Some(0.0));
}

#[tokio::test]
async fn test_failed_call_keeps_last_known_good() {
    let fake = Arc::new(FakeService::new());
    fake.set_stats(Ok(stats_snapshot(80, 20)));
    fake.set_health(Ok(health_snapshot("healthy")));
    let (poller, _events) = poller(&fake, Duration::from_secs(5));
    poller.tick().await;

    fake.set_stats(Err(ClientError::Service {
        status: 503,
        body: "cache unavailable".into(),
    }));
    fake.set_health(Ok(health_snapshot("degraded")));

    let outcome = poller.tick().await;
    assert_eq!(outcome, TickOutcome { stats_ok: false, health_ok: true });

    let snapshot = poller.snapshot().await;
    assert_eq!(snapshot.stats, Some(stats_snapshot(80, 20)));
    assert_eq!(snapshot.health.as_ref().map(|h| h.status.as_str()), Some("degraded"));
    assert_eq!(snapshot.ticks, 2);
    assert_eq!(snapshot.failed_ticks, 1);
}

#[tokio::test]
async fn test_no_snapshot_until_first_success() {
    let fake = Arc::new(FakeService::new());
    let (poller, _events) = poller(&fake, Duration::from_secs(5));

    let outcome = poller.tick().await;
    assert_eq!(outcome, TickOutcome { stats_ok: false, health_ok: false });

    let report = poller.report().await;
    assert!(report.snapshot.stats.is_none());
    assert!(report.derived.cache_hit_rate.is_none());
    assert!(report.derived.service_healthy.is_none());
}

#[tokio::test]
async fn test_tick_emits_metrics_event() {
    let fake = Arc::new(FakeService::new());
    fake.set_stats(Ok(stats_snapshot(3, 1)));
    let (poller, events) = poller(&fake, Duration::from_secs(5));
    let mut rx = events.subscribe();

    poller.tick().await;

    match rx.try_recv().unwrap() {
        ClientEvent::MetricsUpdated {
            status,
            points_count,
            cache_hit_rate,
            ..
        } => {
            assert_eq!(status, None);
            assert_eq!(points_count, Some(1500));
            assert_eq!(cache_hit_rate, Some(0.75));
        }
        other => panic!("unexpected event {:?}", other),
    }
}

#[tokio::test]
async fn test_scheduled_ticks_survive_failures_and_stop_on_cancel() {
    let fake = Arc::new(FakeService::new());
    let (poller, _events) = poller(&fake, Duration::from_millis(20));

    let shutdown = CancellationToken::new();
    let handle = poller.clone().spawn(shutdown.clone());

    tokio::time::timeout(Duration::from_secs(5), async {
        while poller.snapshot().await.ticks < 3 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("poller kept ticking despite failures");

    fake.set_stats(Ok(stats_snapshot(1, 0)));
    tokio::time::timeout(Duration::from_secs(5), async {
        while poller.snapshot().await.stats.is_none() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("poller recovered after failures");

    shutdown.cancel();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("poller stopped on cancel")
        .unwrap();

    let ticks = poller.snapshot().await.ticks;
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(poller.snapshot().await.ticks, ticks);
    assert_eq!(poller.report().await.derived.cache_hit_rate, Some(1.0));
}
