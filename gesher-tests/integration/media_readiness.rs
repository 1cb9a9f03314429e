//! Media readiness store integration tests
//!
//! Exercises the store against scriptable resolver/loader collaborators:
//! single-flight behavior under concurrent callers, transition ordering
//! across multiple subscribers, and the bounded-timeout liveness guarantee.

use std::sync::Arc;
use std::time::{Duration, Instant};

use gesher_core::config::{GesherConfig, MediaConfig};
use gesher_core::media::test_support::{MockLoader, MockResolver};
use gesher_core::media::{MediaReadiness, MediaReadinessStore, MediaState, PreloadTicket};

fn config_with_timeout(buffer_timeout: Duration) -> MediaConfig {
    MediaConfig {
        buffer_timeout,
        ..MediaConfig::default()
    }
}

async fn wait_until_terminal(store: &Arc<MediaReadinessStore>, key: &str) -> MediaState {
    for _ in 0..200 {
        let state = store.state(key);
        if state.readiness.is_terminal() {
            return state;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("key {key} never reached a terminal state");
}

#[tokio::test]
async fn concurrent_callers_trigger_one_resolution() {
    let resolver = Arc::new(MockResolver::succeeds_with_delay(
        "http://cdn/hero.mp4",
        Duration::from_millis(50),
    ));
    let loader = Arc::new(MockLoader::instant());
    let store = MediaReadinessStore::new(
        resolver.clone(),
        loader,
        &config_with_timeout(Duration::from_secs(5)),
    );

    // Ten independent call sites racing on the same key
    let mut handles = Vec::new();
    for _ in 0..10 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store.request_preload("videos/hero.mp4").unwrap()
        }));
    }

    let mut started = 0;
    for handle in handles {
        if handle.await.unwrap() == PreloadTicket::Started {
            started += 1;
        }
    }

    assert_eq!(started, 1, "exactly one caller may start the attempt");
    wait_until_terminal(&store, "videos/hero.mp4").await;
    assert_eq!(resolver.invocations(), 1);
}

#[tokio::test]
async fn all_subscribers_observe_the_same_ordered_transitions() {
    let resolver = Arc::new(MockResolver::succeeds_with("http://cdn/hero.mp4"));
    let loader = Arc::new(MockLoader::instant());
    let store = MediaReadinessStore::new(
        resolver,
        loader,
        &config_with_timeout(Duration::from_secs(5)),
    );

    let mut first = store.subscribe();
    let mut second = store.subscribe();

    store.request_preload("videos/hero.mp4").unwrap();

    async fn collect(
        events: &mut tokio::sync::broadcast::Receiver<MediaState>,
    ) -> Vec<MediaReadiness> {
        let mut observed = Vec::new();
        loop {
            let state = tokio::time::timeout(Duration::from_secs(1), events.recv())
                .await
                .expect("transition stream stalled")
                .expect("event channel closed");
            let terminal = state.readiness.is_terminal();
            observed.push(state.readiness);
            if terminal {
                return observed;
            }
        }
    }

    let expected = vec![
        MediaReadiness::Resolving,
        MediaReadiness::Buffering,
        MediaReadiness::Ready,
    ];
    assert_eq!(collect(&mut first).await, expected);
    assert_eq!(collect(&mut second).await, expected);
}

#[tokio::test]
async fn stalled_loader_still_reaches_ready_within_the_bound() {
    let config = GesherConfig::for_testing();
    let timeout = config.media.buffer_timeout;
    let resolver = Arc::new(MockResolver::succeeds_with("http://cdn/hero.mp4"));
    let loader = Arc::new(MockLoader::never_completes());
    let store = MediaReadinessStore::new(resolver, loader, &config.media);

    let started = Instant::now();
    store.request_preload("videos/hero.mp4").unwrap();

    let state = wait_until_terminal(&store, "videos/hero.mp4").await;
    let elapsed = started.elapsed();

    // Soft success: ready despite the loader never signalling completion
    assert_eq!(state.readiness, MediaReadiness::Ready);
    assert!(state.error_detail.is_none());
    assert!(
        elapsed < timeout + Duration::from_secs(1),
        "readiness took {elapsed:?}, bound was {timeout:?}"
    );
}

#[tokio::test]
async fn failure_requires_reset_before_retry() {
    let resolver = Arc::new(MockResolver::fails_with("bucket unavailable"));
    let loader = Arc::new(MockLoader::instant());
    let store = MediaReadinessStore::new(
        resolver.clone(),
        loader,
        &config_with_timeout(Duration::from_secs(5)),
    );

    store.request_preload("videos/hero.mp4").unwrap();
    let failed = wait_until_terminal(&store, "videos/hero.mp4").await;
    assert_eq!(failed.readiness, MediaReadiness::Failed);

    // Re-requesting without reset joins the failed attempt, no new fetch
    assert_eq!(
        store.request_preload("videos/hero.mp4").unwrap(),
        PreloadTicket::Joined(MediaReadiness::Failed)
    );
    assert_eq!(resolver.invocations(), 1);

    resolver.recover_with("http://cdn/hero.mp4");
    assert!(store.reset("videos/hero.mp4"));
    assert_eq!(
        store.request_preload("videos/hero.mp4").unwrap(),
        PreloadTicket::Started
    );

    let state = wait_until_terminal(&store, "videos/hero.mp4").await;
    assert_eq!(state.readiness, MediaReadiness::Ready);
    assert_eq!(resolver.invocations(), 2);
}

#[tokio::test]
async fn reads_never_trigger_fetches() {
    let resolver = Arc::new(MockResolver::succeeds_with("http://cdn/hero.mp4"));
    let loader = Arc::new(MockLoader::instant());
    let store = MediaReadinessStore::new(
        resolver.clone(),
        loader,
        &config_with_timeout(Duration::from_secs(5)),
    );

    let _ = store.state("videos/hero.mp4");
    let _ = store.subscribe();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(resolver.invocations(), 0);
    assert_eq!(
        store.state("videos/hero.mp4").readiness,
        MediaReadiness::Idle
    );
}
