//! Reload behaviour under concurrent evaluation.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use diameter_rtd::config::loader::parse_config;
use diameter_rtd::lifecycle::{load_initial, Reloader, Shutdown};
use diameter_rtd::routing::{build, AttributeMap, Directive, PeerInfo, RuleStore, StoreState, TargetClass};

mod common;
use common::{rules_file, target, target_with_rules};

/// Two targets matching the same peer, each adding `version`.
fn versioned(version: i64) -> Vec<Directive> {
    let mut directives = target_with_rules(
        &target(TargetClass::PeerIdentity, "a.node", false),
        &[("all", None, version)],
    );
    directives.extend(target_with_rules(
        &target(TargetClass::Realm, "example.com", false),
        &[("all", None, version)],
    ));
    directives
}

fn realm_score_file(score: i64) -> String {
    format!(
        "[reload]\nwatch = false\n\n[[targets]]\nclass = \"realm\"\nmatch = \"example.com\"\n  [[targets.rules]]\n  criteria = \"all\"\n  score = {}\n",
        score
    )
}

/// A watched rules file: `filler` peer targets plus `realm example.com all +score`.
fn watched_file(filler: usize, score: i64) -> String {
    let mut text = String::from("[reload]\nwatch = true\npoll_interval_secs = 1\n");
    for i in 0..filler {
        text.push_str(&format!(
            "\n[[targets]]\nclass = \"peer\"\nmatch = \"filler{}.node\"\n  [[targets.rules]]\n  criteria = \"all\"\n  score = 1\n",
            i
        ));
    }
    text.push_str(&format!(
        "\n[[targets]]\nclass = \"realm\"\nmatch = \"example.com\"\n  [[targets.rules]]\n  criteria = \"all\"\n  score = {}\n",
        score
    ));
    text
}

#[test]
fn readers_never_see_partial_rule_sets() {
    let store = Arc::new(RuleStore::with_repository(build(&versioned(1)).unwrap()));
    let done = Arc::new(AtomicBool::new(false));

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let store = store.clone();
            let done = done.clone();
            thread::spawn(move || {
                let peers = [PeerInfo::new("a.node").with_realm("example.com")];
                let message = AttributeMap::new();
                let mut evaluations = 0u64;
                while !done.load(Ordering::Relaxed) {
                    let score = store.evaluate(&message, &peers)[0].score;
                    assert!(score % 2 == 0 && (2..=200).contains(&score), "torn score {}", score);
                    evaluations += 1;
                }
                evaluations
            })
        })
        .collect();

    let peers = [PeerInfo::new("a.node").with_realm("example.com")];
    for version in 2..=100 {
        store.reload(&versioned(version)).unwrap();
        // Every evaluation issued after reload returns sees the new rules.
        assert_eq!(store.evaluate(&AttributeMap::new(), &peers)[0].score, 2 * version);
    }
    done.store(true, Ordering::Relaxed);

    for reader in readers {
        reader.join().unwrap();
    }
}

#[test]
fn in_flight_snapshot_keeps_old_rules() {
    let store = RuleStore::with_repository(build(&versioned(1)).unwrap());
    let peers = [PeerInfo::new("a.node").with_realm("example.com")];

    let snapshot = store.get_for_read().unwrap();
    store.reload(&versioned(5)).unwrap();

    let old = diameter_rtd::routing::evaluate(&snapshot, &AttributeMap::new(), &peers);
    let new = store.evaluate(&AttributeMap::new(), &peers);
    assert_eq!(old[0].score, 2);
    assert_eq!(new[0].score, 10);
}

#[test]
fn concurrent_reloads_are_serialized() {
    let store = Arc::new(RuleStore::new());
    assert_eq!(store.state(), StoreState::Uninitialized);

    let writers: Vec<_> = (1..=8)
        .map(|v| {
            let store = store.clone();
            thread::spawn(move || store.reload(&versioned(v)).is_ok())
        })
        .collect();
    for writer in writers {
        assert!(writer.join().unwrap());
    }

    assert_eq!(store.state(), StoreState::Ready);
    let repo = store.get_for_read().unwrap();
    assert_eq!(repo.target_count(), 2);
    assert_eq!(repo.rule_count(), 2);
}

#[tokio::test]
async fn reloader_applies_requests_and_survives_bad_files() {
    let file = rules_file(&realm_score_file(10));
    let (config, store) = load_initial(file.path()).unwrap();
    let shutdown = Shutdown::new();
    let reloader = Reloader::spawn(store.clone(), file.path().to_path_buf(), &config, &shutdown).unwrap();

    let peers = [PeerInfo::new("p").with_realm("example.com")];
    let score = || store.evaluate(&AttributeMap::new(), &peers)[0].score;
    assert_eq!(score(), 10);

    std::fs::write(file.path(), realm_score_file(20)).unwrap();
    assert!(reloader.request_reload());
    wait_for(|| score() == 20).await;

    std::fs::write(file.path(), "[[targets]]\nclass = \"realm\"\nmatch = \"((\"\npattern = true\n").unwrap();
    assert!(reloader.request_reload());
    let applied = parse_config(&realm_score_file(30)).unwrap();
    assert!(reloader.request_apply(applied));
    // Requests are applied in order: the bad file is skipped, then 30 lands.
    wait_for(|| score() == 30).await;

    shutdown.trigger();
    reloader.join().await;
}

async fn wait_for(mut condition: impl FnMut() -> bool) {
    for _ in 0..250 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("condition not reached");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn watched_file_edit_is_reloaded() {
    let file = rules_file(&watched_file(0, 10));
    let (config, store) = load_initial(file.path()).unwrap();
    assert!(config.reload.watch);
    let shutdown = Shutdown::new();
    let reloader = Reloader::spawn(store.clone(), file.path().to_path_buf(), &config, &shutdown).unwrap();

    let peers = [PeerInfo::new("p").with_realm("example.com")];
    let score = || store.evaluate(&AttributeMap::new(), &peers)[0].score;
    assert_eq!(score(), 10);

    std::fs::write(file.path(), watched_file(0, 20)).unwrap();
    wait_for(|| score() == 20).await;

    shutdown.trigger();
    reloader.join().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn rewrite_burst_never_publishes_a_truncated_file() {
    let file = rules_file(&watched_file(200, 10));
    let (config, store) = load_initial(file.path()).unwrap();
    let shutdown = Shutdown::new();
    let reloader = Reloader::spawn(store.clone(), file.path().to_path_buf(), &config, &shutdown).unwrap();

    let done = Arc::new(AtomicBool::new(false));
    let lowest = Arc::new(AtomicI64::new(i64::MAX));
    let sampler = {
        let (store, done, lowest) = (store.clone(), done.clone(), lowest.clone());
        thread::spawn(move || {
            let peers = [PeerInfo::new("p").with_realm("example.com")];
            while !done.load(Ordering::Relaxed) {
                let score = store.evaluate(&AttributeMap::new(), &peers)[0].score;
                lowest.fetch_min(score, Ordering::Relaxed);
            }
        })
    };

    // Every write leaves a valid file behind; only the in-between states are not.
    for i in 0..200 {
        std::fs::write(file.path(), watched_file(200, 10 + (i % 2))).unwrap();
    }

    let peers = [PeerInfo::new("p").with_realm("example.com")];
    wait_for(|| store.evaluate(&AttributeMap::new(), &peers)[0].score == 11).await;
    assert_eq!(store.get_for_read().unwrap().target_count(), 201);

    done.store(true, Ordering::Relaxed);
    sampler.join().unwrap();
    assert!(lowest.load(Ordering::Relaxed) >= 10, "rules were wiped during rewrites");

    shutdown.trigger();
    reloader.join().await;
}
