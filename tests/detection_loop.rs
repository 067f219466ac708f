use ids_core::{
    ChannelPresenter, Dashboard, DetectionLoop, DetectorConfig, IntrusionKind, ShellMessage,
};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn wait_for(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    false
}

fn seeded_config(seed: u64) -> DetectorConfig {
    DetectorConfig {
        tick_interval_ms: 2,
        seed: Some(seed),
        ..Default::default()
    }
}

#[test]
fn test_seeded_run_against_dashboard() {
    let dashboard = Arc::new(Dashboard::new());
    let ids = DetectionLoop::new(seeded_config(2024), dashboard.clone()).unwrap();

    ids.start().unwrap();
    assert!(wait_for(|| ids.ticks() >= 60));
    ids.stop();

    let samples = dashboard.samples();
    assert_eq!(samples.len() as u64, ids.ticks());
    assert!(samples.iter().all(|s| *s <= 99));

    // One intrusion per sample above 70, recorded in sample order.
    let above = samples.iter().filter(|s| **s > 70).count();
    let history = dashboard.history();
    assert_eq!(history.len(), above);
    assert!(history.iter().all(|i| i.kind() != IntrusionKind::Unknown));
    for pair in history.windows(2) {
        assert!(pair[0].observed_at() <= pair[1].observed_at());
    }

    // Every alert line directly follows the traffic line that triggered it.
    let log = dashboard.log_lines();
    for (i, line) in log.iter().enumerate() {
        if line.starts_with("Security Alert / Intrusion detected: ") {
            let traffic: u8 = log[i - 1]
                .strip_prefix("Current Traffic: ")
                .expect("alert must follow a traffic line")
                .parse()
                .unwrap();
            assert!(traffic > 70);
        }
    }

    let dump = dashboard.history_lines();
    assert_eq!(dump.len(), history.len());
    for (line, intrusion) in dump.iter().zip(&history) {
        assert_eq!(line, &intrusion.history_line());
    }
}

#[test]
fn test_same_seed_same_samples() {
    let a = Arc::new(Dashboard::new());
    let b = Arc::new(Dashboard::new());
    let ids_a = DetectionLoop::new(seeded_config(7), a.clone()).unwrap();
    let ids_b = DetectionLoop::new(seeded_config(7), b.clone()).unwrap();

    ids_a.start().unwrap();
    ids_b.start().unwrap();
    assert!(wait_for(|| ids_a.ticks() >= 20 && ids_b.ticks() >= 20));
    ids_a.stop();
    ids_b.stop();

    let xs = a.samples();
    let ys = b.samples();
    let n = xs.len().min(ys.len());
    assert_eq!(xs[..n], ys[..n]);
}

#[test]
fn test_channel_presenter_hand_off() {
    let (presenter, rx) = ChannelPresenter::new();
    let ids = DetectionLoop::new(seeded_config(99), Arc::new(presenter)).unwrap();

    ids.start().unwrap();
    assert!(wait_for(|| ids.ticks() >= 15));
    ids.stop();
    let ticks = ids.ticks() as usize;
    drop(ids);

    let dashboard = Dashboard::new();
    let messages: Vec<ShellMessage> = rx.iter().collect();
    let sample_count = messages
        .iter()
        .filter(|m| matches!(m, ShellMessage::Sample(_)))
        .count();
    assert_eq!(sample_count, ticks);

    for msg in messages {
        dashboard.apply(msg);
    }
    let log = dashboard.log_lines();
    assert_eq!(log.first().map(String::as_str), Some("INTRUDER DETECTION SYSTEM STARTED"));
    assert_eq!(log.last().map(String::as_str), Some("INTRUDER DETECTION SYSTEM STOPPED"));
    assert_eq!(
        log.iter().filter(|l| l.starts_with("Current Traffic: ")).count(),
        ticks
    );
}

#[test]
fn test_shared_loop_from_many_threads() {
    let dashboard = Arc::new(Dashboard::new());
    let ids = Arc::new(DetectionLoop::new(seeded_config(5), dashboard.clone()).unwrap());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let ids = Arc::clone(&ids);
            thread::spawn(move || ids.start().unwrap())
        })
        .collect();
    let started = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|s| *s)
        .count();

    assert_eq!(started, 1);
    assert_eq!(ids.active_workers(), 1);
    assert!(ids.stop());
    assert!(!ids.stop());
    assert_eq!(ids.active_workers(), 0);
}
