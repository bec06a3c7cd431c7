// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file → landmark file → driver → in-memory broker.

use std::io::Write;
use std::sync::atomic::AtomicBool;
use std::time::{Duration, Instant};

use handsig::config::{load_config, validate_config};
use handsig::gesture::{Digit, LandmarkPoint, LANDMARK_COUNT};
use handsig::pipeline::{connect_with_retry, settings, DetectedHand, JsonLinesSource, NullSink};
use handsig::prelude::*;

/// Right-oriented hand with the given digits extended
fn hand(open: [bool; 5]) -> DetectedHand {
    let mut points = vec![LandmarkPoint::new(0.5, 0.5); LANDMARK_COUNT];
    points[0] = LandmarkPoint::new(0.4, 0.9);
    points[Digit::Thumb.tip().index()] = LandmarkPoint::new(if open[0] { 0.7 } else { 0.3 }, 0.5);
    for (digit, extended) in [Digit::Index, Digit::Middle, Digit::Ring, Digit::Pinky]
        .into_iter()
        .zip(&open[1..])
    {
        let y = if *extended { 0.2 } else { 0.8 };
        points[digit.tip().index()] = LandmarkPoint::new(0.5, y);
    }
    DetectedHand::new(points)
}

fn write_config(dir: &std::path::Path, body: &str) -> std::path::PathBuf {
    let path = dir.join("handsig_configuration.toml");
    std::fs::write(&path, body).unwrap();
    path
}

#[test]
fn configured_pipeline_publishes_every_tick_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(
        dir.path(),
        r#"
[broker]
topic = "test/gestures"
client_id = "e2e"
qos = 1

[pipeline]
tick_interval_ms = 1
capture_timeout_ms = 2000
"#,
    );
    let config = load_config(Some(config_path.as_path()), None).unwrap();
    validate_config(&config).unwrap();

    let frames_path = dir.path().join("frames.jsonl");
    let mut frames = std::fs::File::create(&frames_path).unwrap();
    for frame in [
        serde_json::json!({ "hands": [hand([false, true, false, true, true])] }),
        serde_json::json!({ "hands": [] }),
        serde_json::json!({ "hands": [hand([true; 5])] }),
    ] {
        writeln!(frames, "{}", frame).unwrap();
    }
    drop(frames);

    let broker = MemoryBroker::new();
    let mut session = PublishSession::new(settings::session_config(&config).unwrap(), broker.transport());
    connect_with_retry(&mut session, &settings::connect_options(&config), 0, 1).unwrap();

    let source = JsonLinesSource::open(
        &frames_path,
        settings::detection_thresholds(&config),
        settings::capture_timeout(&config),
    )
    .unwrap();
    let mut driver = PipelineDriver::new(source, session, settings::tick_interval(&config))
        .with_sink(NullSink)
        .with_smoothing(settings::smoothing_filter(&config).unwrap());
    driver.run(&AtomicBool::new(true)).unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    while broker.payloads().len() < 3 && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(5));
    }
    let (stats, session_stats) = driver.shutdown();

    assert_eq!(broker.payloads(), vec!["01011", "00000", "11111"]);
    for message in broker.messages() {
        assert_eq!(message.topic, "test/gestures");
        assert_eq!(message.client_id, "e2e");
        assert_eq!(message.level, DeliveryLevel::AtLeastOnce);
    }
    assert_eq!(stats.ticks, 3);
    assert_eq!(stats.hands_seen, 2);
    assert_eq!(session_stats.acknowledged, 3);
    assert_eq!(session_stats.dropped, 0);
}

#[test]
fn refused_broker_fails_startup_without_retry() {
    let broker = MemoryBroker::new();
    broker.set_refusal(Some("not authorized".to_string()));
    let mut session = PublishSession::new(SessionConfig::new("e2e", "gestures"), broker.transport());

    let err = connect_with_retry(
        &mut session,
        &ConnectOptions::new(BrokerEndpoint::new("memory", 1883)),
        5,
        1,
    )
    .unwrap_err();
    assert!(!err.is_retryable());
    assert_eq!(session.state(), ConnectionState::Disconnected);
    assert_eq!(broker.connection_count(), 0);
}
