mod common;

use catbox_engine::{
    AnimationKind, AnimationSynchronizer, EngineEvent, EngineTimings, Generation, Readiness,
    ScriptedEngine, ScriptedEngineConfig,
};
use common::init_tracing;
use web_time::{Duration, Instant};

fn sync_with(config: ScriptedEngineConfig) -> AnimationSynchronizer {
    AnimationSynchronizer::new(
        Box::new(ScriptedEngine::new(config)),
        "rive/19556-36763-cat-in-a-box.riv",
        EngineTimings::default(),
    )
}

fn drain(sync: &mut AnimationSynchronizer, now: Instant) -> Vec<EngineEvent> {
    sync.poll_at(now).collect()
}

#[test]
fn fire_is_refused_in_every_non_ready_state_for_every_kind() {
    init_tracing();
    let mut sync = sync_with(ScriptedEngineConfig::delayed(2));
    let now = Instant::now();

    // Unloaded.
    for kind in AnimationKind::ALL {
        assert!(!sync.fire_at(kind, now));
    }

    // Loading.
    sync.initialize_at(now);
    assert_eq!(sync.readiness(), Readiness::Loading);
    for kind in AnimationKind::ALL {
        assert!(!sync.fire_at(kind, now));
    }

    // Resetting.
    sync.reset_at(now);
    assert_eq!(sync.readiness(), Readiness::Resetting);
    for kind in AnimationKind::ALL {
        assert!(!sync.fire_at(kind, now));
    }

    // No playback window was ever opened by a refused fire.
    assert_eq!(sync.pending_playback_count(), 0);
}

#[test]
fn reset_from_ready_reaches_unloaded_only_after_the_settle_delay() {
    init_tracing();
    let mut sync = sync_with(ScriptedEngineConfig::immediate());
    let start = Instant::now();
    sync.initialize_at(start);
    assert_eq!(sync.readiness(), Readiness::Ready);

    sync.reset_at(start);
    // Capabilities drop immediately.
    assert!(!sync.capability(AnimationKind::Mouse));
    assert!(!sync.capability(AnimationKind::ButtonPress));
    assert_eq!(sync.readiness(), Readiness::Resetting);

    // Never Unloaded before the settle delay.
    for ms in [0u64, 100, 250, 499] {
        let _ = drain(&mut sync, start + Duration::from_millis(ms));
        assert_eq!(sync.readiness(), Readiness::Resetting);
    }
    let events = drain(&mut sync, start + Duration::from_millis(500));
    assert_eq!(sync.readiness(), Readiness::Unloaded);
    assert!(events
        .iter()
        .any(|event| matches!(event, EngineEvent::SettleElapsed { .. })));
}

#[test]
fn discovery_ceiling_signals_load_failure_once() {
    init_tracing();
    let mut sync = sync_with(ScriptedEngineConfig::never_ready());
    let start = Instant::now();
    sync.initialize_at(start);

    let mut failures = 0;
    for step in 1..120u64 {
        let events = drain(&mut sync, start + Duration::from_millis(150 * step));
        failures += events
            .iter()
            .filter(|event| matches!(event, EngineEvent::LoadFailed { .. }))
            .count();
    }
    assert_eq!(failures, 1);
    assert!(sync.load_failed());
    assert!(!sync.readiness().accepts_fire());
}

#[test]
fn generations_tag_completions_with_fire_time_not_poll_time() {
    init_tracing();
    let mut sync = sync_with(ScriptedEngineConfig::immediate());
    let start = Instant::now();
    sync.initialize_at(start);
    let _ = drain(&mut sync, start);

    assert!(sync.fire_at(AnimationKind::Mouse, start));
    let fired_under = sync.generation();

    // Two resets later, the window's expiration still carries the original
    // generation.
    sync.reset_at(start + Duration::from_millis(100));
    let _ = drain(&mut sync, start + Duration::from_millis(700));
    sync.initialize_at(start + Duration::from_millis(800));
    sync.reset_at(start + Duration::from_millis(900));

    let current = sync.generation();
    assert!(current > fired_under);

    let events = drain(&mut sync, start + Duration::from_millis(9000));
    let completion = events
        .iter()
        .find_map(|event| match event {
            EngineEvent::PlaybackFinished { generation, .. } => Some(*generation),
            _ => None,
        })
        .expect("the stale window still expires");
    assert_eq!(completion, fired_under);
    assert_ne!(completion, current);
}

#[test]
fn two_fires_open_two_windows() {
    init_tracing();
    let mut sync = sync_with(ScriptedEngineConfig::immediate());
    let start = Instant::now();
    sync.initialize_at(start);
    let _ = drain(&mut sync, start);

    assert!(sync.fire_at(AnimationKind::Mouse, start));
    assert!(sync.fire_at(
        AnimationKind::ButtonPress,
        start + Duration::from_millis(1000)
    ));
    assert_eq!(sync.pending_playback_count(), 2);

    let first = drain(&mut sync, start + Duration::from_millis(9000));
    assert_eq!(
        first,
        vec![EngineEvent::PlaybackFinished {
            kind: AnimationKind::Mouse,
            generation: Generation::INITIAL,
        }]
    );
    let second = drain(&mut sync, start + Duration::from_millis(10_000));
    assert_eq!(
        second,
        vec![EngineEvent::PlaybackFinished {
            kind: AnimationKind::ButtonPress,
            generation: Generation::INITIAL,
        }]
    );
}

#[test]
fn synthesized_pulse_rises_and_falls_on_schedule() {
    init_tracing();
    // Observe the level through a scripted engine we keep probing via the
    // synchronizer's own backend: the level-only script forces synthesis.
    let mut sync = AnimationSynchronizer::new(
        Box::new(ScriptedEngine::new(ScriptedEngineConfig::level_only())),
        "rive/cat.riv",
        EngineTimings::default(),
    );
    let start = Instant::now();
    sync.initialize_at(start);
    assert!(sync.fire_at(AnimationKind::ButtonPress, start));

    // The clear lands at +100ms; polling before then must not clear early,
    // and firing again after the clear must succeed (a fresh rising edge).
    let _ = drain(&mut sync, start + Duration::from_millis(50));
    let _ = drain(&mut sync, start + Duration::from_millis(100));
    assert!(sync.fire_at(
        AnimationKind::ButtonPress,
        start + Duration::from_millis(150)
    ));
}

#[test]
fn capability_reports_per_kind_discovery() {
    init_tracing();
    let mut sync = sync_with(ScriptedEngineConfig {
        missing_controls: vec!["mouse".to_owned()],
        ..ScriptedEngineConfig::default()
    });
    let now = Instant::now();
    sync.initialize_at(now);
    assert_eq!(sync.readiness(), Readiness::Ready);
    assert!(!sync.capability(AnimationKind::Mouse));
    assert!(sync.capability(AnimationKind::ButtonPress));
    assert!(!sync.fire_at(AnimationKind::Mouse, now));
    assert!(sync.fire_at(AnimationKind::ButtonPress, now));
}
