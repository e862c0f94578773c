//! Common test infrastructure shared across integration tests.
//!
//! # Usage
//!
//! From any integration test file:
//! ```ignore
//! mod common;
//! use common::{drive, init_tracing, resolved_controller};
//! ```

use catbox_engine::{
    Choice, FixedDraw, Identity, MemoryStore, RoundBuilder, RoundController, RoundEvent,
    ScriptedEngine, ScriptedEngineConfig,
};
use web_time::{Duration, Instant};

/// Installs a tracing subscriber for the test binary, once. Harmless if
/// another test got there first.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_test_writer()
        .try_init();
}

/// A controller with a forced opponent draw, an authenticated user, and an
/// in-memory store — the standard fixture for round tests.
#[allow(dead_code)]
pub fn forced_controller(forced: Choice) -> RoundController {
    RoundBuilder::new()
        .with_draw(Box::new(FixedDraw::new(forced)))
        .with_user(Identity::new("player-1"))
        .with_store(Box::new(MemoryStore::new()))
        .start(Box::new(ScriptedEngine::new(
            ScriptedEngineConfig::immediate(),
        )))
}

/// Polls the controller at `now` and returns the events that surfaced.
#[allow(dead_code)]
pub fn drive(round: &mut RoundController, now: Instant) -> Vec<RoundEvent> {
    round.poll_at(now);
    round.events().collect()
}

/// Drives a started-and-guessed round through settle, reveal, and playback
/// with the default timings; returns everything emitted along the way and
/// the instant the round had resolved by.
#[allow(dead_code)]
pub fn drive_to_resolution(
    round: &mut RoundController,
    start: Instant,
) -> (Vec<RoundEvent>, Instant) {
    let mut events = Vec::new();
    // Default timings: settle 500ms, reveal 3000ms, playback 9000ms.
    for ms in [500u64, 3000, 12_000] {
        events.extend(drive(round, start + Duration::from_millis(ms)));
    }
    (events, start + Duration::from_millis(12_000))
}
