//! Builder for assembling a [`RoundController`] from explicit context.
//!
//! Identity, persistence, sound preference, timings and the draw strategy
//! are all injected here instead of being reached for ambiently, so a
//! controller is fully determined by what its builder was given — which is
//! also what makes the round engine testable without a mounted UI.

use crate::engine::backend::AnimationBackend;
use crate::engine::synchronizer::AnimationSynchronizer;
use crate::round::config::{EngineTimings, RoundTimings};
use crate::round::controller::{RoundController, DEFAULT_EVENT_QUEUE_SIZE};
use crate::round::draw::{OpponentDraw, UniformDraw};
use crate::store::GameStore;
use crate::{Identity, DEFAULT_ANIMATION_SOURCE};

/// Sound cues default to enabled, matching the shipped game configuration.
const DEFAULT_SOUND_ENABLED: bool = true;

/// Builds a [`RoundController`].
///
/// After setting the desired context, consume the builder with
/// [`start`](Self::start), passing the animation backend the controller's
/// synchronizer will own.
///
/// # Examples
///
/// ```
/// use catbox_engine::{Identity, MemoryStore, RoundBuilder, ScriptedEngine};
///
/// let round = RoundBuilder::new()
///     .with_user(Identity::new("user-1"))
///     .with_store(Box::new(MemoryStore::new()))
///     .with_seed(42)
///     .start(Box::new(ScriptedEngine::default()));
/// assert!(round.current_user().is_some());
/// ```
#[must_use = "RoundBuilder must be consumed by calling start()"]
pub struct RoundBuilder {
    source: String,
    store: Option<Box<dyn GameStore>>,
    user: Option<Identity>,
    sound_enabled: bool,
    engine_timings: EngineTimings,
    round_timings: RoundTimings,
    draw: Option<Box<dyn OpponentDraw>>,
    event_queue_size: usize,
}

impl std::fmt::Debug for RoundBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoundBuilder")
            .field("source", &self.source)
            .field("has_store", &self.store.is_some())
            .field("user", &self.user)
            .field("sound_enabled", &self.sound_enabled)
            .field("engine_timings", &self.engine_timings)
            .field("round_timings", &self.round_timings)
            .field("has_custom_draw", &self.draw.is_some())
            .field("event_queue_size", &self.event_queue_size)
            .finish()
    }
}

impl Default for RoundBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RoundBuilder {
    /// Constructs a new builder with all values set to their defaults.
    pub fn new() -> Self {
        Self {
            source: DEFAULT_ANIMATION_SOURCE.to_owned(),
            store: None,
            user: None,
            sound_enabled: DEFAULT_SOUND_ENABLED,
            engine_timings: EngineTimings::default(),
            round_timings: RoundTimings::default(),
            draw: None,
            event_queue_size: DEFAULT_EVENT_QUEUE_SIZE,
        }
    }

    /// Sets the animation asset source the engine loads each round.
    pub fn with_animation_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Sets the persistence collaborator. Without one, resolved rounds are
    /// simply not recorded.
    pub fn with_store(mut self, store: Box<dyn GameStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Sets the authenticated identity record writes are attributed to.
    /// Without one, persistence is disabled but gameplay is not.
    pub fn with_user(mut self, user: Identity) -> Self {
        self.user = Some(user);
        self
    }

    /// Sets the identity from the host's auth state, which may be absent.
    pub fn with_current_user(mut self, user: Option<Identity>) -> Self {
        self.user = user;
        self
    }

    /// Sets the initial sound preference. Default: enabled.
    pub fn with_sound_enabled(mut self, enabled: bool) -> Self {
        self.sound_enabled = enabled;
        self
    }

    /// Overrides the engine timing configuration.
    pub fn with_engine_timings(mut self, timings: EngineTimings) -> Self {
        self.engine_timings = timings;
        self
    }

    /// Overrides the round timing configuration.
    pub fn with_round_timings(mut self, timings: RoundTimings) -> Self {
        self.round_timings = timings;
        self
    }

    /// Replaces the opponent draw strategy. Default: a fair draw seeded from
    /// the wall clock.
    pub fn with_draw(mut self, draw: Box<dyn OpponentDraw>) -> Self {
        self.draw = Some(draw);
        self
    }

    /// Uses a fair draw with a fixed seed, for reproducible rounds.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.draw = Some(Box::new(UniformDraw::with_seed(seed)));
        self
    }

    /// Caps the number of unpolled events retained before the oldest are
    /// dropped. Default: 100.
    pub fn with_event_queue_size(mut self, size: usize) -> Self {
        self.event_queue_size = size;
        self
    }

    /// Consumes the builder and starts a controller over the given backend.
    ///
    /// The controller begins in [`RoundPhase::Lobby`] with the engine
    /// unloaded; the first `start_round()` mounts the first instance.
    ///
    /// [`RoundPhase::Lobby`]: crate::RoundPhase::Lobby
    #[must_use]
    pub fn start(self, backend: Box<dyn AnimationBackend>) -> RoundController {
        let sync = AnimationSynchronizer::new(backend, self.source, self.engine_timings);
        let draw = self
            .draw
            .unwrap_or_else(|| Box::new(UniformDraw::new()));
        RoundController::new(
            sync,
            draw,
            self.store,
            self.user,
            self.sound_enabled,
            self.round_timings,
            self.event_queue_size,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Readiness, RoundPhase, ScriptedEngine};

    #[test]
    fn defaults_produce_a_lobby_controller_with_an_unloaded_engine() {
        let round = RoundBuilder::new().start(Box::new(ScriptedEngine::default()));
        assert_eq!(round.phase(), RoundPhase::Lobby);
        assert_eq!(round.animation_readiness(), Readiness::Unloaded);
        assert!(round.current_user().is_none());
        assert!(round.store().is_none());
        assert!(round.sound_enabled());
    }

    #[test]
    fn context_is_threaded_through() {
        let round = RoundBuilder::new()
            .with_user(Identity::new("abc"))
            .with_sound_enabled(false)
            .with_animation_source("assets/custom.riv")
            .start(Box::new(ScriptedEngine::default()));
        assert_eq!(round.current_user().map(|user| user.id.as_str()), Some("abc"));
        assert!(!round.sound_enabled());
        assert_eq!(round.synchronizer().source(), "assets/custom.riv");
    }

    #[test]
    fn current_user_accepts_absent_identity() {
        let round = RoundBuilder::new()
            .with_current_user(None)
            .start(Box::new(ScriptedEngine::default()));
        assert!(round.current_user().is_none());
    }

    #[test]
    fn debug_reports_collaborator_presence_not_contents() {
        let builder = RoundBuilder::new().with_user(Identity::new("abc"));
        let debug = format!("{builder:?}");
        assert!(debug.contains("has_store: false"));
        assert!(debug.contains("abc"));
    }
}
