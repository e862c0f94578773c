//! The round controller: sequences a round, binds the opponent draw to the
//! matching animation, and gates outcome visibility on animation completion.
//!
//! The controller exclusively owns its [`AnimationSynchronizer`] — it never
//! touches the engine instance handle, only `fire` / `reset` / the drained
//! engine events — which is what makes the reset-and-rebuild strategy safe
//! to reason about. Presentation is never called into: the controller emits
//! [`RoundEvent`]s and the host drains them with
//! [`events()`](RoundController::events).

use std::collections::VecDeque;

use tracing::{debug, trace, warn};
use web_time::Instant;

use crate::engine::readiness::Readiness;
use crate::engine::synchronizer::{AnimationSynchronizer, EngineEvent};
use crate::round::config::RoundTimings;
use crate::round::draw::OpponentDraw;
use crate::round::event_drain::EventDrain;
use crate::store::{GameRecord, GameStore};
use crate::{AnimationKind, Choice, Generation, Identity, Outcome, RoundPhase};

/// A sound the presentation layer should play, if it plays sounds at all.
///
/// Emitted only while the sound preference is enabled; the engine itself
/// never plays audio.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SoundCue {
    /// The player pressed a choice button.
    Click,
    /// The round resolved as a win.
    Win,
    /// The round resolved as a loss.
    Lose,
}

/// Notifications from the round engine to the host. Handling them is up to
/// the presentation layer; none of them require a response.
///
/// # Forward Compatibility
///
/// This enum is marked `#[non_exhaustive]` because new event types may be
/// added in future versions. Always include a wildcard arm when matching.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RoundEvent {
    /// The round phase changed.
    PhaseChanged {
        /// The phase just entered.
        phase: RoundPhase,
    },
    /// The animation runtime finished loading and accepted its controls.
    /// A UI showing a loading affordance can dismiss it.
    EngineReady {
        /// The engine incarnation that became ready.
        generation: Generation,
    },
    /// The animation runtime failed to load or never exposed a control
    /// input. The UI should show a degraded affordance; gameplay itself is
    /// unaffected and a later round start retries the load.
    EngineLoadFailed {
        /// Discovery attempts consumed before giving up.
        attempts: u32,
    },
    /// The reveal animation began playing.
    AnimationStarted {
        /// Which animation is playing.
        kind: AnimationKind,
        /// The engine incarnation it plays on.
        generation: Generation,
    },
    /// The round resolved: the outcome may now be shown.
    RoundResolved {
        /// The player's guess.
        user_choice: Choice,
        /// The drawn opposing value.
        opponent_choice: Choice,
        /// Win iff the two match.
        outcome: Outcome,
    },
    /// A sound cue for the presentation layer.
    SoundCue {
        /// The cue to play.
        cue: SoundCue,
    },
}

/// Maximum number of unpolled events to retain by default. Oldest are
/// dropped first.
pub(crate) const DEFAULT_EVENT_QUEUE_SIZE: usize = 100;

/// Sequences rounds of the guessing game.
///
/// Construct through [`RoundBuilder`](crate::RoundBuilder). Drive with
/// [`poll`](Self::poll) (typically once per rendered frame) and drain
/// [`events`](Self::events).
///
/// All user-input operations (`start_round`, `submit_choice`, `play_again`,
/// `abandon_to_lobby`) tolerate duplicate and out-of-phase invocation as
/// no-ops — a double-clicked button must never corrupt a round.
pub struct RoundController {
    // round state
    phase: RoundPhase,
    user_choice: Option<Choice>,
    /// Drawn opponent value and derived outcome, held privately until the
    /// generation-matched completion commits them to the accessors.
    pending_draw: Option<(Choice, Outcome)>,

    // collaborators
    sync: AnimationSynchronizer,
    draw: Box<dyn OpponentDraw>,
    store: Option<Box<dyn GameStore>>,
    user: Option<Identity>,
    sound_enabled: bool,

    // timers and bindings
    timings: RoundTimings,
    /// Generation of the engine incarnation created for the active round.
    /// Completion events are accepted only when their tag matches.
    round_generation: Option<Generation>,
    reveal_deadline: Option<Instant>,
    /// A fire the engine refused because it was not ready yet; retried when
    /// a readiness or capability event arrives.
    awaiting_fire: Option<AnimationKind>,

    event_queue: VecDeque<RoundEvent>,
    event_queue_size: usize,
}

impl std::fmt::Debug for RoundController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoundController")
            .field("phase", &self.phase)
            .field("user_choice", &self.user_choice)
            .field("round_generation", &self.round_generation)
            .field("awaiting_fire", &self.awaiting_fire)
            .field("sound_enabled", &self.sound_enabled)
            .field("has_store", &self.store.is_some())
            .field("has_user", &self.user.is_some())
            .field("queued_events", &self.event_queue.len())
            .finish()
    }
}

impl RoundController {
    pub(crate) fn new(
        sync: AnimationSynchronizer,
        draw: Box<dyn OpponentDraw>,
        store: Option<Box<dyn GameStore>>,
        user: Option<Identity>,
        sound_enabled: bool,
        timings: RoundTimings,
        event_queue_size: usize,
    ) -> Self {
        Self {
            phase: RoundPhase::Lobby,
            user_choice: None,
            pending_draw: None,
            sync,
            draw,
            store,
            user,
            sound_enabled,
            timings,
            round_generation: None,
            reveal_deadline: None,
            awaiting_fire: None,
            event_queue: VecDeque::new(),
            event_queue_size,
        }
    }

    // ==========================================
    // Accessors
    // ==========================================

    /// Current round phase.
    #[must_use]
    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    /// The player's guess for the active round, if submitted.
    #[must_use]
    pub fn user_choice(&self) -> Option<Choice> {
        self.user_choice
    }

    /// The drawn opposing value. `Some` only once the round is resolved —
    /// the draw is never observable while the reveal animation plays.
    #[must_use]
    pub fn opponent_choice(&self) -> Option<Choice> {
        match (self.phase, self.pending_draw) {
            (RoundPhase::Resolved, Some((opponent, _))) => Some(opponent),
            _ => None,
        }
    }

    /// The round outcome. `Some` exactly when [`opponent_choice`] is.
    ///
    /// [`opponent_choice`]: Self::opponent_choice
    #[must_use]
    pub fn outcome(&self) -> Option<Outcome> {
        match (self.phase, self.pending_draw) {
            (RoundPhase::Resolved, Some((_, outcome))) => Some(outcome),
            _ => None,
        }
    }

    /// Readiness of the owned animation runtime.
    #[must_use]
    pub fn animation_readiness(&self) -> Readiness {
        self.sync.readiness()
    }

    /// Read-only view of the owned synchronizer.
    #[must_use]
    pub fn synchronizer(&self) -> &AnimationSynchronizer {
        &self.sync
    }

    /// The authenticated identity persistence writes are attributed to.
    #[must_use]
    pub fn current_user(&self) -> Option<&Identity> {
        self.user.as_ref()
    }

    /// The persistence collaborator, for the statistics surface.
    #[must_use]
    pub fn store(&self) -> Option<&dyn GameStore> {
        self.store.as_deref()
    }

    /// Whether sound cues are currently emitted.
    #[must_use]
    pub fn sound_enabled(&self) -> bool {
        self.sound_enabled
    }

    /// Sets the sound preference.
    pub fn set_sound_enabled(&mut self, enabled: bool) {
        self.sound_enabled = enabled;
    }

    /// Flips the sound preference and returns the new state.
    pub fn toggle_sound(&mut self) -> bool {
        self.sound_enabled = !self.sound_enabled;
        self.sound_enabled
    }

    // ==========================================
    // Round operations
    // ==========================================

    /// Starts a fresh round. Valid from [`RoundPhase::Lobby`] and
    /// [`RoundPhase::Resolved`]; a logged no-op anywhere else.
    ///
    /// Every round begins with a freshly mounted engine instance: the
    /// synchronizer is reset (bumping the generation) and re-initialized once
    /// the settle delay elapses, so leftover visual state from the previous
    /// round can never leak into the next. Returns whether the round started.
    pub fn start_round(&mut self) -> bool {
        self.start_round_at(Instant::now())
    }

    /// Explicit-instant variant of [`start_round`](Self::start_round), for
    /// hosts that drive their own clock and for deterministic tests.
    pub fn start_round_at(&mut self, now: Instant) -> bool {
        if !self.phase.accepts_new_round() {
            trace!(phase = %self.phase, "Ignoring start_round outside a resting phase");
            return false;
        }
        self.clear_round_state();
        self.phase = RoundPhase::AwaitingChoice;
        let generation = self.sync.reset_at(now);
        self.round_generation = Some(generation);
        debug!(%generation, "Round started");
        self.push_event(RoundEvent::PhaseChanged {
            phase: RoundPhase::AwaitingChoice,
        });
        true
    }

    /// Records the player's guess and begins the reveal. Valid in
    /// [`RoundPhase::AwaitingChoice`] with no prior guess; duplicate UI
    /// events (double-clicks, re-entrant handlers) are logged no-ops.
    ///
    /// After the reveal delay elapses (observed during [`poll`](Self::poll)),
    /// the opponent value is drawn, the outcome derived, and the bound
    /// animation fired. Returns whether the guess was accepted.
    pub fn submit_choice(&mut self, choice: Choice) -> bool {
        self.submit_choice_at(choice, Instant::now())
    }

    /// Explicit-instant variant of [`submit_choice`](Self::submit_choice).
    pub fn submit_choice_at(&mut self, choice: Choice, now: Instant) -> bool {
        if self.phase != RoundPhase::AwaitingChoice || self.user_choice.is_some() {
            trace!(phase = %self.phase, %choice, "Ignoring submit_choice");
            return false;
        }
        debug!(%choice, "Choice submitted");
        self.user_choice = Some(choice);
        self.phase = RoundPhase::Revealing;
        self.reveal_deadline = Some(now + self.timings.reveal_delay);
        self.push_event(RoundEvent::PhaseChanged {
            phase: RoundPhase::Revealing,
        });
        self.push_sound(SoundCue::Click);
        true
    }

    /// Starts the next round from a resolved one. Valid only from
    /// [`RoundPhase::Resolved`]; equivalent to
    /// [`start_round`](Self::start_round), including the fresh generation.
    pub fn play_again(&mut self) -> bool {
        self.play_again_at(Instant::now())
    }

    /// Explicit-instant variant of [`play_again`](Self::play_again).
    pub fn play_again_at(&mut self, now: Instant) -> bool {
        if self.phase != RoundPhase::Resolved {
            trace!(phase = %self.phase, "Ignoring play_again outside Resolved");
            return false;
        }
        self.start_round_at(now)
    }

    /// Abandons the current round and returns to the lobby. Allowed from any
    /// phase; cancels an in-flight reveal or animation without ever showing
    /// an outcome.
    pub fn abandon_to_lobby(&mut self) {
        self.abandon_to_lobby_at(Instant::now());
    }

    /// Explicit-instant variant of
    /// [`abandon_to_lobby`](Self::abandon_to_lobby).
    pub fn abandon_to_lobby_at(&mut self, now: Instant) {
        debug!(phase = %self.phase, "Abandoning to lobby");
        self.clear_round_state();
        self.phase = RoundPhase::Lobby;
        self.round_generation = None;
        let _ = self.sync.reset_at(now);
        self.push_event(RoundEvent::PhaseChanged {
            phase: RoundPhase::Lobby,
        });
    }

    /// Advances every deadline and pumps the owned synchronizer. Call
    /// periodically — typically once per rendered frame.
    pub fn poll(&mut self) {
        self.poll_at(Instant::now());
    }

    /// Explicit-instant variant of [`poll`](Self::poll).
    pub fn poll_at(&mut self, now: Instant) {
        // Reveal delay: exactly one draw per round.
        if self.phase == RoundPhase::Revealing && self.pending_draw.is_none() {
            if let Some(deadline) = self.reveal_deadline {
                if now >= deadline {
                    self.reveal_deadline = None;
                    self.draw_opponent(now);
                }
            }
        }

        // Pump the synchronizer and translate its events.
        let engine_events: Vec<EngineEvent> = self.sync.poll_at(now).collect();
        for event in engine_events {
            self.handle_engine_event(event, now);
        }

        self.trim_event_queue();
    }

    /// Drains the events raised since the last call.
    pub fn events(&mut self) -> EventDrain<'_, RoundEvent> {
        EventDrain::from_drain(self.event_queue.drain(..))
    }

    // ==========================================
    // Internals
    // ==========================================

    fn clear_round_state(&mut self) {
        self.user_choice = None;
        self.pending_draw = None;
        self.reveal_deadline = None;
        self.awaiting_fire = None;
    }

    /// Draws the opponent value, derives the outcome, and requests the bound
    /// animation.
    fn draw_opponent(&mut self, now: Instant) {
        let Some(user) = self.user_choice else {
            warn!("Reveal elapsed without a submitted choice");
            return;
        };
        let opponent = self.draw.draw();
        let outcome = Outcome::from_choices(user, opponent);
        debug!(%opponent, %outcome, "Opponent drawn");
        self.pending_draw = Some((opponent, outcome));
        self.request_fire(opponent.animation_kind(), now);
    }

    /// Fires, or remembers the kind for a retry once the engine reports
    /// ready. The round must not silently hang on a slow-loading engine.
    fn request_fire(&mut self, kind: AnimationKind, now: Instant) {
        if self.sync.fire_at(kind, now) {
            self.awaiting_fire = None;
            self.push_event(RoundEvent::AnimationStarted {
                kind,
                generation: self.sync.generation(),
            });
        } else {
            trace!(%kind, readiness = %self.sync.readiness(), "Fire deferred until ready");
            self.awaiting_fire = Some(kind);
        }
    }

    fn handle_engine_event(&mut self, event: EngineEvent, now: Instant) {
        match event {
            EngineEvent::SettleElapsed { generation } => {
                // The settle that belongs to the active round frees the slot
                // for its fresh instance.
                if Some(generation) == self.round_generation && self.round_active() {
                    self.sync.initialize_at(now);
                }
            }
            EngineEvent::Ready { generation } => {
                if Some(generation) != self.round_generation {
                    trace!(%generation, "Discarding ready event from a stale generation");
                    return;
                }
                self.push_event(RoundEvent::EngineReady { generation });
                self.retry_deferred_fire(now);
            }
            EngineEvent::ControlDiscovered { generation, .. } => {
                if Some(generation) == self.round_generation {
                    self.retry_deferred_fire(now);
                }
            }
            EngineEvent::LoadFailed {
                attempts,
                generation,
            } => {
                if Some(generation) == self.round_generation {
                    self.push_event(RoundEvent::EngineLoadFailed { attempts });
                }
            }
            EngineEvent::PlaybackFinished { kind, generation } => {
                self.handle_playback_finished(kind, generation);
            }
        }
    }

    fn retry_deferred_fire(&mut self, now: Instant) {
        if let Some(kind) = self.awaiting_fire {
            if self.sync.capability(kind) {
                self.request_fire(kind, now);
            }
        }
    }

    /// The completion event that resolves a round — accepted only when its
    /// generation matches the engine incarnation created for this round.
    fn handle_playback_finished(&mut self, kind: AnimationKind, generation: Generation) {
        if Some(generation) != self.round_generation {
            trace!(
                %kind,
                %generation,
                "Discarding completion from a torn-down engine instance"
            );
            return;
        }
        if self.phase != RoundPhase::Revealing {
            trace!(phase = %self.phase, "Discarding completion outside Revealing");
            return;
        }
        let (Some(user), Some((opponent, outcome))) = (self.user_choice, self.pending_draw) else {
            trace!("Discarding completion before the draw");
            return;
        };

        self.phase = RoundPhase::Resolved;
        debug!(%user, %opponent, %outcome, "Round resolved");
        self.push_event(RoundEvent::PhaseChanged {
            phase: RoundPhase::Resolved,
        });
        self.push_event(RoundEvent::RoundResolved {
            user_choice: user,
            opponent_choice: opponent,
            outcome,
        });
        self.push_sound(match outcome {
            Outcome::Win => SoundCue::Win,
            Outcome::Lose => SoundCue::Lose,
        });
        self.persist_record(user, opponent, outcome);
    }

    /// One fire-and-forget write per resolved round. A failure is logged and
    /// otherwise ignored; the displayed outcome is never rolled back because
    /// persistence misbehaved.
    fn persist_record(&mut self, user_choice: Choice, opponent: Choice, outcome: Outcome) {
        let (Some(store), Some(user)) = (self.store.as_mut(), self.user.as_ref()) else {
            debug!("No store or identity; round not persisted");
            return;
        };
        let record = GameRecord::new(user.id.clone(), user_choice, opponent, outcome);
        match store.create_game_record(&record) {
            Ok(()) => debug!(user_id = %record.user_id, "Game record persisted"),
            Err(error) => warn!(%error, "Failed to persist game record"),
        }
    }

    fn round_active(&self) -> bool {
        matches!(
            self.phase,
            RoundPhase::AwaitingChoice | RoundPhase::Revealing
        )
    }

    fn push_event(&mut self, event: RoundEvent) {
        self.event_queue.push_back(event);
    }

    fn push_sound(&mut self, cue: SoundCue) {
        if self.sound_enabled {
            self.event_queue.push_back(RoundEvent::SoundCue { cue });
        }
    }

    fn trim_event_queue(&mut self) {
        while self.event_queue.len() > self.event_queue_size {
            self.event_queue.pop_front();
        }
    }
}
