//! # Catbox Engine
//!
//! Catbox Engine is the round engine powering the Quantum Cat guessing game:
//! a browser-based game where the player guesses whether the cat in the box
//! is dead or alive, an opposing value is drawn at random, and a vector
//! animation plays out the reveal.
//!
//! The crate contains exactly the part of the game with real ordering
//! complexity — the coordination between the round state machine and an
//! asynchronously-loading external animation runtime — and treats everything
//! else (rendering, persistence, identity, sound) as collaborators behind
//! narrow traits:
//!
//! - [`AnimationSynchronizer`] owns the animation runtime's readiness
//!   lifecycle and exposes readiness-gated fire operations.
//! - [`RoundController`] sequences a round, binds the random opponent draw to
//!   the matching animation, and gates outcome visibility on animation
//!   completion.
//!
//! Everything is single-threaded and poll-driven: the host calls
//! [`RoundController::poll`] once per rendered frame and drains
//! [`RoundEvent`]s. There are no callbacks and no async runtime; every delay
//! in the system is a stored deadline checked during `poll`.
//!
//! ```
//! use catbox_engine::{Choice, RoundBuilder, RoundPhase, ScriptedEngine};
//!
//! let mut round = RoundBuilder::new().start(Box::new(ScriptedEngine::default()));
//! assert_eq!(round.phase(), RoundPhase::Lobby);
//!
//! round.start_round();
//! assert_eq!(round.phase(), RoundPhase::AwaitingChoice);
//!
//! round.submit_choice(Choice::Alive);
//! assert_eq!(round.phase(), RoundPhase::Revealing);
//! // ...poll() until the reveal delay and playback window elapse...
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::fmt;

use serde::{Deserialize, Serialize};

pub use error::{EngineError, StoreError};
pub use engine::backend::{AnimationBackend, ControlRef, EngineHandle};
pub use engine::readiness::Readiness;
pub use engine::scripted::{ScriptedEngine, ScriptedEngineConfig, ScriptedEngineStats};
pub use engine::synchronizer::{AnimationSynchronizer, EngineEvent};
pub use round::builder::RoundBuilder;
pub use round::config::{EngineTimings, RoundTimings};
pub use round::controller::{RoundController, RoundEvent, SoundCue};
pub use round::draw::{FixedDraw, OpponentDraw, UniformDraw};
pub use round::event_drain::EventDrain;
pub use store::{current_win_streak, GameRecord, GameStatistics, GameStore, MemoryStore};

pub mod error;
pub mod rng;
pub mod store;
pub mod engine {
    //! The animation runtime boundary: the backend trait, the readiness state
    //! machine, and the synchronizer that drives them.
    pub mod backend;
    pub mod readiness;
    pub mod scripted;
    pub mod synchronizer;
}
pub mod round {
    //! The round state machine: builder, controller, timings and the
    //! opponent draw strategy.
    pub mod builder;
    pub mod config;
    pub mod controller;
    pub mod draw;
    pub mod event_drain;
}

// #############
// # CONSTANTS #
// #############

/// Default asset path for the cat-in-a-box animation, relative to the asset
/// root the host serves from.
pub const DEFAULT_ANIMATION_SOURCE: &str = "rive/19556-36763-cat-in-a-box.riv";

/// A guess value: the state the cat might be in.
///
/// One of the two mutually exclusive values either side of a round can hold.
/// The player submits one, the opponent draw produces the other, and the
/// round is won iff they match. Serialized lowercase (`"dead"` / `"alive"`),
/// which is the wire form the persisted game record uses.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Choice {
    /// The cat is dead.
    Dead,
    /// The cat is alive.
    Alive,
}

impl Choice {
    /// Both choice values, in draw order.
    pub const ALL: [Choice; 2] = [Choice::Dead, Choice::Alive];

    /// The animation bound to this value when it comes up as the opponent
    /// draw.
    ///
    /// The binding is a fixed bijection: a dead draw plays the mouse
    /// animation, an alive draw plays the button-press animation.
    #[inline]
    #[must_use]
    pub const fn animation_kind(self) -> AnimationKind {
        match self {
            Choice::Dead => AnimationKind::Mouse,
            Choice::Alive => AnimationKind::ButtonPress,
        }
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Choice::Dead => write!(f, "dead"),
            Choice::Alive => write!(f, "alive"),
        }
    }
}

/// The result of a resolved round.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// The player's guess matched the opponent draw.
    Win,
    /// The player's guess did not match the opponent draw.
    Lose,
}

impl Outcome {
    /// Derives the outcome from the player's guess and the opponent draw:
    /// a win iff they are equal.
    #[inline]
    #[must_use]
    pub fn from_choices(user: Choice, opponent: Choice) -> Self {
        if user == opponent {
            Outcome::Win
        } else {
            Outcome::Lose
        }
    }

    /// `true` for [`Outcome::Win`].
    #[inline]
    #[must_use]
    pub const fn is_win(self) -> bool {
        matches!(self, Outcome::Win)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Win => write!(f, "win"),
            Outcome::Lose => write!(f, "lose"),
        }
    }
}

/// One of the two distinct animations the runtime can be asked to play.
///
/// Each kind is bound to exactly one [`Choice`] value (see
/// [`Choice::animation_kind`]) and to exactly one named control input on the
/// runtime's state machine.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum AnimationKind {
    /// The cat chases the mouse. Bound to a dead opponent draw.
    Mouse,
    /// The cat presses the button. Bound to an alive opponent draw.
    ButtonPress,
}

impl AnimationKind {
    /// Both animation kinds.
    pub const ALL: [AnimationKind; 2] = [AnimationKind::Mouse, AnimationKind::ButtonPress];

    /// The name of the runtime control input that triggers this animation.
    ///
    /// These names are authored into the animation asset and are discovered
    /// at runtime by the synchronizer's bounded polling.
    #[inline]
    #[must_use]
    pub const fn control_name(self) -> &'static str {
        match self {
            AnimationKind::Mouse => "mouse",
            AnimationKind::ButtonPress => "button press",
        }
    }
}

impl fmt::Display for AnimationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.control_name())
    }
}

/// The phase of the current round.
///
/// ```text
/// Lobby ──start_round──► AwaitingChoice ──submit_choice──► Revealing
///   ▲                                                          │
///   │                                  (delay, draw, fire,     │
///   │                                   playback complete)     ▼
///   └───────────────abandon_to_lobby─────────────────────── Resolved
///                                                              │
///                                        play_again ───────────┘
/// ```
///
/// `Lobby` and `Resolved` are both resting states awaiting input; there is no
/// terminal phase. `abandon_to_lobby` is additionally reachable from
/// `AwaitingChoice` and `Revealing`, cancelling the in-flight reveal without
/// ever displaying an outcome.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum RoundPhase {
    /// No round in progress.
    Lobby,
    /// A round has started and the player has not yet guessed.
    AwaitingChoice,
    /// The player has guessed; the draw, animation and reveal are in flight.
    Revealing,
    /// The round is over and the outcome is visible.
    Resolved,
}

impl RoundPhase {
    /// Whether a new round may start from this phase.
    #[inline]
    #[must_use]
    pub const fn accepts_new_round(self) -> bool {
        matches!(self, RoundPhase::Lobby | RoundPhase::Resolved)
    }
}

impl fmt::Display for RoundPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundPhase::Lobby => write!(f, "lobby"),
            RoundPhase::AwaitingChoice => write!(f, "awaiting-choice"),
            RoundPhase::Revealing => write!(f, "revealing"),
            RoundPhase::Resolved => write!(f, "resolved"),
        }
    }
}

/// A tag identifying one incarnation of the animation runtime instance.
///
/// Every reset tears the instance down and bumps the generation. Timers and
/// completion events are tagged with the generation active when they were
/// scheduled; an expiration whose tag no longer matches the current
/// generation belongs to a torn-down instance and is discarded. This is the
/// crate's only cancellation primitive — no timer carries an explicit cancel
/// handle.
///
/// # Examples
///
/// ```
/// use catbox_engine::Generation;
///
/// let first = Generation::INITIAL;
/// let second = first.next();
/// assert!(second > first);
/// assert_eq!(second.as_u64(), 1);
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(u64);

impl Generation {
    /// The generation of a synchronizer that has never been reset.
    pub const INITIAL: Generation = Generation(0);

    /// Creates a generation from a raw counter value.
    #[inline]
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Generation(value)
    }

    /// Returns the underlying counter value.
    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// The generation after this one.
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Generation(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The authenticated identity supplied by the host, if any.
///
/// Absence disables persistence but never disables gameplay: an anonymous
/// player gets a full round, and the resolved record is simply not written.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    /// Opaque user id, as issued by the host's auth provider.
    pub id: String,
}

impl Identity {
    /// Creates an identity from a user id.
    pub fn new(id: impl Into<String>) -> Self {
        Identity { id: id.into() }
    }
}

// ###################
// # UNIT TESTS      #
// ###################

#[cfg(test)]
mod tests {
    use super::*;

    // ==========================================
    // Choice / Outcome Tests
    // ==========================================

    #[test]
    fn choice_animation_binding_is_a_bijection() {
        assert_eq!(Choice::Dead.animation_kind(), AnimationKind::Mouse);
        assert_eq!(Choice::Alive.animation_kind(), AnimationKind::ButtonPress);
        assert_ne!(
            Choice::Dead.animation_kind(),
            Choice::Alive.animation_kind()
        );
    }

    #[test]
    fn outcome_is_win_iff_choices_match() {
        for user in Choice::ALL {
            for opponent in Choice::ALL {
                let outcome = Outcome::from_choices(user, opponent);
                assert_eq!(outcome == Outcome::Win, user == opponent);
                assert_eq!(outcome.is_win(), user == opponent);
            }
        }
    }

    #[test]
    fn choice_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Choice::Dead).unwrap(),
            "\"dead\"".to_owned()
        );
        assert_eq!(
            serde_json::to_string(&Choice::Alive).unwrap(),
            "\"alive\"".to_owned()
        );
        let round_tripped: Choice = serde_json::from_str("\"alive\"").unwrap();
        assert_eq!(round_tripped, Choice::Alive);
    }

    #[test]
    fn choice_display() {
        assert_eq!(Choice::Dead.to_string(), "dead");
        assert_eq!(Choice::Alive.to_string(), "alive");
    }

    // ==========================================
    // AnimationKind Tests
    // ==========================================

    #[test]
    fn animation_kind_control_names_match_the_authored_asset() {
        assert_eq!(AnimationKind::Mouse.control_name(), "mouse");
        assert_eq!(AnimationKind::ButtonPress.control_name(), "button press");
    }

    #[test]
    fn animation_kind_all_is_distinct() {
        assert_ne!(AnimationKind::ALL[0], AnimationKind::ALL[1]);
    }

    // ==========================================
    // RoundPhase Tests
    // ==========================================

    #[test]
    fn resting_phases_accept_a_new_round() {
        assert!(RoundPhase::Lobby.accepts_new_round());
        assert!(RoundPhase::Resolved.accepts_new_round());
        assert!(!RoundPhase::AwaitingChoice.accepts_new_round());
        assert!(!RoundPhase::Revealing.accepts_new_round());
    }

    #[test]
    fn round_phase_display() {
        assert_eq!(RoundPhase::Lobby.to_string(), "lobby");
        assert_eq!(RoundPhase::AwaitingChoice.to_string(), "awaiting-choice");
        assert_eq!(RoundPhase::Revealing.to_string(), "revealing");
        assert_eq!(RoundPhase::Resolved.to_string(), "resolved");
    }

    // ==========================================
    // Generation Tests
    // ==========================================

    #[test]
    fn generation_starts_at_zero_and_increments() {
        let g = Generation::INITIAL;
        assert_eq!(g.as_u64(), 0);
        assert_eq!(g.next().as_u64(), 1);
        assert_eq!(g.next().next().as_u64(), 2);
    }

    #[test]
    fn generation_ordering_follows_the_counter() {
        let older = Generation::new(3);
        let newer = older.next();
        assert!(newer > older);
        assert_ne!(older, newer);
    }

    #[test]
    fn generation_default_is_initial() {
        assert_eq!(Generation::default(), Generation::INITIAL);
    }

    // ==========================================
    // Identity Tests
    // ==========================================

    #[test]
    fn identity_holds_the_given_id() {
        let identity = Identity::new("user-123");
        assert_eq!(identity.id, "user-123");
    }
}
