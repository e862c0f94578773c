//! The persistence boundary: the resolved-round record, the statistics
//! surface, and the [`GameStore`] collaborator trait.
//!
//! Writes are fire-and-forget from the round engine's perspective. The
//! controller requests exactly one record write per resolved round and logs
//! (never surfaces) a failure; reads only serve the statistics surface, which
//! lives entirely outside the round state machine.

use serde::{Deserialize, Serialize};

use crate::{Choice, Outcome, StoreError};

/// Milliseconds since the unix epoch, on both native and wasm targets.
#[must_use]
pub fn millis_since_epoch() -> u128 {
    #[cfg(not(target_arch = "wasm32"))]
    {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_millis())
    }
    #[cfg(target_arch = "wasm32")]
    {
        js_sys::Date::new_0().get_time() as u128
    }
}

/// One resolved round, as persisted by the store collaborator.
///
/// Written once per resolved round and never mutated afterward. The serde
/// field names are the only externally-visible schema the engine honors
/// exactly; changing them is a breaking change for every stored document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    /// Id of the authenticated user the round belongs to.
    pub user_id: String,
    /// The user's guess.
    pub user_choice: Choice,
    /// The drawn opposing value.
    pub opponent_choice: Choice,
    /// Whether the user's guess matched the draw.
    pub won: bool,
    /// Resolution time, milliseconds since the unix epoch.
    pub created_at: u64,
}

impl GameRecord {
    /// Builds a record for a round resolved right now.
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        user_choice: Choice,
        opponent_choice: Choice,
        outcome: Outcome,
    ) -> Self {
        GameRecord {
            user_id: user_id.into(),
            user_choice,
            opponent_choice,
            won: outcome.is_win(),
            created_at: millis_since_epoch() as u64,
        }
    }

    /// Replaces the resolution timestamp. Useful for deterministic tests and
    /// for hosts that stamp server time instead of client time.
    #[must_use]
    pub fn with_timestamp(mut self, created_at: u64) -> Self {
        self.created_at = created_at;
        self
    }

    /// Serializes the record to a JSON string.
    #[cfg(feature = "json")]
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serializes the record to a pretty-printed JSON string.
    #[cfg(feature = "json")]
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Aggregate results for one user, as served to the statistics surface.
///
/// Percentages are rounded to one decimal place. `ties` is always zero under
/// the two-value equality rule but remains part of the schema the statistics
/// collaborator serves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStatistics {
    /// Total rounds recorded.
    pub total_games: u64,
    /// Rounds won.
    pub wins: u64,
    /// Rounds lost.
    pub losses: u64,
    /// Rounds tied.
    pub ties: u64,
    /// `wins / total_games`, as a percentage rounded to one decimal.
    pub win_percentage: f64,
    /// `losses / total_games`, as a percentage rounded to one decimal.
    pub loss_percentage: f64,
    /// `ties / total_games`, as a percentage rounded to one decimal.
    pub tie_percentage: f64,
}

impl GameStatistics {
    /// Statistics for a user with no recorded rounds.
    #[must_use]
    pub const fn empty() -> Self {
        GameStatistics {
            total_games: 0,
            wins: 0,
            losses: 0,
            ties: 0,
            win_percentage: 0.0,
            loss_percentage: 0.0,
            tie_percentage: 0.0,
        }
    }

    /// Computes the statistics surface from raw counts.
    #[must_use]
    pub fn from_counts(wins: u64, losses: u64, ties: u64) -> Self {
        let total = wins + losses + ties;
        GameStatistics {
            total_games: total,
            wins,
            losses,
            ties,
            win_percentage: percentage(wins, total),
            loss_percentage: percentage(losses, total),
            tie_percentage: percentage(ties, total),
        }
    }

    /// Computes the statistics surface from a user's records.
    #[must_use]
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a GameRecord>) -> Self {
        let mut wins = 0u64;
        let mut losses = 0u64;
        for record in records {
            if record.won {
                wins += 1;
            } else {
                losses += 1;
            }
        }
        Self::from_counts(wins, losses, 0)
    }

    /// Serializes the statistics to a JSON string.
    #[cfg(feature = "json")]
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serializes the statistics to a pretty-printed JSON string.
    #[cfg(feature = "json")]
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Share of `count` in `total` as a percentage, rounded to one decimal place.
fn percentage(count: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let raw = (count as f64 / total as f64) * 100.0;
    (raw * 10.0).round() / 10.0
}

/// Consecutive wins counted from the most recent record.
///
/// Expects records ordered newest-first; stops at the first loss.
#[must_use]
pub fn current_win_streak<'a>(newest_first: impl IntoIterator<Item = &'a GameRecord>) -> u64 {
    let mut streak = 0;
    for record in newest_first {
        if record.won {
            streak += 1;
        } else {
            break;
        }
    }
    streak
}

/// The persistence collaborator.
///
/// Implementations are expected to be tolerant: the round engine calls
/// [`create_game_record`](GameStore::create_game_record) exactly once per
/// resolved round, logs any error, and moves on. An implementation backed by
/// a remote document store should perform its own retries or queueing; the
/// engine will not re-request a failed write.
pub trait GameStore {
    /// Persists one resolved round.
    fn create_game_record(&mut self, record: &GameRecord) -> Result<(), StoreError>;

    /// Serves the aggregate statistics surface for a user.
    fn user_game_statistics(&self, user_id: &str) -> Result<GameStatistics, StoreError>;
}

/// An in-memory [`GameStore`].
///
/// Backs tests and offline play. Write failures can be injected to exercise
/// the engine's persistence-failure tolerance.
///
/// # Examples
///
/// ```
/// use catbox_engine::{Choice, GameRecord, MemoryStore, GameStore, Outcome};
///
/// let mut store = MemoryStore::new();
/// let record = GameRecord::new("u1", Choice::Dead, Choice::Dead, Outcome::Win);
/// store.create_game_record(&record).unwrap();
/// let stats = store.user_game_statistics("u1").unwrap();
/// assert_eq!(stats.wins, 1);
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Vec<GameRecord>,
    failing_writes: u64,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` writes fail with [`StoreError::Unavailable`].
    pub fn fail_next_writes(&mut self, count: u64) {
        self.failing_writes = count;
    }

    /// All records, in insertion (oldest-first) order.
    #[must_use]
    pub fn records(&self) -> &[GameRecord] {
        &self.records
    }

    /// A user's most recent records, newest-first, capped at `limit`.
    #[must_use]
    pub fn recent_records(&self, user_id: &str, limit: usize) -> Vec<&GameRecord> {
        self.records
            .iter()
            .rev()
            .filter(|record| record.user_id == user_id)
            .take(limit)
            .collect()
    }

    /// A user's current win streak.
    #[must_use]
    pub fn win_streak(&self, user_id: &str) -> u64 {
        current_win_streak(
            self.records
                .iter()
                .rev()
                .filter(|record| record.user_id == user_id),
        )
    }
}

impl GameStore for MemoryStore {
    fn create_game_record(&mut self, record: &GameRecord) -> Result<(), StoreError> {
        if self.failing_writes > 0 {
            self.failing_writes -= 1;
            return Err(StoreError::Unavailable {
                reason: "injected write failure".to_owned(),
            });
        }
        self.records.push(record.clone());
        Ok(())
    }

    fn user_game_statistics(&self, user_id: &str) -> Result<GameStatistics, StoreError> {
        Ok(GameStatistics::from_records(
            self.records
                .iter()
                .filter(|record| record.user_id == user_id),
        ))
    }
}
