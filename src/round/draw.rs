//! Opponent draw strategies.
//!
//! Exactly one opponent value is drawn per round, during the
//! `Revealing → Resolved` transition. The draw is behind a strategy trait so
//! hosts can pin it: [`UniformDraw`] is the production fair draw, and
//! [`FixedDraw`] forces a known value for deterministic tests and demos.

use crate::rng::Pcg32;
use crate::Choice;

/// Produces the opponent's value, once per round.
pub trait OpponentDraw {
    /// Draws the next opponent value.
    fn draw(&mut self) -> Choice;
}

/// Draws uniformly at random from the two choice values.
///
/// # Examples
///
/// ```
/// use catbox_engine::{OpponentDraw, UniformDraw};
///
/// let mut a = UniformDraw::with_seed(9);
/// let mut b = UniformDraw::with_seed(9);
/// assert_eq!(a.draw(), b.draw()); // same seed, same sequence
/// ```
#[derive(Debug, Clone)]
pub struct UniformDraw {
    rng: Pcg32,
}

impl UniformDraw {
    /// Creates a draw seeded from the wall clock.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: Pcg32::from_entropy(),
        }
    }

    /// Creates a deterministic draw from a fixed seed.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
        }
    }
}

impl Default for UniformDraw {
    fn default() -> Self {
        Self::new()
    }
}

impl OpponentDraw for UniformDraw {
    fn draw(&mut self) -> Choice {
        if self.rng.coin_flip() {
            Choice::Alive
        } else {
            Choice::Dead
        }
    }
}

/// Always draws the same value.
///
/// For tests that need a forced outcome and for scripted demos.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedDraw {
    choice: Choice,
}

impl FixedDraw {
    /// Creates a draw pinned to `choice`.
    #[must_use]
    pub const fn new(choice: Choice) -> Self {
        Self { choice }
    }
}

impl OpponentDraw for FixedDraw {
    fn draw(&mut self) -> Choice {
        self.choice
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_draw_is_deterministic_per_seed() {
        let mut a = UniformDraw::with_seed(1234);
        let mut b = UniformDraw::with_seed(1234);
        for _ in 0..100 {
            assert_eq!(a.draw(), b.draw());
        }
    }

    #[test]
    fn uniform_draw_produces_both_values() {
        let mut draw = UniformDraw::with_seed(7);
        let mut saw_dead = false;
        let mut saw_alive = false;
        for _ in 0..100 {
            match draw.draw() {
                Choice::Dead => saw_dead = true,
                Choice::Alive => saw_alive = true,
            }
        }
        assert!(saw_dead && saw_alive);
    }

    #[test]
    fn uniform_draw_is_roughly_fair() {
        let mut draw = UniformDraw::with_seed(42);
        let alive = (0..10_000).filter(|_| draw.draw() == Choice::Alive).count();
        assert!(alive > 4500, "Too few alive draws: {alive}");
        assert!(alive < 5500, "Too many alive draws: {alive}");
    }

    #[test]
    fn fixed_draw_never_wavers() {
        let mut draw = FixedDraw::new(Choice::Dead);
        for _ in 0..10 {
            assert_eq!(draw.draw(), Choice::Dead);
        }
    }
}
