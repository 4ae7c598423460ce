//! Whose turn it is, expressed as a join-order index into the registry.

use rand::Rng;
use serde::Deserialize;

/// How moves are gated during a level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnMode {
    /// Only the player holding the turn may move; the turn rotates after each correct color.
    #[default]
    Rotation,
    /// Any player may answer; the turn is never rotated.
    Open,
}

/// Rotating turn pointer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnScheduler {
    index: Option<usize>,
}

impl TurnScheduler {
    /// Scheduler with nobody holding the turn.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pick a uniformly random starting player.
    ///
    /// Called at the start of every round and every level; the previous
    /// index is not carried over.
    pub fn assign_random_start<R: Rng + ?Sized>(
        &mut self,
        player_count: usize,
        rng: &mut R,
    ) -> Option<usize> {
        self.index = (player_count > 0).then(|| rng.random_range(0..player_count));
        self.index
    }

    /// Hand the turn to the next player, wrapping around.
    pub fn advance(&mut self, player_count: usize) -> Option<usize> {
        self.index = match (self.index, player_count) {
            (_, 0) => None,
            (Some(index), count) => Some((index + 1) % count),
            (None, _) => Some(0),
        };
        self.index
    }

    /// Re-derive the pointer after the player at `departed` left.
    ///
    /// If the departing player held the turn, it passes to whoever now sits
    /// at the same position (wrapping to the first player).
    pub fn on_departure(&mut self, departed: usize, remaining: usize) -> Option<usize> {
        self.index = match self.index {
            _ if remaining == 0 => None,
            None => None,
            Some(index) if departed < index => Some(index - 1),
            Some(index) => Some(index % remaining),
        };
        self.index
    }

    /// Nobody holds the turn.
    pub fn clear(&mut self) {
        self.index = None;
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    #[test]
    fn random_start_is_in_range() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut scheduler = TurnScheduler::new();
        for count in 1..=4 {
            for _ in 0..20 {
                let index = scheduler.assign_random_start(count, &mut rng).unwrap();
                assert!(index < count);
            }
        }
        assert_eq!(scheduler.assign_random_start(0, &mut rng), None);
    }

    #[test]
    fn advance_wraps() {
        let mut scheduler = TurnScheduler { index: Some(2) };
        assert_eq!(scheduler.advance(3), Some(0));
        assert_eq!(scheduler.advance(3), Some(1));
    }

    #[test]
    fn departure_before_current_shifts_index() {
        let mut scheduler = TurnScheduler { index: Some(2) };
        assert_eq!(scheduler.on_departure(0, 3), Some(1));
    }

    #[test]
    fn departure_after_current_keeps_index() {
        let mut scheduler = TurnScheduler { index: Some(1) };
        assert_eq!(scheduler.on_departure(3, 3), Some(1));
    }

    #[test]
    fn departure_of_current_passes_turn_on() {
        let mut scheduler = TurnScheduler { index: Some(1) };
        assert_eq!(scheduler.on_departure(1, 3), Some(1));

        let mut last = TurnScheduler { index: Some(3) };
        assert_eq!(last.on_departure(3, 3), Some(0));
    }

    #[test]
    fn last_departure_clears_turn() {
        let mut scheduler = TurnScheduler { index: Some(0) };
        assert_eq!(scheduler.on_departure(0, 0), None);
    }
}
