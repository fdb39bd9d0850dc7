//! In-memory score counters
//!
//! Tracks kills and round wins per player. Persistence belongs to the
//! external scoring collaborator; this only counts.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::sim::state::PlayerId;

/// Counters for a single player
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerScore {
    pub kills: u32,
    pub wins: u32,
}

/// Per-player counters, ordered by player id
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scoreboard {
    pub entries: BTreeMap<PlayerId, PlayerScore>,
}

impl Scoreboard {
    /// Create empty scoreboard
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Credit `killer` with a kill
    pub fn record_kill(&mut self, killer: PlayerId) {
        self.entries.entry(killer).or_default().kills += 1;
    }

    /// Credit `winner` with a round win
    pub fn record_win(&mut self, winner: PlayerId) {
        self.entries.entry(winner).or_default().wins += 1;
    }

    pub fn get(&self, player: PlayerId) -> PlayerScore {
        self.entries.get(&player).copied().unwrap_or_default()
    }

    /// Players sorted by wins, then kills (descending), then id
    pub fn standings(&self) -> Vec<(PlayerId, PlayerScore)> {
        let mut rows: Vec<_> = self.entries.iter().map(|(p, s)| (*p, *s)).collect();
        rows.sort_by(|a, b| {
            b.1.wins
                .cmp(&a.1.wins)
                .then(b.1.kills.cmp(&a.1.kills))
                .then(a.0.cmp(&b.0))
        });
        rows
    }

    /// Check if nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_accumulate() {
        let mut board = Scoreboard::new();
        assert!(board.is_empty());
        board.record_kill(PlayerId(2));
        board.record_kill(PlayerId(2));
        board.record_win(PlayerId(2));
        assert_eq!(board.get(PlayerId(2)), PlayerScore { kills: 2, wins: 1 });
        assert_eq!(board.get(PlayerId(9)), PlayerScore::default());
    }

    #[test]
    fn test_standings_order() {
        let mut board = Scoreboard::new();
        board.record_kill(PlayerId(1));
        board.record_kill(PlayerId(1));
        board.record_kill(PlayerId(3));
        board.record_win(PlayerId(3));
        board.record_kill(PlayerId(2));
        board.record_kill(PlayerId(2));
        let order: Vec<_> = board.standings().into_iter().map(|(p, _)| p).collect();
        assert_eq!(order, vec![PlayerId(3), PlayerId(1), PlayerId(2)]);
    }
}
