//! Win-ratio leaderboard over finished sessions.

use crate::session::{GameSession, PlayerId};
use crate::types::Mark;
use derive_getters::Getters;
use std::collections::HashMap;
use tracing::{debug, instrument};

/// Default leaderboard length.
pub const DEFAULT_TOP_PLAYERS: usize = 10;

/// Aggregated results for one player.
#[derive(Debug, Clone, PartialEq, Getters)]
pub struct PlayerStats {
    /// The ranked player.
    player_id: PlayerId,
    /// Most recent non-empty display name.
    name: Option<String>,
    /// Finished games counted for this player.
    games: u32,
    /// Counted games this player won.
    wins: u32,
}

impl PlayerStats {
    /// Wins divided by counted games (0.0–1.0).
    pub fn win_ratio(&self) -> f64 {
        if self.games == 0 {
            0.0
        } else {
            f64::from(self.wins) / f64::from(self.games)
        }
    }
}

/// Ranks human players by win ratio over finished sessions.
///
/// The X player always counts the game; the O player counts it only in
/// games without the AI, so the AI never appears. Ties are broken by
/// wins, then by player id.
#[instrument(skip(sessions), fields(sessions = sessions.len()))]
pub fn top_players(sessions: &[GameSession], limit: usize) -> Vec<PlayerStats> {
    let mut table: HashMap<PlayerId, PlayerStats> = HashMap::new();

    for session in sessions.iter().filter(|s| s.is_terminal()) {
        for player in session.players() {
            let counted = !player.is_ai() && (*player.mark() == Mark::X || !session.with_ai());
            if !counted {
                continue;
            }
            let entry = table.entry(*player.id()).or_insert_with(|| PlayerStats {
                player_id: *player.id(),
                name: None,
                games: 0,
                wins: 0,
            });
            entry.games += 1;
            if session.state().winner() == Some(*player.id()) {
                entry.wins += 1;
            }
            if let Some(name) = player.name().as_ref().filter(|n| !n.is_empty()) {
                entry.name = Some(name.clone());
            }
        }
    }

    let mut ranked: Vec<PlayerStats> = table.into_values().filter(|s| s.games > 0).collect();
    ranked.sort_by(|a, b| {
        b.win_ratio()
            .total_cmp(&a.win_ratio())
            .then_with(|| b.wins.cmp(&a.wins))
            .then_with(|| a.player_id.cmp(&b.player_id))
    });
    ranked.truncate(limit);

    debug!(ranked = ranked.len(), "Leaderboard computed");
    ranked
}
