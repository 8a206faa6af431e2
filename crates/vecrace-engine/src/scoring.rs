use vecrace_core::events::RankEntry;
use vecrace_core::player::PlayerId;

use crate::player::Player;

/// Leaderboard for a finished race.
///
/// Only finished players are ranked, fewest moves first. Ties keep the order
/// in which the players crossed the line (`finish_order`); finished players
/// missing from `finish_order` rank after it in seat order.
pub fn ranking(players: &[Player], finish_order: &[PlayerId]) -> Vec<RankEntry> {
    let mut order: Vec<&Player> = finish_order
        .iter()
        .filter_map(|id| players.iter().find(|p| p.id == *id && p.finished))
        .collect();
    for p in players.iter().filter(|p| p.finished) {
        if !order.iter().any(|o| o.id == p.id) {
            order.push(p);
        }
    }
    order.sort_by_key(|p| p.moves_made);
    order
        .into_iter()
        .enumerate()
        .map(|(i, p)| RankEntry {
            rank: i + 1,
            player_id: p.id,
            moves: p.moves_made,
        })
        .collect()
}
