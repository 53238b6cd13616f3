//! Final-ranking computation.

use std::collections::HashMap;

use uuid::Uuid;

/// Standard competition ranking ("1-2-2-4") over a score table.
///
/// `standings` must be in join order; the sort is stable, so players with
/// equal scores keep that order and deterministically share a rank. The rank
/// following a tie block counts the players strictly ahead, not the distinct
/// scores ahead.
pub fn competition_ranks(standings: &[(Uuid, u32)]) -> HashMap<Uuid, u32> {
    let mut sorted: Vec<(Uuid, u32)> = standings.to_vec();
    sorted.sort_by(|a, b| b.1.cmp(&a.1));

    let mut ranks = HashMap::with_capacity(sorted.len());
    let mut prev_score = 0u32;
    let mut prev_rank = 0u32;
    for (i, (user_id, score)) in sorted.into_iter().enumerate() {
        let rank = if i > 0 && score == prev_score {
            prev_rank
        } else {
            i as u32 + 1
        };
        ranks.insert(user_id, rank);
        prev_score = score;
        prev_rank = rank;
    }
    ranks
}
