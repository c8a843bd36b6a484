//! Champion aggregation.
//!
//! Reshapes validated match records into per-champion win/games tallies and
//! the tiered summary the report stage consumes. Accumulation is commutative,
//! so concurrent, out-of-order fetch completion cannot change the result.

use std::collections::HashMap;

use chrono::Utc;
use tracing::debug;

use crate::models::{
    ChampionStat, ChampionStats, MatchRecord, RankedChampion, SummaryTotals, Tier,
    ValidationError,
};

/// Accumulate per-champion games and wins across a batch of match records.
///
/// Every record is validated before any counting happens: a corrupt record
/// yields an error and no partial output. The accumulation itself is
/// order-independent.
pub fn aggregate(
    records: &[MatchRecord],
) -> Result<HashMap<String, ChampionStat>, ValidationError> {
    for record in records {
        record.validate()?;
    }

    let mut stats: HashMap<String, ChampionStat> = HashMap::new();
    for record in records {
        for participant in &record.info.participants {
            stats
                .entry(participant.champion_name.clone())
                .or_insert_with(|| ChampionStat::new(participant.champion_name.clone()))
                .record_game(participant);
        }
    }

    debug!(
        matches = records.len(),
        champions = stats.len(),
        "aggregated champion stats"
    );
    Ok(stats)
}

/// Build the sorted, tiered summary handed to the report stage.
pub fn summarize(stats: HashMap<String, ChampionStat>, match_count: usize) -> ChampionStats {
    let participants: u32 = stats.values().map(|s| s.games).sum();

    let mut champions: Vec<RankedChampion> = stats
        .into_values()
        .map(|stat| RankedChampion {
            tier: Tier::from_win_rate(stat.win_rate()),
            games: stat.games,
            wins: stat.wins,
            losses: stat.losses(),
            win_rate: stat.win_rate(),
            kda: stat.kda(),
            name: stat.name,
        })
        .collect();

    // Win rate first; games as the tie-breaker so heavily played champions
    // rank above one-off appearances, then name for a stable order.
    champions.sort_by(|a, b| {
        b.win_rate
            .total_cmp(&a.win_rate)
            .then(b.games.cmp(&a.games))
            .then(a.name.cmp(&b.name))
    });

    ChampionStats {
        computed_at: Utc::now(),
        totals: SummaryTotals {
            matches: match_count as u32,
            participants,
            champions: champions.len() as u32,
        },
        champions,
    }
}
