//! Core data structures: Riot wire records and champion aggregates.

pub mod league;
pub mod matches;
pub mod stats;

pub use league::{LeagueEntry, LeagueList, Summoner};
pub use matches::{MatchInfo, MatchMetadata, MatchRecord, Participant, ValidationError};
pub use stats::{ChampionStat, ChampionStats, RankedChampion, SummaryTotals, Tier};
