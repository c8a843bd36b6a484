//! Per-champion aggregates and the report summary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Participant;

/// Tier classification based on win rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tier {
    S,
    A,
    B,
    C,
    D,
}

impl Tier {
    /// Calculate tier from win rate.
    pub fn from_win_rate(win_rate: f64) -> Self {
        if win_rate >= 0.55 {
            Tier::S
        } else if win_rate >= 0.52 {
            Tier::A
        } else if win_rate >= 0.48 {
            Tier::B
        } else if win_rate >= 0.45 {
            Tier::C
        } else {
            Tier::D
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tier::S => write!(f, "S"),
            Tier::A => write!(f, "A"),
            Tier::B => write!(f, "B"),
            Tier::C => write!(f, "C"),
            Tier::D => write!(f, "D"),
        }
    }
}

/// Running per-champion tally across a batch of matches.
///
/// `wins` can never exceed `games`: both advance only through
/// `record_game`, which increments them together.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChampionStat {
    pub name: String,
    pub games: u32,
    pub wins: u32,
    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,
}

impl ChampionStat {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Fold one participant appearance into the tally.
    pub fn record_game(&mut self, participant: &Participant) {
        self.games += 1;
        if participant.win {
            self.wins += 1;
        }
        self.kills += participant.kills;
        self.deaths += participant.deaths;
        self.assists += participant.assists;
    }

    pub fn losses(&self) -> u32 {
        self.games - self.wins
    }

    /// Win rate (0.0 to 1.0), zero for an empty tally.
    pub fn win_rate(&self) -> f64 {
        if self.games == 0 {
            0.0
        } else {
            self.wins as f64 / self.games as f64
        }
    }

    /// (kills + assists) / deaths, with deaths floored at 1.
    pub fn kda(&self) -> f64 {
        (self.kills + self.assists) as f64 / self.deaths.max(1) as f64
    }
}

/// One champion in the final ranking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedChampion {
    pub name: String,
    pub tier: Tier,
    pub games: u32,
    pub wins: u32,
    pub losses: u32,
    pub win_rate: f64,
    pub kda: f64,
}

/// Batch totals.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SummaryTotals {
    pub matches: u32,
    pub participants: u32,
    pub champions: u32,
}

/// The aggregate summary consumed by the report stage. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChampionStats {
    /// When this summary was computed.
    pub computed_at: DateTime<Utc>,

    /// Batch totals.
    pub totals: SummaryTotals,

    /// Champions sorted by win rate, highest first.
    pub champions: Vec<RankedChampion>,
}

impl ChampionStats {
    /// Get a champion by name, case-insensitively.
    pub fn get_champion(&self, name: &str) -> Option<&RankedChampion> {
        self.champions
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Champions in a specific tier.
    pub fn in_tier(&self, tier: Tier) -> Vec<&RankedChampion> {
        self.champions.iter().filter(|c| c.tier == tier).collect()
    }
}
