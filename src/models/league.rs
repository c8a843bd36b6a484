//! League and summoner records from the Riot league-v4 / summoner-v4 APIs.

use serde::{Deserialize, Serialize};

/// One entry in a league listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueEntry {
    pub summoner_id: String,
    pub league_points: i32,
    #[serde(default)]
    pub wins: u32,
    #[serde(default)]
    pub losses: u32,
}

/// A league listing: the tier plus its member entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueList {
    #[serde(default)]
    pub tier: String,
    #[serde(default)]
    pub entries: Vec<LeagueEntry>,
}

impl LeagueList {
    /// The top `count` entries by league points, highest first.
    pub fn top_entries(&self, count: usize) -> Vec<LeagueEntry> {
        let mut sorted: Vec<LeagueEntry> = self.entries.clone();
        sorted.sort_by(|a, b| b.league_points.cmp(&a.league_points));
        sorted.truncate(count);
        sorted
    }
}

/// A summoner record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summoner {
    pub id: String,
    #[serde(default)]
    pub account_id: String,
    pub puuid: String,
    #[serde(default)]
    pub summoner_level: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_league_entry_deserialization() {
        let json = r#"{
            "summonerId": "abc123",
            "leaguePoints": 1204,
            "wins": 310,
            "losses": 250
        }"#;

        let entry: LeagueEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.summoner_id, "abc123");
        assert_eq!(entry.league_points, 1204);
        assert_eq!(entry.wins, 310);
    }

    #[test]
    fn test_league_entry_missing_record_defaults() {
        let json = r#"{"summonerId": "abc123", "leaguePoints": 800}"#;

        let entry: LeagueEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.wins, 0);
        assert_eq!(entry.losses, 0);
    }

    #[test]
    fn test_top_entries_sorted_and_truncated() {
        let league = LeagueList {
            tier: "CHALLENGER".to_string(),
            entries: vec![
                LeagueEntry {
                    summoner_id: "low".to_string(),
                    league_points: 700,
                    wins: 0,
                    losses: 0,
                },
                LeagueEntry {
                    summoner_id: "high".to_string(),
                    league_points: 1400,
                    wins: 0,
                    losses: 0,
                },
                LeagueEntry {
                    summoner_id: "mid".to_string(),
                    league_points: 1000,
                    wins: 0,
                    losses: 0,
                },
            ],
        };

        let top = league.top_entries(2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].summoner_id, "high");
        assert_eq!(top[1].summoner_id, "mid");
    }

    #[test]
    fn test_top_entries_count_exceeds_len() {
        let league = LeagueList {
            tier: String::new(),
            entries: vec![LeagueEntry {
                summoner_id: "only".to_string(),
                league_points: 500,
                wins: 0,
                losses: 0,
            }],
        };

        assert_eq!(league.top_entries(10).len(), 1);
    }

    #[test]
    fn test_summoner_deserialization() {
        let json = r#"{
            "id": "enc-id",
            "accountId": "acct-id",
            "puuid": "puuid-1",
            "summonerLevel": 612
        }"#;

        let summoner: Summoner = serde_json::from_str(json).unwrap();
        assert_eq!(summoner.puuid, "puuid-1");
        assert_eq!(summoner.summoner_level, 612);
    }
}
