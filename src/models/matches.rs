//! Match records from the Riot match-v5 API.

use chrono::serde::ts_milliseconds;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A match record whose participant lists disagree. This indicates upstream
/// data corruption and is surfaced to the caller rather than repaired.
#[derive(Debug, Error)]
#[error("match {match_id}: {detail}")]
pub struct ValidationError {
    pub match_id: String,
    pub detail: String,
}

/// Match metadata: the match ID and the PUUID of every participant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchMetadata {
    pub match_id: String,
    pub participants: Vec<String>,
    #[serde(default)]
    pub data_version: String,
}

/// Per-participant outcome and performance numbers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub puuid: String,
    pub champion_id: i32,
    pub champion_name: String,
    pub win: bool,
    #[serde(default)]
    pub kills: u32,
    #[serde(default)]
    pub deaths: u32,
    #[serde(default)]
    pub assists: u32,
    #[serde(default)]
    pub total_damage_dealt_to_champions: u64,
    #[serde(default)]
    pub gold_earned: u64,
    #[serde(default)]
    pub vision_score: f64,
    #[serde(default)]
    pub total_minions_killed: u32,
}

/// Match body: timing plus the participant details.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchInfo {
    #[serde(with = "ts_milliseconds")]
    pub game_creation: DateTime<Utc>,
    pub game_duration: i64,
    #[serde(default)]
    pub game_mode: String,
    #[serde(default)]
    pub game_version: String,
    pub participants: Vec<Participant>,
}

/// One played match, immutable after deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRecord {
    pub metadata: MatchMetadata,
    pub info: MatchInfo,
}

impl MatchRecord {
    pub fn id(&self) -> &str {
        &self.metadata.match_id
    }

    /// Check the participant-list invariant: the metadata PUUID list and the
    /// per-participant details must describe the same set of players.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let ids = self.metadata.participants.len();
        let details = self.info.participants.len();
        if ids != details {
            return Err(ValidationError {
                match_id: self.metadata.match_id.clone(),
                detail: format!("{ids} participant ids but {details} participant entries"),
            });
        }
        for participant in &self.info.participants {
            if !self.metadata.participants.contains(&participant.puuid) {
                return Err(ValidationError {
                    match_id: self.metadata.match_id.clone(),
                    detail: format!("participant {} missing from metadata", participant.puuid),
                });
            }
        }
        Ok(())
    }
}
