//! Report pipeline steps.
//!
//! The step sequence an orchestrator runs in order: top players → matches →
//! aggregate → report → file. Each step is an ordinary async function so an
//! external scheduler can invoke them individually; [`Pipeline::run`]
//! composes them for the CLI. Dropping the returned future cancels in-flight
//! fetches at their next suspension point and commits nothing.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::models::{ChampionStats, MatchRecord, Summoner, ValidationError};
use crate::report::{self, LlmBackend, ReportError};
use crate::riot::{FetchError, RiotClient};
use crate::transform;

/// Queue the pipeline samples from.
pub const RANKED_SOLO_QUEUE: &str = "RANKED_SOLO_5x5";

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error("no matches found for the selected players")]
    NoMatches,
}

/// Orchestrates one report run.
pub struct Pipeline {
    client: Arc<RiotClient>,
    backend: Option<Arc<dyn LlmBackend>>,
    output_dir: PathBuf,
}

impl Pipeline {
    pub fn new(client: Arc<RiotClient>, output_dir: PathBuf) -> Self {
        Self {
            client,
            backend: None,
            output_dir,
        }
    }

    pub fn with_backend(mut self, backend: Arc<dyn LlmBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Top challenger players by league points.
    pub async fn top_players(&self, count: usize) -> Result<Vec<Summoner>, PipelineError> {
        let league = self.client.challenger_league(RANKED_SOLO_QUEUE).await?;
        let top = league.top_entries(count);
        info!(candidates = league.entries.len(), selected = top.len(), "selected challenger entries");

        let ids: Vec<String> = top.into_iter().map(|entry| entry.summoner_id).collect();
        Ok(self.client.summoners_by_ids(&ids).await?)
    }

    /// Recent matches for the given players, fetched concurrently and
    /// deduplicated by match ID. A match that has vanished upstream (404)
    /// is skipped with a warning rather than failing the run.
    pub async fn matches_for_players(
        &self,
        players: &[Summoner],
        per_player: u32,
    ) -> Result<Vec<MatchRecord>, PipelineError> {
        let mut id_tasks = JoinSet::new();
        for player in players {
            let client = Arc::clone(&self.client);
            let puuid = player.puuid.clone();
            id_tasks.spawn(async move { client.match_ids_for(&puuid, per_player).await });
        }

        let mut all_ids: Vec<String> = Vec::new();
        while let Some(joined) = id_tasks.join_next().await {
            let ids = joined.map_err(|e| FetchError::Network(format!("task join failed: {e}")))??;
            all_ids.extend(ids);
        }

        let unique = dedupe_match_ids(all_ids);
        info!(unique = unique.len(), "deduplicated match ids");

        let mut match_tasks = JoinSet::new();
        for match_id in unique {
            let client = Arc::clone(&self.client);
            match_tasks.spawn(async move {
                match client.match_by_id(&match_id).await {
                    Ok(record) => Ok(Some(record)),
                    Err(FetchError::NotFound(_)) => {
                        warn!(%match_id, "match no longer available, skipping");
                        Ok(None)
                    }
                    Err(err) => Err(err),
                }
            });
        }

        let mut matches = Vec::new();
        while let Some(joined) = match_tasks.join_next().await {
            let record =
                joined.map_err(|e| FetchError::Network(format!("task join failed: {e}")))??;
            if let Some(record) = record {
                matches.push(record);
            }
        }

        if matches.is_empty() {
            return Err(PipelineError::NoMatches);
        }
        info!(matches = matches.len(), "fetched match records");
        Ok(matches)
    }

    /// Aggregate matches into the tiered champion summary.
    pub fn aggregate_matches(
        &self,
        matches: &[MatchRecord],
    ) -> Result<ChampionStats, PipelineError> {
        let stats = transform::aggregate(matches)?;
        Ok(transform::summarize(stats, matches.len()))
    }

    /// Ask the configured LLM backend for the HTML report.
    pub async fn generate_report(&self, summary: &ChampionStats) -> Result<String, PipelineError> {
        let backend = self.backend.as_deref().ok_or_else(|| {
            ReportError::BackendUnavailable("no LLM backend configured".to_string())
        })?;
        Ok(report::render(summary, backend).await?)
    }

    /// Write the report into the configured output directory.
    pub async fn write_report(&self, html: &str) -> Result<PathBuf, PipelineError> {
        Ok(report::write_report(html, &self.output_dir).await?)
    }

    /// Full run: players → matches → aggregate → report → file.
    pub async fn run(&self, top: usize, per_player: u32) -> Result<PathBuf, PipelineError> {
        let players = self.top_players(top).await?;
        let matches = self.matches_for_players(&players, per_player).await?;
        let summary = self.aggregate_matches(&matches)?;
        let html = self.generate_report(&summary).await?;
        self.write_report(&html).await
    }
}

/// Keep the first occurrence of each match ID. Order does not matter
/// downstream; aggregation is commutative.
fn dedupe_match_ids(ids: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}
