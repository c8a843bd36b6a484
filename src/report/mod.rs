//! HTML report generation.
//!
//! Builds the analyst prompt from a champion summary, invokes an
//! [`LlmBackend`], sanity-checks the reply, and writes the report to disk.
//! The model's job is presentation only; every number in the report comes
//! from the aggregation stage.

pub mod backend;

use std::path::{Path, PathBuf};

use chrono::Utc;
use thiserror::Error;
use tracing::info;

use crate::models::ChampionStats;
pub use backend::{GeminiBackend, LlmBackend};

/// Errors from report generation.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("LLM backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("LLM response unparseable: {0}")]
    ResponseParse(String),

    #[error("LLM backend rate limited after {0} attempts")]
    RateLimited(u32),

    #[error("backend returned something other than an HTML document")]
    NotHtml,

    #[error("failed to serialize summary: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

const SYSTEM_PROMPT: &str = "\
You are a professional League of Legends analyst. Analyze the provided \
champion performance summary and generate a visually appealing HTML report.

The report must include:
1. A main title, e.g. \"League of Legends - Champion Performance Analysis\".
2. One section per champion tier, S through D, best to worst, each with a \
clear heading.
3. A card per champion showing its name, a 50x50 image from Riot's Data \
Dragon CDN (e.g. https://ddragon.leagueoflegends.com/cdn/15.9.1/img/champion/Aatrox.png), \
its win rate, KDA, and games played, and a one-sentence justification for \
the tier placement.
4. A <style> block for a clean, professional layout with distinct visual \
styles per tier.
5. The output MUST be a single valid HTML document, starting with \
<!DOCTYPE html> and ending with </html>. No surrounding commentary.";

/// Build the user prompt: the serialized summary the model should present.
pub fn build_prompt(summary: &ChampionStats) -> Result<String, ReportError> {
    let payload = serde_json::to_string_pretty(summary)?;
    Ok(format!(
        "Champion performance summary computed at {} from {} matches:\n\n{}",
        summary.computed_at.format("%Y-%m-%d %H:%M:%S UTC"),
        summary.totals.matches,
        payload
    ))
}

/// Invoke the backend and validate that the reply is a standalone HTML
/// document. Models sometimes wrap their output in a markdown code fence;
/// one fence level is stripped before validation.
pub async fn render(
    summary: &ChampionStats,
    backend: &dyn LlmBackend,
) -> Result<String, ReportError> {
    let prompt = build_prompt(summary)?;
    info!(
        backend = backend.name(),
        champions = summary.totals.champions,
        "generating report"
    );

    let raw = backend.generate(SYSTEM_PROMPT, &prompt).await?;
    let html = strip_code_fence(raw.trim());
    if !looks_like_html(html) {
        return Err(ReportError::NotHtml);
    }
    Ok(html.to_string())
}

/// Write the report under `dir` with a timestamped name; returns the path.
pub async fn write_report(html: &str, dir: &Path) -> Result<PathBuf, ReportError> {
    tokio::fs::create_dir_all(dir).await?;
    let name = format!(
        "champion_report_{}.html",
        Utc::now().format("%Y%m%d_%H%M%S")
    );
    let path = dir.join(name);
    tokio::fs::write(&path, html).await?;
    info!(path = %path.display(), "report written");
    Ok(path)
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string ("html") up to the first newline.
    let body = match rest.split_once('\n') {
        Some((_, body)) => body,
        None => return text,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

fn looks_like_html(text: &str) -> bool {
    let lowered = text.trim_start().to_ascii_lowercase();
    lowered.starts_with("<!doctype html") || lowered.starts_with("<html")
}
