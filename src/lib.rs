//! # Rift Report
//!
//! League of Legends champion performance tracker with AI-generated reports.
//!
//! ## Architecture
//!
//! - **models**: Riot wire records and champion aggregates
//! - **riot**: rate-limited async Riot API client
//! - **transform**: commutative champion win-rate aggregation
//! - **report**: LLM-backed HTML report generation
//! - **pipeline**: the fetch → aggregate → report step sequence
//! - **config**: configuration loading and validation

pub mod config;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod riot;
pub mod transform;

pub use models::*;
