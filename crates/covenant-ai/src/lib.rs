//! Completion-backed contract analysis for Covenant.
//!
//! The [`CompletionClient`] capability isolates the wire protocol; the
//! [`ContractAnalyzer`] turns extracted contract text into metadata,
//! detected clauses, and an aggregate risk summary, and also backs the
//! chat endpoints.

#![allow(async_fn_in_trait)]

mod analyzer;
mod client;
mod parse;
mod risk;

pub mod error;

pub use analyzer::{
  Analysis, AnalysisOutcome, ContractAnalyzer, ContractMetadata,
  DetectedClause, parse_loose_date,
};
pub use client::{CompletionClient, OpenAiCompletionClient};
pub use error::{Error, Result};
pub use risk::{aggregate_risk, RiskSummary};
