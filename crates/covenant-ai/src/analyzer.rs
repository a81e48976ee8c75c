//! The Contract Analyzer: turns extracted contract text into metadata,
//! detected clauses, and an aggregate risk picture.
//!
//! Analysis is deliberately non-fatal: a transport failure yields
//! [`AnalysisOutcome::Failed`] for the caller to degrade on, and a reply
//! that does not parse yields empty metadata or an empty clause list, not
//! an error.

use chrono::NaiveDate;
use covenant_core::{
  clause::{ClauseType, NewClause},
  contract::RiskLevel,
};
use serde::{Deserialize, Deserializer};
use uuid::Uuid;

use crate::{
  client::CompletionClient,
  parse::{first_json_array, first_json_object},
  risk::{aggregate_risk, RiskSummary},
};

const METADATA_TEXT_BUDGET: usize = 4000;
const METADATA_MAX_TOKENS: u32 = 500;
const CLAUSE_TEXT_BUDGET: usize = 6000;
const CLAUSE_MAX_TOKENS: u32 = 3000;
const CHAT_TEXT_BUDGET: usize = 6000;
const CHAT_MAX_TOKENS: u32 = 800;
const MAX_DETECTED_CLAUSES: usize = 20;
const ANALYSIS_TEMPERATURE: f32 = 0.1;
const CHAT_TEMPERATURE: f32 = 0.3;

const METADATA_SYSTEM_PROMPT: &str = "You are a contract analysis \
  assistant. Extract the requested fields from the contract text and reply \
  with a single JSON object using exactly these keys: vendor_name, \
  customer_name, start_date, end_date, contract_value, currency, \
  payment_terms, title. Dates must be formatted YYYY-MM-DD. Use null for \
  anything not present in the text.";

const CLAUSE_SYSTEM_PROMPT: &str = "You are a contract compliance \
  assistant. Identify compliance-relevant clauses in the contract text and \
  reply with a JSON array of at most 20 objects, each with keys: \
  clause_type (one of regulatory, financial, penalty, renewal, \
  termination, liability, warranty, confidentiality, other), \
  clause_subtype, title, content, summary, compliance_requirement, \
  risk_assessment (low, medium or high), action_required (boolean), \
  action_deadline (YYYY-MM-DD or null), financial_amount, penalty_amount, \
  penalty_trigger.";

const CHAT_SYSTEM_PROMPT: &str = "You are a contract compliance \
  assistant. Answer questions using only the provided contract text. If \
  the text does not contain the answer, say so.";

const SUMMARY_SYSTEM_PROMPT: &str = "You are a contract compliance \
  assistant. Summarize the provided contract in a few short paragraphs, \
  covering parties, term, value, and notable compliance obligations.";

// ─── Output types ────────────────────────────────────────────────────────────

/// Fixed-key metadata the analyzer asks for. Every field is optional;
/// dates stay as raw strings so one malformed date never sinks the rest.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContractMetadata {
  #[serde(default)]
  pub vendor_name:    Option<String>,
  #[serde(default)]
  pub customer_name:  Option<String>,
  #[serde(default)]
  pub start_date:     Option<String>,
  #[serde(default)]
  pub end_date:       Option<String>,
  #[serde(default)]
  pub contract_value: Option<f64>,
  #[serde(default)]
  pub currency:       Option<String>,
  #[serde(default)]
  pub payment_terms:  Option<String>,
  #[serde(default)]
  pub title:          Option<String>,
}

/// One clause as reported by the model, with defaults filled so consumers
/// never see gaps.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DetectedClause {
  #[serde(default, deserialize_with = "de_clause_type")]
  pub clause_type:            ClauseType,
  #[serde(default)]
  pub clause_subtype:         Option<String>,
  #[serde(default)]
  pub title:                  Option<String>,
  #[serde(default)]
  pub content:                String,
  #[serde(default)]
  pub summary:                Option<String>,
  #[serde(default)]
  pub compliance_requirement: Option<String>,
  #[serde(default, deserialize_with = "de_risk")]
  pub risk_assessment:        RiskLevel,
  #[serde(default, deserialize_with = "de_bool")]
  pub action_required:        bool,
  #[serde(default)]
  pub action_deadline:        Option<String>,
  #[serde(default)]
  pub financial_amount:       Option<f64>,
  #[serde(default)]
  pub penalty_amount:         Option<f64>,
  #[serde(default)]
  pub penalty_trigger:        Option<String>,
}

impl DetectedClause {
  /// Convert to the store input type, applying the untitled-clause
  /// fallback and loose date parsing.
  pub fn into_new_clause(self, contract_id: Uuid) -> NewClause {
    NewClause {
      contract_id,
      clause_type: self.clause_type,
      clause_subtype: self.clause_subtype,
      title: self.title.unwrap_or_else(|| "Untitled clause".to_owned()),
      content: self.content,
      summary: self.summary,
      compliance_requirement: self.compliance_requirement,
      risk_assessment: self.risk_assessment,
      action_required: self.action_required,
      action_deadline: self
        .action_deadline
        .as_deref()
        .and_then(parse_loose_date),
      financial_amount: self.financial_amount,
      penalty_amount: self.penalty_amount,
      penalty_trigger: self.penalty_trigger,
    }
  }
}

#[derive(Debug, Clone)]
pub struct Analysis {
  pub metadata: ContractMetadata,
  pub clauses:  Vec<DetectedClause>,
  pub risk:     RiskSummary,
}

/// Result of [`ContractAnalyzer::analyze`]. Never an `Err`: callers decide
/// whether a failed analysis is fatal for them.
#[derive(Debug, Clone)]
pub enum AnalysisOutcome {
  Success(Analysis),
  Failed { error: String },
}

/// Parse a model-supplied date, tolerating the common formats.
pub fn parse_loose_date(s: &str) -> Option<NaiveDate> {
  let s = s.trim();
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .or_else(|_| NaiveDate::parse_from_str(s, "%m/%d/%Y"))
    .ok()
}

// ─── Analyzer ────────────────────────────────────────────────────────────────

pub struct ContractAnalyzer<C: CompletionClient> {
  client: C,
}

impl<C: CompletionClient> ContractAnalyzer<C> {
  pub fn new(client: C) -> Self {
    Self { client }
  }

  /// Run the full analysis: metadata extraction, clause detection, risk
  /// aggregation.
  pub async fn analyze(&self, text: &str) -> AnalysisOutcome {
    let metadata = match self.extract_metadata(text).await {
      Ok(metadata) => metadata,
      Err(err) => {
        tracing::warn!(error = %err, "metadata extraction failed");
        return AnalysisOutcome::Failed { error: err.to_string() };
      }
    };

    let clauses = match self.detect_clauses(text).await {
      Ok(clauses) => clauses,
      Err(err) => {
        tracing::warn!(error = %err, "clause detection failed");
        return AnalysisOutcome::Failed { error: err.to_string() };
      }
    };

    let risk = aggregate_risk(&clauses);
    AnalysisOutcome::Success(Analysis { metadata, clauses, risk })
  }

  async fn extract_metadata(
    &self,
    text: &str,
  ) -> crate::Result<ContractMetadata> {
    let prompt = format!(
      "Contract text:\n\n{}",
      clip(text, METADATA_TEXT_BUDGET)
    );
    let reply = self
      .client
      .complete(
        METADATA_SYSTEM_PROMPT,
        &prompt,
        ANALYSIS_TEMPERATURE,
        METADATA_MAX_TOKENS,
      )
      .await?;

    let metadata = first_json_object(&reply)
      .and_then(|slice| serde_json::from_str(slice).ok())
      .unwrap_or_else(|| {
        tracing::warn!("metadata reply carried no parseable JSON object");
        ContractMetadata::default()
      });
    Ok(metadata)
  }

  async fn detect_clauses(
    &self,
    text: &str,
  ) -> crate::Result<Vec<DetectedClause>> {
    let prompt =
      format!("Contract text:\n\n{}", clip(text, CLAUSE_TEXT_BUDGET));
    let reply = self
      .client
      .complete(
        CLAUSE_SYSTEM_PROMPT,
        &prompt,
        ANALYSIS_TEMPERATURE,
        CLAUSE_MAX_TOKENS,
      )
      .await?;

    let Some(slice) = first_json_array(&reply) else {
      tracing::warn!("clause reply carried no parseable JSON array");
      return Ok(vec![]);
    };
    let values: Vec<serde_json::Value> =
      serde_json::from_str(slice).unwrap_or_default();

    let mut clauses = Vec::new();
    for value in values {
      match serde_json::from_value::<DetectedClause>(value) {
        Ok(clause) => clauses.push(clause),
        Err(err) => tracing::debug!(error = %err, "dropped malformed clause"),
      }
      if clauses.len() == MAX_DETECTED_CLAUSES {
        break;
      }
    }
    Ok(clauses)
  }

  /// Answer a question against the contract text. Failures come back as a
  /// readable answer string, never as an error.
  pub async fn answer(&self, text: &str, question: &str) -> String {
    let prompt = format!(
      "Contract text:\n\n{}\n\nQuestion: {question}",
      clip(text, CHAT_TEXT_BUDGET)
    );
    match self
      .client
      .complete(CHAT_SYSTEM_PROMPT, &prompt, CHAT_TEMPERATURE, CHAT_MAX_TOKENS)
      .await
    {
      Ok(reply) => reply,
      Err(err) => {
        tracing::warn!(error = %err, "chat completion failed");
        format!("Unable to answer right now: {err}")
      }
    }
  }

  /// Produce a short summary of the contract text.
  pub async fn summarize(&self, text: &str) -> String {
    let prompt =
      format!("Contract text:\n\n{}", clip(text, CHAT_TEXT_BUDGET));
    match self
      .client
      .complete(
        SUMMARY_SYSTEM_PROMPT,
        &prompt,
        CHAT_TEMPERATURE,
        CHAT_MAX_TOKENS,
      )
      .await
    {
      Ok(reply) => reply,
      Err(err) => {
        tracing::warn!(error = %err, "summary completion failed");
        format!("Unable to summarize right now: {err}")
      }
    }
  }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Char-safe prefix of `text`, at most `max_chars` long.
fn clip(text: &str, max_chars: usize) -> &str {
  match text.char_indices().nth(max_chars) {
    Some((idx, _)) => &text[..idx],
    None => text,
  }
}

fn de_clause_type<'de, D>(deserializer: D) -> Result<ClauseType, D::Error>
where
  D: Deserializer<'de>,
{
  let raw = Option::<String>::deserialize(deserializer)?;
  Ok(
    raw
      .and_then(|s| {
        serde_json::from_value(serde_json::Value::String(
          s.trim().to_lowercase(),
        ))
        .ok()
      })
      .unwrap_or_default(),
  )
}

fn de_risk<'de, D>(deserializer: D) -> Result<RiskLevel, D::Error>
where
  D: Deserializer<'de>,
{
  let raw = Option::<String>::deserialize(deserializer)?;
  Ok(
    raw
      .and_then(|s| {
        serde_json::from_value(serde_json::Value::String(
          s.trim().to_lowercase(),
        ))
        .ok()
      })
      .unwrap_or_default(),
  )
}

fn de_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
  D: Deserializer<'de>,
{
  let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
  Ok(match raw {
    Some(serde_json::Value::Bool(b)) => b,
    Some(serde_json::Value::String(s)) => {
      matches!(s.to_lowercase().as_str(), "true" | "yes" | "1")
    }
    Some(serde_json::Value::Number(n)) => n.as_f64() != Some(0.0),
    _ => false,
  })
}

// ─── Tests ───────────────────────────────────────────────────────────────────
