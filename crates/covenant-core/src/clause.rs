//! Clause — a discrete extracted contractual provision.
//!
//! Clauses are created only by the analysis pipeline (bulk insert after
//! clause detection) and afterwards touched only by reviewers. Users never
//! create them directly.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::contract::RiskLevel;

/// Maximum clause content length accepted at ingestion. Longer detector
/// output is truncated, not rejected.
pub const MAX_CLAUSE_CONTENT_LEN: usize = 1000;

// ─── ClauseType ──────────────────────────────────────────────────────────────

/// Compliance-relevant classification of a clause.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ClauseType {
  Regulatory,
  Financial,
  Penalty,
  Renewal,
  Termination,
  Liability,
  Warranty,
  Confidentiality,
  #[default]
  Other,
}

// ─── Clause ──────────────────────────────────────────────────────────────────

/// An extracted provision with its risk classification and review state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clause {
  pub clause_id:              Uuid,
  pub contract_id:            Uuid,
  pub clause_type:            ClauseType,
  /// Finer classification, e.g. the regulatory standard (ISO, FDA, GMP).
  pub clause_subtype:         Option<String>,
  pub title:                  String,
  /// Verbatim clause text, capped at [`MAX_CLAUSE_CONTENT_LEN`].
  pub content:                String,
  pub summary:                Option<String>,
  pub compliance_requirement: Option<String>,
  pub risk_assessment:        RiskLevel,
  pub action_required:        bool,
  pub action_deadline:        Option<NaiveDate>,
  pub financial_amount:       Option<f64>,
  pub penalty_amount:         Option<f64>,
  pub penalty_trigger:        Option<String>,
  pub detected_at:            DateTime<Utc>,
  pub reviewed:               bool,
  pub reviewed_by:            Option<Uuid>,
  pub reviewed_at:            Option<DateTime<Utc>>,
}

// ─── NewClause ───────────────────────────────────────────────────────────────

/// Input to [`crate::store::ComplianceStore::insert_clauses`].
/// `detected_at` is set by the store; review state starts cleared.
#[derive(Debug, Clone)]
pub struct NewClause {
  pub contract_id:            Uuid,
  pub clause_type:            ClauseType,
  pub clause_subtype:         Option<String>,
  pub title:                  String,
  pub content:                String,
  pub summary:                Option<String>,
  pub compliance_requirement: Option<String>,
  pub risk_assessment:        RiskLevel,
  pub action_required:        bool,
  pub action_deadline:        Option<NaiveDate>,
  pub financial_amount:       Option<f64>,
  pub penalty_amount:         Option<f64>,
  pub penalty_trigger:        Option<String>,
}

impl NewClause {
  /// Minimal clause with analyzer defaults (type Other, risk Medium, no
  /// action required).
  pub fn new(
    contract_id: Uuid,
    title: impl Into<String>,
    content: impl Into<String>,
  ) -> Self {
    Self {
      contract_id,
      clause_type:            ClauseType::default(),
      clause_subtype:         None,
      title:                  title.into(),
      content:                content.into(),
      summary:                None,
      compliance_requirement: None,
      risk_assessment:        RiskLevel::default(),
      action_required:        false,
      action_deadline:        None,
      financial_amount:       None,
      penalty_amount:         None,
      penalty_trigger:        None,
    }
  }
}

// ─── ClauseUpdate ────────────────────────────────────────────────────────────

/// Partial update applied by reviewers. `None` fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClauseUpdate {
  pub title:                  Option<String>,
  pub summary:                Option<String>,
  pub compliance_requirement: Option<String>,
  pub risk_assessment:        Option<RiskLevel>,
  pub action_required:        Option<bool>,
  pub action_deadline:        Option<NaiveDate>,
}
