//! Contract — the root entity of the compliance store.
//!
//! A contract is created from an uploaded document, enriched by the
//! analyzer, and mutated only through explicit update and audit operations.
//! Its clauses are owned (cascade-deleted with it); alerts and audit-log
//! rows reference it by id without ownership.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Enums ───────────────────────────────────────────────────────────────────

/// Aggregate risk classification, assigned by the analyzer and editable by
/// auditors.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
  Low,
  #[default]
  Medium,
  High,
}

/// Where a contract stands in the compliance review lifecycle.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceStatus {
  #[default]
  Pending,
  Compliant,
  NonCompliant,
  ReviewRequired,
}

// ─── Contract ────────────────────────────────────────────────────────────────

/// A vendor contract and the state derived from its analysis.
///
/// `contract_number` is unique and immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contract {
  pub contract_id:       Uuid,
  pub contract_number:   String,
  pub vendor_name:       String,
  pub title:             String,
  pub original_filename: String,
  /// Server-assigned name of the stored upload; never exposed for download
  /// under its original name.
  pub stored_filename:   String,
  pub extracted_text:    Option<String>,
  pub start_date:        Option<NaiveDate>,
  pub end_date:          Option<NaiveDate>,
  pub renewal_date:      Option<NaiveDate>,
  pub contract_value:    Option<f64>,
  pub currency:          String,
  pub risk_level:        RiskLevel,
  pub compliance_status: ComplianceStatus,
  pub last_audit_date:   Option<DateTime<Utc>>,
  pub next_audit_date:   Option<DateTime<Utc>>,
  pub owner_id:          Uuid,
  pub created_at:        DateTime<Utc>,
  pub updated_at:        DateTime<Utc>,
}

// ─── NewContract ─────────────────────────────────────────────────────────────

/// Input to [`crate::store::ComplianceStore::create_contract`].
/// Timestamps are always set by the store; they are not accepted from
/// callers.
#[derive(Debug, Clone)]
pub struct NewContract {
  pub contract_number:   String,
  pub vendor_name:       String,
  pub title:             String,
  pub original_filename: String,
  pub stored_filename:   String,
  pub extracted_text:    Option<String>,
  pub start_date:        Option<NaiveDate>,
  pub end_date:          Option<NaiveDate>,
  pub renewal_date:      Option<NaiveDate>,
  pub contract_value:    Option<f64>,
  pub currency:          String,
  pub risk_level:        RiskLevel,
  pub owner_id:          Uuid,
}

impl NewContract {
  /// Convenience constructor with analyzer-derived fields left empty.
  pub fn new(
    contract_number: impl Into<String>,
    vendor_name: impl Into<String>,
    title: impl Into<String>,
    owner_id: Uuid,
  ) -> Self {
    Self {
      contract_number:   contract_number.into(),
      vendor_name:       vendor_name.into(),
      title:             title.into(),
      original_filename: String::new(),
      stored_filename:   String::new(),
      extracted_text:    None,
      start_date:        None,
      end_date:          None,
      renewal_date:      None,
      contract_value:    None,
      currency:          "USD".to_owned(),
      risk_level:        RiskLevel::default(),
      owner_id,
    }
  }
}

// ─── ContractUpdate ──────────────────────────────────────────────────────────

/// Partial update applied by
/// [`crate::store::ComplianceStore::update_contract`]. `None` fields are
/// left untouched. The contract number cannot appear here — it is immutable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContractUpdate {
  pub vendor_name:       Option<String>,
  pub title:             Option<String>,
  pub start_date:        Option<NaiveDate>,
  pub end_date:          Option<NaiveDate>,
  pub renewal_date:      Option<NaiveDate>,
  pub contract_value:    Option<f64>,
  pub currency:          Option<String>,
  pub risk_level:        Option<RiskLevel>,
  pub compliance_status: Option<ComplianceStatus>,
  pub last_audit_date:   Option<DateTime<Utc>>,
  pub next_audit_date:   Option<DateTime<Utc>>,
}

impl ContractUpdate {
  pub fn is_empty(&self) -> bool {
    self.vendor_name.is_none()
      && self.title.is_none()
      && self.start_date.is_none()
      && self.end_date.is_none()
      && self.renewal_date.is_none()
      && self.contract_value.is_none()
      && self.currency.is_none()
      && self.risk_level.is_none()
      && self.compliance_status.is_none()
      && self.last_audit_date.is_none()
      && self.next_audit_date.is_none()
  }
}
