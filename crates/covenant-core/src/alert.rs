//! Alert — a system-generated notification tied to a contract's temporal or
//! risk state.
//!
//! Alerts are created only by the rule engine. Two independent lifecycle
//! axes apply: delivery (`is_sent`/`sent_at`, flipped by the delivery
//! sub-process) and handling (`acknowledged`/`acknowledged_by`/
//! `acknowledged_at`, flipped by a user). An alert can be acknowledged
//! before it is sent, or sent and never acknowledged. Deactivation
//! (`is_active = false`, via explicit dismissal or the cleanup rule) is
//! terminal — nothing reactivates an alert.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Enums ───────────────────────────────────────────────────────────────────

/// The condition that produced an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
  Expiration,
  Renewal,
  AuditDue,
  HighRisk,
  NonCompliance,
}

/// How urgently the alert should be handled.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
  Low,
  #[default]
  Medium,
  High,
  Critical,
}

impl Severity {
  /// Sort rank used by alert listings — critical first.
  pub fn rank(self) -> u8 {
    match self {
      Self::Critical => 1,
      Self::High => 2,
      Self::Medium => 3,
      Self::Low => 4,
    }
  }
}

// ─── Alert ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
  pub alert_id:        Uuid,
  pub contract_id:     Uuid,
  pub alert_type:      AlertType,
  pub severity:        Severity,
  pub title:           String,
  pub message:         String,
  /// The timestamp at/after which the alert is eligible for delivery.
  pub trigger_date:    DateTime<Utc>,
  pub is_active:       bool,
  pub is_sent:         bool,
  pub sent_at:         Option<DateTime<Utc>>,
  pub acknowledged:    bool,
  pub acknowledged_by: Option<Uuid>,
  pub acknowledged_at: Option<DateTime<Utc>>,
  pub created_at:      DateTime<Utc>,
}

// ─── NewAlert ────────────────────────────────────────────────────────────────

/// Input to [`crate::store::ComplianceStore::create_alert`]. Alerts start
/// active, unsent, and unacknowledged.
#[derive(Debug, Clone)]
pub struct NewAlert {
  pub contract_id:  Uuid,
  pub alert_type:   AlertType,
  pub severity:     Severity,
  pub title:        String,
  pub message:      String,
  pub trigger_date: DateTime<Utc>,
}
