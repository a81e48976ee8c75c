//! The `ComplianceStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g.
//! `covenant-store-sqlite`). Higher layers (`covenant-api`,
//! `covenant-alerts`) depend on this abstraction, not on any concrete
//! backend.

use std::future::Future;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use uuid::Uuid;

use crate::{
  alert::{Alert, AlertType, NewAlert, Severity},
  audit::{AuditLog, NewAuditLog},
  clause::{Clause, ClauseType, ClauseUpdate, NewClause},
  contract::{ComplianceStatus, Contract, ContractUpdate, NewContract, RiskLevel},
  user::{NewUser, User},
};

// ─── Query types ─────────────────────────────────────────────────────────────

/// Parameters for [`ComplianceStore::list_contracts`].
#[derive(Debug, Clone, Default)]
pub struct ContractQuery {
  /// Substring filter over vendor names (case-insensitive LIKE).
  pub vendor_name:       Option<String>,
  pub risk_level:        Option<RiskLevel>,
  pub compliance_status: Option<ComplianceStatus>,
  pub limit:             Option<usize>,
  pub offset:            Option<usize>,
}

/// Parameters for [`ComplianceStore::list_clauses`]. Results are ordered
/// highest risk first.
#[derive(Debug, Clone, Default)]
pub struct ClauseQuery {
  pub contract_id:     Option<Uuid>,
  pub clause_type:     Option<ClauseType>,
  pub risk_assessment: Option<RiskLevel>,
  pub action_required: Option<bool>,
  pub limit:           Option<usize>,
  pub offset:          Option<usize>,
}

/// Parameters for [`ComplianceStore::list_alerts`]. Results are ordered by
/// severity rank, then trigger date descending.
#[derive(Debug, Clone, Default)]
pub struct AlertQuery {
  pub is_active:    Option<bool>,
  pub alert_type:   Option<AlertType>,
  pub severity:     Option<Severity>,
  pub acknowledged: Option<bool>,
  pub limit:        Option<usize>,
  pub offset:       Option<usize>,
}

/// A window of results plus the unpaginated total.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Page<T> {
  pub items: Vec<T>,
  pub total: usize,
}

/// Active unacknowledged alert counts grouped by severity.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct AlertCounts {
  pub total:    usize,
  pub critical: usize,
  pub high:     usize,
  pub medium:   usize,
  pub low:      usize,
}

/// Contract counts grouped by risk level and by compliance status, for the
/// compliance-summary report.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct ContractStatusCounts {
  pub total:           usize,
  pub low_risk:        usize,
  pub medium_risk:     usize,
  pub high_risk:       usize,
  pub pending:         usize,
  pub compliant:       usize,
  pub non_compliant:   usize,
  pub review_required: usize,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Covenant compliance store backend.
///
/// The store is shared between request handlers and the scheduled alert
/// rules. The audit-log table is append-only: no update or delete
/// operation exists for it.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait ComplianceStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  fn create_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  /// Retrieve a user by id. Returns `None` if not found.
  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// All users with `is_active = true`; consumed by the daily digest.
  fn list_active_users(
    &self,
  ) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send + '_;

  // ── Contracts ─────────────────────────────────────────────────────────

  /// Persist a new contract. Fails if the contract number is taken.
  fn create_contract(
    &self,
    input: NewContract,
  ) -> impl Future<Output = Result<Contract, Self::Error>> + Send + '_;

  /// Persist a contract and its detected clauses in a single transaction:
  /// either every row lands or none do.
  fn create_contract_with_clauses(
    &self,
    contract: NewContract,
    clauses: Vec<NewClause>,
  ) -> impl Future<Output = Result<Contract, Self::Error>> + Send + '_;

  fn get_contract(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Contract>, Self::Error>> + Send + '_;

  fn get_contract_by_number<'a>(
    &'a self,
    number: &'a str,
  ) -> impl Future<Output = Result<Option<Contract>, Self::Error>> + Send + 'a;

  fn list_contracts<'a>(
    &'a self,
    query: &'a ContractQuery,
  ) -> impl Future<Output = Result<Page<Contract>, Self::Error>> + Send + 'a;

  /// Apply a partial update and bump `updated_at`. The contract number is
  /// immutable and not part of [`ContractUpdate`].
  fn update_contract(
    &self,
    id: Uuid,
    update: ContractUpdate,
  ) -> impl Future<Output = Result<Contract, Self::Error>> + Send + '_;

  /// Delete a contract and (by cascade) its clauses. Alerts and audit-log
  /// rows referencing it are left in place.
  fn delete_contract(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn contracts_by_owner(
    &self,
    owner_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Contract>, Self::Error>> + Send + '_;

  // ── Rule selects ──────────────────────────────────────────────────────

  /// Contracts whose `end_date` equals `date` exactly (the expiration
  /// rule probes one horizon at a time).
  fn contracts_ending_on(
    &self,
    date: NaiveDate,
  ) -> impl Future<Output = Result<Vec<Contract>, Self::Error>> + Send + '_;

  /// Contracts with `next_audit_date` in `[now, now + horizon]`.
  fn contracts_with_audit_due_within(
    &self,
    now: DateTime<Utc>,
    horizon: Duration,
  ) -> impl Future<Output = Result<Vec<Contract>, Self::Error>> + Send + '_;

  fn contracts_by_risk_and_status(
    &self,
    risk: RiskLevel,
    status: ComplianceStatus,
  ) -> impl Future<Output = Result<Vec<Contract>, Self::Error>> + Send + '_;

  // ── Clauses ───────────────────────────────────────────────────────────

  /// Bulk-insert detected clauses. Content longer than
  /// [`crate::clause::MAX_CLAUSE_CONTENT_LEN`] is truncated at ingestion.
  fn insert_clauses(
    &self,
    clauses: Vec<NewClause>,
  ) -> impl Future<Output = Result<Vec<Clause>, Self::Error>> + Send + '_;

  fn get_clause(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Clause>, Self::Error>> + Send + '_;

  fn list_clauses<'a>(
    &'a self,
    query: &'a ClauseQuery,
  ) -> impl Future<Output = Result<Page<Clause>, Self::Error>> + Send + 'a;

  fn update_clause(
    &self,
    id: Uuid,
    update: ClauseUpdate,
  ) -> impl Future<Output = Result<Clause, Self::Error>> + Send + '_;

  /// Mark a clause reviewed by `reviewer` at `at`.
  fn review_clause(
    &self,
    id: Uuid,
    reviewer: Uuid,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<Clause, Self::Error>> + Send + '_;

  // ── Alerts ────────────────────────────────────────────────────────────

  fn create_alert(
    &self,
    input: NewAlert,
  ) -> impl Future<Output = Result<Alert, Self::Error>> + Send + '_;

  fn get_alert(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Alert>, Self::Error>> + Send + '_;

  fn list_alerts<'a>(
    &'a self,
    query: &'a AlertQuery,
  ) -> impl Future<Output = Result<Page<Alert>, Self::Error>> + Send + 'a;

  fn alerts_for_contract(
    &self,
    contract_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Alert>, Self::Error>> + Send + '_;

  /// The day-scoped deduplication probe used by the rule engine: does any
  /// alert for `(contract_id, alert_type)` have a trigger date on `day`?
  ///
  /// This is a best-effort check-then-insert guard, not a database
  /// constraint; overlapping executions of the same rule can still insert
  /// duplicates.
  fn alert_exists_on_day(
    &self,
    contract_id: Uuid,
    alert_type: AlertType,
    day: NaiveDate,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Alerts eligible for delivery: active, unsent, trigger date at or
  /// before `now`.
  fn unsent_due_alerts(
    &self,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<Vec<Alert>, Self::Error>> + Send + '_;

  fn mark_alert_sent(
    &self,
    id: Uuid,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<Alert, Self::Error>> + Send + '_;

  /// Record acknowledgment. Acknowledging an already-acknowledged alert is
  /// a no-op returning the stored row.
  fn acknowledge_alert(
    &self,
    id: Uuid,
    user_id: Uuid,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<Alert, Self::Error>> + Send + '_;

  /// Deactivate an alert (terminal).
  fn dismiss_alert(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Alert, Self::Error>> + Send + '_;

  /// Deactivate every alert acknowledged strictly before `cutoff`.
  /// Returns the number of alerts deactivated.
  fn deactivate_acknowledged_before(
    &self,
    cutoff: DateTime<Utc>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Counts of active, unacknowledged alerts grouped by severity.
  fn active_alert_counts(
    &self,
  ) -> impl Future<Output = Result<AlertCounts, Self::Error>> + Send + '_;

  // ── Audit log ─────────────────────────────────────────────────────────

  fn append_audit_log(
    &self,
    input: NewAuditLog,
  ) -> impl Future<Output = Result<AuditLog, Self::Error>> + Send + '_;

  /// Most recent audit-log rows, newest first.
  fn list_audit_logs(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<AuditLog>, Self::Error>> + Send + '_;

  // ── Reporting aggregates ──────────────────────────────────────────────

  fn contract_status_counts(
    &self,
  ) -> impl Future<Output = Result<ContractStatusCounts, Self::Error>> + Send + '_;

  fn count_action_required_clauses(
    &self,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;
}
