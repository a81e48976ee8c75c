//! Audit log — the append-only trail of state-changing operations.
//!
//! Rows are written synchronously alongside every mutation and are never
//! updated or deleted by the application.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLog {
  pub log_id:        Uuid,
  pub user_id:       Uuid,
  pub contract_id:   Option<Uuid>,
  /// e.g. `"upload"`, `"update"`, `"delete"`, `"acknowledge"`, `"review"`.
  pub action:        String,
  /// e.g. `"contract"`, `"clause"`, `"alert"`, `"report"`.
  pub resource_type: Option<String>,
  pub resource_id:   Option<Uuid>,
  pub details:       serde_json::Value,
  pub ip_address:    Option<String>,
  pub user_agent:    Option<String>,
  pub timestamp:     DateTime<Utc>,
}

/// Input to [`crate::store::ComplianceStore::append_audit_log`].
/// The timestamp is set by the store.
#[derive(Debug, Clone)]
pub struct NewAuditLog {
  pub user_id:       Uuid,
  pub contract_id:   Option<Uuid>,
  pub action:        String,
  pub resource_type: Option<String>,
  pub resource_id:   Option<Uuid>,
  pub details:       serde_json::Value,
  pub ip_address:    Option<String>,
  pub user_agent:    Option<String>,
}

impl NewAuditLog {
  pub fn new(user_id: Uuid, action: impl Into<String>) -> Self {
    Self {
      user_id,
      contract_id:   None,
      action:        action.into(),
      resource_type: None,
      resource_id:   None,
      details:       serde_json::Value::Null,
      ip_address:    None,
      user_agent:    None,
    }
  }

  pub fn resource(
    mut self,
    resource_type: impl Into<String>,
    resource_id: Uuid,
  ) -> Self {
    self.resource_type = Some(resource_type.into());
    self.resource_id = Some(resource_id);
    self
  }

  pub fn details(mut self, details: serde_json::Value) -> Self {
    self.details = details;
    self
  }
}
