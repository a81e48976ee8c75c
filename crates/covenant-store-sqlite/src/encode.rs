//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, calendar dates as ISO 8601
//! `YYYY-MM-DD`, enums as their snake_case serde tags, and UUIDs as
//! hyphenated lowercase strings. Booleans use SQLite INTEGER 0/1.

use chrono::{DateTime, NaiveDate, Utc};
use covenant_core::{
  alert::{Alert, AlertType, Severity},
  audit::AuditLog,
  clause::{Clause, ClauseType},
  contract::{ComplianceStatus, Contract, RiskLevel},
  user::{Role, User},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn decode_uuid_opt(s: Option<&str>) -> Result<Option<Uuid>> {
  s.map(decode_uuid).transpose()
}

// ─── Timestamps and dates ────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn decode_dt_opt(s: Option<&str>) -> Result<Option<DateTime<Utc>>> {
  s.map(decode_dt).transpose()
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn decode_date_opt(s: Option<&str>) -> Result<Option<NaiveDate>> {
  s.map(decode_date).transpose()
}

// ─── Enums ───────────────────────────────────────────────────────────────────

fn unknown_enum(field: &'static str, value: &str) -> Error {
  Error::Core(covenant_core::Error::UnknownEnumValue {
    field,
    value: value.to_owned(),
  })
}

pub fn encode_risk(r: RiskLevel) -> &'static str {
  match r {
    RiskLevel::Low => "low",
    RiskLevel::Medium => "medium",
    RiskLevel::High => "high",
  }
}

pub fn decode_risk(s: &str) -> Result<RiskLevel> {
  match s {
    "low" => Ok(RiskLevel::Low),
    "medium" => Ok(RiskLevel::Medium),
    "high" => Ok(RiskLevel::High),
    other => Err(unknown_enum("risk_level", other)),
  }
}

pub fn encode_status(s: ComplianceStatus) -> &'static str {
  match s {
    ComplianceStatus::Pending => "pending",
    ComplianceStatus::Compliant => "compliant",
    ComplianceStatus::NonCompliant => "non_compliant",
    ComplianceStatus::ReviewRequired => "review_required",
  }
}

pub fn decode_status(s: &str) -> Result<ComplianceStatus> {
  match s {
    "pending" => Ok(ComplianceStatus::Pending),
    "compliant" => Ok(ComplianceStatus::Compliant),
    "non_compliant" => Ok(ComplianceStatus::NonCompliant),
    "review_required" => Ok(ComplianceStatus::ReviewRequired),
    other => Err(unknown_enum("compliance_status", other)),
  }
}

pub fn encode_clause_type(t: ClauseType) -> &'static str {
  match t {
    ClauseType::Regulatory => "regulatory",
    ClauseType::Financial => "financial",
    ClauseType::Penalty => "penalty",
    ClauseType::Renewal => "renewal",
    ClauseType::Termination => "termination",
    ClauseType::Liability => "liability",
    ClauseType::Warranty => "warranty",
    ClauseType::Confidentiality => "confidentiality",
    ClauseType::Other => "other",
  }
}

pub fn decode_clause_type(s: &str) -> Result<ClauseType> {
  match s {
    "regulatory" => Ok(ClauseType::Regulatory),
    "financial" => Ok(ClauseType::Financial),
    "penalty" => Ok(ClauseType::Penalty),
    "renewal" => Ok(ClauseType::Renewal),
    "termination" => Ok(ClauseType::Termination),
    "liability" => Ok(ClauseType::Liability),
    "warranty" => Ok(ClauseType::Warranty),
    "confidentiality" => Ok(ClauseType::Confidentiality),
    "other" => Ok(ClauseType::Other),
    other => Err(unknown_enum("clause_type", other)),
  }
}

pub fn encode_alert_type(t: AlertType) -> &'static str {
  match t {
    AlertType::Expiration => "expiration",
    AlertType::Renewal => "renewal",
    AlertType::AuditDue => "audit_due",
    AlertType::HighRisk => "high_risk",
    AlertType::NonCompliance => "non_compliance",
  }
}

pub fn decode_alert_type(s: &str) -> Result<AlertType> {
  match s {
    "expiration" => Ok(AlertType::Expiration),
    "renewal" => Ok(AlertType::Renewal),
    "audit_due" => Ok(AlertType::AuditDue),
    "high_risk" => Ok(AlertType::HighRisk),
    "non_compliance" => Ok(AlertType::NonCompliance),
    other => Err(unknown_enum("alert_type", other)),
  }
}

pub fn encode_severity(s: Severity) -> &'static str {
  match s {
    Severity::Low => "low",
    Severity::Medium => "medium",
    Severity::High => "high",
    Severity::Critical => "critical",
  }
}

pub fn decode_severity(s: &str) -> Result<Severity> {
  match s {
    "low" => Ok(Severity::Low),
    "medium" => Ok(Severity::Medium),
    "high" => Ok(Severity::High),
    "critical" => Ok(Severity::Critical),
    other => Err(unknown_enum("severity", other)),
  }
}

pub fn encode_role(r: Role) -> &'static str {
  match r {
    Role::Admin => "admin",
    Role::Auditor => "auditor",
  }
}

pub fn decode_role(s: &str) -> Result<Role> {
  match s {
    "admin" => Ok(Role::Admin),
    "auditor" => Ok(Role::Auditor),
    other => Err(unknown_enum("role", other)),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `contracts` row.
pub struct RawContract {
  pub contract_id:       String,
  pub contract_number:   String,
  pub vendor_name:       String,
  pub title:             String,
  pub original_filename: String,
  pub stored_filename:   String,
  pub extracted_text:    Option<String>,
  pub start_date:        Option<String>,
  pub end_date:          Option<String>,
  pub renewal_date:      Option<String>,
  pub contract_value:    Option<f64>,
  pub currency:          String,
  pub risk_level:        String,
  pub compliance_status: String,
  pub last_audit_date:   Option<String>,
  pub next_audit_date:   Option<String>,
  pub owner_id:          String,
  pub created_at:        String,
  pub updated_at:        String,
}

impl RawContract {
  /// SELECT column list matching the field order of [`Self::from_row`].
  pub const COLUMNS: &'static str = "contract_id, contract_number, \
     vendor_name, title, original_filename, stored_filename, \
     extracted_text, start_date, end_date, renewal_date, contract_value, \
     currency, risk_level, compliance_status, last_audit_date, \
     next_audit_date, owner_id, created_at, updated_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      contract_id:       row.get(0)?,
      contract_number:   row.get(1)?,
      vendor_name:       row.get(2)?,
      title:             row.get(3)?,
      original_filename: row.get(4)?,
      stored_filename:   row.get(5)?,
      extracted_text:    row.get(6)?,
      start_date:        row.get(7)?,
      end_date:          row.get(8)?,
      renewal_date:      row.get(9)?,
      contract_value:    row.get(10)?,
      currency:          row.get(11)?,
      risk_level:        row.get(12)?,
      compliance_status: row.get(13)?,
      last_audit_date:   row.get(14)?,
      next_audit_date:   row.get(15)?,
      owner_id:          row.get(16)?,
      created_at:        row.get(17)?,
      updated_at:        row.get(18)?,
    })
  }

  pub fn into_contract(self) -> Result<Contract> {
    Ok(Contract {
      contract_id:       decode_uuid(&self.contract_id)?,
      contract_number:   self.contract_number,
      vendor_name:       self.vendor_name,
      title:             self.title,
      original_filename: self.original_filename,
      stored_filename:   self.stored_filename,
      extracted_text:    self.extracted_text,
      start_date:        decode_date_opt(self.start_date.as_deref())?,
      end_date:          decode_date_opt(self.end_date.as_deref())?,
      renewal_date:      decode_date_opt(self.renewal_date.as_deref())?,
      contract_value:    self.contract_value,
      currency:          self.currency,
      risk_level:        decode_risk(&self.risk_level)?,
      compliance_status: decode_status(&self.compliance_status)?,
      last_audit_date:   decode_dt_opt(self.last_audit_date.as_deref())?,
      next_audit_date:   decode_dt_opt(self.next_audit_date.as_deref())?,
      owner_id:          decode_uuid(&self.owner_id)?,
      created_at:        decode_dt(&self.created_at)?,
      updated_at:        decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw strings read directly from a `clauses` row.
pub struct RawClause {
  pub clause_id:              String,
  pub contract_id:            String,
  pub clause_type:            String,
  pub clause_subtype:         Option<String>,
  pub title:                  String,
  pub content:                String,
  pub summary:                Option<String>,
  pub compliance_requirement: Option<String>,
  pub risk_assessment:        String,
  pub action_required:        bool,
  pub action_deadline:        Option<String>,
  pub financial_amount:       Option<f64>,
  pub penalty_amount:         Option<f64>,
  pub penalty_trigger:        Option<String>,
  pub detected_at:            String,
  pub reviewed:               bool,
  pub reviewed_by:            Option<String>,
  pub reviewed_at:            Option<String>,
}

impl RawClause {
  pub const COLUMNS: &'static str = "clause_id, contract_id, clause_type, \
     clause_subtype, title, content, summary, compliance_requirement, \
     risk_assessment, action_required, action_deadline, financial_amount, \
     penalty_amount, penalty_trigger, detected_at, reviewed, reviewed_by, \
     reviewed_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      clause_id:              row.get(0)?,
      contract_id:            row.get(1)?,
      clause_type:            row.get(2)?,
      clause_subtype:         row.get(3)?,
      title:                  row.get(4)?,
      content:                row.get(5)?,
      summary:                row.get(6)?,
      compliance_requirement: row.get(7)?,
      risk_assessment:        row.get(8)?,
      action_required:        row.get(9)?,
      action_deadline:        row.get(10)?,
      financial_amount:       row.get(11)?,
      penalty_amount:         row.get(12)?,
      penalty_trigger:        row.get(13)?,
      detected_at:            row.get(14)?,
      reviewed:               row.get(15)?,
      reviewed_by:            row.get(16)?,
      reviewed_at:            row.get(17)?,
    })
  }

  pub fn into_clause(self) -> Result<Clause> {
    Ok(Clause {
      clause_id:              decode_uuid(&self.clause_id)?,
      contract_id:            decode_uuid(&self.contract_id)?,
      clause_type:            decode_clause_type(&self.clause_type)?,
      clause_subtype:         self.clause_subtype,
      title:                  self.title,
      content:                self.content,
      summary:                self.summary,
      compliance_requirement: self.compliance_requirement,
      risk_assessment:        decode_risk(&self.risk_assessment)?,
      action_required:        self.action_required,
      action_deadline:        decode_date_opt(self.action_deadline.as_deref())?,
      financial_amount:       self.financial_amount,
      penalty_amount:         self.penalty_amount,
      penalty_trigger:        self.penalty_trigger,
      detected_at:            decode_dt(&self.detected_at)?,
      reviewed:               self.reviewed,
      reviewed_by:            decode_uuid_opt(self.reviewed_by.as_deref())?,
      reviewed_at:            decode_dt_opt(self.reviewed_at.as_deref())?,
    })
  }
}

/// Raw strings read directly from an `alerts` row.
pub struct RawAlert {
  pub alert_id:        String,
  pub contract_id:     String,
  pub alert_type:      String,
  pub severity:        String,
  pub title:           String,
  pub message:         String,
  pub trigger_date:    String,
  pub is_active:       bool,
  pub is_sent:         bool,
  pub sent_at:         Option<String>,
  pub acknowledged:    bool,
  pub acknowledged_by: Option<String>,
  pub acknowledged_at: Option<String>,
  pub created_at:      String,
}

impl RawAlert {
  pub const COLUMNS: &'static str = "alert_id, contract_id, alert_type, \
     severity, title, message, trigger_date, is_active, is_sent, sent_at, \
     acknowledged, acknowledged_by, acknowledged_at, created_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      alert_id:        row.get(0)?,
      contract_id:     row.get(1)?,
      alert_type:      row.get(2)?,
      severity:        row.get(3)?,
      title:           row.get(4)?,
      message:         row.get(5)?,
      trigger_date:    row.get(6)?,
      is_active:       row.get(7)?,
      is_sent:         row.get(8)?,
      sent_at:         row.get(9)?,
      acknowledged:    row.get(10)?,
      acknowledged_by: row.get(11)?,
      acknowledged_at: row.get(12)?,
      created_at:      row.get(13)?,
    })
  }

  pub fn into_alert(self) -> Result<Alert> {
    Ok(Alert {
      alert_id:        decode_uuid(&self.alert_id)?,
      contract_id:     decode_uuid(&self.contract_id)?,
      alert_type:      decode_alert_type(&self.alert_type)?,
      severity:        decode_severity(&self.severity)?,
      title:           self.title,
      message:         self.message,
      trigger_date:    decode_dt(&self.trigger_date)?,
      is_active:       self.is_active,
      is_sent:         self.is_sent,
      sent_at:         decode_dt_opt(self.sent_at.as_deref())?,
      acknowledged:    self.acknowledged,
      acknowledged_by: decode_uuid_opt(self.acknowledged_by.as_deref())?,
      acknowledged_at: decode_dt_opt(self.acknowledged_at.as_deref())?,
      created_at:      decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from an `audit_logs` row.
pub struct RawAuditLog {
  pub log_id:        String,
  pub user_id:       String,
  pub contract_id:   Option<String>,
  pub action:        String,
  pub resource_type: Option<String>,
  pub resource_id:   Option<String>,
  pub details:       String,
  pub ip_address:    Option<String>,
  pub user_agent:    Option<String>,
  pub timestamp:     String,
}

impl RawAuditLog {
  pub const COLUMNS: &'static str = "log_id, user_id, contract_id, action, \
     resource_type, resource_id, details, ip_address, user_agent, timestamp";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      log_id:        row.get(0)?,
      user_id:       row.get(1)?,
      contract_id:   row.get(2)?,
      action:        row.get(3)?,
      resource_type: row.get(4)?,
      resource_id:   row.get(5)?,
      details:       row.get(6)?,
      ip_address:    row.get(7)?,
      user_agent:    row.get(8)?,
      timestamp:     row.get(9)?,
    })
  }

  pub fn into_audit_log(self) -> Result<AuditLog> {
    Ok(AuditLog {
      log_id:        decode_uuid(&self.log_id)?,
      user_id:       decode_uuid(&self.user_id)?,
      contract_id:   decode_uuid_opt(self.contract_id.as_deref())?,
      action:        self.action,
      resource_type: self.resource_type,
      resource_id:   decode_uuid_opt(self.resource_id.as_deref())?,
      details:       serde_json::from_str(&self.details)?,
      ip_address:    self.ip_address,
      user_agent:    self.user_agent,
      timestamp:     decode_dt(&self.timestamp)?,
    })
  }
}

/// Raw strings read directly from a `users` row.
pub struct RawUser {
  pub user_id:    String,
  pub username:   String,
  pub email:      String,
  pub role:       String,
  pub is_active:  bool,
  pub created_at: String,
}

impl RawUser {
  pub const COLUMNS: &'static str =
    "user_id, username, email, role, is_active, created_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:    row.get(0)?,
      username:   row.get(1)?,
      email:      row.get(2)?,
      role:       row.get(3)?,
      is_active:  row.get(4)?,
      created_at: row.get(5)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:    decode_uuid(&self.user_id)?,
      username:   self.username,
      email:      self.email,
      role:       decode_role(&self.role)?,
      is_active:  self.is_active,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}
