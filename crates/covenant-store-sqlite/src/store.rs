//! [`SqliteStore`] — the SQLite implementation of [`ComplianceStore`].

use std::path::Path;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use covenant_core::{
  alert::{Alert, AlertType, NewAlert},
  audit::{AuditLog, NewAuditLog},
  clause::{Clause, ClauseUpdate, NewClause, MAX_CLAUSE_CONTENT_LEN},
  contract::{ComplianceStatus, Contract, ContractUpdate, NewContract, RiskLevel},
  store::{
    AlertCounts, AlertQuery, ClauseQuery, ComplianceStore, ContractQuery,
    ContractStatusCounts, Page,
  },
  user::{NewUser, User},
};

use crate::{
  encode::{
    encode_alert_type, encode_clause_type, encode_date, encode_dt,
    encode_risk, encode_role, encode_severity, encode_status, encode_uuid,
    RawAlert, RawAuditLog, RawClause, RawContract, RawUser,
  },
  schema::SCHEMA,
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Covenant compliance store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Fetch a single contract row by hyphenated UUID string.
  async fn fetch_contract(&self, id_str: String) -> Result<Option<Contract>> {
    let raw: Option<RawContract> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {} FROM contracts WHERE contract_id = ?1",
                RawContract::COLUMNS
              ),
              rusqlite::params![id_str],
              RawContract::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawContract::into_contract).transpose()
  }

  async fn fetch_alert(&self, id_str: String) -> Result<Option<Alert>> {
    let raw: Option<RawAlert> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {} FROM alerts WHERE alert_id = ?1",
                RawAlert::COLUMNS
              ),
              rusqlite::params![id_str],
              RawAlert::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawAlert::into_alert).transpose()
  }

  async fn fetch_clause(&self, id_str: String) -> Result<Option<Clause>> {
    let raw: Option<RawClause> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {} FROM clauses WHERE clause_id = ?1",
                RawClause::COLUMNS
              ),
              rusqlite::params![id_str],
              RawClause::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawClause::into_clause).transpose()
  }

  /// Run a contracts SELECT with a fixed WHERE clause and decode the rows.
  async fn select_contracts(
    &self,
    where_clause: &'static str,
    params: Vec<String>,
  ) -> Result<Vec<Contract>> {
    let raws: Vec<RawContract> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {} FROM contracts WHERE {}",
          RawContract::COLUMNS,
          where_clause
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params_from_iter(params.iter()),
            RawContract::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawContract::into_contract).collect()
  }
}

// ─── Insert helpers ──────────────────────────────────────────────────────────

/// Build the stored [`Contract`] for a [`NewContract`] with server-assigned
/// id, timestamps, and default compliance status.
fn build_contract(input: NewContract, now: DateTime<Utc>) -> Contract {
  Contract {
    contract_id:       Uuid::new_v4(),
    contract_number:   input.contract_number,
    vendor_name:       input.vendor_name,
    title:             input.title,
    original_filename: input.original_filename,
    stored_filename:   input.stored_filename,
    extracted_text:    input.extracted_text,
    start_date:        input.start_date,
    end_date:          input.end_date,
    renewal_date:      input.renewal_date,
    contract_value:    input.contract_value,
    currency:          input.currency,
    risk_level:        input.risk_level,
    compliance_status: ComplianceStatus::Pending,
    last_audit_date:   None,
    next_audit_date:   None,
    owner_id:          input.owner_id,
    created_at:        now,
    updated_at:        now,
  }
}

/// Build the stored [`Clause`] for a [`NewClause`], truncating over-long
/// content at ingestion.
fn build_clause(input: NewClause, now: DateTime<Utc>) -> Clause {
  let content = if input.content.chars().count() > MAX_CLAUSE_CONTENT_LEN {
    input.content.chars().take(MAX_CLAUSE_CONTENT_LEN).collect()
  } else {
    input.content
  };
  Clause {
    clause_id:              Uuid::new_v4(),
    contract_id:            input.contract_id,
    clause_type:            input.clause_type,
    clause_subtype:         input.clause_subtype,
    title:                  input.title,
    content,
    summary:                input.summary,
    compliance_requirement: input.compliance_requirement,
    risk_assessment:        input.risk_assessment,
    action_required:        input.action_required,
    action_deadline:        input.action_deadline,
    financial_amount:       input.financial_amount,
    penalty_amount:         input.penalty_amount,
    penalty_trigger:        input.penalty_trigger,
    detected_at:            now,
    reviewed:               false,
    reviewed_by:            None,
    reviewed_at:            None,
  }
}

fn insert_contract_row(
  conn: &rusqlite::Connection,
  c: &Contract,
) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO contracts (
       contract_id, contract_number, vendor_name, title,
       original_filename, stored_filename, extracted_text,
       start_date, end_date, renewal_date, contract_value, currency,
       risk_level, compliance_status, last_audit_date, next_audit_date,
       owner_id, created_at, updated_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
               ?14, ?15, ?16, ?17, ?18, ?19)",
    rusqlite::params![
      encode_uuid(c.contract_id),
      c.contract_number,
      c.vendor_name,
      c.title,
      c.original_filename,
      c.stored_filename,
      c.extracted_text,
      c.start_date.map(encode_date),
      c.end_date.map(encode_date),
      c.renewal_date.map(encode_date),
      c.contract_value,
      c.currency,
      encode_risk(c.risk_level),
      encode_status(c.compliance_status),
      c.last_audit_date.map(encode_dt),
      c.next_audit_date.map(encode_dt),
      encode_uuid(c.owner_id),
      encode_dt(c.created_at),
      encode_dt(c.updated_at),
    ],
  )?;
  Ok(())
}

fn insert_clause_row(
  conn: &rusqlite::Connection,
  cl: &Clause,
) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO clauses (
       clause_id, contract_id, clause_type, clause_subtype, title, content,
       summary, compliance_requirement, risk_assessment, action_required,
       action_deadline, financial_amount, penalty_amount, penalty_trigger,
       detected_at, reviewed, reviewed_by, reviewed_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
               ?14, ?15, ?16, ?17, ?18)",
    rusqlite::params![
      encode_uuid(cl.clause_id),
      encode_uuid(cl.contract_id),
      encode_clause_type(cl.clause_type),
      cl.clause_subtype,
      cl.title,
      cl.content,
      cl.summary,
      cl.compliance_requirement,
      encode_risk(cl.risk_assessment),
      cl.action_required,
      cl.action_deadline.map(encode_date),
      cl.financial_amount,
      cl.penalty_amount,
      cl.penalty_trigger,
      encode_dt(cl.detected_at),
      cl.reviewed,
      cl.reviewed_by.map(encode_uuid),
      cl.reviewed_at.map(encode_dt),
    ],
  )?;
  Ok(())
}

fn contract_number_taken(
  conn: &rusqlite::Connection,
  number: &str,
) -> rusqlite::Result<bool> {
  Ok(
    conn
      .query_row(
        "SELECT 1 FROM contracts WHERE contract_number = ?1",
        rusqlite::params![number],
        |_| Ok(true),
      )
      .optional()?
      .unwrap_or(false),
  )
}

// ─── ComplianceStore impl ────────────────────────────────────────────────────

impl ComplianceStore for SqliteStore {
  type Error = Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn create_user(&self, input: NewUser) -> Result<User> {
    let user = User {
      user_id:    Uuid::new_v4(),
      username:   input.username,
      email:      input.email,
      role:       input.role,
      is_active:  true,
      created_at: Utc::now(),
    };

    let id_str   = encode_uuid(user.user_id);
    let username = user.username.clone();
    let email    = user.email.clone();
    let role_str = encode_role(user.role).to_owned();
    let at_str   = encode_dt(user.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users (user_id, username, email, role, is_active, created_at)
           VALUES (?1, ?2, ?3, ?4, 1, ?5)",
          rusqlite::params![id_str, username, email, role_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(user)
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
    let id_str = encode_uuid(id);
    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {} FROM users WHERE user_id = ?1",
                RawUser::COLUMNS
              ),
              rusqlite::params![id_str],
              RawUser::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawUser::into_user).transpose()
  }

  async fn list_active_users(&self) -> Result<Vec<User>> {
    let raws: Vec<RawUser> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM users WHERE is_active = 1 ORDER BY username",
          RawUser::COLUMNS
        ))?;
        let rows = stmt
          .query_map([], RawUser::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawUser::into_user).collect()
  }

  // ── Contracts ─────────────────────────────────────────────────────────────

  async fn create_contract(&self, input: NewContract) -> Result<Contract> {
    self.create_contract_with_clauses(input, Vec::new()).await
  }

  async fn create_contract_with_clauses(
    &self,
    contract: NewContract,
    clauses: Vec<NewClause>,
  ) -> Result<Contract> {
    let now = Utc::now();
    let number = contract.contract_number.clone();
    let built = build_contract(contract, now);
    let built_clauses: Vec<Clause> = clauses
      .into_iter()
      .map(|mut cl| {
        // Clauses detected before the contract id existed are re-pointed at
        // the row being created.
        cl.contract_id = built.contract_id;
        build_clause(cl, now)
      })
      .collect();

    let row = built.clone();
    let clause_rows = built_clauses;
    let taken: bool = self
      .conn
      .call(move |conn| {
        if contract_number_taken(conn, &row.contract_number)? {
          return Ok(true);
        }
        let tx = conn.transaction()?;
        insert_contract_row(&tx, &row)?;
        for cl in &clause_rows {
          insert_clause_row(&tx, cl)?;
        }
        tx.commit()?;
        Ok(false)
      })
      .await?;

    if taken {
      return Err(Error::DuplicateContractNumber(number));
    }
    Ok(built)
  }

  async fn get_contract(&self, id: Uuid) -> Result<Option<Contract>> {
    self.fetch_contract(encode_uuid(id)).await
  }

  async fn get_contract_by_number(
    &self,
    number: &str,
  ) -> Result<Option<Contract>> {
    let number = number.to_owned();
    let raw: Option<RawContract> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {} FROM contracts WHERE contract_number = ?1",
                RawContract::COLUMNS
              ),
              rusqlite::params![number],
              RawContract::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawContract::into_contract).transpose()
  }

  async fn list_contracts(
    &self,
    query: &ContractQuery,
  ) -> Result<Page<Contract>> {
    let vendor_pattern = query.vendor_name.as_deref().map(|v| format!("%{v}%"));
    let risk_str   = query.risk_level.map(encode_risk).map(str::to_owned);
    let status_str =
      query.compliance_status.map(encode_status).map(str::to_owned);
    let limit_val  = query.limit.unwrap_or(100) as i64;
    let offset_val = query.offset.unwrap_or(0) as i64;

    let (raws, total): (Vec<RawContract>, usize) = self
      .conn
      .call(move |conn| {
        let mut conds: Vec<&'static str> = vec![];
        let mut params: Vec<String> = vec![];
        if let Some(p) = &vendor_pattern {
          conds.push("vendor_name LIKE ?");
          params.push(p.clone());
        }
        if let Some(r) = &risk_str {
          conds.push("risk_level = ?");
          params.push(r.clone());
        }
        if let Some(s) = &status_str {
          conds.push("compliance_status = ?");
          params.push(s.clone());
        }

        let where_clause = if conds.is_empty() {
          String::new()
        } else {
          format!("WHERE {}", conds.join(" AND "))
        };

        let total: i64 = conn.query_row(
          &format!("SELECT COUNT(*) FROM contracts {where_clause}"),
          rusqlite::params_from_iter(params.iter()),
          |r| r.get(0),
        )?;

        let sql = format!(
          "SELECT {} FROM contracts {where_clause}
           ORDER BY created_at DESC
           LIMIT {limit_val} OFFSET {offset_val}",
          RawContract::COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params_from_iter(params.iter()),
            RawContract::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((rows, total as usize))
      })
      .await?;

    let items = raws
      .into_iter()
      .map(RawContract::into_contract)
      .collect::<Result<Vec<_>>>()?;
    Ok(Page { items, total })
  }

  async fn update_contract(
    &self,
    id: Uuid,
    update: ContractUpdate,
  ) -> Result<Contract> {
    let id_str = encode_uuid(id);
    let now_str = encode_dt(Utc::now());

    let changed: usize = self
      .conn
      .call(move |conn| {
        let mut sets: Vec<&'static str> = vec!["updated_at = ?"];
        let mut params: Vec<Box<dyn rusqlite::ToSql + Send>> =
          vec![Box::new(now_str)];

        if let Some(v) = update.vendor_name {
          sets.push("vendor_name = ?");
          params.push(Box::new(v));
        }
        if let Some(v) = update.title {
          sets.push("title = ?");
          params.push(Box::new(v));
        }
        if let Some(v) = update.start_date {
          sets.push("start_date = ?");
          params.push(Box::new(encode_date(v)));
        }
        if let Some(v) = update.end_date {
          sets.push("end_date = ?");
          params.push(Box::new(encode_date(v)));
        }
        if let Some(v) = update.renewal_date {
          sets.push("renewal_date = ?");
          params.push(Box::new(encode_date(v)));
        }
        if let Some(v) = update.contract_value {
          sets.push("contract_value = ?");
          params.push(Box::new(v));
        }
        if let Some(v) = update.currency {
          sets.push("currency = ?");
          params.push(Box::new(v));
        }
        if let Some(v) = update.risk_level {
          sets.push("risk_level = ?");
          params.push(Box::new(encode_risk(v).to_owned()));
        }
        if let Some(v) = update.compliance_status {
          sets.push("compliance_status = ?");
          params.push(Box::new(encode_status(v).to_owned()));
        }
        if let Some(v) = update.last_audit_date {
          sets.push("last_audit_date = ?");
          params.push(Box::new(encode_dt(v)));
        }
        if let Some(v) = update.next_audit_date {
          sets.push("next_audit_date = ?");
          params.push(Box::new(encode_dt(v)));
        }

        params.push(Box::new(id_str));
        let sql = format!(
          "UPDATE contracts SET {} WHERE contract_id = ?",
          sets.join(", ")
        );
        let changed = conn.execute(
          &sql,
          rusqlite::params_from_iter(params.iter().map(|p| p.as_ref())),
        )?;
        Ok(changed)
      })
      .await?;

    if changed == 0 {
      return Err(Error::ContractNotFound(id));
    }
    self
      .fetch_contract(encode_uuid(id))
      .await?
      .ok_or(Error::ContractNotFound(id))
  }

  async fn delete_contract(&self, id: Uuid) -> Result<()> {
    let id_str = encode_uuid(id);
    let changed: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM contracts WHERE contract_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;
    if changed == 0 {
      return Err(Error::ContractNotFound(id));
    }
    Ok(())
  }

  async fn contracts_by_owner(&self, owner_id: Uuid) -> Result<Vec<Contract>> {
    self
      .select_contracts("owner_id = ?1", vec![encode_uuid(owner_id)])
      .await
  }

  // ── Rule selects ──────────────────────────────────────────────────────────

  async fn contracts_ending_on(&self, date: NaiveDate) -> Result<Vec<Contract>> {
    self
      .select_contracts("end_date = ?1", vec![encode_date(date)])
      .await
  }

  async fn contracts_with_audit_due_within(
    &self,
    now: DateTime<Utc>,
    horizon: Duration,
  ) -> Result<Vec<Contract>> {
    // RFC 3339 UTC strings compare lexicographically in timestamp order.
    self
      .select_contracts(
        "next_audit_date IS NOT NULL
           AND next_audit_date >= ?1
           AND next_audit_date <= ?2",
        vec![encode_dt(now), encode_dt(now + horizon)],
      )
      .await
  }

  async fn contracts_by_risk_and_status(
    &self,
    risk: RiskLevel,
    status: ComplianceStatus,
  ) -> Result<Vec<Contract>> {
    self
      .select_contracts(
        "risk_level = ?1 AND compliance_status = ?2",
        vec![encode_risk(risk).to_owned(), encode_status(status).to_owned()],
      )
      .await
  }

  // ── Clauses ───────────────────────────────────────────────────────────────

  async fn insert_clauses(&self, clauses: Vec<NewClause>) -> Result<Vec<Clause>> {
    let now = Utc::now();
    let built: Vec<Clause> =
      clauses.into_iter().map(|cl| build_clause(cl, now)).collect();

    let rows = built.clone();
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        for cl in &rows {
          insert_clause_row(&tx, cl)?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok(built)
  }

  async fn get_clause(&self, id: Uuid) -> Result<Option<Clause>> {
    self.fetch_clause(encode_uuid(id)).await
  }

  async fn list_clauses(&self, query: &ClauseQuery) -> Result<Page<Clause>> {
    let contract_str = query.contract_id.map(encode_uuid);
    let type_str =
      query.clause_type.map(encode_clause_type).map(str::to_owned);
    let risk_str = query.risk_assessment.map(encode_risk).map(str::to_owned);
    let action = query.action_required;
    let limit_val = query.limit.unwrap_or(100) as i64;
    let offset_val = query.offset.unwrap_or(0) as i64;

    let (raws, total): (Vec<RawClause>, usize) = self
      .conn
      .call(move |conn| {
        let mut conds: Vec<&'static str> = vec![];
        let mut params: Vec<String> = vec![];
        if let Some(c) = &contract_str {
          conds.push("contract_id = ?");
          params.push(c.clone());
        }
        if let Some(t) = &type_str {
          conds.push("clause_type = ?");
          params.push(t.clone());
        }
        if let Some(r) = &risk_str {
          conds.push("risk_assessment = ?");
          params.push(r.clone());
        }
        if let Some(a) = action {
          conds.push("action_required = ?");
          params.push(if a { "1".into() } else { "0".into() });
        }

        let where_clause = if conds.is_empty() {
          String::new()
        } else {
          format!("WHERE {}", conds.join(" AND "))
        };

        let total: i64 = conn.query_row(
          &format!("SELECT COUNT(*) FROM clauses {where_clause}"),
          rusqlite::params_from_iter(params.iter()),
          |r| r.get(0),
        )?;

        let sql = format!(
          "SELECT {} FROM clauses {where_clause}
           ORDER BY CASE risk_assessment
                      WHEN 'high' THEN 1
                      WHEN 'medium' THEN 2
                      WHEN 'low' THEN 3
                      ELSE 4
                    END,
                    detected_at DESC
           LIMIT {limit_val} OFFSET {offset_val}",
          RawClause::COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params_from_iter(params.iter()),
            RawClause::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((rows, total as usize))
      })
      .await?;

    let items = raws
      .into_iter()
      .map(RawClause::into_clause)
      .collect::<Result<Vec<_>>>()?;
    Ok(Page { items, total })
  }

  async fn update_clause(
    &self,
    id: Uuid,
    update: ClauseUpdate,
  ) -> Result<Clause> {
    let id_str = encode_uuid(id);

    let changed: usize = self
      .conn
      .call(move |conn| {
        let mut sets: Vec<&'static str> = vec![];
        let mut params: Vec<Box<dyn rusqlite::ToSql + Send>> = vec![];

        if let Some(v) = update.title {
          sets.push("title = ?");
          params.push(Box::new(v));
        }
        if let Some(v) = update.summary {
          sets.push("summary = ?");
          params.push(Box::new(v));
        }
        if let Some(v) = update.compliance_requirement {
          sets.push("compliance_requirement = ?");
          params.push(Box::new(v));
        }
        if let Some(v) = update.risk_assessment {
          sets.push("risk_assessment = ?");
          params.push(Box::new(encode_risk(v).to_owned()));
        }
        if let Some(v) = update.action_required {
          sets.push("action_required = ?");
          params.push(Box::new(v));
        }
        if let Some(v) = update.action_deadline {
          sets.push("action_deadline = ?");
          params.push(Box::new(encode_date(v)));
        }

        if sets.is_empty() {
          // Nothing to change; report one affected row so the caller
          // falls through to the fetch.
          return Ok(1);
        }

        params.push(Box::new(id_str));
        let sql = format!(
          "UPDATE clauses SET {} WHERE clause_id = ?",
          sets.join(", ")
        );
        let changed = conn.execute(
          &sql,
          rusqlite::params_from_iter(params.iter().map(|p| p.as_ref())),
        )?;
        Ok(changed)
      })
      .await?;

    if changed == 0 {
      return Err(Error::ClauseNotFound(id));
    }
    self
      .fetch_clause(encode_uuid(id))
      .await?
      .ok_or(Error::ClauseNotFound(id))
  }

  async fn review_clause(
    &self,
    id: Uuid,
    reviewer: Uuid,
    at: DateTime<Utc>,
  ) -> Result<Clause> {
    let id_str       = encode_uuid(id);
    let reviewer_str = encode_uuid(reviewer);
    let at_str       = encode_dt(at);

    let changed: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE clauses
           SET reviewed = 1, reviewed_by = ?1, reviewed_at = ?2
           WHERE clause_id = ?3",
          rusqlite::params![reviewer_str, at_str, id_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::ClauseNotFound(id));
    }
    self
      .fetch_clause(encode_uuid(id))
      .await?
      .ok_or(Error::ClauseNotFound(id))
  }

  // ── Alerts ────────────────────────────────────────────────────────────────

  async fn create_alert(&self, input: NewAlert) -> Result<Alert> {
    let alert = Alert {
      alert_id:        Uuid::new_v4(),
      contract_id:     input.contract_id,
      alert_type:      input.alert_type,
      severity:        input.severity,
      title:           input.title,
      message:         input.message,
      trigger_date:    input.trigger_date,
      is_active:       true,
      is_sent:         false,
      sent_at:         None,
      acknowledged:    false,
      acknowledged_by: None,
      acknowledged_at: None,
      created_at:      Utc::now(),
    };

    let id_str       = encode_uuid(alert.alert_id);
    let contract_str = encode_uuid(alert.contract_id);
    let type_str     = encode_alert_type(alert.alert_type).to_owned();
    let sev_str      = encode_severity(alert.severity).to_owned();
    let title        = alert.title.clone();
    let message      = alert.message.clone();
    let trigger_str  = encode_dt(alert.trigger_date);
    let created_str  = encode_dt(alert.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO alerts (
             alert_id, contract_id, alert_type, severity, title, message,
             trigger_date, is_active, is_sent, acknowledged, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1, 0, 0, ?8)",
          rusqlite::params![
            id_str,
            contract_str,
            type_str,
            sev_str,
            title,
            message,
            trigger_str,
            created_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(alert)
  }

  async fn get_alert(&self, id: Uuid) -> Result<Option<Alert>> {
    self.fetch_alert(encode_uuid(id)).await
  }

  async fn list_alerts(&self, query: &AlertQuery) -> Result<Page<Alert>> {
    let active       = query.is_active;
    let type_str     = query.alert_type.map(encode_alert_type).map(str::to_owned);
    let sev_str      = query.severity.map(encode_severity).map(str::to_owned);
    let acknowledged = query.acknowledged;
    let limit_val    = query.limit.unwrap_or(100) as i64;
    let offset_val   = query.offset.unwrap_or(0) as i64;

    let (raws, total): (Vec<RawAlert>, usize) = self
      .conn
      .call(move |conn| {
        let mut conds: Vec<&'static str> = vec![];
        let mut params: Vec<String> = vec![];
        if let Some(a) = active {
          conds.push("is_active = ?");
          params.push(if a { "1".into() } else { "0".into() });
        }
        if let Some(t) = &type_str {
          conds.push("alert_type = ?");
          params.push(t.clone());
        }
        if let Some(s) = &sev_str {
          conds.push("severity = ?");
          params.push(s.clone());
        }
        if let Some(a) = acknowledged {
          conds.push("acknowledged = ?");
          params.push(if a { "1".into() } else { "0".into() });
        }

        let where_clause = if conds.is_empty() {
          String::new()
        } else {
          format!("WHERE {}", conds.join(" AND "))
        };

        let total: i64 = conn.query_row(
          &format!("SELECT COUNT(*) FROM alerts {where_clause}"),
          rusqlite::params_from_iter(params.iter()),
          |r| r.get(0),
        )?;

        let sql = format!(
          "SELECT {} FROM alerts {where_clause}
           ORDER BY CASE severity
                      WHEN 'critical' THEN 1
                      WHEN 'high' THEN 2
                      WHEN 'medium' THEN 3
                      WHEN 'low' THEN 4
                      ELSE 5
                    END,
                    trigger_date DESC
           LIMIT {limit_val} OFFSET {offset_val}",
          RawAlert::COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params_from_iter(params.iter()),
            RawAlert::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((rows, total as usize))
      })
      .await?;

    let items = raws
      .into_iter()
      .map(RawAlert::into_alert)
      .collect::<Result<Vec<_>>>()?;
    Ok(Page { items, total })
  }

  async fn alerts_for_contract(&self, contract_id: Uuid) -> Result<Vec<Alert>> {
    let id_str = encode_uuid(contract_id);
    let raws: Vec<RawAlert> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM alerts WHERE contract_id = ?1
           ORDER BY trigger_date DESC",
          RawAlert::COLUMNS
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawAlert::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawAlert::into_alert).collect()
  }

  async fn alert_exists_on_day(
    &self,
    contract_id: Uuid,
    alert_type: AlertType,
    day: NaiveDate,
  ) -> Result<bool> {
    let contract_str = encode_uuid(contract_id);
    let type_str     = encode_alert_type(alert_type).to_owned();
    let day_str      = encode_date(day);

    let exists: bool = self
      .conn
      .call(move |conn| {
        // trigger_date is RFC 3339, so its first 10 bytes are the UTC day.
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM alerts
               WHERE contract_id = ?1
                 AND alert_type = ?2
                 AND substr(trigger_date, 1, 10) = ?3",
              rusqlite::params![contract_str, type_str, day_str],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false),
        )
      })
      .await?;
    Ok(exists)
  }

  async fn unsent_due_alerts(&self, now: DateTime<Utc>) -> Result<Vec<Alert>> {
    let now_str = encode_dt(now);
    let raws: Vec<RawAlert> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM alerts
           WHERE is_active = 1 AND is_sent = 0 AND trigger_date <= ?1
           ORDER BY trigger_date",
          RawAlert::COLUMNS
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![now_str], RawAlert::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawAlert::into_alert).collect()
  }

  async fn mark_alert_sent(&self, id: Uuid, at: DateTime<Utc>) -> Result<Alert> {
    let id_str = encode_uuid(id);
    let at_str = encode_dt(at);

    let changed: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE alerts SET is_sent = 1, sent_at = ?1 WHERE alert_id = ?2",
          rusqlite::params![at_str, id_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::AlertNotFound(id));
    }
    self
      .fetch_alert(encode_uuid(id))
      .await?
      .ok_or(Error::AlertNotFound(id))
  }

  async fn acknowledge_alert(
    &self,
    id: Uuid,
    user_id: Uuid,
    at: DateTime<Utc>,
  ) -> Result<Alert> {
    let existing = self
      .fetch_alert(encode_uuid(id))
      .await?
      .ok_or(Error::AlertNotFound(id))?;

    // Acknowledgment is one-way; a second acknowledge is a no-op.
    if existing.acknowledged {
      return Ok(existing);
    }

    let id_str   = encode_uuid(id);
    let user_str = encode_uuid(user_id);
    let at_str   = encode_dt(at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE alerts
           SET acknowledged = 1, acknowledged_by = ?1, acknowledged_at = ?2
           WHERE alert_id = ?3",
          rusqlite::params![user_str, at_str, id_str],
        )?;
        Ok(())
      })
      .await?;

    self
      .fetch_alert(encode_uuid(id))
      .await?
      .ok_or(Error::AlertNotFound(id))
  }

  async fn dismiss_alert(&self, id: Uuid) -> Result<Alert> {
    let id_str = encode_uuid(id);
    let changed: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE alerts SET is_active = 0 WHERE alert_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::AlertNotFound(id));
    }
    self
      .fetch_alert(encode_uuid(id))
      .await?
      .ok_or(Error::AlertNotFound(id))
  }

  async fn deactivate_acknowledged_before(
    &self,
    cutoff: DateTime<Utc>,
  ) -> Result<usize> {
    let cutoff_str = encode_dt(cutoff);
    let changed: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE alerts SET is_active = 0
           WHERE is_active = 1
             AND acknowledged = 1
             AND acknowledged_at < ?1",
          rusqlite::params![cutoff_str],
        )?)
      })
      .await?;
    Ok(changed)
  }

  async fn active_alert_counts(&self) -> Result<AlertCounts> {
    let pairs: Vec<(String, i64)> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT severity, COUNT(*) FROM alerts
           WHERE is_active = 1 AND acknowledged = 0
           GROUP BY severity",
        )?;
        let rows = stmt
          .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let mut counts = AlertCounts::default();
    for (severity, n) in pairs {
      let n = n as usize;
      counts.total += n;
      match severity.as_str() {
        "critical" => counts.critical = n,
        "high" => counts.high = n,
        "medium" => counts.medium = n,
        "low" => counts.low = n,
        _ => {}
      }
    }
    Ok(counts)
  }

  // ── Audit log ─────────────────────────────────────────────────────────────

  async fn append_audit_log(&self, input: NewAuditLog) -> Result<AuditLog> {
    let log = AuditLog {
      log_id:        Uuid::new_v4(),
      user_id:       input.user_id,
      contract_id:   input.contract_id,
      action:        input.action,
      resource_type: input.resource_type,
      resource_id:   input.resource_id,
      details:       input.details,
      ip_address:    input.ip_address,
      user_agent:    input.user_agent,
      timestamp:     Utc::now(),
    };

    let id_str        = encode_uuid(log.log_id);
    let user_str      = encode_uuid(log.user_id);
    let contract_str  = log.contract_id.map(encode_uuid);
    let action        = log.action.clone();
    let resource_type = log.resource_type.clone();
    let resource_str  = log.resource_id.map(encode_uuid);
    let details_str   = serde_json::to_string(&log.details)?;
    let ip            = log.ip_address.clone();
    let agent         = log.user_agent.clone();
    let at_str        = encode_dt(log.timestamp);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO audit_logs (
             log_id, user_id, contract_id, action, resource_type,
             resource_id, details, ip_address, user_agent, timestamp
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
          rusqlite::params![
            id_str,
            user_str,
            contract_str,
            action,
            resource_type,
            resource_str,
            details_str,
            ip,
            agent,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(log)
  }

  async fn list_audit_logs(&self, limit: usize) -> Result<Vec<AuditLog>> {
    let limit_val = limit as i64;
    let raws: Vec<RawAuditLog> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM audit_logs ORDER BY timestamp DESC LIMIT {limit_val}",
          RawAuditLog::COLUMNS
        ))?;
        let rows = stmt
          .query_map([], RawAuditLog::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawAuditLog::into_audit_log).collect()
  }

  // ── Reporting aggregates ──────────────────────────────────────────────────

  async fn contract_status_counts(&self) -> Result<ContractStatusCounts> {
    let (risk_pairs, status_pairs): (Vec<(String, i64)>, Vec<(String, i64)>) =
      self
        .conn
        .call(|conn| {
          let mut stmt = conn.prepare(
            "SELECT risk_level, COUNT(*) FROM contracts GROUP BY risk_level",
          )?;
          let risks = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

          let mut stmt = conn.prepare(
            "SELECT compliance_status, COUNT(*) FROM contracts
             GROUP BY compliance_status",
          )?;
          let statuses = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

          Ok((risks, statuses))
        })
        .await?;

    let mut counts = ContractStatusCounts::default();
    for (risk, n) in risk_pairs {
      let n = n as usize;
      counts.total += n;
      match risk.as_str() {
        "low" => counts.low_risk = n,
        "medium" => counts.medium_risk = n,
        "high" => counts.high_risk = n,
        _ => {}
      }
    }
    for (status, n) in status_pairs {
      let n = n as usize;
      match status.as_str() {
        "pending" => counts.pending = n,
        "compliant" => counts.compliant = n,
        "non_compliant" => counts.non_compliant = n,
        "review_required" => counts.review_required = n,
        _ => {}
      }
    }
    Ok(counts)
  }

  async fn count_action_required_clauses(&self) -> Result<usize> {
    let n: i64 = self
      .conn
      .call(|conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM clauses WHERE action_required = 1",
          [],
          |r| r.get(0),
        )?)
      })
      .await?;
    Ok(n as usize)
  }
}
