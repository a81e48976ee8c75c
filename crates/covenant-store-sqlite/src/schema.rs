//! SQL schema for the Covenant SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// The `alerts` table deliberately carries no uniqueness constraint on
/// (contract_id, alert_type, day) — deduplication is a best-effort probe in
/// the rule engine, and overlapping rule executions may insert duplicates.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id     TEXT PRIMARY KEY,
    username    TEXT NOT NULL UNIQUE,
    email       TEXT NOT NULL,
    role        TEXT NOT NULL,   -- 'admin' | 'auditor'
    is_active   INTEGER NOT NULL DEFAULT 1,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS contracts (
    contract_id       TEXT PRIMARY KEY,
    contract_number   TEXT NOT NULL UNIQUE,  -- immutable after creation
    vendor_name       TEXT NOT NULL,
    title             TEXT NOT NULL,
    original_filename TEXT NOT NULL,
    stored_filename   TEXT NOT NULL,
    extracted_text    TEXT,
    start_date        TEXT,                  -- ISO 8601 date
    end_date          TEXT,
    renewal_date      TEXT,
    contract_value    REAL,
    currency          TEXT NOT NULL DEFAULT 'USD',
    risk_level        TEXT NOT NULL DEFAULT 'medium',
    compliance_status TEXT NOT NULL DEFAULT 'pending',
    last_audit_date   TEXT,                  -- RFC 3339 UTC
    next_audit_date   TEXT,
    owner_id          TEXT NOT NULL REFERENCES users(user_id),
    created_at        TEXT NOT NULL,
    updated_at        TEXT NOT NULL
);

-- Clauses are owned by their contract and cascade-deleted with it.
CREATE TABLE IF NOT EXISTS clauses (
    clause_id              TEXT PRIMARY KEY,
    contract_id            TEXT NOT NULL
                             REFERENCES contracts(contract_id)
                             ON DELETE CASCADE,
    clause_type            TEXT NOT NULL,
    clause_subtype         TEXT,
    title                  TEXT NOT NULL,
    content                TEXT NOT NULL,
    summary                TEXT,
    compliance_requirement TEXT,
    risk_assessment        TEXT NOT NULL DEFAULT 'medium',
    action_required        INTEGER NOT NULL DEFAULT 0,
    action_deadline        TEXT,
    financial_amount       REAL,
    penalty_amount         REAL,
    penalty_trigger        TEXT,
    detected_at            TEXT NOT NULL,
    reviewed               INTEGER NOT NULL DEFAULT 0,
    reviewed_by            TEXT REFERENCES users(user_id),
    reviewed_at            TEXT
);

-- Alerts reference their contract without ownership; deleting a contract
-- leaves its alerts in place.
CREATE TABLE IF NOT EXISTS alerts (
    alert_id        TEXT PRIMARY KEY,
    contract_id     TEXT NOT NULL,
    alert_type      TEXT NOT NULL,
    severity        TEXT NOT NULL DEFAULT 'medium',
    title           TEXT NOT NULL,
    message         TEXT NOT NULL,
    trigger_date    TEXT NOT NULL,
    is_active       INTEGER NOT NULL DEFAULT 1,
    is_sent         INTEGER NOT NULL DEFAULT 0,
    sent_at         TEXT,
    acknowledged    INTEGER NOT NULL DEFAULT 0,
    acknowledged_by TEXT REFERENCES users(user_id),
    acknowledged_at TEXT,
    created_at      TEXT NOT NULL
);

-- Audit log rows are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS audit_logs (
    log_id        TEXT PRIMARY KEY,
    user_id       TEXT NOT NULL,
    contract_id   TEXT,
    action        TEXT NOT NULL,
    resource_type TEXT,
    resource_id   TEXT,
    details       TEXT NOT NULL DEFAULT 'null',  -- JSON
    ip_address    TEXT,
    user_agent    TEXT,
    timestamp     TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS contracts_end_date_idx   ON contracts(end_date);
CREATE INDEX IF NOT EXISTS contracts_next_audit_idx ON contracts(next_audit_date);
CREATE INDEX IF NOT EXISTS contracts_owner_idx      ON contracts(owner_id);
CREATE INDEX IF NOT EXISTS clauses_contract_idx     ON clauses(contract_id);
CREATE INDEX IF NOT EXISTS alerts_contract_type_idx ON alerts(contract_id, alert_type);
CREATE INDEX IF NOT EXISTS alerts_delivery_idx      ON alerts(is_active, is_sent, trigger_date);
CREATE INDEX IF NOT EXISTS audit_logs_time_idx      ON audit_logs(timestamp);

PRAGMA user_version = 1;
";
