use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};
use covenant_core::{
  alert::{AlertType, NewAlert, Severity},
  contract::{ComplianceStatus, ContractUpdate, NewContract, RiskLevel},
  store::{AlertQuery, ComplianceStore},
  user::{NewUser, Role, User},
};
use covenant_store_sqlite::SqliteStore;

use crate::{AlertEngine, EmailSender};

struct RecordingMailer {
  succeed: bool,
  sent:    Mutex<Vec<(String, String)>>,
}

impl RecordingMailer {
  fn new(succeed: bool) -> Arc<Self> {
    Arc::new(Self { succeed, sent: Mutex::new(vec![]) })
  }

  fn sent(&self) -> Vec<(String, String)> {
    self.sent.lock().unwrap().clone()
  }
}

impl EmailSender for RecordingMailer {
  async fn send<'a>(
    &'a self,
    recipient: &'a str,
    subject: &'a str,
    _html_body: &'a str,
  ) -> bool {
    if self.succeed {
      self
        .sent
        .lock()
        .unwrap()
        .push((recipient.to_owned(), subject.to_owned()));
    }
    self.succeed
  }
}

async fn setup(
  mailer_succeeds: bool,
) -> (SqliteStore, Arc<RecordingMailer>, AlertEngine<SqliteStore, Arc<RecordingMailer>>)
{
  let store = SqliteStore::open_in_memory().await.unwrap();
  let mailer = RecordingMailer::new(mailer_succeeds);
  let engine = AlertEngine::new(store.clone(), Arc::clone(&mailer));
  (store, mailer, engine)
}

async fn seed_owner(store: &SqliteStore) -> User {
  store
    .create_user(NewUser {
      username: "ava".to_owned(),
      email:    "ava@example.com".to_owned(),
      role:     Role::Auditor,
    })
    .await
    .unwrap()
}

/// A fixed Monday morning.
fn monday() -> DateTime<Utc> {
  Utc.with_ymd_and_hms(2026, 8, 31, 9, 0, 0).unwrap()
}

// ─── Expiration rule ─────────────────────────────────────────────────────────

#[tokio::test]
async fn expiration_rule_creates_one_high_alert_and_emails_owner() {
  let (store, mailer, engine) = setup(true).await;
  let owner = seed_owner(&store).await;
  let now = monday();

  let mut input = NewContract::new("CN-001", "Acme", "MSA", owner.user_id);
  input.end_date = Some(now.date_naive() + Duration::days(30));
  store.create_contract(input).await.unwrap();

  let run = engine.run_expiration_rule(now).await.unwrap();
  assert_eq!(run.created, 1);
  assert_eq!(run.emails_sent, 1);
  assert_eq!(run.failures, 0);

  let page = store.list_alerts(&AlertQuery::default()).await.unwrap();
  assert_eq!(page.total, 1);
  let alert = &page.items[0];
  assert_eq!(alert.alert_type, AlertType::Expiration);
  assert_eq!(alert.severity, Severity::High);

  let sent = mailer.sent();
  assert_eq!(sent.len(), 1);
  assert_eq!(sent[0].0, "ava@example.com");
  assert!(sent[0].1.contains("CN-001"));

  // Second run on the same day is a no-op.
  let run = engine.run_expiration_rule(now).await.unwrap();
  assert_eq!(run.created, 0);
  assert_eq!(run.skipped, 1);
  let page = store.list_alerts(&AlertQuery::default()).await.unwrap();
  assert_eq!(page.total, 1);
}

#[tokio::test]
async fn far_expiration_horizons_are_medium_severity() {
  let (store, _mailer, engine) = setup(true).await;
  let owner = seed_owner(&store).await;
  let now = monday();

  let mut input = NewContract::new("CN-001", "Acme", "MSA", owner.user_id);
  input.end_date = Some(now.date_naive() + Duration::days(60));
  store.create_contract(input).await.unwrap();

  engine.run_expiration_rule(now).await.unwrap();

  let page = store.list_alerts(&AlertQuery::default()).await.unwrap();
  assert_eq!(page.total, 1);
  assert_eq!(page.items[0].severity, Severity::Medium);
}

#[tokio::test]
async fn expiration_email_failure_still_creates_the_alert() {
  let (store, mailer, engine) = setup(false).await;
  let owner = seed_owner(&store).await;
  let now = monday();

  let mut input = NewContract::new("CN-001", "Acme", "MSA", owner.user_id);
  input.end_date = Some(now.date_naive() + Duration::days(30));
  store.create_contract(input).await.unwrap();

  let run = engine.run_expiration_rule(now).await.unwrap();
  assert_eq!(run.created, 1);
  assert_eq!(run.emails_sent, 0);
  assert!(mailer.sent().is_empty());
  let page = store.list_alerts(&AlertQuery::default()).await.unwrap();
  assert_eq!(page.total, 1);
}

// ─── Audit-due rule ──────────────────────────────────────────────────────────

#[tokio::test]
async fn audit_due_severity_tracks_urgency() {
  let (store, _mailer, engine) = setup(true).await;
  let owner = seed_owner(&store).await;
  let now = monday();

  let urgent = store
    .create_contract(NewContract::new("CN-001", "Acme", "MSA", owner.user_id))
    .await
    .unwrap();
  store
    .update_contract(urgent.contract_id, ContractUpdate {
      next_audit_date: Some(now + Duration::days(2)),
      ..Default::default()
    })
    .await
    .unwrap();

  let relaxed = store
    .create_contract(NewContract::new("CN-002", "Acme", "NDA", owner.user_id))
    .await
    .unwrap();
  store
    .update_contract(relaxed.contract_id, ContractUpdate {
      next_audit_date: Some(now + Duration::days(5)),
      ..Default::default()
    })
    .await
    .unwrap();

  let run = engine.run_audit_due_rule(now).await.unwrap();
  assert_eq!(run.created, 2);

  let urgent_alerts =
    store.alerts_for_contract(urgent.contract_id).await.unwrap();
  assert_eq!(urgent_alerts.len(), 1);
  assert_eq!(urgent_alerts[0].severity, Severity::High);
  assert_eq!(urgent_alerts[0].alert_type, AlertType::AuditDue);

  let relaxed_alerts =
    store.alerts_for_contract(relaxed.contract_id).await.unwrap();
  assert_eq!(relaxed_alerts[0].severity, Severity::Medium);

  // Same-day rerun deduplicates.
  let run = engine.run_audit_due_rule(now).await.unwrap();
  assert_eq!(run.created, 0);
  assert_eq!(run.skipped, 2);
}

// ─── High-risk rule ──────────────────────────────────────────────────────────

#[tokio::test]
async fn high_risk_rule_runs_only_on_monday() {
  let (store, _mailer, engine) = setup(true).await;
  let owner = seed_owner(&store).await;

  let mut input = NewContract::new("CN-001", "Acme", "MSA", owner.user_id);
  input.risk_level = RiskLevel::High;
  store.create_contract(input).await.unwrap();

  let tuesday = monday() + Duration::days(1);
  let run = engine.run_high_risk_rule(tuesday).await.unwrap();
  assert_eq!(run.created, 0);

  let run = engine.run_high_risk_rule(monday()).await.unwrap();
  assert_eq!(run.created, 1);

  let page = store.list_alerts(&AlertQuery::default()).await.unwrap();
  assert_eq!(page.items[0].alert_type, AlertType::HighRisk);
  assert_eq!(page.items[0].severity, Severity::High);
}

#[tokio::test]
async fn high_risk_rule_skips_reviewed_contracts() {
  let (store, _mailer, engine) = setup(true).await;
  let owner = seed_owner(&store).await;

  let mut input = NewContract::new("CN-001", "Acme", "MSA", owner.user_id);
  input.risk_level = RiskLevel::High;
  let contract = store.create_contract(input).await.unwrap();
  store
    .update_contract(contract.contract_id, ContractUpdate {
      compliance_status: Some(ComplianceStatus::Compliant),
      ..Default::default()
    })
    .await
    .unwrap();

  let run = engine.run_high_risk_rule(monday()).await.unwrap();
  assert_eq!(run.created, 0);
}

// ─── Delivery ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn delivery_sends_once_and_flips_sent_flag() {
  let (store, mailer, engine) = setup(true).await;
  let owner = seed_owner(&store).await;
  let now = monday();

  let contract = store
    .create_contract(NewContract::new("CN-001", "Acme", "MSA", owner.user_id))
    .await
    .unwrap();
  let alert = store
    .create_alert(NewAlert {
      contract_id:  contract.contract_id,
      alert_type:   AlertType::AuditDue,
      severity:     Severity::Medium,
      title:        "Compliance audit due".to_owned(),
      message:      "audit soon".to_owned(),
      trigger_date: now - Duration::hours(1),
    })
    .await
    .unwrap();

  let run = engine.deliver_pending(now).await.unwrap();
  assert_eq!(run.emails_sent, 1);

  let stored = store.get_alert(alert.alert_id).await.unwrap().unwrap();
  assert!(stored.is_sent);
  assert_eq!(stored.sent_at, Some(now));
  assert_eq!(mailer.sent().len(), 1);

  // Nothing left to deliver.
  let run = engine.deliver_pending(now).await.unwrap();
  assert_eq!(run.emails_sent, 0);
  assert_eq!(mailer.sent().len(), 1);
}

#[tokio::test]
async fn failed_delivery_leaves_the_alert_pending() {
  let (store, _mailer, engine) = setup(false).await;
  let owner = seed_owner(&store).await;
  let now = monday();

  let contract = store
    .create_contract(NewContract::new("CN-001", "Acme", "MSA", owner.user_id))
    .await
    .unwrap();
  let alert = store
    .create_alert(NewAlert {
      contract_id:  contract.contract_id,
      alert_type:   AlertType::HighRisk,
      severity:     Severity::High,
      title:        "t".to_owned(),
      message:      "m".to_owned(),
      trigger_date: now - Duration::hours(1),
    })
    .await
    .unwrap();

  let run = engine.deliver_pending(now).await.unwrap();
  assert_eq!(run.emails_sent, 0);

  let stored = store.get_alert(alert.alert_id).await.unwrap().unwrap();
  assert!(!stored.is_sent);
  assert!(stored.sent_at.is_none());
}

#[tokio::test]
async fn delivery_deactivates_alerts_for_deleted_contracts() {
  let (store, mailer, engine) = setup(true).await;
  let now = monday();

  let alert = store
    .create_alert(NewAlert {
      contract_id:  uuid::Uuid::new_v4(),
      alert_type:   AlertType::Expiration,
      severity:     Severity::Medium,
      title:        "t".to_owned(),
      message:      "m".to_owned(),
      trigger_date: now - Duration::hours(1),
    })
    .await
    .unwrap();

  let run = engine.deliver_pending(now).await.unwrap();
  assert_eq!(run.emails_sent, 0);
  assert!(mailer.sent().is_empty());

  // Deactivated rather than retried forever; the sent flag stays honest.
  let stored = store.get_alert(alert.alert_id).await.unwrap().unwrap();
  assert!(!stored.is_active);
  assert!(!stored.is_sent);
  assert!(stored.sent_at.is_none());

  // Out of the delivery queue for good.
  let run = engine.deliver_pending(now).await.unwrap();
  assert_eq!(run.emails_sent, 0);
  assert_eq!(run.skipped, 0);
}

// ─── Cleanup ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn cleanup_deactivates_alerts_acknowledged_over_90_days_ago() {
  let (store, _mailer, engine) = setup(true).await;
  let owner = seed_owner(&store).await;
  let now = monday();

  let stale = store
    .create_alert(NewAlert {
      contract_id:  uuid::Uuid::new_v4(),
      alert_type:   AlertType::HighRisk,
      severity:     Severity::High,
      title:        "stale".to_owned(),
      message:      "m".to_owned(),
      trigger_date: now,
    })
    .await
    .unwrap();
  let fresh = store
    .create_alert(NewAlert {
      contract_id:  uuid::Uuid::new_v4(),
      alert_type:   AlertType::HighRisk,
      severity:     Severity::High,
      title:        "fresh".to_owned(),
      message:      "m".to_owned(),
      trigger_date: now,
    })
    .await
    .unwrap();
  store
    .acknowledge_alert(stale.alert_id, owner.user_id, now - Duration::days(91))
    .await
    .unwrap();
  store
    .acknowledge_alert(fresh.alert_id, owner.user_id, now - Duration::days(89))
    .await
    .unwrap();

  let deactivated = engine.run_cleanup_rule(now).await.unwrap();
  assert_eq!(deactivated, 1);

  assert!(!store.get_alert(stale.alert_id).await.unwrap().unwrap().is_active);
  assert!(store.get_alert(fresh.alert_id).await.unwrap().unwrap().is_active);
}

// ─── Daily digest ────────────────────────────────────────────────────────────

#[tokio::test]
async fn digest_emails_owners_with_upcoming_audits() {
  let (store, mailer, engine) = setup(true).await;
  let owner = seed_owner(&store).await;
  let idle = store
    .create_user(NewUser {
      username: "ben".to_owned(),
      email:    "ben@example.com".to_owned(),
      role:     Role::Admin,
    })
    .await
    .unwrap();
  let now = monday();

  let contract = store
    .create_contract(NewContract::new("CN-001", "Acme", "MSA", owner.user_id))
    .await
    .unwrap();
  store
    .update_contract(contract.contract_id, ContractUpdate {
      next_audit_date: Some(now + Duration::days(10)),
      ..Default::default()
    })
    .await
    .unwrap();

  // An owned contract with a far-off audit does not trigger a digest.
  let far = store
    .create_contract(NewContract::new("CN-002", "Acme", "NDA", idle.user_id))
    .await
    .unwrap();
  store
    .update_contract(far.contract_id, ContractUpdate {
      next_audit_date: Some(now + Duration::days(45)),
      ..Default::default()
    })
    .await
    .unwrap();

  let run = engine.send_daily_digest(now).await.unwrap();
  assert_eq!(run.emails_sent, 1);

  let sent = mailer.sent();
  assert_eq!(sent.len(), 1);
  assert_eq!(sent[0].0, "ava@example.com");
}
