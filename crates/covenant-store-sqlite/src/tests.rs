use chrono::{Duration, NaiveDate, Utc};
use covenant_core::{
  alert::{AlertType, NewAlert, Severity},
  audit::NewAuditLog,
  clause::{ClauseType, ClauseUpdate, NewClause, MAX_CLAUSE_CONTENT_LEN},
  contract::{ComplianceStatus, ContractUpdate, NewContract, RiskLevel},
  store::{AlertQuery, ClauseQuery, ComplianceStore, ContractQuery},
  user::{NewUser, Role, User},
};

use crate::{Error, SqliteStore};

async fn test_store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("failed to open in-memory store")
}

async fn seed_user(store: &SqliteStore) -> User {
  store
    .create_user(NewUser {
      username: "ava".to_owned(),
      email:    "ava@example.com".to_owned(),
      role:     Role::Auditor,
    })
    .await
    .expect("failed to create user")
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
  NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// ─── Contracts ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get_contract_roundtrips() {
  let store = test_store().await;
  let owner = seed_user(&store).await;

  let mut input = NewContract::new("CN-001", "Acme Corp", "MSA", owner.user_id);
  input.start_date = Some(date(2026, 1, 1));
  input.end_date = Some(date(2027, 1, 1));
  input.contract_value = Some(125_000.0);
  input.risk_level = RiskLevel::High;

  let created = store.create_contract(input).await.unwrap();
  assert_eq!(created.compliance_status, ComplianceStatus::Pending);
  assert!(created.last_audit_date.is_none());

  let fetched = store
    .get_contract(created.contract_id)
    .await
    .unwrap()
    .expect("contract missing");
  assert_eq!(fetched.contract_number, "CN-001");
  assert_eq!(fetched.vendor_name, "Acme Corp");
  assert_eq!(fetched.start_date, Some(date(2026, 1, 1)));
  assert_eq!(fetched.contract_value, Some(125_000.0));
  assert_eq!(fetched.risk_level, RiskLevel::High);
  assert_eq!(fetched.created_at, created.created_at);

  let by_number = store
    .get_contract_by_number("CN-001")
    .await
    .unwrap()
    .expect("lookup by number failed");
  assert_eq!(by_number.contract_id, created.contract_id);
}

#[tokio::test]
async fn duplicate_contract_number_is_rejected() {
  let store = test_store().await;
  let owner = seed_user(&store).await;

  store
    .create_contract(NewContract::new("CN-001", "Acme", "MSA", owner.user_id))
    .await
    .unwrap();

  let err = store
    .create_contract(NewContract::new("CN-001", "Other", "NDA", owner.user_id))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::DuplicateContractNumber(n) if n == "CN-001"));
}

#[tokio::test]
async fn contract_with_clauses_is_atomic_and_defaults_apply() {
  let store = test_store().await;
  let owner = seed_user(&store).await;

  let input = NewContract::new("CN-002", "Acme", "MSA", owner.user_id);
  let clauses = vec![
    NewClause::new(uuid::Uuid::nil(), "Payment terms", "Net 30."),
    NewClause::new(uuid::Uuid::nil(), "Long clause", "x".repeat(5000)),
  ];

  let contract = store
    .create_contract_with_clauses(input, clauses)
    .await
    .unwrap();

  let page = store
    .list_clauses(&ClauseQuery {
      contract_id: Some(contract.contract_id),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(page.total, 2);

  for clause in &page.items {
    // Clauses are re-pointed at the created contract.
    assert_eq!(clause.contract_id, contract.contract_id);
    assert_eq!(clause.clause_type, ClauseType::Other);
    assert_eq!(clause.risk_assessment, RiskLevel::Medium);
    assert!(!clause.action_required);
    assert!(!clause.reviewed);
    assert!(clause.content.chars().count() <= MAX_CLAUSE_CONTENT_LEN);
  }
}

#[tokio::test]
async fn list_contracts_filters_and_paginates() {
  let store = test_store().await;
  let owner = seed_user(&store).await;

  for i in 0..5 {
    let mut input = NewContract::new(
      format!("CN-{i:03}"),
      if i < 3 { "Acme Corp" } else { "Globex" },
      "MSA",
      owner.user_id,
    );
    input.risk_level =
      if i == 0 { RiskLevel::High } else { RiskLevel::Low };
    store.create_contract(input).await.unwrap();
  }

  let all = store.list_contracts(&ContractQuery::default()).await.unwrap();
  assert_eq!(all.total, 5);
  assert_eq!(all.items.len(), 5);

  let acme = store
    .list_contracts(&ContractQuery {
      vendor_name: Some("acme".to_owned()),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(acme.total, 3);

  let high = store
    .list_contracts(&ContractQuery {
      risk_level: Some(RiskLevel::High),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(high.total, 1);
  assert_eq!(high.items[0].contract_number, "CN-000");

  let window = store
    .list_contracts(&ContractQuery {
      limit: Some(2),
      offset: Some(4),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(window.total, 5);
  assert_eq!(window.items.len(), 1);
}

#[tokio::test]
async fn update_contract_is_partial_and_bumps_updated_at() {
  let store = test_store().await;
  let owner = seed_user(&store).await;
  let created = store
    .create_contract(NewContract::new("CN-001", "Acme", "MSA", owner.user_id))
    .await
    .unwrap();

  let updated = store
    .update_contract(created.contract_id, ContractUpdate {
      compliance_status: Some(ComplianceStatus::Compliant),
      ..Default::default()
    })
    .await
    .unwrap();

  assert_eq!(updated.compliance_status, ComplianceStatus::Compliant);
  assert_eq!(updated.vendor_name, "Acme");
  assert_eq!(updated.contract_number, "CN-001");
  assert!(updated.updated_at >= created.updated_at);

  let err = store
    .update_contract(uuid::Uuid::new_v4(), ContractUpdate::default())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::ContractNotFound(_)));
}

#[tokio::test]
async fn delete_contract_cascades_clauses_but_keeps_alerts() {
  let store = test_store().await;
  let owner = seed_user(&store).await;
  let contract = store
    .create_contract(NewContract::new("CN-001", "Acme", "MSA", owner.user_id))
    .await
    .unwrap();

  store
    .insert_clauses(vec![NewClause::new(
      contract.contract_id,
      "Penalty",
      "5% per late week.",
    )])
    .await
    .unwrap();
  let alert = store
    .create_alert(NewAlert {
      contract_id:  contract.contract_id,
      alert_type:   AlertType::Expiration,
      severity:     Severity::High,
      title:        "Contract expiring".to_owned(),
      message:      "expires soon".to_owned(),
      trigger_date: Utc::now(),
    })
    .await
    .unwrap();

  store.delete_contract(contract.contract_id).await.unwrap();

  assert!(store.get_contract(contract.contract_id).await.unwrap().is_none());
  let clauses = store
    .list_clauses(&ClauseQuery {
      contract_id: Some(contract.contract_id),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(clauses.total, 0);
  // Alerts reference without ownership and survive the delete.
  assert!(store.get_alert(alert.alert_id).await.unwrap().is_some());
}

#[tokio::test]
async fn rule_selects_match_their_windows() {
  let store = test_store().await;
  let owner = seed_user(&store).await;
  let now = Utc::now();

  let mut ending = NewContract::new("CN-001", "Acme", "MSA", owner.user_id);
  ending.end_date = Some(date(2026, 12, 1));
  store.create_contract(ending).await.unwrap();

  let mut other = NewContract::new("CN-002", "Acme", "NDA", owner.user_id);
  other.end_date = Some(date(2026, 12, 2));
  store.create_contract(other).await.unwrap();

  let hits = store.contracts_ending_on(date(2026, 12, 1)).await.unwrap();
  assert_eq!(hits.len(), 1);
  assert_eq!(hits[0].contract_number, "CN-001");

  let audited = store
    .create_contract(NewContract::new("CN-003", "Acme", "SOW", owner.user_id))
    .await
    .unwrap();
  store
    .update_contract(audited.contract_id, ContractUpdate {
      next_audit_date: Some(now + Duration::days(5)),
      ..Default::default()
    })
    .await
    .unwrap();

  let due = store
    .contracts_with_audit_due_within(now, Duration::days(7))
    .await
    .unwrap();
  assert_eq!(due.len(), 1);
  assert_eq!(due[0].contract_number, "CN-003");

  let due = store
    .contracts_with_audit_due_within(now, Duration::days(3))
    .await
    .unwrap();
  assert!(due.is_empty());
}

// ─── Clauses ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn clause_review_and_update() {
  let store = test_store().await;
  let owner = seed_user(&store).await;
  let contract = store
    .create_contract(NewContract::new("CN-001", "Acme", "MSA", owner.user_id))
    .await
    .unwrap();

  let inserted = store
    .insert_clauses(vec![NewClause::new(
      contract.contract_id,
      "Liability cap",
      "Capped at fees paid.",
    )])
    .await
    .unwrap();
  let clause_id = inserted[0].clause_id;

  let updated = store
    .update_clause(clause_id, ClauseUpdate {
      risk_assessment: Some(RiskLevel::High),
      action_required: Some(true),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(updated.risk_assessment, RiskLevel::High);
  assert!(updated.action_required);
  assert_eq!(updated.title, "Liability cap");

  let at = Utc::now();
  let reviewed = store
    .review_clause(clause_id, owner.user_id, at)
    .await
    .unwrap();
  assert!(reviewed.reviewed);
  assert_eq!(reviewed.reviewed_by, Some(owner.user_id));
  assert_eq!(reviewed.reviewed_at, Some(at));
}

#[tokio::test]
async fn clause_listing_orders_highest_risk_first() {
  let store = test_store().await;
  let owner = seed_user(&store).await;
  let contract = store
    .create_contract(NewContract::new("CN-001", "Acme", "MSA", owner.user_id))
    .await
    .unwrap();

  let mut low = NewClause::new(contract.contract_id, "Low", "a");
  low.risk_assessment = RiskLevel::Low;
  let mut high = NewClause::new(contract.contract_id, "High", "b");
  high.risk_assessment = RiskLevel::High;
  let medium = NewClause::new(contract.contract_id, "Medium", "c");
  store.insert_clauses(vec![low, high, medium]).await.unwrap();

  let page = store.list_clauses(&ClauseQuery::default()).await.unwrap();
  let titles: Vec<_> = page.items.iter().map(|c| c.title.as_str()).collect();
  assert_eq!(titles, vec!["High", "Medium", "Low"]);
}

// ─── Alerts ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn alert_lifecycle_send_then_acknowledge() {
  let store = test_store().await;
  let owner = seed_user(&store).await;
  let now = Utc::now();

  let alert = store
    .create_alert(NewAlert {
      contract_id:  uuid::Uuid::new_v4(),
      alert_type:   AlertType::AuditDue,
      severity:     Severity::High,
      title:        "Audit due".to_owned(),
      message:      "audit in 3 days".to_owned(),
      trigger_date: now,
    })
    .await
    .unwrap();
  assert!(alert.is_active);
  assert!(!alert.is_sent);
  assert!(!alert.acknowledged);

  let due = store.unsent_due_alerts(now).await.unwrap();
  assert_eq!(due.len(), 1);

  let sent = store.mark_alert_sent(alert.alert_id, now).await.unwrap();
  assert!(sent.is_sent);
  assert_eq!(sent.sent_at, Some(now));
  assert!(store.unsent_due_alerts(now).await.unwrap().is_empty());

  let acked = store
    .acknowledge_alert(alert.alert_id, owner.user_id, now)
    .await
    .unwrap();
  assert!(acked.acknowledged);
  assert_eq!(acked.acknowledged_by, Some(owner.user_id));

  // A second acknowledge keeps the original attribution.
  let other = seed_another_user(&store).await;
  let again = store
    .acknowledge_alert(alert.alert_id, other.user_id, Utc::now())
    .await
    .unwrap();
  assert_eq!(again.acknowledged_by, Some(owner.user_id));
  assert_eq!(again.acknowledged_at, Some(now));
}

async fn seed_another_user(store: &SqliteStore) -> User {
  store
    .create_user(NewUser {
      username: "ben".to_owned(),
      email:    "ben@example.com".to_owned(),
      role:     Role::Admin,
    })
    .await
    .unwrap()
}

#[tokio::test]
async fn future_alerts_are_not_due() {
  let store = test_store().await;
  let now = Utc::now();

  store
    .create_alert(NewAlert {
      contract_id:  uuid::Uuid::new_v4(),
      alert_type:   AlertType::Renewal,
      severity:     Severity::Medium,
      title:        "Renewal".to_owned(),
      message:      "renewal ahead".to_owned(),
      trigger_date: now + Duration::hours(1),
    })
    .await
    .unwrap();

  assert!(store.unsent_due_alerts(now).await.unwrap().is_empty());
}

#[tokio::test]
async fn alert_exists_on_day_scopes_by_type_and_day() {
  let store = test_store().await;
  let contract_id = uuid::Uuid::new_v4();
  let trigger = date(2026, 8, 29).and_hms_opt(9, 0, 0).unwrap().and_utc();

  store
    .create_alert(NewAlert {
      contract_id,
      alert_type: AlertType::Expiration,
      severity: Severity::High,
      title: "Expiring".to_owned(),
      message: "expires".to_owned(),
      trigger_date: trigger,
    })
    .await
    .unwrap();

  assert!(store
    .alert_exists_on_day(contract_id, AlertType::Expiration, date(2026, 8, 29))
    .await
    .unwrap());
  assert!(!store
    .alert_exists_on_day(contract_id, AlertType::Expiration, date(2026, 8, 30))
    .await
    .unwrap());
  assert!(!store
    .alert_exists_on_day(contract_id, AlertType::AuditDue, date(2026, 8, 29))
    .await
    .unwrap());
  assert!(!store
    .alert_exists_on_day(uuid::Uuid::new_v4(), AlertType::Expiration, date(2026, 8, 29))
    .await
    .unwrap());
}

#[tokio::test]
async fn cleanup_deactivates_only_stale_acknowledged_alerts() {
  let store = test_store().await;
  let owner = seed_user(&store).await;
  let now = Utc::now();

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

  let cutoff = now - Duration::days(90);
  let deactivated = store.deactivate_acknowledged_before(cutoff).await.unwrap();
  assert_eq!(deactivated, 1);

  let stale = store.get_alert(stale.alert_id).await.unwrap().unwrap();
  assert!(!stale.is_active);
  let fresh = store.get_alert(fresh.alert_id).await.unwrap().unwrap();
  assert!(fresh.is_active);

  // Re-running finds nothing new.
  assert_eq!(
    store.deactivate_acknowledged_before(cutoff).await.unwrap(),
    0
  );
}

#[tokio::test]
async fn alert_listing_orders_by_severity_and_counts_group() {
  let store = test_store().await;
  let now = Utc::now();

  for (severity, title) in [
    (Severity::Low, "low"),
    (Severity::Critical, "critical"),
    (Severity::Medium, "medium"),
    (Severity::High, "high"),
  ] {
    store
      .create_alert(NewAlert {
        contract_id:  uuid::Uuid::new_v4(),
        alert_type:   AlertType::NonCompliance,
        severity,
        title:        title.to_owned(),
        message:      "m".to_owned(),
        trigger_date: now,
      })
      .await
      .unwrap();
  }

  let page = store
    .list_alerts(&AlertQuery { is_active: Some(true), ..Default::default() })
    .await
    .unwrap();
  let titles: Vec<_> = page.items.iter().map(|a| a.title.as_str()).collect();
  assert_eq!(titles, vec!["critical", "high", "medium", "low"]);

  let counts = store.active_alert_counts().await.unwrap();
  assert_eq!(counts.total, 4);
  assert_eq!(counts.critical, 1);
  assert_eq!(counts.high, 1);
  assert_eq!(counts.medium, 1);
  assert_eq!(counts.low, 1);
}

#[tokio::test]
async fn dismiss_is_terminal() {
  let store = test_store().await;
  let alert = store
    .create_alert(NewAlert {
      contract_id:  uuid::Uuid::new_v4(),
      alert_type:   AlertType::Expiration,
      severity:     Severity::Medium,
      title:        "t".to_owned(),
      message:      "m".to_owned(),
      trigger_date: Utc::now(),
    })
    .await
    .unwrap();

  let dismissed = store.dismiss_alert(alert.alert_id).await.unwrap();
  assert!(!dismissed.is_active);

  let counts = store.active_alert_counts().await.unwrap();
  assert_eq!(counts.total, 0);
}

// ─── Audit log and reports ───────────────────────────────────────────────────

#[tokio::test]
async fn audit_log_appends_and_lists_newest_first() {
  let store = test_store().await;
  let owner = seed_user(&store).await;
  let contract_id = uuid::Uuid::new_v4();

  store
    .append_audit_log(NewAuditLog::new(owner.user_id, "upload"))
    .await
    .unwrap();
  store
    .append_audit_log(
      NewAuditLog::new(owner.user_id, "update")
        .resource("contract", contract_id)
        .details(serde_json::json!({ "field": "risk_level" })),
    )
    .await
    .unwrap();

  let logs = store.list_audit_logs(10).await.unwrap();
  assert_eq!(logs.len(), 2);
  assert_eq!(logs[0].action, "update");
  assert_eq!(logs[0].resource_type.as_deref(), Some("contract"));
  assert_eq!(logs[0].resource_id, Some(contract_id));
  assert_eq!(logs[0].details["field"], "risk_level");
  assert_eq!(logs[1].action, "upload");
  assert_eq!(logs[1].details, serde_json::Value::Null);

  let limited = store.list_audit_logs(1).await.unwrap();
  assert_eq!(limited.len(), 1);
}

#[tokio::test]
async fn report_aggregates_count_by_risk_and_status() {
  let store = test_store().await;
  let owner = seed_user(&store).await;

  for (i, risk) in
    [RiskLevel::High, RiskLevel::High, RiskLevel::Low].iter().enumerate()
  {
    let mut input =
      NewContract::new(format!("CN-{i}"), "Acme", "MSA", owner.user_id);
    input.risk_level = *risk;
    store.create_contract(input).await.unwrap();
  }

  let counts = store.contract_status_counts().await.unwrap();
  assert_eq!(counts.total, 3);
  assert_eq!(counts.high_risk, 2);
  assert_eq!(counts.low_risk, 1);
  assert_eq!(counts.medium_risk, 0);
  assert_eq!(counts.pending, 3);
  assert_eq!(counts.compliant, 0);

  assert_eq!(store.count_action_required_clauses().await.unwrap(), 0);
}

// ─── Row decoding ────────────────────────────────────────────────────────────

#[test]
fn unknown_enum_discriminants_name_the_field_and_value() {
  let err = crate::encode::decode_risk("weird").unwrap_err();
  assert!(matches!(
    err,
    Error::Core(covenant_core::Error::UnknownEnumValue {
      field: "risk_level",
      ..
    })
  ));
  assert!(err.to_string().contains("unknown enum value for risk_level"));
  assert!(err.to_string().contains("weird"));

  let err = crate::encode::decode_role("root").unwrap_err();
  assert!(err.to_string().contains("unknown enum value for role"));
  let err = crate::encode::decode_severity("fatal").unwrap_err();
  assert!(err.to_string().contains("unknown enum value for severity"));
}
