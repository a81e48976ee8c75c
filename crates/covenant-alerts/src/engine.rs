//! The scheduled alert rules and the delivery sub-process.
//!
//! Every rule takes `now` from the caller, so runs are reproducible and
//! testable. Per-item failures are logged and isolated; one contract's
//! error never aborts the rest of a run.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use covenant_core::{
  alert::{Alert, AlertType, NewAlert, Severity},
  contract::{ComplianceStatus, Contract, RiskLevel},
  store::ComplianceStore,
};

use crate::mail::{
  alert_notification_body, audit_reminder_body, expiration_notice_body,
  EmailSender,
};

/// Expiration horizons probed per run, in days.
const EXPIRATION_HORIZONS: [i64; 3] = [30, 60, 90];
/// Audit alerts fire this many days ahead.
const AUDIT_ALERT_WINDOW_DAYS: i64 = 7;
/// Audits within this window are urgent.
const AUDIT_URGENT_DAYS: i64 = 3;
/// The high-risk sweep runs once a week on this day.
const HIGH_RISK_WEEKDAY: Weekday = Weekday::Mon;
/// Acknowledged alerts older than this are deactivated by cleanup.
const CLEANUP_AGE_DAYS: i64 = 90;
/// Digest lookahead for owned contracts with upcoming audits.
const DIGEST_AUDIT_WINDOW_DAYS: i64 = 30;

/// What one rule run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuleRun {
  pub created:     usize,
  pub skipped:     usize,
  pub emails_sent: usize,
  pub failures:    usize,
}

pub struct AlertEngine<S, M> {
  store:  S,
  mailer: M,
}

impl<S: ComplianceStore, M: EmailSender> AlertEngine<S, M> {
  pub fn new(store: S, mailer: M) -> Self {
    Self { store, mailer }
  }

  // ── Expiration ────────────────────────────────────────────────────────────

  /// For each horizon, alert on contracts ending exactly `horizon` days
  /// from today, once per day per contract, and notify the owner
  /// synchronously.
  pub async fn run_expiration_rule(
    &self,
    now: DateTime<Utc>,
  ) -> Result<RuleRun, S::Error> {
    let today = now.date_naive();
    let mut run = RuleRun::default();

    for horizon in EXPIRATION_HORIZONS {
      let target = today + Duration::days(horizon);
      let contracts = self.store.contracts_ending_on(target).await?;

      for contract in contracts {
        match self.expire_one(&contract, horizon, now, today).await {
          Ok(Expired::Created { email_sent }) => {
            run.created += 1;
            if email_sent {
              run.emails_sent += 1;
            }
          }
          Ok(Expired::AlreadyAlerted) => run.skipped += 1,
          Err(err) => {
            tracing::warn!(
              contract = %contract.contract_number,
              error = %err,
              "expiration rule failed for contract"
            );
            run.failures += 1;
          }
        }
      }
    }

    tracing::info!(?run, "expiration rule finished");
    Ok(run)
  }

  async fn expire_one(
    &self,
    contract: &Contract,
    horizon: i64,
    now: DateTime<Utc>,
    today: NaiveDate,
  ) -> Result<Expired, S::Error> {
    if self
      .store
      .alert_exists_on_day(contract.contract_id, AlertType::Expiration, today)
      .await?
    {
      return Ok(Expired::AlreadyAlerted);
    }

    let severity =
      if horizon <= 30 { Severity::High } else { Severity::Medium };
    let end_date = today + Duration::days(horizon);
    self
      .store
      .create_alert(NewAlert {
        contract_id:  contract.contract_id,
        alert_type:   AlertType::Expiration,
        severity,
        title:        format!("Contract expiring in {horizon} days"),
        message:      format!(
          "Contract {} with {} expires on {}.",
          contract.contract_number, contract.vendor_name, end_date
        ),
        trigger_date: now,
      })
      .await?;

    // Expiration notices go out immediately, outside the delivery loop.
    // A send failure is logged but never undoes the alert.
    let email_sent = match self.store.get_user(contract.owner_id).await? {
      Some(owner) => {
        self
          .mailer
          .send(
            &owner.email,
            &format!(
              "Contract Expiration Notice: {}",
              contract.contract_number
            ),
            &expiration_notice_body(contract, end_date, horizon),
          )
          .await
      }
      None => {
        tracing::warn!(
          contract = %contract.contract_number,
          "contract owner not found, skipping expiration notice"
        );
        false
      }
    };

    Ok(Expired::Created { email_sent })
  }

  // ── Audit due ─────────────────────────────────────────────────────────────

  /// Alert on contracts whose next audit falls within the next 7 days,
  /// once per day per contract.
  pub async fn run_audit_due_rule(
    &self,
    now: DateTime<Utc>,
  ) -> Result<RuleRun, S::Error> {
    let today = now.date_naive();
    let mut run = RuleRun::default();

    let contracts = self
      .store
      .contracts_with_audit_due_within(
        now,
        Duration::days(AUDIT_ALERT_WINDOW_DAYS),
      )
      .await?;

    for contract in contracts {
      let Some(next_audit) = contract.next_audit_date else {
        continue;
      };
      let result: Result<bool, S::Error> = async {
        if self
          .store
          .alert_exists_on_day(
            contract.contract_id,
            AlertType::AuditDue,
            today,
          )
          .await?
        {
          return Ok(false);
        }

        let days_until = (next_audit - now).num_days();
        let severity = if days_until <= AUDIT_URGENT_DAYS {
          Severity::High
        } else {
          Severity::Medium
        };
        self
          .store
          .create_alert(NewAlert {
            contract_id:  contract.contract_id,
            alert_type:   AlertType::AuditDue,
            severity,
            title:        "Compliance audit due".to_owned(),
            message:      format!(
              "Contract {} with {} has a compliance audit due in {} days.",
              contract.contract_number, contract.vendor_name, days_until
            ),
            trigger_date: now,
          })
          .await?;
        Ok(true)
      }
      .await;

      match result {
        Ok(true) => run.created += 1,
        Ok(false) => run.skipped += 1,
        Err(err) => {
          tracing::warn!(
            contract = %contract.contract_number,
            error = %err,
            "audit-due rule failed for contract"
          );
          run.failures += 1;
        }
      }
    }

    tracing::info!(?run, "audit-due rule finished");
    Ok(run)
  }

  // ── High risk weekly ──────────────────────────────────────────────────────

  /// Weekly sweep: every high-risk contract still pending review gets a
  /// high-severity alert. Runs only on Mondays; idempotence per day comes
  /// from the schedule, not from deduplication.
  pub async fn run_high_risk_rule(
    &self,
    now: DateTime<Utc>,
  ) -> Result<RuleRun, S::Error> {
    if now.weekday() != HIGH_RISK_WEEKDAY {
      return Ok(RuleRun::default());
    }

    let mut run = RuleRun::default();
    let contracts = self
      .store
      .contracts_by_risk_and_status(RiskLevel::High, ComplianceStatus::Pending)
      .await?;

    for contract in contracts {
      let created = self
        .store
        .create_alert(NewAlert {
          contract_id:  contract.contract_id,
          alert_type:   AlertType::HighRisk,
          severity:     Severity::High,
          title:        "High-risk contract pending review".to_owned(),
          message:      format!(
            "Contract {} with {} is classified high risk and has not been \
             reviewed.",
            contract.contract_number, contract.vendor_name
          ),
          trigger_date: now,
        })
        .await;

      match created {
        Ok(_) => run.created += 1,
        Err(err) => {
          tracing::warn!(
            contract = %contract.contract_number,
            error = %err,
            "high-risk rule failed for contract"
          );
          run.failures += 1;
        }
      }
    }

    tracing::info!(?run, "high-risk rule finished");
    Ok(run)
  }

  // ── Delivery ──────────────────────────────────────────────────────────────

  /// Deliver every active, unsent alert whose trigger date has passed.
  /// Delivery is at-least-once: the sent flag flips only after a
  /// successful send, so a crash between send and flip re-sends.
  pub async fn deliver_pending(
    &self,
    now: DateTime<Utc>,
  ) -> Result<RuleRun, S::Error> {
    let mut run = RuleRun::default();
    let due = self.store.unsent_due_alerts(now).await?;

    for alert in due {
      match self.deliver_one(&alert, now).await {
        Ok(true) => run.emails_sent += 1,
        Ok(false) => run.skipped += 1,
        Err(err) => {
          tracing::warn!(
            alert_id = %alert.alert_id,
            error = %err,
            "alert delivery failed"
          );
          run.failures += 1;
        }
      }
    }

    tracing::info!(?run, "delivery pass finished");
    Ok(run)
  }

  async fn deliver_one(
    &self,
    alert: &Alert,
    now: DateTime<Utc>,
  ) -> Result<bool, S::Error> {
    let Some(contract) = self.store.get_contract(alert.contract_id).await?
    else {
      // The contract is gone, so no recipient can ever exist. Deactivate
      // instead of retrying forever; is_sent stays false because nothing
      // was sent.
      tracing::warn!(
        alert_id = %alert.alert_id,
        "alert references a deleted contract, deactivating"
      );
      self.store.dismiss_alert(alert.alert_id).await?;
      return Ok(false);
    };
    let Some(owner) = self.store.get_user(contract.owner_id).await? else {
      tracing::warn!(
        alert_id = %alert.alert_id,
        "contract owner not found, deactivating alert"
      );
      self.store.dismiss_alert(alert.alert_id).await?;
      return Ok(false);
    };

    let delivered = self
      .mailer
      .send(
        &owner.email,
        &format!("Compliance Alert: {}", alert.title),
        &alert_notification_body(alert, &contract),
      )
      .await;
    if !delivered {
      // Left pending; the next pass retries.
      return Ok(false);
    }

    self.store.mark_alert_sent(alert.alert_id, now).await?;
    Ok(true)
  }

  // ── Cleanup ───────────────────────────────────────────────────────────────

  /// Deactivate alerts acknowledged more than 90 days ago. Terminal.
  pub async fn run_cleanup_rule(
    &self,
    now: DateTime<Utc>,
  ) -> Result<usize, S::Error> {
    let cutoff = now - Duration::days(CLEANUP_AGE_DAYS);
    let deactivated =
      self.store.deactivate_acknowledged_before(cutoff).await?;
    if deactivated > 0 {
      tracing::info!(deactivated, "cleanup deactivated stale alerts");
    }
    Ok(deactivated)
  }

  // ── Daily digest ──────────────────────────────────────────────────────────

  /// One audit-reminder email per active user owning contracts with an
  /// audit due in the next 30 days.
  pub async fn send_daily_digest(
    &self,
    now: DateTime<Utc>,
  ) -> Result<RuleRun, S::Error> {
    let horizon = now + Duration::days(DIGEST_AUDIT_WINDOW_DAYS);
    let mut run = RuleRun::default();

    for user in self.store.list_active_users().await? {
      let result: Result<bool, S::Error> = async {
        let owned = self.store.contracts_by_owner(user.user_id).await?;
        let upcoming: Vec<&Contract> = owned
          .iter()
          .filter(|c| {
            c.next_audit_date
              .is_some_and(|d| d >= now && d <= horizon)
          })
          .collect();
        if upcoming.is_empty() {
          return Ok(false);
        }

        Ok(
          self
            .mailer
            .send(
              &user.email,
              "Upcoming compliance audits",
              &audit_reminder_body(&user.username, &upcoming),
            )
            .await,
        )
      }
      .await;

      match result {
        Ok(true) => run.emails_sent += 1,
        Ok(false) => run.skipped += 1,
        Err(err) => {
          tracing::warn!(
            user = %user.username,
            error = %err,
            "daily digest failed for user"
          );
          run.failures += 1;
        }
      }
    }

    tracing::info!(?run, "daily digest finished");
    Ok(run)
  }
}

enum Expired {
  Created { email_sent: bool },
  AlreadyAlerted,
}
