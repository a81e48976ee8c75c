//! Background interval loops driving the alert engine.
//!
//! Each rule runs on its own tokio task with its own cadence; a failed
//! run is logged and the loop keeps ticking. One loop dying never takes
//! the server down.

use std::{future::Future, sync::Arc, time::Duration};

use chrono::Utc;
use covenant_alerts::{AlertEngine, EmailSender, RuleRun};
use covenant_core::store::ComplianceStore;
use tokio::time::{self, MissedTickBehavior};

use crate::settings::ScheduleConfig;

/// Spawn the six scheduled loops: expiration, audit-due, high-risk,
/// delivery, cleanup, and the daily digest.
pub fn spawn_rule_loops<S, M>(
  engine: Arc<AlertEngine<S, M>>,
  schedule: &ScheduleConfig,
) where
  S: ComplianceStore + 'static,
  M: EmailSender + 'static,
{
  let e = Arc::clone(&engine);
  spawn_loop("expiration", hours(schedule.expiration_hours), move || {
    let e = Arc::clone(&e);
    async move {
      match e.run_expiration_rule(Utc::now()).await {
        Ok(run) => log_run("expiration", run),
        Err(err) => log_failure("expiration", &err),
      }
    }
  });

  let e = Arc::clone(&engine);
  spawn_loop("audit_due", hours(schedule.audit_hours), move || {
    let e = Arc::clone(&e);
    async move {
      match e.run_audit_due_rule(Utc::now()).await {
        Ok(run) => log_run("audit_due", run),
        Err(err) => log_failure("audit_due", &err),
      }
    }
  });

  // Ticks daily; the engine itself only acts on Mondays.
  let e = Arc::clone(&engine);
  spawn_loop("high_risk", hours(schedule.high_risk_hours), move || {
    let e = Arc::clone(&e);
    async move {
      match e.run_high_risk_rule(Utc::now()).await {
        Ok(run) => log_run("high_risk", run),
        Err(err) => log_failure("high_risk", &err),
      }
    }
  });

  let e = Arc::clone(&engine);
  spawn_loop("delivery", minutes(schedule.delivery_minutes), move || {
    let e = Arc::clone(&e);
    async move {
      match e.deliver_pending(Utc::now()).await {
        Ok(run) => log_run("delivery", run),
        Err(err) => log_failure("delivery", &err),
      }
    }
  });

  let e = Arc::clone(&engine);
  spawn_loop("cleanup", hours(schedule.cleanup_hours), move || {
    let e = Arc::clone(&e);
    async move {
      match e.run_cleanup_rule(Utc::now()).await {
        Ok(deactivated) => {
          tracing::info!(task = "cleanup", deactivated, "rule run finished");
        }
        Err(err) => log_failure("cleanup", &err),
      }
    }
  });

  let e = engine;
  spawn_loop("digest", hours(schedule.digest_hours), move || {
    let e = Arc::clone(&e);
    async move {
      match e.send_daily_digest(Utc::now()).await {
        Ok(run) => log_run("digest", run),
        Err(err) => log_failure("digest", &err),
      }
    }
  });
}

fn spawn_loop<F, Fut>(name: &'static str, period: Duration, tick: F)
where
  F: Fn() -> Fut + Send + 'static,
  Fut: Future<Output = ()> + Send,
{
  tokio::spawn(async move {
    let mut ticker = time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
      ticker.tick().await;
      tracing::debug!(task = name, "tick");
      tick().await;
    }
  });
}

fn log_run(task: &'static str, run: RuleRun) {
  tracing::info!(
    task,
    created = run.created,
    skipped = run.skipped,
    emails_sent = run.emails_sent,
    failures = run.failures,
    "rule run finished",
  );
}

fn log_failure(task: &'static str, err: &dyn std::error::Error) {
  tracing::error!(task, error = %err, "rule run failed");
}

fn hours(n: u64) -> Duration {
  Duration::from_secs(n * 3600)
}

fn minutes(n: u64) -> Duration {
  Duration::from_secs(n * 60)
}
