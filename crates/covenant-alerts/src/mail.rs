//! The [`EmailSender`] capability, an HTTP mail-relay implementation, and
//! the HTML bodies the engine sends.

use std::{future::Future, sync::Arc};

use chrono::NaiveDate;
use covenant_core::{alert::Alert, contract::Contract};
use serde::Serialize;

/// Capability to send one HTML email. Sending never errors; a failed
/// delivery is `false` and the caller decides whether to retry later.
pub trait EmailSender: Send + Sync {
  fn send<'a>(
    &'a self,
    recipient: &'a str,
    subject: &'a str,
    html_body: &'a str,
  ) -> impl Future<Output = bool> + Send + 'a;
}

impl<M: EmailSender> EmailSender for Arc<M> {
  async fn send<'a>(
    &'a self,
    recipient: &'a str,
    subject: &'a str,
    html_body: &'a str,
  ) -> bool {
    (**self).send(recipient, subject, html_body).await
  }
}

// ─── HTTP relay ──────────────────────────────────────────────────────────────

/// Posts messages as JSON to a mail-relay endpoint.
#[derive(Clone)]
pub struct HttpMailer {
  http:     reqwest::Client,
  endpoint: String,
  token:    String,
  from:     String,
}

impl HttpMailer {
  pub fn new(
    http: reqwest::Client,
    endpoint: String,
    token: String,
    from: String,
  ) -> Self {
    Self { http, endpoint, token, from }
  }
}

#[derive(Serialize)]
struct RelayMessage<'a> {
  from:      &'a str,
  to:        &'a str,
  subject:   &'a str,
  html_body: &'a str,
}

impl EmailSender for HttpMailer {
  async fn send<'a>(
    &'a self,
    recipient: &'a str,
    subject: &'a str,
    html_body: &'a str,
  ) -> bool {
    let message = RelayMessage {
      from: &self.from,
      to: recipient,
      subject,
      html_body,
    };
    let result = self
      .http
      .post(&self.endpoint)
      .bearer_auth(&self.token)
      .json(&message)
      .send()
      .await
      .and_then(|r| r.error_for_status());

    match result {
      Ok(_) => true,
      Err(err) => {
        tracing::warn!(error = %err, recipient, "mail relay send failed");
        false
      }
    }
  }
}

/// Stand-in sender for deployments without a mail relay. Every send is
/// reported as failed, so alerts stay queued for later delivery once a
/// relay is configured.
#[derive(Clone, Copy, Default)]
pub struct DisabledMailer;

impl EmailSender for DisabledMailer {
  async fn send<'a>(
    &'a self,
    recipient: &'a str,
    subject: &'a str,
    _html_body: &'a str,
  ) -> bool {
    tracing::debug!(recipient, subject, "mail disabled, message not sent");
    false
  }
}

// ─── HTML bodies ─────────────────────────────────────────────────────────────

pub fn alert_notification_body(alert: &Alert, contract: &Contract) -> String {
  format!(
    "<html><body>\
     <h2>{title}</h2>\
     <p>{message}</p>\
     <p><b>Contract:</b> {number} &mdash; {vendor}<br>\
     <b>Severity:</b> {severity:?}</p>\
     <p>Please review this alert in the compliance dashboard.</p>\
     </body></html>",
    title = alert.title,
    message = alert.message,
    number = contract.contract_number,
    vendor = contract.vendor_name,
    severity = alert.severity,
  )
}

pub fn expiration_notice_body(
  contract: &Contract,
  end_date: NaiveDate,
  days: i64,
) -> String {
  format!(
    "<html><body>\
     <h2>Contract Expiration Notice</h2>\
     <p>Contract <b>{number}</b> with <b>{vendor}</b> expires on \
     <b>{end_date}</b> ({days} days from now).</p>\
     <p>Review renewal options before the expiration date.</p>\
     </body></html>",
    number = contract.contract_number,
    vendor = contract.vendor_name,
  )
}

pub fn audit_reminder_body(username: &str, contracts: &[&Contract]) -> String {
  let rows: String = contracts
    .iter()
    .map(|c| {
      format!(
        "<li>{} &mdash; {} (audit due {})</li>",
        c.contract_number,
        c.vendor_name,
        c.next_audit_date
          .map(|d| d.date_naive().to_string())
          .unwrap_or_else(|| "unscheduled".to_owned()),
      )
    })
    .collect();
  format!(
    "<html><body>\
     <h2>Upcoming Compliance Audits</h2>\
     <p>Hello {username}, the following contracts you own have audits due \
     within 30 days:</p>\
     <ul>{rows}</ul>\
     </body></html>"
  )
}
