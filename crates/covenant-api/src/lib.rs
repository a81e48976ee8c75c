//! JSON REST API for Covenant.
//!
//! Exposes an axum [`Router`] backed by any
//! [`covenant_core::store::ComplianceStore`], with the analyzer and
//! extractor injected as capabilities. Auth, TLS, and transport concerns
//! are the caller's responsibility; the acting user is supplied
//! per-request.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", covenant_api::api_router(state))
//! ```

pub mod alerts;
pub mod chat;
pub mod clauses;
pub mod contracts;
pub mod error;
pub mod reports;


use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, post},
};
use covenant_ai::{CompletionClient, ContractAnalyzer};
use covenant_core::{audit::NewAuditLog, store::ComplianceStore};
use covenant_extract::{OcrClient, TextExtractor};

pub use error::ApiError;

/// Shared handler state: the store plus the document capabilities.
///
/// The analyzer is optional; endpoints that need it answer 503 when it is
/// absent, and uploads degrade to persisting without clauses.
pub struct ApiState<S, C: CompletionClient, O: OcrClient> {
  pub store:      Arc<S>,
  pub analyzer:   Option<Arc<ContractAnalyzer<C>>>,
  pub extractor:  Arc<TextExtractor<O>>,
  pub upload_dir: PathBuf,
}

impl<S, C: CompletionClient, O: OcrClient> Clone for ApiState<S, C, O> {
  fn clone(&self) -> Self {
    Self {
      store:      Arc::clone(&self.store),
      analyzer:   self.analyzer.clone(),
      extractor:  Arc::clone(&self.extractor),
      upload_dir: self.upload_dir.clone(),
    }
  }
}

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router
/// regardless of its own state type.
pub fn api_router<S, C, O>(state: ApiState<S, C, O>) -> Router<()>
where
  S: ComplianceStore + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
  C: CompletionClient + 'static,
  O: OcrClient + 'static,
{
  Router::new()
    // Contracts
    .route(
      "/contracts",
      get(contracts::list::<S, C, O>).post(contracts::upload::<S, C, O>),
    )
    .route(
      "/contracts/{id}",
      get(contracts::get_one::<S, C, O>)
        .put(contracts::update::<S, C, O>)
        .delete(contracts::delete_one::<S, C, O>),
    )
    .route("/contracts/{id}/audit", post(contracts::audit_one::<S, C, O>))
    .route("/contracts/{id}/alerts", get(alerts::for_contract::<S, C, O>))
    .route("/contracts/{id}/summary", get(chat::summary::<S, C, O>))
    // Clauses
    .route("/clauses", get(clauses::list::<S, C, O>))
    .route(
      "/clauses/{id}",
      get(clauses::get_one::<S, C, O>).put(clauses::update::<S, C, O>),
    )
    .route("/clauses/{id}/review", post(clauses::review::<S, C, O>))
    // Alerts
    .route("/alerts", get(alerts::list::<S, C, O>))
    .route("/alerts/active-count", get(alerts::active_count::<S, C, O>))
    .route("/alerts/{id}", get(alerts::get_one::<S, C, O>))
    .route(
      "/alerts/{id}/acknowledge",
      post(alerts::acknowledge::<S, C, O>),
    )
    .route("/alerts/{id}/dismiss", post(alerts::dismiss::<S, C, O>))
    // Reports and chat
    .route(
      "/reports/compliance-summary",
      get(reports::compliance_summary::<S, C, O>),
    )
    .route("/chat/ask", post(chat::ask::<S, C, O>))
    .with_state(state)
}

/// Append an audit-log row; failures are logged, never surfaced.
pub(crate) async fn record_audit<S>(store: &S, entry: NewAuditLog)
where
  S: ComplianceStore,
{
  if let Err(err) = store.append_audit_log(entry).await {
    tracing::warn!(error = %err, "failed to append audit log row");
  }
}
