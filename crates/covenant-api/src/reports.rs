//! Handler for `/reports/compliance-summary`.

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use covenant_ai::CompletionClient;
use covenant_core::store::{
  AlertCounts, ComplianceStore, ContractStatusCounts,
};
use covenant_extract::OcrClient;
use serde::Serialize;

use crate::{error::ApiError, ApiState};

#[derive(Debug, Serialize)]
pub struct ComplianceSummary {
  pub contracts:               ContractStatusCounts,
  pub action_required_clauses: usize,
  pub alerts:                  AlertCounts,
  pub generated_at:            DateTime<Utc>,
}

/// `GET /reports/compliance-summary` — the dashboard aggregates in one
/// response.
pub async fn compliance_summary<S, C, O>(
  State(state): State<ApiState<S, C, O>>,
) -> Result<Json<ComplianceSummary>, ApiError>
where
  S: ComplianceStore,
  S::Error: std::error::Error + Send + Sync + 'static,
  C: CompletionClient,
  O: OcrClient,
{
  let contracts =
    state.store.contract_status_counts().await.map_err(ApiError::store)?;
  let action_required_clauses = state
    .store
    .count_action_required_clauses()
    .await
    .map_err(ApiError::store)?;
  let alerts =
    state.store.active_alert_counts().await.map_err(ApiError::store)?;

  Ok(Json(ComplianceSummary {
    contracts,
    action_required_clauses,
    alerts,
    generated_at: Utc::now(),
  }))
}
