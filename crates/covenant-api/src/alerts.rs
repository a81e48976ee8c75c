//! Handlers for `/alerts` endpoints.
//!
//! Alerts are created only by the rule engine; the API reads them and
//! drives the handling axis (acknowledge, dismiss).

use axum::{
  Json,
  extract::{Path, Query, State},
};
use chrono::Utc;
use covenant_ai::CompletionClient;
use covenant_core::{
  alert::{Alert, AlertType, Severity},
  audit::NewAuditLog,
  store::{AlertCounts, AlertQuery, ComplianceStore, Page},
};
use covenant_extract::OcrClient;
use serde::Deserialize;
use uuid::Uuid;

use crate::{error::ApiError, record_audit, ApiState};

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub is_active:    Option<bool>,
  pub alert_type:   Option<AlertType>,
  pub severity:     Option<Severity>,
  pub acknowledged: Option<bool>,
  pub limit:        Option<usize>,
  pub offset:       Option<usize>,
}

/// `GET /alerts[?is_active=...][&alert_type=...][&severity=...]` — most
/// severe first.
pub async fn list<S, C, O>(
  State(state): State<ApiState<S, C, O>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Page<Alert>>, ApiError>
where
  S: ComplianceStore,
  S::Error: std::error::Error + Send + Sync + 'static,
  C: CompletionClient,
  O: OcrClient,
{
  let query = AlertQuery {
    is_active:    params.is_active,
    alert_type:   params.alert_type,
    severity:     params.severity,
    acknowledged: params.acknowledged,
    limit:        params.limit,
    offset:       params.offset,
  };
  let page =
    state.store.list_alerts(&query).await.map_err(ApiError::store)?;
  Ok(Json(page))
}

/// `GET /alerts/:id`
pub async fn get_one<S, C, O>(
  State(state): State<ApiState<S, C, O>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Alert>, ApiError>
where
  S: ComplianceStore,
  S::Error: std::error::Error + Send + Sync + 'static,
  C: CompletionClient,
  O: OcrClient,
{
  let alert = state
    .store
    .get_alert(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("alert {id} not found")))?;
  Ok(Json(alert))
}

#[derive(Debug, Deserialize)]
pub struct AcknowledgeBody {
  pub user_id: Uuid,
}

/// `POST /alerts/:id/acknowledge` — idempotent; a second acknowledge
/// returns the stored row unchanged.
pub async fn acknowledge<S, C, O>(
  State(state): State<ApiState<S, C, O>>,
  Path(id): Path<Uuid>,
  Json(body): Json<AcknowledgeBody>,
) -> Result<Json<Alert>, ApiError>
where
  S: ComplianceStore,
  S::Error: std::error::Error + Send + Sync + 'static,
  C: CompletionClient,
  O: OcrClient,
{
  state
    .store
    .get_alert(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("alert {id} not found")))?;

  let alert = state
    .store
    .acknowledge_alert(id, body.user_id, Utc::now())
    .await
    .map_err(ApiError::store)?;

  record_audit(
    state.store.as_ref(),
    NewAuditLog::new(body.user_id, "acknowledge").resource("alert", id),
  )
  .await;
  Ok(Json(alert))
}

#[derive(Debug, Deserialize)]
pub struct DismissBody {
  pub actor_id: Uuid,
}

/// `POST /alerts/:id/dismiss` — deactivation is terminal.
pub async fn dismiss<S, C, O>(
  State(state): State<ApiState<S, C, O>>,
  Path(id): Path<Uuid>,
  Json(body): Json<DismissBody>,
) -> Result<Json<Alert>, ApiError>
where
  S: ComplianceStore,
  S::Error: std::error::Error + Send + Sync + 'static,
  C: CompletionClient,
  O: OcrClient,
{
  state
    .store
    .get_alert(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("alert {id} not found")))?;

  let alert =
    state.store.dismiss_alert(id).await.map_err(ApiError::store)?;

  record_audit(
    state.store.as_ref(),
    NewAuditLog::new(body.actor_id, "dismiss").resource("alert", id),
  )
  .await;
  Ok(Json(alert))
}

/// `GET /alerts/active-count` — active unacknowledged counts by severity.
pub async fn active_count<S, C, O>(
  State(state): State<ApiState<S, C, O>>,
) -> Result<Json<AlertCounts>, ApiError>
where
  S: ComplianceStore,
  S::Error: std::error::Error + Send + Sync + 'static,
  C: CompletionClient,
  O: OcrClient,
{
  let counts =
    state.store.active_alert_counts().await.map_err(ApiError::store)?;
  Ok(Json(counts))
}

/// `GET /contracts/:id/alerts` — all alerts for one contract, newest
/// trigger first.
pub async fn for_contract<S, C, O>(
  State(state): State<ApiState<S, C, O>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Alert>>, ApiError>
where
  S: ComplianceStore,
  S::Error: std::error::Error + Send + Sync + 'static,
  C: CompletionClient,
  O: OcrClient,
{
  state
    .store
    .get_contract(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("contract {id} not found")))?;

  let alerts =
    state.store.alerts_for_contract(id).await.map_err(ApiError::store)?;
  Ok(Json(alerts))
}
