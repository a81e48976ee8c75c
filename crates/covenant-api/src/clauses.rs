//! Handlers for `/clauses` endpoints.
//!
//! Clauses are created by the upload pipeline, never through this module;
//! here they are read, corrected, and reviewed.

use axum::{
  Json,
  extract::{Path, Query, State},
};
use chrono::Utc;
use covenant_ai::CompletionClient;
use covenant_core::{
  audit::NewAuditLog,
  clause::{Clause, ClauseType, ClauseUpdate},
  contract::RiskLevel,
  store::{ClauseQuery, ComplianceStore, Page},
};
use covenant_extract::OcrClient;
use serde::Deserialize;
use uuid::Uuid;

use crate::{error::ApiError, record_audit, ApiState};

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub contract_id:     Option<Uuid>,
  pub clause_type:     Option<ClauseType>,
  pub risk_assessment: Option<RiskLevel>,
  pub action_required: Option<bool>,
  pub limit:           Option<usize>,
  pub offset:          Option<usize>,
}

/// `GET /clauses[?contract_id=...][&clause_type=...][&risk_assessment=...]`
pub async fn list<S, C, O>(
  State(state): State<ApiState<S, C, O>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Page<Clause>>, ApiError>
where
  S: ComplianceStore,
  S::Error: std::error::Error + Send + Sync + 'static,
  C: CompletionClient,
  O: OcrClient,
{
  let query = ClauseQuery {
    contract_id:     params.contract_id,
    clause_type:     params.clause_type,
    risk_assessment: params.risk_assessment,
    action_required: params.action_required,
    limit:           params.limit,
    offset:          params.offset,
  };
  let page =
    state.store.list_clauses(&query).await.map_err(ApiError::store)?;
  Ok(Json(page))
}

/// `GET /clauses/:id`
pub async fn get_one<S, C, O>(
  State(state): State<ApiState<S, C, O>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Clause>, ApiError>
where
  S: ComplianceStore,
  S::Error: std::error::Error + Send + Sync + 'static,
  C: CompletionClient,
  O: OcrClient,
{
  let clause = state
    .store
    .get_clause(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("clause {id} not found")))?;
  Ok(Json(clause))
}

#[derive(Debug, Deserialize)]
pub struct UpdateBody {
  pub actor_id: Uuid,
  #[serde(flatten)]
  pub update:   ClauseUpdate,
}

/// `PUT /clauses/:id` — reviewer corrections to the detected clause.
pub async fn update<S, C, O>(
  State(state): State<ApiState<S, C, O>>,
  Path(id): Path<Uuid>,
  Json(body): Json<UpdateBody>,
) -> Result<Json<Clause>, ApiError>
where
  S: ComplianceStore,
  S::Error: std::error::Error + Send + Sync + 'static,
  C: CompletionClient,
  O: OcrClient,
{
  state
    .store
    .get_clause(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("clause {id} not found")))?;

  let clause = state
    .store
    .update_clause(id, body.update)
    .await
    .map_err(ApiError::store)?;

  record_audit(
    state.store.as_ref(),
    NewAuditLog::new(body.actor_id, "update").resource("clause", id),
  )
  .await;
  Ok(Json(clause))
}

#[derive(Debug, Deserialize)]
pub struct ReviewBody {
  pub reviewer_id: Uuid,
}

/// `POST /clauses/:id/review` — marks the clause reviewed by the given
/// user.
pub async fn review<S, C, O>(
  State(state): State<ApiState<S, C, O>>,
  Path(id): Path<Uuid>,
  Json(body): Json<ReviewBody>,
) -> Result<Json<Clause>, ApiError>
where
  S: ComplianceStore,
  S::Error: std::error::Error + Send + Sync + 'static,
  C: CompletionClient,
  O: OcrClient,
{
  state
    .store
    .get_clause(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("clause {id} not found")))?;

  let clause = state
    .store
    .review_clause(id, body.reviewer_id, Utc::now())
    .await
    .map_err(ApiError::store)?;

  record_audit(
    state.store.as_ref(),
    NewAuditLog::new(body.reviewer_id, "review").resource("clause", id),
  )
  .await;
  Ok(Json(clause))
}
