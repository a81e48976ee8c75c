//! Handlers for `/contracts` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/contracts` | Optional `vendor_name`, `risk_level`, `compliance_status`, `limit`, `offset` |
//! | `POST`   | `/contracts` | Body: [`UploadBody`]; extract + analyze + persist |
//! | `GET`    | `/contracts/:id` | Contract with its clauses |
//! | `PUT`    | `/contracts/:id` | Body: actor + partial update |
//! | `DELETE` | `/contracts/:id` | Removes the stored document too |
//! | `POST`   | `/contracts/:id/audit` | Marks audited, schedules the next audit |

use std::path::Path as FsPath;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use base64::Engine as _;
use chrono::{Duration, Utc};
use covenant_ai::{parse_loose_date, AnalysisOutcome, CompletionClient};
use covenant_core::{
  audit::NewAuditLog,
  clause::{Clause, NewClause},
  contract::{
    ComplianceStatus, Contract, ContractUpdate, NewContract, RiskLevel,
  },
  store::{ComplianceStore, ContractQuery, Page},
};
use covenant_extract::{ExtractMethod, OcrClient};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::ApiError, record_audit, ApiState};

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub vendor_name:       Option<String>,
  pub risk_level:        Option<RiskLevel>,
  pub compliance_status: Option<ComplianceStatus>,
  pub limit:             Option<usize>,
  pub offset:            Option<usize>,
}

/// `GET /contracts[?vendor_name=...][&risk_level=...][&compliance_status=...]`
pub async fn list<S, C, O>(
  State(state): State<ApiState<S, C, O>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Page<Contract>>, ApiError>
where
  S: ComplianceStore,
  S::Error: std::error::Error + Send + Sync + 'static,
  C: CompletionClient,
  O: OcrClient,
{
  let query = ContractQuery {
    vendor_name:       params.vendor_name,
    risk_level:        params.risk_level,
    compliance_status: params.compliance_status,
    limit:             params.limit,
    offset:            params.offset,
  };
  let page =
    state.store.list_contracts(&query).await.map_err(ApiError::store)?;
  Ok(Json(page))
}

// ─── Upload ──────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /contracts`.
#[derive(Debug, Deserialize)]
pub struct UploadBody {
  pub contract_number: String,
  pub vendor_name:     String,
  pub title:           String,
  pub owner_id:        Uuid,
  pub filename:        String,
  /// Base64-encoded document bytes.
  pub content:         String,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
  pub contract:           Contract,
  pub clause_count:       usize,
  pub extraction_method:  ExtractMethod,
  pub analysis_succeeded: bool,
  pub analysis_error:     Option<String>,
}

/// `POST /contracts` — returns 201 + [`UploadResponse`].
///
/// Extraction failure aborts the upload; analysis failure degrades to a
/// contract without clauses. The stored file never outlives a failed
/// upload.
pub async fn upload<S, C, O>(
  State(state): State<ApiState<S, C, O>>,
  Json(body): Json<UploadBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ComplianceStore,
  S::Error: std::error::Error + Send + Sync + 'static,
  C: CompletionClient,
  O: OcrClient,
{
  if !body.filename.to_lowercase().ends_with(".pdf") {
    return Err(ApiError::BadRequest(
      "only PDF documents are accepted".to_owned(),
    ));
  }
  if state
    .store
    .get_contract_by_number(&body.contract_number)
    .await
    .map_err(ApiError::store)?
    .is_some()
  {
    return Err(ApiError::Conflict(format!(
      "contract number {} already exists",
      body.contract_number
    )));
  }
  let bytes = base64::engine::general_purpose::STANDARD
    .decode(&body.content)
    .map_err(|e| ApiError::BadRequest(format!("invalid base64 content: {e}")))?;

  let stored_filename = format!("{}.pdf", Uuid::new_v4());
  let stored_path = state.upload_dir.join(&stored_filename);
  tokio::fs::write(&stored_path, &bytes).await?;

  let extraction = match state.extractor.extract(&bytes).await {
    Ok(extraction) => extraction,
    Err(err) => {
      discard_upload(&stored_path).await;
      return Err(ApiError::Unprocessable(format!(
        "text extraction failed: {err}"
      )));
    }
  };

  let outcome = match &state.analyzer {
    Some(analyzer) => analyzer.analyze(&extraction.text).await,
    None => AnalysisOutcome::Failed {
      error: "analyzer not configured".to_owned(),
    },
  };

  let mut input = NewContract::new(
    body.contract_number,
    body.vendor_name,
    body.title,
    body.owner_id,
  );
  input.original_filename = body.filename;
  input.stored_filename = stored_filename;
  input.extracted_text = Some(extraction.text.clone());

  let (clauses, analysis_error): (Vec<NewClause>, Option<String>) =
    match &outcome {
      AnalysisOutcome::Success(analysis) => {
        let metadata = &analysis.metadata;
        if input.vendor_name.trim().is_empty() {
          if let Some(vendor) = &metadata.vendor_name {
            input.vendor_name = vendor.clone();
          }
        }
        if input.title.trim().is_empty() {
          if let Some(title) = &metadata.title {
            input.title = title.clone();
          }
        }
        input.start_date =
          metadata.start_date.as_deref().and_then(parse_loose_date);
        input.end_date =
          metadata.end_date.as_deref().and_then(parse_loose_date);
        input.contract_value = metadata.contract_value;
        if let Some(currency) = &metadata.currency {
          input.currency = currency.clone();
        }
        input.risk_level = analysis.risk.overall;

        let clauses = analysis
          .clauses
          .iter()
          .cloned()
          // The real contract id is assigned inside the transaction.
          .map(|c| c.into_new_clause(Uuid::nil()))
          .collect();
        (clauses, None)
      }
      AnalysisOutcome::Failed { error } => {
        tracing::warn!(error, "analysis failed, persisting without clauses");
        (vec![], Some(error.clone()))
      }
    };

  let clause_count = clauses.len();
  let contract = match state
    .store
    .create_contract_with_clauses(input, clauses)
    .await
  {
    Ok(contract) => contract,
    Err(err) => {
      discard_upload(&stored_path).await;
      return Err(ApiError::store(err));
    }
  };

  record_audit(
    state.store.as_ref(),
    NewAuditLog::new(body.owner_id, "upload")
      .resource("contract", contract.contract_id)
      .details(serde_json::json!({
        "contract_number": contract.contract_number,
        "extraction_method": extraction.method,
        "clause_count": clause_count,
      })),
  )
  .await;

  Ok((
    StatusCode::CREATED,
    Json(UploadResponse {
      contract,
      clause_count,
      extraction_method: extraction.method,
      analysis_succeeded: analysis_error.is_none(),
      analysis_error,
    }),
  ))
}

async fn discard_upload(path: &FsPath) {
  if let Err(err) = tokio::fs::remove_file(path).await {
    tracing::warn!(error = %err, path = %path.display(), "failed to remove upload");
  }
}

// ─── Get one ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ContractDetail {
  pub contract: Contract,
  pub clauses:  Vec<Clause>,
}

/// `GET /contracts/:id` — the contract plus its clauses, highest risk
/// first.
pub async fn get_one<S, C, O>(
  State(state): State<ApiState<S, C, O>>,
  Path(id): Path<Uuid>,
) -> Result<Json<ContractDetail>, ApiError>
where
  S: ComplianceStore,
  S::Error: std::error::Error + Send + Sync + 'static,
  C: CompletionClient,
  O: OcrClient,
{
  let contract = state
    .store
    .get_contract(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("contract {id} not found")))?;
  let clauses = state
    .store
    .list_clauses(&covenant_core::store::ClauseQuery {
      contract_id: Some(id),
      ..Default::default()
    })
    .await
    .map_err(ApiError::store)?
    .items;
  Ok(Json(ContractDetail { contract, clauses }))
}

// ─── Update ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UpdateBody {
  pub actor_id: Uuid,
  #[serde(flatten)]
  pub update:   ContractUpdate,
}

/// `PUT /contracts/:id` — partial update; the contract number is
/// immutable.
pub async fn update<S, C, O>(
  State(state): State<ApiState<S, C, O>>,
  Path(id): Path<Uuid>,
  Json(body): Json<UpdateBody>,
) -> Result<Json<Contract>, ApiError>
where
  S: ComplianceStore,
  S::Error: std::error::Error + Send + Sync + 'static,
  C: CompletionClient,
  O: OcrClient,
{
  if body.update.is_empty() {
    return Err(ApiError::BadRequest("no fields to update".to_owned()));
  }
  state
    .store
    .get_contract(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("contract {id} not found")))?;

  let contract = state
    .store
    .update_contract(id, body.update)
    .await
    .map_err(ApiError::store)?;

  record_audit(
    state.store.as_ref(),
    NewAuditLog::new(body.actor_id, "update").resource("contract", id),
  )
  .await;
  Ok(Json(contract))
}

// ─── Delete ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ActorParams {
  pub actor_id: Uuid,
}

/// `DELETE /contracts/:id?actor_id=<id>` — cascades clauses and removes
/// the stored document.
pub async fn delete_one<S, C, O>(
  State(state): State<ApiState<S, C, O>>,
  Path(id): Path<Uuid>,
  Query(params): Query<ActorParams>,
) -> Result<StatusCode, ApiError>
where
  S: ComplianceStore,
  S::Error: std::error::Error + Send + Sync + 'static,
  C: CompletionClient,
  O: OcrClient,
{
  let contract = state
    .store
    .get_contract(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("contract {id} not found")))?;

  state.store.delete_contract(id).await.map_err(ApiError::store)?;
  discard_upload(&state.upload_dir.join(&contract.stored_filename)).await;

  record_audit(
    state.store.as_ref(),
    NewAuditLog::new(params.actor_id, "delete")
      .resource("contract", id)
      .details(serde_json::json!({
        "contract_number": contract.contract_number,
      })),
  )
  .await;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Audit ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AuditBody {
  pub actor_id: Uuid,
}

/// `POST /contracts/:id/audit` — records a completed audit and schedules
/// the next one from the contract's risk level (90/180/365 days for
/// high/medium/low).
pub async fn audit_one<S, C, O>(
  State(state): State<ApiState<S, C, O>>,
  Path(id): Path<Uuid>,
  Json(body): Json<AuditBody>,
) -> Result<Json<Contract>, ApiError>
where
  S: ComplianceStore,
  S::Error: std::error::Error + Send + Sync + 'static,
  C: CompletionClient,
  O: OcrClient,
{
  let contract = state
    .store
    .get_contract(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("contract {id} not found")))?;

  let now = Utc::now();
  let next_in_days = match contract.risk_level {
    RiskLevel::High => 90,
    RiskLevel::Medium => 180,
    RiskLevel::Low => 365,
  };
  let updated = state
    .store
    .update_contract(id, ContractUpdate {
      last_audit_date: Some(now),
      compliance_status: Some(ComplianceStatus::Compliant),
      next_audit_date: Some(now + Duration::days(next_in_days)),
      ..Default::default()
    })
    .await
    .map_err(ApiError::store)?;

  record_audit(
    state.store.as_ref(),
    NewAuditLog::new(body.actor_id, "audit")
      .resource("contract", id)
      .details(serde_json::json!({ "next_audit_in_days": next_in_days })),
  )
  .await;
  Ok(Json(updated))
}
