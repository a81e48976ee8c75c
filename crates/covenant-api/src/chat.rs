//! Handlers for the chat endpoints: question answering and contract
//! summaries over the extracted text.

use axum::{
  Json,
  extract::{Path, State},
};
use covenant_ai::CompletionClient;
use covenant_core::store::ComplianceStore;
use covenant_extract::OcrClient;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::ApiError, ApiState};

#[derive(Debug, Deserialize)]
pub struct AskBody {
  pub contract_id: Uuid,
  pub question:    String,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
  pub contract_id: Uuid,
  pub question:    String,
  pub answer:      String,
}

/// `POST /chat/ask` — answer a question against one contract's extracted
/// text. 400 when the contract has no text to ask about.
pub async fn ask<S, C, O>(
  State(state): State<ApiState<S, C, O>>,
  Json(body): Json<AskBody>,
) -> Result<Json<AskResponse>, ApiError>
where
  S: ComplianceStore,
  S::Error: std::error::Error + Send + Sync + 'static,
  C: CompletionClient,
  O: OcrClient,
{
  let analyzer = state.analyzer.as_ref().ok_or_else(|| {
    ApiError::Unavailable("analyzer not configured".to_owned())
  })?;
  let contract = state
    .store
    .get_contract(body.contract_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| {
      ApiError::NotFound(format!("contract {} not found", body.contract_id))
    })?;
  let text = contract
    .extracted_text
    .as_deref()
    .filter(|t| !t.trim().is_empty())
    .ok_or_else(|| {
      ApiError::BadRequest(
        "contract has no extracted text to ask about".to_owned(),
      )
    })?;

  let answer = analyzer.answer(text, &body.question).await;
  Ok(Json(AskResponse {
    contract_id: body.contract_id,
    question: body.question,
    answer,
  }))
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
  pub contract_id: Uuid,
  pub summary:     String,
}

/// `GET /contracts/:id/summary` — a short generated summary of the
/// contract text.
pub async fn summary<S, C, O>(
  State(state): State<ApiState<S, C, O>>,
  Path(id): Path<Uuid>,
) -> Result<Json<SummaryResponse>, ApiError>
where
  S: ComplianceStore,
  S::Error: std::error::Error + Send + Sync + 'static,
  C: CompletionClient,
  O: OcrClient,
{
  let analyzer = state.analyzer.as_ref().ok_or_else(|| {
    ApiError::Unavailable("analyzer not configured".to_owned())
  })?;
  let contract = state
    .store
    .get_contract(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("contract {id} not found")))?;
  let text = contract
    .extracted_text
    .as_deref()
    .filter(|t| !t.trim().is_empty())
    .ok_or_else(|| {
      ApiError::BadRequest(
        "contract has no extracted text to summarize".to_owned(),
      )
    })?;

  let summary = analyzer.summarize(text).await;
  Ok(Json(SummaryResponse { contract_id: id, summary }))
}
