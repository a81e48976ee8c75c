//! The [`OcrClient`] capability and its HTTP read-API implementation.
//!
//! The remote protocol is asynchronous: the document is POSTed once, the
//! response names an operation URL, and the operation is polled until it
//! reaches a terminal state.

use std::future::Future;
use std::time::Duration;

use serde::Deserialize;

use crate::{Error, PageText, Result};

/// Capability to turn a scanned document into per-page text.
pub trait OcrClient: Send + Sync {
  fn recognize<'a>(
    &'a self,
    bytes: &'a [u8],
  ) -> impl Future<Output = Result<Vec<PageText>>> + Send + 'a;
}

// ─── HTTP implementation ─────────────────────────────────────────────────────

const POLL_INTERVAL: Duration = Duration::from_secs(1);
const MAX_POLLS: usize = 30;

/// OCR over an HTTP vision read API (submit, then poll the returned
/// operation URL).
#[derive(Clone)]
pub struct HttpOcrClient {
  http:         reqwest::Client,
  analyze_url:  String,
  key:          String,
}

impl HttpOcrClient {
  pub fn new(http: reqwest::Client, analyze_url: String, key: String) -> Self {
    Self { http, analyze_url, key }
  }

  async fn submit(&self, bytes: &[u8]) -> Result<String> {
    let resp = self
      .http
      .post(&self.analyze_url)
      .header("Ocp-Apim-Subscription-Key", &self.key)
      .header("Content-Type", "application/octet-stream")
      .body(bytes.to_vec())
      .send()
      .await?
      .error_for_status()?;

    resp
      .headers()
      .get("Operation-Location")
      .and_then(|v| v.to_str().ok())
      .map(str::to_owned)
      .ok_or(Error::MissingOperationLocation)
  }

  async fn poll(&self, operation_url: &str) -> Result<ReadOperation> {
    for _ in 0..MAX_POLLS {
      tokio::time::sleep(POLL_INTERVAL).await;

      let op: ReadOperation = self
        .http
        .get(operation_url)
        .header("Ocp-Apim-Subscription-Key", &self.key)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

      match op.status.as_str() {
        "succeeded" => return Ok(op),
        "failed" => return Err(Error::OcrFailed(op.status)),
        _ => continue,
      }
    }
    Err(Error::OcrTimeout(MAX_POLLS))
  }
}

impl OcrClient for HttpOcrClient {
  async fn recognize<'a>(&'a self, bytes: &'a [u8]) -> Result<Vec<PageText>> {
    let operation_url = self.submit(bytes).await?;
    tracing::debug!(%operation_url, "submitted document for OCR");

    let op = self.poll(&operation_url).await?;
    let pages = op
      .analyze_result
      .map(|r| {
        r.read_results
          .into_iter()
          .map(|page| PageText {
            page_number: page.page,
            text:        page
              .lines
              .iter()
              .map(|l| l.text.as_str())
              .collect::<Vec<_>>()
              .join("\n"),
          })
          .collect()
      })
      .unwrap_or_default();

    Ok(pages)
  }
}

// ─── Wire types ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReadOperation {
  status:         String,
  analyze_result: Option<AnalyzeResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeResult {
  read_results: Vec<ReadResult>,
}

#[derive(Debug, Deserialize)]
struct ReadResult {
  page:  u32,
  #[serde(default)]
  lines: Vec<ReadLine>,
}

#[derive(Debug, Deserialize)]
struct ReadLine {
  text: String,
}
