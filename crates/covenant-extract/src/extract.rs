//! Native PDF text extraction with OCR fallback for scanned documents.

use serde::Serialize;

use crate::{ocr::OcrClient, Error, Result};

/// Minimum trimmed native-text length before a document is treated as
/// scanned.
pub const MIN_NATIVE_TEXT_LEN: usize = 100;

/// Text recovered from one page; page numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageText {
  pub page_number: u32,
  pub text:        String,
}

/// How the text of an [`Extraction`] was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractMethod {
  Native,
  Ocr,
}

#[derive(Debug, Clone)]
pub struct Extraction {
  pub text:   String,
  pub pages:  Vec<PageText>,
  pub method: ExtractMethod,
}

/// An uninhabited [`OcrClient`] for extractors built without OCR.
pub enum NoOcr {}

impl OcrClient for NoOcr {
  async fn recognize<'a>(&'a self, _bytes: &'a [u8]) -> Result<Vec<PageText>> {
    match *self {}
  }
}

// ─── TextExtractor ───────────────────────────────────────────────────────────

/// Document text extractor: native path first, OCR fallback when the
/// document looks scanned.
pub struct TextExtractor<O: OcrClient> {
  ocr:            Option<O>,
  min_native_len: usize,
}

impl TextExtractor<NoOcr> {
  /// An extractor with no OCR fallback; scanned documents are rejected.
  pub fn without_ocr() -> Self {
    Self { ocr: None, min_native_len: MIN_NATIVE_TEXT_LEN }
  }
}

impl<O: OcrClient> TextExtractor<O> {
  pub fn new(ocr: O) -> Self {
    Self { ocr: Some(ocr), min_native_len: MIN_NATIVE_TEXT_LEN }
  }

  /// An extractor whose OCR fallback depends on deployment configuration.
  pub fn with_optional_ocr(ocr: Option<O>) -> Self {
    Self { ocr, min_native_len: MIN_NATIVE_TEXT_LEN }
  }

  pub async fn extract(&self, bytes: &[u8]) -> Result<Extraction> {
    match self.extract_native(bytes) {
      Some(extraction) => Ok(extraction),
      None => self.extract_ocr(bytes).await,
    }
  }

  /// Native path. `None` when the document parses but reads as scanned, or
  /// does not parse at all.
  fn extract_native(&self, bytes: &[u8]) -> Option<Extraction> {
    let page_texts = match pdf_extract::extract_text_from_mem_by_pages(bytes) {
      Ok(pages) => pages,
      Err(err) => {
        tracing::debug!(error = %err, "native PDF parse failed");
        return None;
      }
    };

    let pages: Vec<PageText> = page_texts
      .into_iter()
      .enumerate()
      .map(|(i, text)| PageText { page_number: i as u32 + 1, text })
      .collect();
    let text = pages
      .iter()
      .map(|p| p.text.as_str())
      .collect::<Vec<_>>()
      .join("\n");

    if text.trim().chars().count() > self.min_native_len {
      Some(Extraction { text, pages, method: ExtractMethod::Native })
    } else {
      tracing::debug!(
        native_len = text.trim().chars().count(),
        "native text below threshold, treating document as scanned"
      );
      None
    }
  }

  async fn extract_ocr(&self, bytes: &[u8]) -> Result<Extraction> {
    let Some(ocr) = &self.ocr else {
      return Err(Error::ScannedWithoutOcr);
    };

    let pages = ocr.recognize(bytes).await?;
    let text = pages
      .iter()
      .map(|p| p.text.as_str())
      .collect::<Vec<_>>()
      .join("\n");
    if text.trim().is_empty() {
      return Err(Error::OcrEmpty);
    }

    tracing::info!(pages = pages.len(), "recovered document text via OCR");
    Ok(Extraction { text, pages, method: ExtractMethod::Ocr })
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
