//! Error type for `covenant-extract`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The document produced no usable native text and no OCR client is
  /// available to fall back to.
  #[error(
    "document appears to be scanned and no OCR client is configured"
  )]
  ScannedWithoutOcr,

  /// OCR ran but returned no text at all.
  #[error("OCR produced no text")]
  OcrEmpty,

  /// The remote read operation reported failure.
  #[error("OCR operation failed: {0}")]
  OcrFailed(String),

  /// The read API never reached a terminal state within the polling budget.
  #[error("OCR operation timed out after {0} polls")]
  OcrTimeout(usize),

  /// The read API response was missing the operation location header.
  #[error("OCR submit response carried no operation location")]
  MissingOperationLocation,

  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
