//! Document text extraction for Covenant.
//!
//! Tries the native PDF text layer first and falls back to a configured
//! [`OcrClient`] when the document appears to be scanned. Extraction never
//! silently returns empty text; callers always get either text or a
//! descriptive error.

#![allow(async_fn_in_trait)]

mod extract;
mod ocr;

pub mod error;

pub use error::{Error, Result};
pub use extract::{
  ExtractMethod, Extraction, NoOcr, PageText, TextExtractor,
  MIN_NATIVE_TEXT_LEN,
};
pub use ocr::{HttpOcrClient, OcrClient};
