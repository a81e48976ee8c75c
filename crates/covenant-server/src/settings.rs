//! Runtime configuration, deserialised from `config.toml` plus
//! `COVENANT_*` environment overrides.
//!
//! The `[openai]`, `[ocr]`, and `[mail]` sections are optional. Leaving
//! one out disables that capability rather than failing startup: uploads
//! persist without analysis, scanned documents are rejected, and alert
//! emails stay queued.

use std::path::PathBuf;

use serde::Deserialize;

#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:       String,
  #[serde(default = "default_port")]
  pub port:       u16,
  #[serde(default = "default_db_path")]
  pub db_path:    PathBuf,
  #[serde(default = "default_upload_dir")]
  pub upload_dir: PathBuf,

  pub openai: Option<OpenAiConfig>,
  pub ocr:    Option<OcrConfig>,
  pub mail:   Option<MailConfig>,

  #[serde(default)]
  pub schedule: ScheduleConfig,
}

#[derive(Deserialize, Clone)]
pub struct OpenAiConfig {
  pub base_url: String,
  pub api_key:  String,
  #[serde(default = "default_model")]
  pub model:    String,
}

#[derive(Deserialize, Clone)]
pub struct OcrConfig {
  pub analyze_url: String,
  pub key:         String,
}

#[derive(Deserialize, Clone)]
pub struct MailConfig {
  pub endpoint: String,
  pub token:    String,
  pub from:     String,
}

/// Cadences for the background loops. Rules that only act on certain
/// days (the weekly high-risk sweep) still tick daily and gate inside
/// the engine.
#[derive(Deserialize, Clone)]
pub struct ScheduleConfig {
  #[serde(default = "default_daily_hours")]
  pub expiration_hours: u64,
  #[serde(default = "default_daily_hours")]
  pub audit_hours:      u64,
  #[serde(default = "default_daily_hours")]
  pub high_risk_hours:  u64,
  #[serde(default = "default_delivery_minutes")]
  pub delivery_minutes: u64,
  #[serde(default = "default_daily_hours")]
  pub cleanup_hours:    u64,
  #[serde(default = "default_daily_hours")]
  pub digest_hours:     u64,
}

impl Default for ScheduleConfig {
  fn default() -> Self {
    Self {
      expiration_hours: default_daily_hours(),
      audit_hours:      default_daily_hours(),
      high_risk_hours:  default_daily_hours(),
      delivery_minutes: default_delivery_minutes(),
      cleanup_hours:    default_daily_hours(),
      digest_hours:     default_daily_hours(),
    }
  }
}

fn default_host() -> String {
  "127.0.0.1".to_owned()
}

fn default_port() -> u16 {
  8080
}

fn default_db_path() -> PathBuf {
  PathBuf::from("covenant.db")
}

fn default_upload_dir() -> PathBuf {
  PathBuf::from("uploads")
}

fn default_model() -> String {
  "gpt-4o-mini".to_owned()
}

fn default_daily_hours() -> u64 {
  24
}

fn default_delivery_minutes() -> u64 {
  5
}
