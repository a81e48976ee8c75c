//! User — the thin identity envelope owning contracts.
//!
//! Credential handling lives outside this core; a user here is only what
//! the store needs for ownership, acknowledgment, and review attribution.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Admin,
  Auditor,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
  pub user_id:    Uuid,
  pub username:   String,
  pub email:      String,
  pub role:       Role,
  pub is_active:  bool,
  pub created_at: DateTime<Utc>,
}

/// Input to [`crate::store::ComplianceStore::create_user`].
#[derive(Debug, Clone)]
pub struct NewUser {
  pub username: String,
  pub email:    String,
  pub role:     Role,
}
