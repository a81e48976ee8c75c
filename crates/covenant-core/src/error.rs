//! Error types for `covenant-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A stored enum discriminant no longer matches any known variant.
  #[error("unknown enum value for {field}: {value:?}")]
  UnknownEnumValue { field: &'static str, value: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
