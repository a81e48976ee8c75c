//! Error type for `covenant-ai`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  /// The completion endpoint answered without any choices.
  #[error("completion response carried no choices")]
  EmptyCompletion,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
