//! Error types for `guci-core`.

use thiserror::Error;

use crate::card::CardId;

#[derive(Debug, Error)]
pub enum Error {
  #[error("card not found: {0}")]
  CardNotFound(CardId),

  #[error("card keyword must not be empty")]
  EmptyKeyword,

  #[error("card definition must not be empty")]
  EmptyDefinition,

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
