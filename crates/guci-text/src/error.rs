//! Error types for the guci-text codec.

use thiserror::Error;

use crate::disambiguate::BoxError;

#[derive(Debug, Error)]
pub enum Error {
  /// The interactive handler itself failed; the walk stops at that line.
  #[error("disambiguator failed: {0}")]
  Disambiguator(#[source] BoxError),

  #[error("invalid roster data: {0}")]
  Roster(#[source] toml::de::Error),

  #[error("invalid conversion table: {0}")]
  ConversionTable(#[source] toml::de::Error),

  #[error("conversion table entry {0:?} must map one character to one")]
  ConversionEntry(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
