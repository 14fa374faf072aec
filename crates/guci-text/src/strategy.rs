//! Interchangeable per-line parsing strategies.

use std::{fmt, str::FromStr, sync::Arc};

use serde::Deserialize;

use crate::{
  LineMatch, ParseContext, classify::SemanticStrategy, convert::ScriptConverter,
  matcher, roster::Rosters,
};

/// Recognises single lines for the walker.
pub trait LineStrategy {
  /// Interpret `line` under `ctx`; `None` hands the line to the fallback.
  fn match_line(&self, line: &str, ctx: &ParseContext) -> Option<LineMatch>;

  /// Whether `line` would stand as its own record. A line following a card
  /// is taken as that card's notes only when this is `false`.
  fn looks_like_record(&self, line: &str) -> bool;
}

/// The fixed punctuation grammar of [`crate::matcher`].
#[derive(Debug, Clone, Copy, Default)]
pub struct GrammarStrategy;

impl LineStrategy for GrammarStrategy {
  fn match_line(&self, line: &str, ctx: &ParseContext) -> Option<LineMatch> {
    matcher::match_line(line, ctx)
  }

  fn looks_like_record(&self, line: &str) -> bool {
    matcher::looks_like_record(line)
  }
}

// ─── Selection ───────────────────────────────────────────────────────────────

/// Strategy names as they appear in configuration and on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
  #[default]
  Grammar,
  Semantic,
}

impl Strategy {
  /// Build the chosen strategy. `rosters` and `converter` are only used by
  /// [`Strategy::Semantic`]; a given `converter` replaces its default
  /// traditional-to-simplified conversion.
  pub fn build(
    self,
    rosters: Rosters,
    converter: Option<Box<dyn ScriptConverter + Send + Sync>>,
  ) -> Arc<dyn LineStrategy + Send + Sync> {
    match self {
      Self::Grammar => Arc::new(GrammarStrategy),
      Self::Semantic => {
        let mut semantic = SemanticStrategy::new(rosters);
        if let Some(converter) = converter {
          semantic = semantic.with_converter(converter);
        }
        Arc::new(semantic)
      }
    }
  }
}

impl fmt::Display for Strategy {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Grammar => "grammar",
      Self::Semantic => "semantic",
    })
  }
}

impl FromStr for Strategy {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "grammar" => Ok(Self::Grammar),
      "semantic" => Ok(Self::Semantic),
      other => Err(format!(
        "unknown strategy {other:?} (expected \"grammar\" or \"semantic\")"
      )),
    }
  }
}
