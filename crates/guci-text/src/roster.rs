//! Author and book rosters used to spot source fragments.

use serde::Deserialize;

use crate::{Error, Result};

const BUILTIN: &str = include_str!("../data/rosters.toml");

/// Known authors and book titles, loaded from TOML:
///
/// ```toml
/// authors = ["潘岳"]
/// books   = ["闲居赋"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Rosters {
  #[serde(default)]
  pub authors: Vec<String>,
  #[serde(default)]
  pub books:   Vec<String>,
}

impl Rosters {
  /// The rosters shipped with guci.
  pub fn builtin() -> Self {
    Self::from_toml_str(BUILTIN).expect("built-in roster data is valid TOML")
  }

  pub fn from_toml_str(input: &str) -> Result<Self> {
    let mut rosters: Self = toml::from_str(input).map_err(Error::Roster)?;
    rosters.authors.retain(|a| !a.trim().is_empty());
    rosters.books.retain(|b| !b.trim().is_empty());
    Ok(rosters)
  }

  /// Add `other`'s names, skipping ones already present.
  pub fn extend(&mut self, other: Rosters) {
    for author in other.authors {
      if !self.authors.contains(&author) {
        self.authors.push(author);
      }
    }
    for book in other.books {
      if !self.books.contains(&book) {
        self.books.push(book);
      }
    }
  }

  pub fn mentions_author(&self, fragment: &str) -> bool {
    self.authors.iter().any(|a| fragment.contains(a.as_str()))
  }

  pub fn mentions_book(&self, fragment: &str) -> bool {
    self.books.iter().any(|b| fragment.contains(b.as_str()))
  }
}
