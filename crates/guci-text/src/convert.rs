//! Script normalisation for the semantic strategy.

use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;

use crate::{Error, Result};

/// Converts text between scripts, e.g. traditional to simplified.
///
/// `None` means the text could not be converted; callers keep the original.
pub trait ScriptConverter {
  fn convert(&self, text: &str) -> Option<String>;
}

// ─── HansConverter ───────────────────────────────────────────────────────────

/// Traditional to simplified Chinese through [`zhconv`]'s phrase tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct HansConverter;

impl ScriptConverter for HansConverter {
  fn convert(&self, text: &str) -> Option<String> {
    Some(zhconv::zhconv(text, zhconv::Variant::ZhHans))
  }
}

// ─── TableConverter ──────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct TableFile {
  #[serde(default)]
  chars: BTreeMap<String, String>,
}

/// Character-for-character substitution from a user-supplied TOML table:
///
/// ```toml
/// [chars]
/// "釣" = "钓"
/// ```
#[derive(Debug, Clone, Default)]
pub struct TableConverter {
  map: HashMap<char, char>,
}

impl TableConverter {
  pub fn from_toml_str(input: &str) -> Result<Self> {
    let file: TableFile =
      toml::from_str(input).map_err(Error::ConversionTable)?;
    let mut map = HashMap::with_capacity(file.chars.len());
    for (from, to) in file.chars {
      match (single_char(&from), single_char(&to)) {
        (Some(f), Some(t)) => {
          map.insert(f, t);
        }
        _ => return Err(Error::ConversionEntry(format!("{from} = {to}"))),
      }
    }
    Ok(Self { map })
  }

  pub fn len(&self) -> usize { self.map.len() }

  pub fn is_empty(&self) -> bool { self.map.is_empty() }
}

impl ScriptConverter for TableConverter {
  fn convert(&self, text: &str) -> Option<String> {
    Some(
      text
        .chars()
        .map(|c| self.map.get(&c).copied().unwrap_or(c))
        .collect(),
    )
  }
}

fn single_char(s: &str) -> Option<char> {
  let mut chars = s.chars();
  match (chars.next(), chars.next()) {
    (Some(c), None) => Some(c),
    _ => None,
  }
}
