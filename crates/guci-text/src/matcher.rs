//! Fixed-grammar line rules.
//!
//! Each rule is a pure function of one trimmed line and the current
//! [`ParseContext`]. Rules are tried in [`RULES`] order and the first match
//! wins. Colons may be ASCII or fullwidth; quotes may be straight or curly.
//!
//! | rule                    | skeleton                          | context  |
//! |-------------------------|-----------------------------------|----------|
//! | `header`                | a line with no `：…。` record shape | none set |
//! | `full-record`           | `def：kw。src:“quote”`             | any      |
//! | `inherited-record`      | `def：src:“quote”`                 | required |
//! | `definition-keyword`    | `def：part。`                       | any      |
//! | `annotated-definition`  | `def：note：src:“quote”`            | required |

use std::sync::LazyLock;

use regex::Regex;

use crate::{LineMatch, ParseContext, ParsedCardDraft};

// ─── Patterns ────────────────────────────────────────────────────────────────

/// A colon eventually followed by a sentence terminator.
static RECORD_SHAPE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"[:：].*[。？]").expect("valid record regex"));

static FULL_RECORD: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r#"^([^:：]+?)[:：]([^:：]+?)。(.+?)[:：]["“”](.*?)["“”]"#)
    .expect("valid full-record regex")
});

static INHERITED_RECORD: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r#"^([^:：]+?)[:：]([^:：]+?)[:：]["“”](.*?)["“”]"#)
    .expect("valid inherited-record regex")
});

static DEFINITION_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r#"^([^:：]+?)[:：]([^:：]+?)。"#)
    .expect("valid definition-keyword regex")
});

const QUOTE_MARKS: [char; 3] = ['"', '“', '”'];

static ANNOTATED: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r#"^([^:：]+?)[:：]([^:：]+?)[:：]([^:：]+?)[:：]["“”](.*?)["“”]"#)
    .expect("valid annotated-definition regex")
});

// ─── Rules ───────────────────────────────────────────────────────────────────

pub type Rule = fn(&str, &ParseContext) -> Option<LineMatch>;

/// Every rule, in priority order, with the name used in logs.
pub const RULES: &[(&str, Rule)] = &[
  ("header", header),
  ("full-record", full_record),
  ("inherited-record", inherited_record),
  ("definition-keyword", definition_keyword),
  ("annotated-definition", annotated_definition),
];

/// Run the rules over `line`; `None` when none applies.
pub fn match_line(line: &str, ctx: &ParseContext) -> Option<LineMatch> {
  RULES.iter().find_map(|(name, rule)| {
    let m = rule(line, ctx)?;
    tracing::debug!(rule = name, line, "line matched");
    Some(m)
  })
}

/// Whether `line` has the shape of a record rather than a free-form note.
pub fn looks_like_record(line: &str) -> bool { RECORD_SHAPE.is_match(line) }

/// A bare keyword, only when no keyword is in effect.
pub fn header(line: &str, ctx: &ParseContext) -> Option<LineMatch> {
  if ctx.current_keyword.is_some() || line.is_empty() || looks_like_record(line)
  {
    return None;
  }
  Some(LineMatch::Header(line.to_string()))
}

/// `def：kw。src:“quote”`. Self-contained, so it clears the context.
pub fn full_record(line: &str, _ctx: &ParseContext) -> Option<LineMatch> {
  let caps = FULL_RECORD.captures(line)?;
  card(&caps[2], &caps[1], &caps[3], &caps[4], true)
}

/// `def：src:“quote”` under the context keyword.
pub fn inherited_record(line: &str, ctx: &ParseContext) -> Option<LineMatch> {
  let keyword = ctx.current_keyword.as_deref()?;
  let caps = INHERITED_RECORD.captures(line)?;
  card(keyword, &caps[1], &caps[2], &caps[3], false)
}

/// `def：part。`. Under a context keyword `part` is the quote; otherwise it
/// is the keyword and the line stands alone. Quote marks around `part` are
/// dropped.
pub fn definition_keyword(
  line: &str,
  ctx: &ParseContext,
) -> Option<LineMatch> {
  let caps = DEFINITION_KEYWORD.captures(line)?;
  let part = caps[2].trim().trim_matches(QUOTE_MARKS);
  match ctx.current_keyword.as_deref() {
    Some(keyword) => card(keyword, &caps[1], "", part, false),
    None => card(part, &caps[1], "", "", true),
  }
}

/// `def：note：src:“quote”` under the context keyword; the definition keeps
/// its annotation as `def：note`.
pub fn annotated_definition(
  line: &str,
  ctx: &ParseContext,
) -> Option<LineMatch> {
  let keyword = ctx.current_keyword.as_deref()?;
  let caps = ANNOTATED.captures(line)?;
  let definition = format!("{}：{}", caps[1].trim(), caps[2].trim());
  card(keyword, &definition, &caps[3], &caps[4], false)
}

fn card(
  keyword: &str,
  definition: &str,
  source: &str,
  quote: &str,
  reset_keyword: bool,
) -> Option<LineMatch> {
  let (keyword, definition) = (keyword.trim(), definition.trim());
  if keyword.is_empty() || definition.is_empty() {
    return None;
  }
  Some(LineMatch::Card(ParsedCardDraft {
    keyword: keyword.to_string(),
    definition: definition.to_string(),
    source: source.trim().to_string(),
    quote: quote.trim().to_string(),
    notes: String::new(),
    reset_keyword,
  }))
}
