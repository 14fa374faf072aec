//! The line-group walker: drives a [`LineStrategy`] over a whole text,
//! carrying the context keyword from line to line.

use std::sync::{
  Arc,
  atomic::{AtomicBool, Ordering},
};

use crate::{
  LineMatch, ParseContext, ParsedCardDraft,
  disambiguate::{Disambiguator, Prompt, Rejection, Resolution},
  error::{Error, Result},
  preprocess::{Line, split_lines},
  strategy::LineStrategy,
};

// ─── Options and outcome ─────────────────────────────────────────────────────

/// Shared stop signal, checked before each line.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
  pub fn new() -> Self { Self::default() }

  pub fn cancel(&self) { self.0.store(true, Ordering::SeqCst); }

  pub fn is_cancelled(&self) -> bool { self.0.load(Ordering::SeqCst) }
}

#[derive(Debug, Clone)]
pub struct WalkOptions {
  /// Answers a disambiguator may give for one line before the line is
  /// failed.
  pub max_prompt_attempts: usize,
  pub cancel:              CancelFlag,
}

impl Default for WalkOptions {
  fn default() -> Self {
    Self { max_prompt_attempts: 3, cancel: CancelFlag::default() }
  }
}

/// A line that produced nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedLine {
  pub number: usize,
  pub text:   String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkOutcome {
  pub drafts:            Vec<ParsedCardDraft>,
  pub failed_lines:      Vec<FailedLine>,
  /// Lines settled by the disambiguator, skips excluded.
  pub interactive_fixed: usize,
  pub cancelled:         bool,
}

// ─── Walk ────────────────────────────────────────────────────────────────────

/// Turn `text` into drafts.
///
/// With a `disambiguator` the walk is interactive: every line the strategy
/// cannot place is put to it. Without one, such lines become notes of the
/// latest draft for the context keyword, a new context keyword, or failures.
///
/// Fails only when the disambiguator itself errors.
pub fn walk(
  text: &str,
  strategy: &dyn LineStrategy,
  options: &WalkOptions,
  mut disambiguator: Option<&mut dyn Disambiguator>,
) -> Result<WalkOutcome> {
  let lines = split_lines(text);
  let mut ctx = ParseContext::default();
  let mut out = WalkOutcome::default();
  let mut i = 0;

  while i < lines.len() {
    if options.cancel.is_cancelled() {
      tracing::info!(line = lines[i].number, "walk cancelled");
      out.cancelled = true;
      break;
    }

    let line = lines[i];
    if line.is_blank() {
      ctx.current_keyword = None;
      i += 1;
      continue;
    }

    match strategy.match_line(line.text, &ctx) {
      Some(LineMatch::Header(keyword)) => {
        ctx.current_keyword = Some(keyword);
      }
      Some(LineMatch::Card(mut draft)) => {
        if let Some(next) = lines.get(i + 1)
          && !next.is_blank()
          && !strategy.looks_like_record(next.text)
        {
          draft.notes = next.text.to_string();
          i += 1;
        }
        if draft.reset_keyword {
          ctx.current_keyword = None;
        }
        out.drafts.push(draft);
      }
      None => match disambiguator.as_deref_mut() {
        Some(d) => {
          if ask(d, line, &mut ctx, &mut out, options.max_prompt_attempts)?
            == Flow::Stop
          {
            tracing::info!(line = line.number, "walk cancelled by handler");
            out.cancelled = true;
            break;
          }
        }
        None => fall_back(line, &mut ctx, &mut out),
      },
    }
    i += 1;
  }

  Ok(out)
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
  Continue,
  Stop,
}

/// Non-interactive handling of an unrecognised line.
fn fall_back(line: Line<'_>, ctx: &mut ParseContext, out: &mut WalkOutcome) {
  match ctx.current_keyword.as_deref() {
    Some(keyword) => {
      if let Some(draft) =
        out.drafts.iter_mut().rev().find(|d| d.keyword == keyword)
      {
        draft.append_note(line.text);
        return;
      }
    }
    None => {
      let has_colon = line.text.contains([':', '：']);
      if !has_colon && !out.drafts.iter().any(|d| d.keyword == line.text) {
        ctx.current_keyword = Some(line.text.to_string());
        return;
      }
    }
  }
  fail(line, out);
}

/// Put `line` to the disambiguator until it gives a usable answer or the
/// attempts run out.
fn ask(
  d: &mut dyn Disambiguator,
  line: Line<'_>,
  ctx: &mut ParseContext,
  out: &mut WalkOutcome,
  max_attempts: usize,
) -> Result<Flow> {
  let mut rejection = None;

  for _ in 0..max_attempts.max(1) {
    let resolution = {
      let prompt = Prompt {
        line: line.text,
        line_number: line.number,
        context_keyword: ctx.current_keyword.as_deref(),
        prior_drafts: &out.drafts,
        rejection,
      };
      d.resolve(&prompt).map_err(Error::Disambiguator)?
    };

    match resolution {
      Resolution::NewKeyword => {
        ctx.current_keyword = Some(line.text.to_string());
        out.interactive_fixed += 1;
        return Ok(Flow::Continue);
      }
      Resolution::Definition { keyword, definition, source, quote } => {
        let answered = keyword
          .map(|k| k.trim().to_string())
          .filter(|k| !k.is_empty());
        // An answer naming a different keyword ends the current group.
        let fresh = answered
          .as_deref()
          .is_some_and(|k| ctx.current_keyword.as_deref() != Some(k));
        let keyword = answered.or_else(|| ctx.current_keyword.clone());
        let definition = definition.trim();
        let Some(keyword) = keyword else {
          rejection = Some(Rejection::MissingKeyword);
          continue;
        };
        if definition.is_empty() {
          rejection = Some(Rejection::EmptyDefinition);
          continue;
        }
        if fresh {
          ctx.current_keyword = None;
        }
        out.drafts.push(ParsedCardDraft {
          keyword,
          definition: definition.to_string(),
          source: source.trim().to_string(),
          quote: quote.trim().to_string(),
          notes: String::new(),
          reset_keyword: false,
        });
        out.interactive_fixed += 1;
        return Ok(Flow::Continue);
      }
      Resolution::AppendNote => {
        let Some(last) = out.drafts.last_mut() else {
          rejection = Some(Rejection::NoPriorDraft);
          continue;
        };
        last.append_note(line.text);
        out.interactive_fixed += 1;
        return Ok(Flow::Continue);
      }
      Resolution::Skip => {
        fail(line, out);
        return Ok(Flow::Continue);
      }
      Resolution::Cancel => return Ok(Flow::Stop),
    }
  }

  tracing::warn!(
    line = line.number,
    ?rejection,
    "no usable answer, giving up on line"
  );
  fail(line, out);
  Ok(Flow::Continue)
}

fn fail(line: Line<'_>, out: &mut WalkOutcome) {
  tracing::warn!(line = line.number, text = line.text, "unparseable line");
  out.failed_lines.push(FailedLine {
    number: line.number,
    text:   line.text.to_string(),
  });
}
