//! The human-in-the-loop protocol for lines no strategy recognises.
//!
//! The walker calls [`Disambiguator::resolve`] once per prompt and blocks on
//! the answer. A console, a GUI dialog and a test script all implement the
//! same trait.

use std::collections::VecDeque;

use crate::ParsedCardDraft;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Everything a handler needs to decide about one line.
#[derive(Debug, Clone, Copy)]
pub struct Prompt<'a> {
  pub line:            &'a str,
  pub line_number:     usize,
  pub context_keyword: Option<&'a str>,
  /// Drafts produced so far in this walk, oldest first.
  pub prior_drafts:    &'a [ParsedCardDraft],
  /// Why the previous answer for this line was refused, if it was.
  pub rejection:       Option<Rejection>,
}

/// A handler's decision for one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
  /// The line is a keyword heading the lines that follow.
  NewKeyword,
  /// The line is a card. `keyword` defaults to the context keyword.
  Definition {
    keyword:    Option<String>,
    definition: String,
    source:     String,
    quote:      String,
  },
  /// The line continues the notes of the most recent draft.
  AppendNote,
  Skip,
  /// Stop the walk; drafts so far are kept.
  Cancel,
}

/// Why an answer was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
  EmptyDefinition,
  /// A definition was given but neither the answer nor the context supplies
  /// a keyword.
  MissingKeyword,
  /// `AppendNote` with nothing to append to.
  NoPriorDraft,
}

impl std::fmt::Display for Rejection {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(match self {
      Self::EmptyDefinition => "the definition must not be empty",
      Self::MissingKeyword => "a keyword is required",
      Self::NoPriorDraft => "there is no earlier card to append to",
    })
  }
}

pub trait Disambiguator {
  fn resolve(&mut self, prompt: &Prompt<'_>) -> Result<Resolution, BoxError>;
}

// ─── Scripted ────────────────────────────────────────────────────────────────

/// Replays a fixed list of answers, for tests and automation.
///
/// Running out of answers is an error.
#[derive(Debug, Default)]
pub struct ScriptedDisambiguator {
  answers: VecDeque<Resolution>,
  seen:    Vec<SeenPrompt>,
}

/// What a [`ScriptedDisambiguator`] was asked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeenPrompt {
  pub line_number: usize,
  pub line:        String,
  pub rejection:   Option<Rejection>,
}

impl ScriptedDisambiguator {
  pub fn new(answers: impl IntoIterator<Item = Resolution>) -> Self {
    Self { answers: answers.into_iter().collect(), seen: Vec::new() }
  }

  pub fn seen(&self) -> &[SeenPrompt] { &self.seen }

  pub fn remaining(&self) -> usize { self.answers.len() }
}

impl Disambiguator for ScriptedDisambiguator {
  fn resolve(&mut self, prompt: &Prompt<'_>) -> Result<Resolution, BoxError> {
    self.seen.push(SeenPrompt {
      line_number: prompt.line_number,
      line:        prompt.line.to_string(),
      rejection:   prompt.rejection,
    });
    self.answers.pop_front().ok_or_else(|| {
      format!("no scripted answer for line {}", prompt.line_number).into()
    })
  }
}
