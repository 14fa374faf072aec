//! Terminal disambiguator: shows an unrecognised line and reads the user's
//! decision.

use std::io::{self, BufRead, Write};

use guci_text::{BoxError, Disambiguator, Prompt, Resolution};

const MENU: &str = "[k] keyword heading  [d] definition  \
                    [n] append to notes  [s] skip  [c] cancel";

/// Reads answers from `input` and writes prompts to `output`. End of input
/// cancels the import.
pub struct ConsoleDisambiguator<R, W> {
  input:  R,
  output: W,
}

impl ConsoleDisambiguator<io::StdinLock<'static>, io::Stderr> {
  pub fn stdio() -> Self { Self::new(io::stdin().lock(), io::stderr()) }
}

impl<R: BufRead, W: Write> ConsoleDisambiguator<R, W> {
  pub fn new(input: R, output: W) -> Self { Self { input, output } }

  /// One trimmed line of input; `None` at end of input.
  fn read_line(&mut self, label: &str) -> io::Result<Option<String>> {
    write!(self.output, "{label}")?;
    self.output.flush()?;
    let mut buf = String::new();
    if self.input.read_line(&mut buf)? == 0 {
      return Ok(None);
    }
    Ok(Some(buf.trim().to_string()))
  }

  fn show(&mut self, prompt: &Prompt<'_>) -> io::Result<()> {
    writeln!(self.output)?;
    writeln!(self.output, "line {}: {}", prompt.line_number, prompt.line)?;
    match prompt.context_keyword {
      Some(k) => writeln!(self.output, "current keyword: {k}")?,
      None => writeln!(self.output, "no current keyword")?,
    }
    if let Some(last) = prompt.prior_drafts.last() {
      writeln!(
        self.output,
        "previous card: {}：{}",
        last.keyword, last.definition
      )?;
    }
    if let Some(reason) = prompt.rejection {
      writeln!(self.output, "previous answer refused: {reason}")?;
    }
    writeln!(self.output, "{MENU}")
  }

  fn read_definition(&mut self) -> io::Result<Option<Resolution>> {
    let Some(keyword) = self.read_line("keyword (blank for current): ")? else {
      return Ok(None);
    };
    let Some(definition) = self.read_line("definition: ")? else {
      return Ok(None);
    };
    let Some(source) = self.read_line("source: ")? else {
      return Ok(None);
    };
    let Some(quote) = self.read_line("quote: ")? else {
      return Ok(None);
    };
    Ok(Some(Resolution::Definition {
      keyword: (!keyword.is_empty()).then_some(keyword),
      definition,
      source,
      quote,
    }))
  }
}

impl<R: BufRead, W: Write> Disambiguator for ConsoleDisambiguator<R, W> {
  fn resolve(&mut self, prompt: &Prompt<'_>) -> Result<Resolution, BoxError> {
    self.show(prompt)?;
    loop {
      let Some(choice) = self.read_line("> ")? else {
        return Ok(Resolution::Cancel);
      };
      let resolution = match choice.as_str() {
        "k" => Resolution::NewKeyword,
        "d" => match self.read_definition()? {
          Some(r) => r,
          None => Resolution::Cancel,
        },
        "n" => Resolution::AppendNote,
        "s" => Resolution::Skip,
        "c" => Resolution::Cancel,
        other => {
          writeln!(self.output, "unknown choice {other:?}; {MENU}")?;
          continue;
        }
      };
      return Ok(resolution);
    }
  }
}
