use crate::commands::ControlCommand;
use crate::core::error::DoloresError;

use console::Style;
use is_terminal::IsTerminal;
use rustyline::completion::{Completer, FilenameCompleter, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::{Hinter, HistoryHinter};
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{CompletionType, Config, Context, EditMode, Editor, Helper};
use std::borrow::Cow;
use std::io::{self, Read};

/// Result of one blocking read from the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Line(String),
    /// Ctrl-C at the prompt
    Interrupted,
    /// Ctrl-D or a closed stream
    Eof,
}

/// Something the session can pull input units from
pub trait InputSource {
    fn read_line(&mut self, prompt: &str) -> Result<InputEvent, DoloresError>;
}

/// Completes control words, and file names after a `!`
pub struct ShellCompleter {
    filename_completer: FilenameCompleter,
}

impl ShellCompleter {
    pub fn new() -> Self {
        Self {
            filename_completer: FilenameCompleter::new(),
        }
    }
}

impl Completer for ShellCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        if line.starts_with('!') {
            return self.filename_completer.complete(line, pos, ctx);
        }

        let typed = &line[..pos];
        if typed.is_empty() || typed.contains(char::is_whitespace) {
            return Ok((pos, Vec::new()));
        }

        let matches = control_completions(typed);
        Ok((0, matches))
    }
}

fn control_completions(typed: &str) -> Vec<Pair> {
    ControlCommand::ALL
        .iter()
        .map(|cmd| cmd.name())
        .filter(|name| name.starts_with(typed))
        .map(|name| Pair {
            display: name.to_string(),
            replacement: name.to_string(),
        })
        .collect()
}

/// Helper struct that combines the rustyline components
pub struct ShellHelper {
    completer: ShellCompleter,
    hinter: HistoryHinter,
    hint_style: Style,
}

impl ShellHelper {
    pub fn new() -> Self {
        Self {
            completer: ShellCompleter::new(),
            hinter: HistoryHinter {},
            hint_style: Style::new().dim(),
        }
    }
}

impl Helper for ShellHelper {}

impl Completer for ShellHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        self.completer.complete(line, pos, ctx)
    }
}

impl Hinter for ShellHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, ctx: &Context<'_>) -> Option<String> {
        self.hinter.hint(line, pos, ctx)
    }
}

impl Highlighter for ShellHelper {
    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Cow::Owned(self.hint_style.apply_to(hint).to_string())
    }
}

impl Validator for ShellHelper {}

/// Interactive line editor backed by rustyline
pub struct LineEditor {
    editor: Editor<ShellHelper, DefaultHistory>,
}

impl LineEditor {
    pub fn new() -> Result<Self, DoloresError> {
        let config = Config::builder()
            .history_ignore_space(true)
            .completion_type(CompletionType::List)
            .edit_mode(EditMode::Emacs)
            .build();

        let mut editor = Editor::with_config(config)
            .map_err(|e| DoloresError::Input(format!("Failed to create line editor: {}", e)))?;
        editor.set_helper(Some(ShellHelper::new()));

        Ok(Self { editor })
    }
}

impl InputSource for LineEditor {
    fn read_line(&mut self, prompt: &str) -> Result<InputEvent, DoloresError> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    self.editor.add_history_entry(line.as_str()).map_err(|e| {
                        DoloresError::Input(format!("Failed to add history entry: {}", e))
                    })?;
                }
                Ok(InputEvent::Line(line))
            }
            Err(ReadlineError::Interrupted) => Ok(InputEvent::Interrupted),
            Err(ReadlineError::Eof) => Ok(InputEvent::Eof),
            Err(err) => Err(DoloresError::Input(format!("Input error: {}", err))),
        }
    }
}

pub fn stdin_is_terminal() -> bool {
    io::stdin().is_terminal()
}

/// Reads all of stdin once when it is not a terminal.
pub fn read_piped_input() -> Result<Option<String>, DoloresError> {
    if stdin_is_terminal() {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .map_err(|e| DoloresError::Input(format!("Failed to read from stdin: {}", e)))?;

    Ok(non_empty(buffer))
}

fn non_empty(buffer: String) -> Option<String> {
    let trimmed = buffer.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(pairs: Vec<Pair>) -> Vec<String> {
        pairs.into_iter().map(|p| p.replacement).collect()
    }

    #[test]
    fn completes_control_words_by_prefix() {
        assert_eq!(names(control_completions("cl")), vec!["clear"]);
        assert_eq!(names(control_completions("q")), vec!["quit"]);
        assert!(control_completions("z").is_empty());
    }

    #[test]
    fn piped_text_is_trimmed_and_blank_is_none() {
        assert_eq!(non_empty("  hola \n".to_string()).as_deref(), Some("hola"));
        assert_eq!(non_empty(" \n\t".to_string()), None);
    }
}
