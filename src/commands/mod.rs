/// Reserved words with REPL-level effect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    Clear,
    Exit,
    Quit,
}

impl ControlCommand {
    pub const ALL: [ControlCommand; 3] =
        [ControlCommand::Clear, ControlCommand::Exit, ControlCommand::Quit];

    pub fn name(self) -> &'static str {
        match self {
            ControlCommand::Clear => "clear",
            ControlCommand::Exit => "exit",
            ControlCommand::Quit => "quit",
        }
    }

    /// Exact, case-sensitive match.
    pub fn parse(input: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|cmd| cmd.name() == input)
    }
}

/// One unit of user input, classified
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputUnit {
    /// `!` escape; the command with surrounding whitespace removed
    Shell(String),
    Control(ControlCommand),
    Chat(String),
    Empty,
}

/// Classifies raw input. Only surrounding whitespace is normalized; control
/// words win over both shell and chat interpretation.
pub fn classify(raw: &str) -> InputUnit {
    let input = raw.trim();

    if input.is_empty() {
        return InputUnit::Empty;
    }
    if let Some(command) = ControlCommand::parse(input) {
        return InputUnit::Control(command);
    }
    if let Some(command) = input.strip_prefix('!') {
        return InputUnit::Shell(command.trim().to_string());
    }

    InputUnit::Chat(input.to_string())
}
