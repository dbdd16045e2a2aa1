use crate::config::Config;
use console::Style;

/// What a piece of terminal output represents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Question,
    Answer,
    Error,
    Info,
}

impl Kind {
    fn emoji(self) -> &'static str {
        match self {
            Kind::Question => "🧐",
            Kind::Answer => "🤖",
            Kind::Error => "❌",
            Kind::Info => "💡",
        }
    }

    fn style(self) -> Style {
        match self {
            Kind::Question => Style::new().bold().blue(),
            Kind::Answer => Style::new().bold().green(),
            Kind::Error => Style::new().bold().red(),
            Kind::Info => Style::new().dim().yellow(),
        }
    }

    fn label(self) -> &'static str {
        match self {
            Kind::Question => "Q: ",
            Kind::Answer => "A: ",
            Kind::Error | Kind::Info => "",
        }
    }
}

/// Decorates output with emoji and ANSI colors according to configuration
#[derive(Debug, Clone, Copy)]
pub struct Formatter {
    enable_emoji: bool,
    enable_color: bool,
}

impl Formatter {
    pub fn new(config: &Config) -> Self {
        Self::with_flags(config.enable_emoji, config.enable_color)
    }

    pub fn with_flags(enable_emoji: bool, enable_color: bool) -> Self {
        Self {
            enable_emoji,
            enable_color,
        }
    }

    pub fn format(&self, text: &str, kind: Kind) -> String {
        let text = if self.enable_emoji {
            format!("{} {}", kind.emoji(), text)
        } else {
            text.to_string()
        };

        if self.enable_color {
            // Colors follow configuration, not console's tty detection
            kind.style().force_styling(true).apply_to(text).to_string()
        } else {
            text
        }
    }

    /// The role label shown before user input and assistant replies.
    pub fn prefix(&self, kind: Kind) -> String {
        self.format(kind.label(), kind)
    }

    pub fn clear_screen(&self) -> &'static str {
        "\x1b[2J\x1b[H"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KINDS: [Kind; 4] = [Kind::Question, Kind::Answer, Kind::Error, Kind::Info];

    #[test]
    fn plain_formatter_returns_text_unchanged() {
        let formatter = Formatter::with_flags(false, false);
        for kind in KINDS {
            assert_eq!(formatter.format("hello", kind), "hello");
        }
    }

    #[test]
    fn emoji_only_prefixes_the_text() {
        let formatter = Formatter::with_flags(true, false);
        assert_eq!(formatter.format("hello", Kind::Answer), "🤖 hello");
        assert_eq!(formatter.format("oops", Kind::Error), "❌ oops");
        assert_eq!(formatter.prefix(Kind::Question), "🧐 Q: ");
    }

    #[test]
    fn color_wraps_text_in_escape_codes() {
        let formatter = Formatter::with_flags(false, true);
        let out = formatter.format("hello", Kind::Answer);
        assert!(out.contains("hello"));
        assert!(out.starts_with("\x1b["));
        assert!(out.ends_with("\x1b[0m"));
    }

    #[test]
    fn errors_are_colored_differently_from_answers() {
        let formatter = Formatter::with_flags(false, true);
        assert_ne!(
            formatter.format("x", Kind::Error),
            formatter.format("x", Kind::Answer)
        );
    }

    #[test]
    fn prefixes_without_decoration_are_bare_labels() {
        let formatter = Formatter::with_flags(false, false);
        assert_eq!(formatter.prefix(Kind::Question), "Q: ");
        assert_eq!(formatter.prefix(Kind::Answer), "A: ");
    }
}
