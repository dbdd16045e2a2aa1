use crate::cli::Args;
use crate::config::Config;
use crate::core::error::DoloresError;
use crate::core::executor::CommandExecutor;
use crate::display::Formatter;
use crate::input::{self, LineEditor};
use crate::providers::ChatClient;
use crate::session::Session;
use crate::system::SystemInfo;
use is_terminal::IsTerminal;
use std::io::{self, Write};
use std::process::ExitCode;

pub struct Application {
    pub args: Args,
    pub config: Config,
    pub client: Box<dyn ChatClient>,
}

impl Application {
    pub fn new(args: Args, config: Config, client: Box<dyn ChatClient>) -> Self {
        Self {
            args,
            config,
            client,
        }
    }

    pub async fn run(self) -> Result<ExitCode, DoloresError> {
        let piped = input::read_piped_input()?;
        let query = (!self.args.text.is_empty()).then(|| self.args.text.join(" "));
        let input_text = compose_input(piped, query);

        if self.args.print_text {
            if let Some(text) = &input_text {
                let mut stdout = io::stdout();
                writeln!(stdout, "{}", text)?;
                stdout.flush()?;
            }
            return Ok(ExitCode::SUCCESS);
        }

        let system_prompt = resolve_system_prompt(&self.args, &self.config);
        let interactive = input::stdin_is_terminal();
        tracing::debug!(
            interactive,
            translate = self.args.translate,
            has_input = input_text.is_some(),
            "starting session"
        );

        let mut session = Session::new(
            self.client,
            CommandExecutor::new(SystemInfo::new()),
            Formatter::new(&self.config),
            io::stdout(),
            io::stderr(),
        )
        .with_system_prompt(system_prompt);

        match input_text {
            Some(text) => {
                if io::stdout().is_terminal() {
                    session.echo_question(&text)?;
                }
                if self.args.translate {
                    session.translate(text).await?;
                } else {
                    session.handle_input(&text).await?;
                }

                if self.args.repl && interactive && !session.is_terminated() {
                    session.run(&mut LineEditor::new()?).await?;
                } else if session.last_turn_failed() {
                    return Ok(ExitCode::FAILURE);
                }
            }
            None if interactive => session.run(&mut LineEditor::new()?).await?,
            None => tracing::debug!("stdin was empty, nothing to send"),
        }

        Ok(ExitCode::SUCCESS)
    }
}

/// Joins piped stdin and command-line text into one input unit.
fn compose_input(piped: Option<String>, query: Option<String>) -> Option<String> {
    match (piped, query) {
        (Some(piped), Some(query)) => Some(format!("{}\n\n{}", piped, query)),
        (Some(piped), None) => Some(piped),
        (None, query) => query,
    }
}

/// `-p` replaces the configured prompt; translate mode always adds its
/// instruction after whichever custom prompt was given on the command line.
fn resolve_system_prompt(args: &Args, config: &Config) -> Option<String> {
    let translate = args
        .translate
        .then(|| translate_prompt(&config.translate_language));

    match (args.prompt.clone(), translate) {
        (Some(custom), Some(translate)) => Some(format!("{}\n\n{}", custom, translate)),
        (Some(custom), None) => Some(custom),
        (None, Some(translate)) => Some(translate),
        (None, None) => config.system_prompt.clone(),
    }
}

pub fn translate_prompt(language: &str) -> String {
    format!(
        "You are a translator. Translate the user's text into {}. \
Reply with the translation only.",
        language
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn config(system_prompt: Option<&str>) -> Config {
        Config::from_lookup(|name| match name {
            "DOLORES_API_KEY" => Some("sk-test".to_string()),
            "DOLORES_SYSTEM_PROMPT" => system_prompt.map(str::to_string),
            _ => None,
        })
        .unwrap()
    }

    #[test]
    fn piped_text_comes_before_arguments() {
        assert_eq!(
            compose_input(Some("log line".into()), Some("explain".into())).as_deref(),
            Some("log line\n\nexplain")
        );
        assert_eq!(
            compose_input(Some("only pipe".into()), None).as_deref(),
            Some("only pipe")
        );
        assert_eq!(
            compose_input(None, Some("only args".into())).as_deref(),
            Some("only args")
        );
        assert_eq!(compose_input(None, None), None);
    }

    #[test]
    fn custom_prompt_replaces_the_configured_one() {
        let args = Args::parse_from(["dolores", "-p", "Be terse."]);
        assert_eq!(
            resolve_system_prompt(&args, &config(Some("From env"))).as_deref(),
            Some("Be terse.")
        );
    }

    #[test]
    fn translate_keeps_its_instruction_next_to_a_custom_prompt() {
        let args = Args::parse_from(["dolores", "-t", "-p", "Be formal."]);
        let prompt = resolve_system_prompt(&args, &config(Some("From env"))).unwrap();
        assert!(prompt.starts_with("Be formal."));
        assert!(prompt.ends_with(&translate_prompt("Chinese")));
        assert!(!prompt.contains("From env"));
    }

    #[test]
    fn translate_mode_seeds_the_translate_prompt() {
        let args = Args::parse_from(["dolores", "-t"]);
        assert_eq!(
            resolve_system_prompt(&args, &config(Some("From env"))),
            Some(translate_prompt("Chinese"))
        );
    }

    #[test]
    fn configured_prompt_is_the_fallback() {
        let args = Args::parse_from(["dolores"]);
        assert_eq!(
            resolve_system_prompt(&args, &config(Some("From env"))).as_deref(),
            Some("From env")
        );
        assert_eq!(resolve_system_prompt(&args, &config(None)), None);
    }

    #[test]
    fn translate_prompt_names_the_language() {
        assert!(translate_prompt("French").contains("into French."));
    }
}
