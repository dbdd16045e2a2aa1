use crate::commands::{ControlCommand, InputUnit, classify};
use crate::core::error::DoloresError;
use crate::core::executor::CommandExecutor;
use crate::display::{Formatter, Kind};
use crate::input::{InputEvent, InputSource};
use crate::providers::{ChatClient, Message};
use futures::StreamExt;
use std::future::Future;
use std::io::Write;

const BANNER: &str = "Entering chat mode (type exit to quit, !<command> runs a shell command)";
const INTERRUPTED_HINT: &str = "(interrupted, type exit to quit)";
const FAREWELL: &str = "Goodbye!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingInput,
    Dispatching,
    StreamingReply,
    Terminated,
}

/// Owns the conversation and drives one turn at a time.
///
/// Replies go to `out`, error lines to `err`. The system prompt is kept
/// outside the history and prepended to every request.
pub struct Session<W: Write, E: Write> {
    client: Box<dyn ChatClient>,
    executor: CommandExecutor,
    formatter: Formatter,
    system_prompt: Option<String>,
    history: Vec<Message>,
    state: SessionState,
    last_turn_failed: bool,
    out: W,
    err: E,
}

impl<W: Write, E: Write> Session<W, E> {
    pub fn new(
        client: Box<dyn ChatClient>,
        executor: CommandExecutor,
        formatter: Formatter,
        out: W,
        err: E,
    ) -> Self {
        Self {
            client,
            executor,
            formatter,
            system_prompt: None,
            history: Vec::new(),
            state: SessionState::AwaitingInput,
            last_turn_failed: false,
            out,
            err,
        }
    }

    pub fn with_system_prompt(mut self, system_prompt: Option<String>) -> Self {
        self.system_prompt = system_prompt;
        self
    }

    pub fn is_terminated(&self) -> bool {
        self.state == SessionState::Terminated
    }

    pub fn last_turn_failed(&self) -> bool {
        self.last_turn_failed
    }

    /// Reads and handles input until `exit`, `quit` or end of input.
    pub async fn run<I: InputSource>(&mut self, input: &mut I) -> Result<(), DoloresError> {
        self.info(BANNER)?;

        while !self.is_terminated() {
            let prompt = self.formatter.prefix(Kind::Question);
            match input.read_line(&prompt)? {
                InputEvent::Line(line) => self.handle_input(&line).await?,
                // Nothing to return to yet, so Ctrl-C leaves
                InputEvent::Interrupted if self.history.is_empty() => {
                    self.transition(SessionState::Terminated)
                }
                InputEvent::Interrupted => self.info(INTERRUPTED_HINT)?,
                InputEvent::Eof => self.transition(SessionState::Terminated),
            }
        }

        self.info(FAREWELL)
    }

    /// Classifies and dispatches one input unit. Turn failures are reported
    /// and swallowed; only terminal I/O errors are returned.
    pub async fn handle_input(&mut self, raw: &str) -> Result<(), DoloresError> {
        if self.is_terminated() {
            return Ok(());
        }

        match classify(raw) {
            InputUnit::Empty => Ok(()),
            InputUnit::Control(ControlCommand::Exit | ControlCommand::Quit) => {
                self.transition(SessionState::Terminated);
                Ok(())
            }
            InputUnit::Control(ControlCommand::Clear) => self.clear(),
            InputUnit::Shell(command) => self.shell_turn(&command).await,
            InputUnit::Chat(text) => self.chat_turn(text, true).await,
        }
    }

    /// One-shot, non-streamed turn used by translate mode.
    pub async fn translate(&mut self, text: String) -> Result<(), DoloresError> {
        if self.is_terminated() {
            return Ok(());
        }
        self.chat_turn(text, false).await
    }

    /// Shows a one-shot question the way the prompt would have.
    pub fn echo_question(&mut self, text: &str) -> Result<(), DoloresError> {
        writeln!(self.out, "{}{}", self.formatter.prefix(Kind::Question), text)?;
        self.out.flush()?;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), DoloresError> {
        self.history.clear();
        write!(self.out, "{}", self.formatter.clear_screen())?;
        self.info("Conversation history cleared.")
    }

    async fn shell_turn(&mut self, command: &str) -> Result<(), DoloresError> {
        if command.is_empty() {
            return Ok(());
        }

        self.transition(SessionState::Dispatching);
        let result = interruptible(self.executor.execute(command))
            .await
            .and_then(|output| output);

        match result {
            Ok(result) => {
                if !result.output.is_empty() {
                    write!(self.out, "{}", self.formatter.prefix(Kind::Answer))?;
                    self.out.write_all(result.output.as_bytes())?;
                    if !result.output.ends_with('\n') {
                        writeln!(self.out)?;
                    }
                    self.out.flush()?;
                }
                if !result.success() {
                    self.error_line(&format!("exit status {}", result.exit_code))?;
                }
                self.last_turn_failed = false;
            }
            Err(e) => self.turn_failed(&e)?,
        }

        self.transition(SessionState::AwaitingInput);
        Ok(())
    }

    async fn chat_turn(&mut self, text: String, streaming: bool) -> Result<(), DoloresError> {
        self.history.push(Message::user(text));
        self.transition(if streaming {
            SessionState::StreamingReply
        } else {
            SessionState::Dispatching
        });

        write!(self.out, "{}", self.formatter.prefix(Kind::Answer))?;
        self.out.flush()?;

        let result = if streaming {
            self.stream_reply().await
        } else {
            self.complete_reply().await
        }
        .and_then(|reply| {
            if reply.trim().is_empty() {
                Err(DoloresError::Api("Model returned an empty reply".to_string()))
            } else {
                Ok(reply)
            }
        });

        match result {
            Ok(reply) => {
                if !reply.ends_with('\n') {
                    writeln!(self.out)?;
                }
                self.out.flush()?;
                self.history.push(Message::assistant(reply));
                self.last_turn_failed = false;
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                writeln!(self.out)?;
                self.out.flush()?;
                self.turn_failed(&e)?;
            }
        }

        self.transition(SessionState::AwaitingInput);
        Ok(())
    }

    /// Writes fragments as they arrive. On error the partial text stays on
    /// screen and nothing is recorded.
    async fn stream_reply(&mut self) -> Result<String, DoloresError> {
        let request = self.request();
        let mut stream = interruptible(self.client.stream(&request)).await??;
        let mut reply = String::new();

        while let Some(fragment) = interruptible(stream.next()).await? {
            let fragment = fragment?;
            self.out.write_all(fragment.as_bytes())?;
            self.out.flush()?;
            reply.push_str(&fragment);
        }

        Ok(reply)
    }

    async fn complete_reply(&mut self) -> Result<String, DoloresError> {
        let request = self.request();
        let reply = interruptible(self.client.complete(&request)).await??;
        self.out.write_all(reply.as_bytes())?;
        Ok(reply)
    }

    fn request(&self) -> Vec<Message> {
        self.system_prompt
            .iter()
            .map(Message::system)
            .chain(self.history.iter().cloned())
            .collect()
    }

    fn turn_failed(&mut self, error: &DoloresError) -> Result<(), DoloresError> {
        tracing::debug!(error = %error, history = self.history.len(), "turn failed");
        self.last_turn_failed = true;
        self.error_line(&error.to_string())
    }

    fn transition(&mut self, next: SessionState) {
        tracing::debug!(from = ?self.state, to = ?next, history = self.history.len(), "session state");
        self.state = next;
    }

    fn info(&mut self, text: &str) -> Result<(), DoloresError> {
        writeln!(self.out, "{}", self.formatter.format(text, Kind::Info))?;
        self.out.flush()?;
        Ok(())
    }

    fn error_line(&mut self, text: &str) -> Result<(), DoloresError> {
        writeln!(self.err, "{}", self.formatter.format(text, Kind::Error))?;
        self.err.flush()?;
        Ok(())
    }
}

/// Races `future` against Ctrl-C; the loser is dropped.
async fn interruptible<F: Future>(future: F) -> Result<F::Output, DoloresError> {
    tokio::select! {
        output = future => Ok(output),
        _ = interrupt_signal() => Err(DoloresError::Interrupted),
    }
}

async fn interrupt_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}
