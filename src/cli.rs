use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Question or text to send; piped stdin is sent together with it
    pub text: Vec<String>,

    /// Stay in interactive mode after answering the initial input
    #[arg(short, long)]
    pub repl: bool,

    /// Translate the input with a single non-streamed completion
    #[arg(short, long)]
    pub translate: bool,

    /// Print the collected input text instead of sending it
    #[arg(short = 'P', long)]
    pub print_text: bool,

    /// Custom system prompt
    #[arg(short, long)]
    pub prompt: Option<String>,

    /// Log debug information to stderr
    #[arg(short, long)]
    pub verbose: bool,
}
