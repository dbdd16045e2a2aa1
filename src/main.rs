use clap::Parser;
use dotenv::dotenv;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod app;
mod cli;
mod commands;
mod config;
mod core;
mod display;
mod input;
mod providers;
mod session;
mod system;

use crate::app::Application;
use crate::cli::Args;
use crate::config::Config;
use crate::providers::openai_compatible::OpenAICompatibleClient;

const LOG_ENV: &str = "DOLORES_LOG";

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenv().ok();

    let args = Args::parse();
    init_tracing(args.verbose);

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", console::style(e).red().bold());
            return ExitCode::FAILURE;
        }
    };
    tracing::debug!(?config, "configuration loaded");

    let client = Box::new(OpenAICompatibleClient::from_config(&config));
    match Application::new(args, config, client).run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}", console::style(e).red().bold());
            ExitCode::FAILURE
        }
    }
}

// Logs go to stderr so they never mix with replies on stdout
fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "dolores=debug,warn" } else { "dolores=warn" };
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}
