mod cli;
mod handlers;
mod printer;

use std::io::{self, Read};

use anyhow::Result;
use is_terminal::IsTerminal;
use rca_console::Config;
use tracing_subscriber::EnvFilter;

use cli::Command;
use handlers::{
    config::ConfigHandler, prompts::PromptsHandler, report::ReportHandler, session::SessionHandler,
    stats::StatsHandler, submit::SubmitHandler, Console,
};

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let cfg = Config::load();

    // RUST_LOG wins; otherwise the configured level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(cfg.get("RCA_LOG_LEVEL").unwrap_or_else(|| "warn".into()))
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let console = Console::open(cfg, args.store.clone());

    if !matches!(args.command, Command::Login { .. } | Command::Logout) {
        console.require_login()?;
    }

    match &args.command {
        Command::Login { username, password } => SessionHandler::login(&console, username, password.as_deref()),
        Command::Logout => SessionHandler::logout(&console),
        Command::Submit(submit_args) => {
            // stdin handling (pipe support for the description)
            let mut piped = None;
            if submit_args.description.is_none() && !submit_args.example && !io::stdin().is_terminal() {
                let mut buf = String::new();
                io::stdin().read_to_string(&mut buf)?;
                if !buf.trim().is_empty() {
                    piped = Some(buf.trim_end().to_string());
                }
            }
            SubmitHandler::run(&console, submit_args, piped).await
        }
        Command::Report(report_args) => ReportHandler::run(&console, report_args).await,
        Command::Prompts(cmd) => PromptsHandler::run(&console, cmd),
        Command::Config(cmd) => ConfigHandler::run(&console, cmd),
        Command::Stats => StatsHandler::run(&console),
    }
}
