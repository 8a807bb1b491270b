use std::path::PathBuf;

use clap::{ArgGroup, Args, Parser, Subcommand};
use rca_console::settings::Theme;

#[derive(Parser, Debug, Clone)]
#[command(name = "rca", about = "RCA console: failure analysis via webhook", version)]
pub struct Cli {
    /// Override the store file (defaults to STORE_PATH).
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Log in with the configured credentials.
    Login {
        username: String,
        /// Password; read from stdin when omitted.
        #[arg(long)]
        password: Option<String>,
    },
    /// Forget the current session.
    Logout,
    /// Send a failure case to the analysis webhook.
    Submit(SubmitArgs),
    /// Show the last analysis report.
    Report(ReportArgs),
    /// Manage the agent prompts.
    #[command(subcommand)]
    Prompts(PromptsCommand),
    /// Manage destination URL, preferences and backups.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Summary of past analyses.
    Stats,
}

#[derive(Args, Debug, Clone)]
pub struct SubmitArgs {
    /// Failure description (required); read from stdin when piped.
    #[arg(short = 'd', long)]
    pub description: Option<String>,

    /// Downtime in minutes.
    #[arg(long, default_value = "")]
    pub duration: String,

    /// Production reduction in percent.
    #[arg(long, default_value = "")]
    pub reduction: String,

    /// Estimated cost.
    #[arg(long, default_value = "")]
    pub cost: String,

    /// Revenue per hour.
    #[arg(long, default_value = "")]
    pub revenue: String,

    /// Equipment tag.
    #[arg(long, default_value = "")]
    pub tag: String,

    /// Asset number.
    #[arg(long, default_value = "")]
    pub asset: String,

    /// Fill every field with the bundled example case.
    #[arg(long)]
    pub example: bool,

    /// Destination URL for this submission only.
    #[arg(long)]
    pub url: Option<String>,

    /// Use the form-encoded delivery (response is not read).
    #[arg(long)]
    pub form: bool,

    /// Write the rendered report here when the call succeeds.
    #[arg(short = 'o', long)]
    pub out: Option<PathBuf>,

    /// Write the bare report document instead of the sandboxed host page.
    #[arg(long, requires = "out")]
    pub raw: bool,
}

#[derive(Args, Debug, Clone)]
#[command(group(ArgGroup::new("report_mode").args(["json", "clear"]).multiple(false)))]
pub struct ReportArgs {
    /// Write the document to a file instead of stdout.
    #[arg(short = 'o', long)]
    pub out: Option<PathBuf>,

    /// Emit the bare report document instead of the sandboxed host page.
    /// The document may carry scripts from the webhook.
    #[arg(long)]
    pub raw: bool,

    /// Print the cached response data as JSON.
    #[arg(long)]
    pub json: bool,

    /// Wait for a result (polling window) and keep following changes.
    #[arg(short = 'w', long, conflicts_with = "clear")]
    pub watch: bool,

    /// Remove the cached result.
    #[arg(long)]
    pub clear: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum PromptsCommand {
    /// Print the prompts in use.
    Show,
    /// Replace one or more prompts with file contents.
    Set {
        #[arg(long)]
        a1: Option<PathBuf>,
        #[arg(long)]
        a2: Option<PathBuf>,
        #[arg(long)]
        a3: Option<PathBuf>,
    },
    /// Restore the default prompts.
    Reset,
    /// Write the prompts as JSON.
    Export {
        #[arg(short = 'o', long)]
        out: Option<PathBuf>,
    },
    /// Load prompts from a JSON file with a1, a2 and a3.
    Import { file: PathBuf },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommand {
    /// Print current settings.
    Show,
    /// Save the destination URL.
    SetUrl { url: String },
    /// Save interface preferences.
    Prefs {
        #[arg(long)]
        theme: Option<Theme>,
        #[arg(long = "auto-save")]
        auto_save: Option<bool>,
        #[arg(long)]
        notifications: Option<bool>,
    },
    /// Write a backup file.
    Export {
        #[arg(short = 'o', long)]
        out: Option<PathBuf>,
    },
    /// Restore a backup file.
    Import { file: PathBuf },
    /// Forget saved prompts and destination URL (the session is kept).
    Reset {
        /// Confirm the reset.
        #[arg(long)]
        yes: bool,
    },
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}
