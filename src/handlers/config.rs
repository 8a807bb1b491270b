use anyhow::{bail, Context, Result};

use rca_console::submit::validate_url;

use super::{read_file, write_output, Console};
use crate::cli::ConfigCommand;

pub struct ConfigHandler;

impl ConfigHandler {
    pub fn run(console: &Console, cmd: &ConfigCommand) -> Result<()> {
        let settings = console.settings();
        match cmd {
            ConfigCommand::Show => {
                let current = settings.load();
                let custom = |flag: bool| if flag { "custom" } else { "default" };
                println!("webhook url:    {} ({})", current.webhook_url, custom(settings.has_custom_webhook_url()));
                println!("theme:          {}", current.theme);
                println!("auto save:      {}", current.auto_save);
                println!("notifications:  {}", current.notifications);
                println!("prompts:        {}", custom(console.prompts().is_customized()));
                println!(
                    "last result:    {}",
                    if console.cache().read().is_some() { "available" } else { "none" }
                );
                println!(
                    "session:        {}",
                    console.gate().current_user().map(|u| u.username).unwrap_or_else(|| "none".into())
                );
                println!("store:          {}", console.store_path.display());
            }
            ConfigCommand::SetUrl { url } => {
                validate_url(url)?;
                settings.save_webhook_url(url)?;
                console.notice.success("Destination URL saved");
            }
            ConfigCommand::Prefs { theme, auto_save, notifications } => {
                let current = settings.load();
                settings.save_preferences(
                    theme.unwrap_or(current.theme),
                    auto_save.unwrap_or(current.auto_save),
                    notifications.unwrap_or(current.notifications),
                )?;
                console.notice.success("Preferences saved");
            }
            ConfigCommand::Export { out } => {
                let backup = settings.export_backup(&console.prompts());
                write_output(out.as_deref(), &serde_json::to_string_pretty(&backup)?)?;
            }
            ConfigCommand::Import { file } => {
                let report = settings
                    .import_backup(&console.prompts(), &read_file(file)?)
                    .context("backup not restored")?;
                console
                    .notice
                    .success(&format!("Backup restored: {}", report.applied.join(", ")));
                if !report.skipped.is_empty() {
                    console
                        .notice
                        .info(&format!("Skipped fields with unexpected types: {}", report.skipped.join(", ")));
                }
            }
            ConfigCommand::Reset { yes } => {
                if !yes {
                    bail!("this forgets the saved prompts and destination URL; pass --yes to confirm");
                }
                settings.reset_all(&console.prompts())?;
                console.notice.success("Prompts and destination URL reset to defaults");
            }
        }
        Ok(())
    }
}
