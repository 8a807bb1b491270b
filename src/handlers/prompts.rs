use anyhow::{bail, Result};

use super::{read_file, write_output, Console};
use crate::cli::PromptsCommand;

pub struct PromptsHandler;

impl PromptsHandler {
    pub fn run(console: &Console, cmd: &PromptsCommand) -> Result<()> {
        let store = console.prompts();
        match cmd {
            PromptsCommand::Show => {
                let prompts = store.load();
                let origin = if store.is_customized() { "custom" } else { "default" };
                println!("# prompts ({origin})\n");
                for (name, text) in [("a1", &prompts.a1), ("a2", &prompts.a2), ("a3", &prompts.a3)] {
                    println!("## {name}\n{text}\n");
                }
            }
            PromptsCommand::Set { a1, a2, a3 } => {
                if a1.is_none() && a2.is_none() && a3.is_none() {
                    bail!("nothing to set; pass --a1, --a2 and/or --a3 with a file path");
                }
                let mut prompts = store.load();
                for (path, slot) in [(a1, &mut prompts.a1), (a2, &mut prompts.a2), (a3, &mut prompts.a3)] {
                    if let Some(path) = path {
                        *slot = read_file(path)?;
                    }
                }
                store.save(&prompts)?;
                console.notice.success("Prompts saved");
            }
            PromptsCommand::Reset => {
                store.reset()?;
                console.notice.success("Prompts restored to defaults");
            }
            PromptsCommand::Export { out } => write_output(out.as_deref(), &store.export()?)?,
            PromptsCommand::Import { file } => {
                store.import(&read_file(file)?)?;
                console.notice.success("Prompts imported");
            }
        }
        Ok(())
    }
}
