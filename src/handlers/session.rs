use std::io::{self, BufRead};

use anyhow::{bail, Result};

use super::Console;

pub struct SessionHandler;

impl SessionHandler {
    pub fn login(console: &Console, username: &str, password: Option<&str>) -> Result<()> {
        let password = match password {
            Some(p) => p.to_string(),
            None => {
                eprint!("Password: ");
                let mut line = String::new();
                io::stdin().lock().read_line(&mut line)?;
                line.trim_end_matches(['\r', '\n']).to_string()
            }
        };
        if !console.gate().login(username, &password)? {
            bail!("invalid username or password");
        }
        console.notice.success(&format!("Logged in as {}", username));
        Ok(())
    }

    pub fn logout(console: &Console) -> Result<()> {
        console.gate().logout()?;
        console.notice.info("Logged out");
        Ok(())
    }
}
