//! Terminal notices (owo-colors) and markdown tables (termimad).

use owo_colors::OwoColorize;
use termimad::MadSkin;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Success,
    Failure,
    Info,
}

/// Notices go to stderr so stdout stays usable for documents and JSON.
pub struct Notice {
    pub enabled: bool,
}

impl Notice {
    pub fn show(&self, tone: Tone, text: &str) {
        if !self.enabled && tone != Tone::Failure {
            return;
        }
        match tone {
            Tone::Success => eprintln!("{} {}", "✔".green(), text.green()),
            Tone::Failure => eprintln!("{} {}", "✘".red(), text.red()),
            Tone::Info => eprintln!("{}", text.cyan()),
        }
    }

    pub fn success(&self, text: &str) {
        self.show(Tone::Success, text)
    }

    pub fn failure(&self, text: &str) {
        self.show(Tone::Failure, text)
    }

    pub fn info(&self, text: &str) {
        self.show(Tone::Info, text)
    }
}

pub struct MarkdownPrinter {
    pub skin: MadSkin,
}

impl Default for MarkdownPrinter {
    fn default() -> Self {
        Self { skin: MadSkin::default() }
    }
}

impl MarkdownPrinter {
    pub fn print(&self, text: &str) {
        self.skin.print_text(text);
        println!();
    }
}
