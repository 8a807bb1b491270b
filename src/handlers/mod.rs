pub mod config;
pub mod prompts;
pub mod report;
pub mod session;
pub mod stats;
pub mod submit;

use std::{fs, path::{Path, PathBuf}, sync::Arc};

use anyhow::{bail, Context, Result};

use rca_console::{
    auth::{Credentials, SessionGate},
    config::Config,
    prompts::PromptStore,
    settings::SettingsStore,
    render::sandboxed_frame,
    FileStore, ReportRenderer, ResultCache, SharedStore,
};

use crate::printer::Notice;

/// Everything a command needs, wired once from configuration.
pub struct Console {
    pub cfg: Config,
    pub store: SharedStore,
    pub store_path: PathBuf,
    pub notice: Notice,
}

impl Console {
    pub fn open(cfg: Config, store_override: Option<PathBuf>) -> Self {
        let file = match store_override {
            Some(path) => FileStore::open(path),
            None => FileStore::from_config(&cfg),
        };
        let store_path = file.path().to_path_buf();
        let store: SharedStore = Arc::new(file);
        let notifications = SettingsStore::new(store.clone(), "").load().notifications;
        Self { cfg, store, store_path, notice: Notice { enabled: notifications } }
    }

    pub fn gate(&self) -> SessionGate {
        SessionGate::new(self.store.clone(), Credentials::from_config(&self.cfg))
    }

    pub fn require_login(&self) -> Result<()> {
        if !self.gate().is_authenticated() {
            bail!("not logged in; run `rca login <username>` first");
        }
        Ok(())
    }

    pub fn cache(&self) -> ResultCache {
        ResultCache::new(self.store.clone())
    }

    pub fn prompts(&self) -> PromptStore {
        PromptStore::new(self.store.clone())
    }

    pub fn settings(&self) -> SettingsStore {
        let default_url = self.cfg.get("DEFAULT_WEBHOOK_URL").unwrap_or_default();
        SettingsStore::new(self.store.clone(), default_url)
    }

    pub fn renderer(&self) -> ReportRenderer {
        ReportRenderer::from_config(&self.cfg)
    }
}

/// Writes to `out` when given, otherwise to stdout.
pub fn write_output(out: Option<&Path>, text: &str) -> Result<()> {
    match out {
        Some(path) => {
            fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;
            Ok(())
        }
        None => {
            println!("{}", text);
            Ok(())
        }
    }
}

/// Writes a rendered report. The webhook's markup is untrusted, so unless
/// `raw` is set it only leaves here inside the sandboxed host page.
pub fn emit_document(renderer: &ReportRenderer, doc: &str, raw: bool, out: Option<&Path>) -> Result<()> {
    if raw {
        write_output(out, doc)
    } else {
        write_output(out, &sandboxed_frame(doc, renderer.title()))
    }
}

pub fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}
