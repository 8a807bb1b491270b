use std::{
    collections::HashMap,
    env,
    fs,
    path::PathBuf,
    time::Duration,
};

use directories::BaseDirs;

pub const DEFAULT_WEBHOOK_URL: &str =
    "https://n8n.grupobeely.com.br/webhook/d620f8b0-a685-4eb7-a9db-367431e11b8e";

#[derive(Debug, Clone)]
pub struct Config {
    inner: HashMap<String, String>,
}

impl Config {
    pub fn load() -> Self {
        let mut map = default_map();

        // Read .rcarc if exists
        if let Ok(text) = fs::read_to_string(default_config_path()) {
            map.extend(parse_rc(&text));
        }

        // Overlay environment variables (take precedence)
        for (k, v) in env::vars() {
            if is_config_key(&k) {
                map.insert(k, v);
            }
        }

        Self { inner: map }
    }

    /// Builds a config from defaults plus explicit entries, ignoring the rc file and environment.
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut map = default_map();
        map.extend(entries.into_iter().map(|(k, v)| (k.into(), v.into())));
        Self { inner: map }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key).cloned()
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(|v| v.trim().parse::<u64>().ok())
    }

    pub fn get_usize(&self, key: &str) -> Option<usize> {
        self.get(key).and_then(|v| v.trim().parse::<usize>().ok())
    }

    pub fn store_path(&self) -> PathBuf {
        self.get("STORE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| config_dir().join("store.json"))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.get_u64("REQUEST_TIMEOUT").unwrap_or(120))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.get_u64("POLL_INTERVAL_MS").unwrap_or(1000).max(10))
    }

    pub fn poll_window(&self) -> Duration {
        Duration::from_secs(self.get_u64("POLL_WINDOW_SECS").unwrap_or(30))
    }

    pub fn history_length(&self) -> usize {
        self.get_usize("HISTORY_LENGTH").unwrap_or(500)
    }

    /// How long the form path waits before abandoning a response nobody reads.
    pub fn form_timeout(&self) -> Duration {
        Duration::from_secs(self.get_u64("FORM_TIMEOUT_SECS").unwrap_or(5).max(1))
    }
}

/// Parses `KEY=VALUE` lines; blank lines and `#` comments are skipped.
pub fn parse_rc(text: &str) -> HashMap<String, String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect()
}

fn is_config_key(k: &str) -> bool {
    const KEYS: &[&str] = &[
        "STORE_PATH",
        "DEFAULT_WEBHOOK_URL",
        "REQUEST_TIMEOUT",
        "POLL_INTERVAL_MS",
        "POLL_WINDOW_SECS",
        "HISTORY_LENGTH",
        "FORM_TIMEOUT_SECS",
        "LOGIN_USERNAME",
        "LOGIN_PASSWORD",
        "REPORT_TITLE",
    ];

    KEYS.contains(&k) || k.starts_with("RCA_")
}

fn config_dir() -> PathBuf {
    let base = BaseDirs::new()
        .map(|b| b.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~/.config"));
    base.join("rca_console")
}

fn default_config_path() -> PathBuf {
    config_dir().join(".rcarc")
}

fn default_map() -> HashMap<String, String> {
    let mut m = HashMap::new();
    m.insert(
        "STORE_PATH".into(),
        config_dir().join("store.json").to_string_lossy().into_owned(),
    );

    // Numbers
    m.insert("REQUEST_TIMEOUT".into(), "120".into());
    m.insert("POLL_INTERVAL_MS".into(), "1000".into());
    m.insert("POLL_WINDOW_SECS".into(), "30".into());
    m.insert("HISTORY_LENGTH".into(), "500".into());
    m.insert("FORM_TIMEOUT_SECS".into(), "5".into());

    // Strings
    m.insert("DEFAULT_WEBHOOK_URL".into(), DEFAULT_WEBHOOK_URL.into());
    m.insert("LOGIN_USERNAME".into(), "analista".into());
    m.insert("LOGIN_PASSWORD".into(), "rca@2025".into());
    m.insert("REPORT_TITLE".into(), "Relatório A3 – Análise de Falha".into());
    m.insert("RCA_LOG_LEVEL".into(), "warn".into());

    m
}
