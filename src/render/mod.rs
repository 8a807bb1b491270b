//! Turns a cached result into a display-only HTML document.
//!
//! The fragment returned by the webhook comes from outside the trust boundary.
//! The rendered document never carries script of its own, and
//! [`sandboxed_frame`] embeds it in an iframe with an empty `sandbox`
//! attribute (scripts disabled, unique origin). Wrapper stripping is
//! pattern-based and tolerates malformed markup.

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::config::Config;
use crate::result::ExecutionResult;

pub const DEFAULT_REPORT_TITLE: &str = "Relatório A3 – Análise de Falha";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoContentReason {
    /// Nothing cached yet.
    Missing,
    /// The call failed; `status` is 0 when it never completed.
    CallFailed { status: u16 },
    /// The call succeeded but returned no HTML.
    NoHtml,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendition {
    Document(String),
    NoContent(NoContentReason),
}

impl Rendition {
    pub fn document(&self) -> Option<&str> {
        match self {
            Rendition::Document(doc) => Some(doc),
            Rendition::NoContent(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReportRenderer {
    title: String,
}

impl Default for ReportRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_REPORT_TITLE)
    }
}

impl ReportRenderer {
    pub fn new(title: impl Into<String>) -> Self {
        Self { title: title.into() }
    }

    pub fn from_config(cfg: &Config) -> Self {
        cfg.get("REPORT_TITLE")
            .filter(|t| !t.trim().is_empty())
            .map(Self::new)
            .unwrap_or_default()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn render_cached(&self, cached: Option<&ExecutionResult>) -> Rendition {
        match cached {
            Some(result) => self.render(result),
            None => Rendition::NoContent(NoContentReason::Missing),
        }
    }

    pub fn render(&self, result: &ExecutionResult) -> Rendition {
        if !result.success {
            debug!(status = result.status, "call failed; nothing to render");
            return Rendition::NoContent(NoContentReason::CallFailed { status: result.status });
        }
        if let Some(fragment) = result.html_fragment() {
            debug!(len = fragment.len(), "embedding html fragment in report template");
            return Rendition::Document(self.wrap(&unwrap_fragment(fragment)));
        }
        if result.content_type.contains("text/html") {
            if let Some(document) = result.data.as_str() {
                debug!("passing html document through unchanged");
                return Rendition::Document(document.to_string());
            }
        }
        debug!(content_type = %result.content_type, "no html in response");
        Rendition::NoContent(NoContentReason::NoHtml)
    }

    fn wrap(&self, fragment: &str) -> String {
        let title = escape_html(&self.title);
        format!(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\" />\n<title>{title}</title>\n<style>\n{REPORT_CSS}</style>\n</head>\n<body>\n<div class=\"container\">\n<div class=\"header\"><h1>{title}</h1></div>\n<div class=\"content\">\n{fragment}\n</div>\n</div>\n</body>\n</html>\n"
        )
    }
}

/// Strips `<html>`, `<head>…</head>` and `<body>` wrappers from a fragment.
pub fn unwrap_fragment(html: &str) -> String {
    static BODY: OnceLock<Regex> = OnceLock::new();
    static WRAPPERS: OnceLock<Regex> = OnceLock::new();
    static STRAY_BODY: OnceLock<Regex> = OnceLock::new();

    let body = BODY.get_or_init(|| {
        Regex::new(r"(?is)<body(?:\s[^>]*)?>(.*)</body\s*>").expect("body pattern is valid")
    });
    let wrappers = WRAPPERS.get_or_init(|| {
        Regex::new(r"(?is)<!doctype[^>]*>|<html(?:\s[^>]*)?>|</html\s*>|<head(?:\s[^>]*)?>.*?</head\s*>")
            .expect("wrapper pattern is valid")
    });
    let stray_body = STRAY_BODY.get_or_init(|| {
        Regex::new(r"(?i)<body(?:\s[^>]*)?>|</body\s*>").expect("stray body pattern is valid")
    });

    let inner = body.replace(html, "$1");
    let inner = wrappers.replace_all(&inner, "");
    stray_body.replace_all(&inner, "").trim().to_string()
}

/// Host page embedding `document` in a script-less, origin-isolated iframe.
pub fn sandboxed_frame(document: &str, title: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\" />\n<title>{title}</title>\n<style>html,body{{margin:0;height:100%;background:#0f172a;}}iframe{{border:0;width:100%;height:100%;}}</style>\n</head>\n<body>\n<iframe sandbox=\"\" referrerpolicy=\"no-referrer\" title=\"{title}\" srcdoc=\"{srcdoc}\"></iframe>\n</body>\n</html>\n",
        title = escape_html(title),
        srcdoc = escape_html(document),
    )
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

const REPORT_CSS: &str = r#"* { box-sizing: border-box; }
body {
  font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
  margin: 0;
  padding: 24px;
  background: linear-gradient(135deg, #0f172a 0%, #1e293b 100%);
  color: #f1f5f9;
  line-height: 1.6;
}
.container {
  max-width: 1200px;
  margin: 0 auto;
  background: #1e293b;
  border-radius: 16px;
  box-shadow: 0 10px 25px rgba(0,0,0,0.3);
  overflow: hidden;
  border: 1px solid #334155;
}
.header {
  position: sticky;
  top: 0;
  background: linear-gradient(135deg, #1e40af 0%, #3b82f6 100%);
  color: white;
  padding: 32px;
  text-align: center;
}
.header h1 { margin: 0; font-size: 2.5rem; font-weight: 700; text-shadow: 0 2px 4px rgba(0,0,0,0.3); }
.content { padding: 32px; }
h2 {
  color: #60a5fa;
  margin: 32px 0 20px 0;
  font-size: 1.75rem;
  font-weight: 600;
  border-bottom: 3px solid #475569;
  padding-bottom: 12px;
}
h3 { color: #e2e8f0; font-size: 1.25rem; font-weight: 600; margin: 20px 0 12px 0; }
.card {
  background: linear-gradient(135deg, #334155 0%, #475569 100%);
  border: 1px solid #64748b;
  border-radius: 12px;
  padding: 24px;
  margin: 20px 0;
  box-shadow: 0 4px 6px rgba(0,0,0,0.2);
}
.subcard {
  background: #1e293b;
  border: 2px dashed #64748b;
  padding: 20px;
  margin: 16px 0;
  border-radius: 8px;
}
.subcard div { margin: 8px 0; padding: 4px 0; }
.subcard b { color: #60a5fa; font-weight: 600; display: inline-block; min-width: 140px; }
.avisos {
  background: linear-gradient(135deg, #451a03 0%, #78350f 100%);
  border: 2px solid #f59e0b;
  color: #fbbf24;
}
.avisos h3 { color: #fbbf24; }
ul { margin: 12px 0; padding-left: 24px; }
li { margin: 8px 0; padding: 4px 0; }
.task-type {
  display: inline-block;
  padding: 2px 8px;
  border-radius: 12px;
  font-size: 0.75rem;
  font-weight: 500;
  text-transform: uppercase;
  margin-left: 8px;
}
.task-type.inspecao { background: #1e40af; color: #dbeafe; }
.task-type.documento { background: #166534; color: #dcfce7; }
.task-type.medicao { background: #92400e; color: #fef3c7; }
@media (max-width: 768px) {
  body { padding: 12px; }
  .header { padding: 20px; }
  .header h1 { font-size: 2rem; }
  .content, .card, .subcard { padding: 16px; }
}
"#;
