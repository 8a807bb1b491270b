//! RCA console: submits industrial failure cases to an analysis webhook,
//! keeps the last result in a local key-value store and renders the returned
//! report as a self-contained, script-free HTML document.

pub mod auth;
pub mod cache;
pub mod config;
pub mod notify;
pub mod prompts;
pub mod render;
pub mod result;
pub mod settings;
pub mod stats;
pub mod store;
pub mod submit;

pub use cache::{ResultCache, RESULT_KEYS};
pub use config::Config;
pub use notify::{Notifier, ReportView, ResultEvent, ResultPoller, StorageWatcher};
pub use render::{NoContentReason, ReportRenderer, Rendition};
pub use result::{ExecutionResult, SubmitMethod};
pub use store::{FileStore, KeyValueStore, MemoryStore, SharedStore};
pub use submit::{CaseForm, Submitter};
