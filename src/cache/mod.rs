//! The "last execution result" record, stored under every historical key name.

use tracing::{debug, warn};

use crate::result::ExecutionResult;
use crate::store::{SharedStore, StoreError};

/// Keys holding the current result, in read priority order. The first entry is canonical.
pub const RESULT_KEYS: [&str; 5] = [
    "rca_last_response",
    "beely_last_response",
    "rca_response",
    "latest_analysis",
    "last_webhook_response",
];

#[derive(Clone)]
pub struct ResultCache {
    store: SharedStore,
}

impl ResultCache {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub fn aliases(&self) -> &'static [&'static str] {
        &RESULT_KEYS
    }

    pub fn is_alias(key: &str) -> bool {
        RESULT_KEYS.contains(&key)
    }

    /// Writes the canonical key and mirrors every legacy alias.
    pub fn write(&self, result: &ExecutionResult) -> Result<(), StoreError> {
        let text = serde_json::to_string(result)?;
        for key in RESULT_KEYS {
            self.store.set(key, &text)?;
        }
        debug!(status = result.status, success = result.success, "cached execution result");
        Ok(())
    }

    /// First alias holding a non-empty value decides; an unparsable value reads as absent.
    pub fn read(&self) -> Option<ExecutionResult> {
        for key in RESULT_KEYS {
            let raw = match self.store.get(key) {
                Ok(Some(raw)) if !raw.is_empty() => raw,
                Ok(_) => continue,
                Err(err) => {
                    warn!(key, error = %err, "result store unreadable");
                    return None;
                }
            };
            return match serde_json::from_str(&raw) {
                Ok(result) => {
                    debug!(key, "found cached result");
                    Some(result)
                }
                Err(err) => {
                    warn!(key, error = %err, "cached result is not valid JSON; treating as absent");
                    None
                }
            };
        }
        None
    }

    /// Raw value of every alias, in priority order.
    pub fn snapshot(&self) -> Vec<(&'static str, Option<String>)> {
        RESULT_KEYS
            .iter()
            .map(|key| (*key, self.store.get(key).ok().flatten()))
            .collect()
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        for key in RESULT_KEYS {
            self.store.remove(key)?;
        }
        debug!("cleared cached execution result");
        Ok(())
    }
}
