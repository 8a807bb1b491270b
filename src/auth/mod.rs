//! Fixed-credential session gate.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::Config;
use crate::store::{SharedStore, StoreError};

pub const AUTH_KEY: &str = "rca_auth";
pub const USER_KEY: &str = "rca_user";

#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            username: cfg.get("LOGIN_USERNAME").unwrap_or_default(),
            password: cfg.get("LOGIN_PASSWORD").unwrap_or_default(),
        }
    }

    fn matches(&self, username: &str, password: &str) -> bool {
        !self.username.is_empty() && self.username == username && self.password == password
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
}

#[derive(Clone)]
pub struct SessionGate {
    store: SharedStore,
    credentials: Credentials,
}

impl SessionGate {
    pub fn new(store: SharedStore, credentials: Credentials) -> Self {
        Self { store, credentials }
    }

    /// Returns `false` on a credential mismatch; the stored flag is left untouched.
    pub fn login(&self, username: &str, password: &str) -> Result<bool, StoreError> {
        if !self.credentials.matches(username, password) {
            info!(username, "login rejected");
            return Ok(false);
        }
        self.store.set(AUTH_KEY, "true")?;
        self.store
            .set(USER_KEY, &serde_json::to_string(&User { username: username.to_string() })?)?;
        info!(username, "logged in");
        Ok(true)
    }

    pub fn logout(&self) -> Result<(), StoreError> {
        self.store.remove(AUTH_KEY)?;
        self.store.remove(USER_KEY)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.store.get(AUTH_KEY), Ok(Some(v)) if v == "true")
    }

    pub fn current_user(&self) -> Option<User> {
        let raw = self.store.get(USER_KEY).ok().flatten()?;
        serde_json::from_str(&raw).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn gate() -> SessionGate {
        SessionGate::new(
            MemoryStore::shared(),
            Credentials { username: "analista".into(), password: "secret".into() },
        )
    }

    #[test]
    fn wrong_credentials_leave_flag_unset() {
        let gate = gate();
        assert!(!gate.login("analista", "nope").unwrap());
        assert!(!gate.login("other", "secret").unwrap());
        assert!(!gate.is_authenticated());
        assert_eq!(gate.current_user(), None);
    }

    #[test]
    fn login_then_logout() {
        let gate = gate();
        assert!(gate.login("analista", "secret").unwrap());
        assert!(gate.is_authenticated());
        assert_eq!(gate.current_user().map(|u| u.username).as_deref(), Some("analista"));

        gate.logout().unwrap();
        assert!(!gate.is_authenticated());
        assert_eq!(gate.current_user(), None);
    }

    #[test]
    fn empty_configured_username_never_matches() {
        let gate = SessionGate::new(
            MemoryStore::shared(),
            Credentials { username: String::new(), password: String::new() },
        );
        assert!(!gate.login("", "").unwrap());
    }
}
