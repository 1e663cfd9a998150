//! Bearer Credential
//!
//! Where the token comes from (secure storage, login screen) is up to the
//! embedding app; the sync code only reads it and drops it on 401/403.

use std::sync::{PoisonError, RwLock};

pub trait CredentialStore: Send + Sync {
    /// Current bearer token, if signed in
    fn bearer(&self) -> Option<String>;

    /// Forget the token after the service rejected it
    fn invalidate(&self);
}

/// Token held in memory
#[derive(Debug, Default)]
pub struct MemoryCredential {
    token: RwLock<Option<String>>,
}

impl MemoryCredential {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }

    /// Store a fresh token after login
    pub fn set(&self, token: impl Into<String>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token.into());
    }
}

impl CredentialStore for MemoryCredential {
    fn bearer(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .filter(|t| !t.is_empty())
    }

    fn invalidate(&self) {
        log::warn!("Credential rejected by board service; signing out");
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}
