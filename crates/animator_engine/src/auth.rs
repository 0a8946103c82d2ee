use std::sync::RwLock;

use animator_logging::{animator_debug, redact_secret};

/// External authorization collaborator. The job monitor only asks whether a
/// credential exists; provider clients read it when they make a call.
#[async_trait::async_trait]
pub trait AuthorizationProvider: Send + Sync {
    async fn has_credential(&self) -> bool;

    /// Lets the user select a credential. Completes when the selection flow ends.
    async fn prompt_for_credential(&self);

    async fn credential(&self) -> Option<String>;
}

/// In-memory credential slot, seeded by the application.
#[derive(Debug, Default)]
pub struct SharedCredential {
    key: RwLock<Option<String>>,
}

impl SharedCredential {
    pub fn new(key: Option<String>) -> Self {
        let key = key.filter(|k| !k.trim().is_empty());
        Self {
            key: RwLock::new(key),
        }
    }

    pub fn set(&self, key: impl Into<String>) {
        let key = key.into();
        animator_debug!("credential selected ({})", redact_secret(&key));
        if let Ok(mut slot) = self.key.write() {
            *slot = Some(key);
        }
    }

    pub fn clear(&self) {
        if let Ok(mut slot) = self.key.write() {
            *slot = None;
        }
    }

    pub fn get(&self) -> Option<String> {
        self.key.read().ok().and_then(|slot| slot.clone())
    }
}

#[async_trait::async_trait]
impl AuthorizationProvider for SharedCredential {
    async fn has_credential(&self) -> bool {
        self.get().is_some()
    }

    /// Nothing to prompt with; the application replaces the key via [`SharedCredential::set`].
    async fn prompt_for_credential(&self) {}

    async fn credential(&self) -> Option<String> {
        self.get()
    }
}
