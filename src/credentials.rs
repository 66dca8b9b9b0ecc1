//! OS keychain storage for portal accounts
//!
//! Passwords never touch the config file; they live in the platform
//! keychain (Windows Credential Manager, macOS Keychain, Linux Secret
//! Service) under the `nauta-connect` service. The keychain API offers no
//! enumeration, so the list of stored usernames is kept in config.

use keyring::Entry;
use thiserror::Error;

const SERVICE: &str = "nauta-connect";

#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("Keychain operation failed: {0}")]
    Keyring(#[from] keyring::Error),
}

/// Keychain-backed store of `(username, password)` pairs
pub struct CredentialStore {
    service: String,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self {
            service: SERVICE.to_string(),
        }
    }

    fn entry(&self, username: &str) -> Result<Entry, CredentialError> {
        Ok(Entry::new(&self.service, username)?)
    }

    pub fn store(&self, username: &str, password: &str) -> Result<(), CredentialError> {
        self.entry(username)?.set_password(password)?;
        Ok(())
    }

    pub fn password(&self, username: &str) -> Result<String, CredentialError> {
        Ok(self.entry(username)?.get_password()?)
    }

    pub fn remove(&self, username: &str) -> Result<(), CredentialError> {
        self.entry(username)?.delete_credential()?;
        Ok(())
    }
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new()
    }
}
