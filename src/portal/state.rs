//! Durable session state
//!
//! The persistent half of a portal session: the anti-forgery tokens
//! scraped from the login form and, while connected, the identity the
//! portal issued. The cookie jar is deliberately not part of this; it
//! lives inside the transport and dies with the process.

use crate::settings::{SettingsError, SettingsStore};
use serde::{Deserialize, Serialize};

/// Identity of an authenticated session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthInfo {
    pub username: String,
    /// Server-issued session identifier, required for logout and queries
    pub attribute_uuid: String,
}

/// Session fields mirrored to a [`SettingsStore`]
///
/// `auth` is present iff a login succeeded and no logout has happened
/// since. The token fields become stale once used for a login; they are
/// re-acquired from a fresh portal GET whenever a login starts without
/// them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub csrfhw: String,
    pub wlanuserip: String,
    pub login_url: String,
    pub auth: Option<AuthInfo>,
}

impl SessionState {
    pub fn is_connected(&self) -> bool {
        self.auth.is_some()
    }

    /// True when the anti-forgery token from the login form is present
    pub fn has_tokens(&self) -> bool {
        !self.csrfhw.is_empty()
    }

    /// Reconstruct state from the last saved values
    ///
    /// A fresh, never-saved store yields an unconnected, token-less state.
    pub fn load<S: SettingsStore>(store: &S) -> Result<Self, SettingsError> {
        let auth = if store.get_bool("connected")? {
            Some(AuthInfo {
                username: store.get_string("username")?,
                attribute_uuid: store.get_string("attribute-uuid")?,
            })
        } else {
            None
        };

        Ok(Self {
            csrfhw: store.get_string("csrfhw")?,
            wlanuserip: store.get_string("wlanuserip")?,
            login_url: store.get_string("login-url")?,
            auth,
        })
    }

    /// Write every field; identity fields are cleared when not connected
    pub fn save<S: SettingsStore>(&self, store: &mut S) -> Result<(), SettingsError> {
        store.set_string("csrfhw", &self.csrfhw)?;
        store.set_string("wlanuserip", &self.wlanuserip)?;
        store.set_string("login-url", &self.login_url)?;
        store.set_bool("connected", self.is_connected())?;

        match &self.auth {
            Some(auth) => {
                store.set_string("username", &auth.username)?;
                store.set_string("attribute-uuid", &auth.attribute_uuid)?;
            }
            None => {
                store.set_string("username", "")?;
                store.set_string("attribute-uuid", "")?;
            }
        }
        Ok(())
    }

    /// Drop everything back to the fresh state
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::MemorySettings;

    fn connected_state() -> SessionState {
        SessionState {
            csrfhw: "1fe3ee0634195096337177a0994723fb".to_string(),
            wlanuserip: "10.190.20.96".to_string(),
            login_url: "https://secure.etecsa.net:8443//LoginServlet".to_string(),
            auth: Some(AuthInfo {
                username: "bob@nauta.com.cu".to_string(),
                attribute_uuid: "abc123".to_string(),
            }),
        }
    }

    #[test]
    fn test_round_trip_connected() {
        let mut store = MemorySettings::default();
        let state = connected_state();

        state.save(&mut store).unwrap();
        let loaded = SessionState::load(&store).unwrap();

        assert_eq!(loaded, state);
        assert!(store.get_bool("connected").unwrap());
    }

    #[test]
    fn test_round_trip_disconnected() {
        let mut store = MemorySettings::default();
        let state = SessionState {
            auth: None,
            ..connected_state()
        };

        state.save(&mut store).unwrap();
        let loaded = SessionState::load(&store).unwrap();

        assert_eq!(loaded, state);
        assert!(loaded.auth.is_none());
    }

    #[test]
    fn test_fresh_store_loads_default_state() {
        let store = MemorySettings::default();
        let loaded = SessionState::load(&store).unwrap();

        assert_eq!(loaded, SessionState::default());
        assert!(!loaded.is_connected());
        assert!(!loaded.has_tokens());
    }

    #[test]
    fn test_save_clears_identity_when_disconnected() {
        let mut store = MemorySettings::default();
        connected_state().save(&mut store).unwrap();

        let mut state = connected_state();
        state.auth = None;
        state.save(&mut store).unwrap();

        assert_eq!(store.get_string("username").unwrap(), "");
        assert_eq!(store.get_string("attribute-uuid").unwrap(), "");
        assert!(!store.get_bool("connected").unwrap());
    }

    #[test]
    fn test_auth_present_iff_connected_flag() {
        let mut store = MemorySettings::default();
        connected_state().save(&mut store).unwrap();

        // Flip only the flag; the stale identity fields must not resurrect
        // a connection on load.
        store.set_bool("connected", false).unwrap();
        let loaded = SessionState::load(&store).unwrap();
        assert!(loaded.auth.is_none());
    }
}
